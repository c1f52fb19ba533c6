//! Parabolic SAR (Stop And Reverse).
//!
//! - SAR(다음) = SAR + AF × (EP - SAR)
//! - AF는 0.02에서 시작해 새 극값(EP)마다 0.02씩 증가, 최대 0.20
//! - 상승 추세의 SAR은 직전 두 봉의 저가를 넘을 수 없음 (하락 추세는 고가)
//! - 가격이 SAR을 돌파하면 추세 전환, SAR = 이전 EP, AF 초기화

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{ensure_same_len, IndicatorError, IndicatorResult, Series};

/// Parabolic SAR 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParabolicSarParams {
    /// 시작 가속 계수 (기본: 0.02).
    pub af_start: Decimal,
    /// 가속 계수 증가분 (기본: 0.02).
    pub af_step: Decimal,
    /// 최대 가속 계수 (기본: 0.20).
    pub af_max: Decimal,
}

impl Default for ParabolicSarParams {
    fn default() -> Self {
        Self {
            af_start: dec!(0.02),
            af_step: dec!(0.02),
            af_max: dec!(0.20),
        }
    }
}

/// SAR 한 봉의 값.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarPoint {
    pub sar: Decimal,
    pub is_uptrend: bool,
}

/// Parabolic SAR 계산기.
#[derive(Debug, Default)]
pub struct ParabolicSarIndicator;

impl ParabolicSarIndicator {
    pub fn new() -> Self {
        Self
    }

    /// Parabolic SAR 계산.
    ///
    /// 초기 추세는 두 번째 종가가 첫 종가 이상이면 상승입니다.
    /// 봉이 2개 미만이면 빈 시계열을 반환합니다.
    pub fn calculate(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: ParabolicSarParams,
    ) -> IndicatorResult<Series<SarPoint>> {
        ensure_same_len(&[high.len(), low.len(), close.len()])?;
        if params.af_start <= Decimal::ZERO || params.af_max < params.af_start {
            return Err(IndicatorError::InvalidParameter(
                "가속 계수 설정이 올바르지 않습니다".to_string(),
            ));
        }

        let n = close.len();
        if n < 2 {
            return Ok(Series::empty(n));
        }

        let mut is_uptrend = close[1] >= close[0];
        let mut sar = if is_uptrend { low[0] } else { high[0] };
        let mut ep = if is_uptrend { high[0] } else { low[0] };
        let mut af = params.af_start;

        let mut points = Vec::with_capacity(n);
        points.push(SarPoint { sar, is_uptrend });

        for i in 1..n {
            let mut next = sar + af * (ep - sar);

            if is_uptrend {
                next = next.min(low[i - 1]);
                if i >= 2 {
                    next = next.min(low[i - 2]);
                }

                if low[i] < next {
                    is_uptrend = false;
                    next = ep;
                    ep = low[i];
                    af = params.af_start;
                } else if high[i] > ep {
                    ep = high[i];
                    af = (af + params.af_step).min(params.af_max);
                }
            } else {
                next = next.max(high[i - 1]);
                if i >= 2 {
                    next = next.max(high[i - 2]);
                }

                if high[i] > next {
                    is_uptrend = true;
                    next = ep;
                    ep = high[i];
                    af = params.af_start;
                } else if low[i] < ep {
                    ep = low[i];
                    af = (af + params.af_step).min(params.af_max);
                }
            }

            sar = next;
            points.push(SarPoint { sar, is_uptrend });
        }

        Ok(Series::new(0, points))
    }
}
