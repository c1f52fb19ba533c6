//! SuperTrend 지표.
//!
//! SuperTrend는 ATR 기반 추세 추종 지표입니다.
//!
//! ## 계산 방식
//! 1. 기본 밴드 = (고가 + 저가) / 2 ± (배수 × ATR)
//! 2. 최종 밴드는 가격 쪽으로만 이동하며, 이전 종가가 밴드를 넘었을 때만 다시 기본 밴드로 돌아감
//! 3. 종가가 활성 밴드를 돌파하면 추세 전환
//!
//! ## 시그널
//! - SuperTrend < 가격: 상승 추세
//! - SuperTrend > 가격: 하락 추세

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::volatility::{AtrParams, VolatilityIndicators};
use super::{ensure_period, ensure_same_len, IndicatorError, IndicatorResult, Series};

/// SuperTrend 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SuperTrendParams {
    /// ATR 기간 (기본: 10).
    pub atr_period: usize,
    /// ATR 배수 (기본: 3.0).
    pub multiplier: Decimal,
}

impl Default for SuperTrendParams {
    fn default() -> Self {
        Self {
            atr_period: 10,
            multiplier: dec!(3.0),
        }
    }
}

/// SuperTrend 한 봉의 값.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperTrendPoint {
    /// SuperTrend 값 (상승 추세면 하단 밴드, 하락 추세면 상단 밴드).
    pub value: Decimal,
    /// 추세 방향 (true: 상승, false: 하락).
    pub is_uptrend: bool,
}

/// SuperTrend 계산기.
#[derive(Debug, Default)]
pub struct SuperTrendIndicator {
    volatility: VolatilityIndicators,
}

impl SuperTrendIndicator {
    /// 새로운 SuperTrend 계산기 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// SuperTrend 지표 계산.
    ///
    /// 결과는 ATR이 처음 계산되는 봉(`atr_period - 1`)부터 시작합니다.
    pub fn calculate(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: SuperTrendParams,
    ) -> IndicatorResult<Series<SuperTrendPoint>> {
        ensure_period(params.atr_period)?;
        ensure_same_len(&[high.len(), low.len(), close.len()])?;

        if params.multiplier <= Decimal::ZERO {
            return Err(IndicatorError::InvalidParameter(
                "배수는 0보다 커야 합니다".to_string(),
            ));
        }

        let atr = self.volatility.atr(
            high,
            low,
            close,
            AtrParams {
                period: params.atr_period,
            },
        )?;
        if atr.is_empty() {
            return Ok(Series::empty(close.len()));
        }

        let mut points = Vec::with_capacity(atr.len());
        let mut prev: Option<(Decimal, Decimal, bool)> = None;

        for (i, atr_val) in atr.iter_indexed() {
            let hl_avg = (high[i] + low[i]) / dec!(2);
            let basic_upper = hl_avg + params.multiplier * *atr_val;
            let basic_lower = hl_avg - params.multiplier * *atr_val;

            let (final_upper, final_lower, is_uptrend) = match prev {
                None => (basic_upper, basic_lower, close[i] >= hl_avg),
                Some((prev_upper, prev_lower, prev_up)) => {
                    let prev_close = close[i - 1];
                    let upper = if basic_upper < prev_upper || prev_close > prev_upper {
                        basic_upper
                    } else {
                        prev_upper
                    };
                    let lower = if basic_lower > prev_lower || prev_close < prev_lower {
                        basic_lower
                    } else {
                        prev_lower
                    };

                    let up = if prev_up {
                        close[i] >= lower
                    } else {
                        close[i] > upper
                    };
                    (upper, lower, up)
                }
            };

            points.push(SuperTrendPoint {
                value: if is_uptrend { final_lower } else { final_upper },
                is_uptrend,
            });
            prev = Some((final_upper, final_lower, is_uptrend));
        }

        Ok(Series::new(atr.first_index, points))
    }
}
