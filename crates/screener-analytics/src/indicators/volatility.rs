//! 변동성 지표 (Volatility Indicators).
//!
//! 가격 변동성을 측정하는 지표들을 제공합니다.
//! - ATR (Average True Range, Wilder 평활)
//! - Bollinger Bands (%B, 밴드폭)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{ensure_period, ensure_same_len, mean, wilder_smooth, IndicatorResult, Series};

/// 볼린저 밴드 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerBandsParams {
    /// 이동평균 기간 (기본: 20).
    pub period: usize,
    /// 표준편차 배수 (기본: 2.0).
    pub std_dev_multiplier: Decimal,
}

impl Default for BollingerBandsParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: dec!(2.0),
        }
    }
}

/// 볼린저 밴드 한 봉의 값.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BollingerPoint {
    /// 상단 밴드.
    pub upper: Decimal,
    /// 중간 밴드 (SMA).
    pub middle: Decimal,
    /// 하단 밴드.
    pub lower: Decimal,
    /// %B = (가격 - 하단) / (상단 - 하단), [0, 1]로 고정. 밴드가 수렴하면 0.5.
    pub percent_b: Decimal,
    /// 밴드폭 = (상단 - 하단) / 중간. 중간이 0이면 0.
    pub bandwidth: Decimal,
}

/// ATR 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtrParams {
    /// ATR 기간 (기본: 14).
    pub period: usize,
}

impl Default for AtrParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 변동성 지표 계산기.
#[derive(Debug, Default)]
pub struct VolatilityIndicators;

impl VolatilityIndicators {
    /// 새로운 변동성 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 볼린저 밴드 계산.
    ///
    /// - 중간 밴드 = SMA(period)
    /// - 상단 밴드 = 중간 밴드 + (표준편차 × 배수)
    /// - 하단 밴드 = 중간 밴드 - (표준편차 × 배수)
    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> IndicatorResult<Series<BollingerPoint>> {
        let period = params.period;
        ensure_period(period)?;

        if prices.len() < period {
            return Ok(Series::empty(prices.len()));
        }

        let period_decimal = Decimal::from(period);
        let values = prices
            .windows(period)
            .map(|window| {
                let ma = mean(window);
                let variance = window
                    .iter()
                    .map(|p| {
                        let diff = *p - ma;
                        diff * diff
                    })
                    .sum::<Decimal>()
                    / period_decimal;

                let deviation = params.std_dev_multiplier * sqrt_decimal(variance);
                let upper = ma + deviation;
                let lower = ma - deviation;
                let price = window[period - 1];

                // 밴드 밖 가격은 0 또는 1로 고정
                let percent_b = if upper != lower {
                    ((price - lower) / (upper - lower)).clamp(Decimal::ZERO, Decimal::ONE)
                } else {
                    dec!(0.5)
                };
                let bandwidth = if ma.is_zero() {
                    Decimal::ZERO
                } else {
                    (upper - lower) / ma
                };

                BollingerPoint {
                    upper,
                    middle: ma,
                    lower,
                    percent_b,
                    bandwidth,
                }
            })
            .collect();

        Ok(Series::new(period - 1, values))
    }

    /// ATR (Average True Range) 계산.
    ///
    /// TR = max(고가 - 저가, |고가 - 이전 종가|, |저가 - 이전 종가|)
    /// ATR = TR의 Wilder 평활 (첫 봉의 TR은 고가 - 저가)
    pub fn atr(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: AtrParams,
    ) -> IndicatorResult<Series> {
        ensure_period(params.period)?;
        ensure_same_len(&[high.len(), low.len(), close.len()])?;

        let tr = true_range(high, low, close);
        Ok(wilder_smooth(&tr, params.period, 0))
    }

    /// ATR 백분율 (ATR / 종가 × 100). 종가가 0이면 0.
    pub fn atr_percent(&self, atr: Decimal, close: Decimal) -> Decimal {
        if close.is_zero() {
            return Decimal::ZERO;
        }
        atr / close * Decimal::ONE_HUNDRED
    }
}

/// 봉별 True Range. 첫 봉은 고가 - 저가.
pub(crate) fn true_range(high: &[Decimal], low: &[Decimal], close: &[Decimal]) -> Vec<Decimal> {
    (0..close.len())
        .map(|i| {
            let hl = high[i] - low[i];
            if i == 0 {
                return hl;
            }
            let hc = (high[i] - close[i - 1]).abs();
            let lc = (low[i] - close[i - 1]).abs();
            hl.max(hc).max(lc)
        })
        .collect()
}

/// Decimal 제곱근 (Newton-Raphson).
pub(crate) fn sqrt_decimal(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let two = dec!(2);
    let tolerance = dec!(0.0000000001);
    let mut x = if value > Decimal::ONE { value / two } else { Decimal::ONE };

    // 큰 값도 수렴하도록 충분히 반복하되, 변화가 없으면 중단
    for _ in 0..100 {
        let next = (x + value / x) / two;
        if (next - x).abs() < tolerance {
            return next;
        }
        x = next;
    }

    x
}
