//! 모멘텀 지표 (Momentum Indicators).
//!
//! 가격 모멘텀과 과매수/과매도 상태를 측정하는 지표들을 제공합니다.
//! - RSI (Wilder 평활)
//! - Stochastic Oscillator (%K 평활 포함)
//! - Williams %R
//! - ROC (Rate of Change)
//! - CCI (Commodity Channel Index)
//! - MFI (Money Flow Index)
//!
//! 0으로 나누는 상황은 모두 중립값으로 대체합니다
//! (RSI 50/100, Stochastic 50, Williams -50, CCI 0, MFI 50/100).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::trend::{SmaParams, TrendIndicators};
use super::{ensure_period, ensure_same_len, highest, lowest, mean, wilder_step, IndicatorResult, Series};

/// RSI 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RsiParams {
    /// RSI 기간 (기본: 14).
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 스토캐스틱 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StochasticParams {
    /// %K 기간 (기본: 14).
    pub k_period: usize,
    /// %D 기간 (기본: 3).
    pub d_period: usize,
    /// %K 평활 기간 (기본: 3).
    pub smooth: usize,
}

impl Default for StochasticParams {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
            smooth: 3,
        }
    }
}

/// 스토캐스틱 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StochasticResult {
    /// 평활된 %K (Slow %K).
    pub k: Series,
    /// %D (%K의 이동평균).
    pub d: Series,
}

/// Williams %R 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WilliamsRParams {
    /// 기간 (기본: 14).
    pub period: usize,
}

impl Default for WilliamsRParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// ROC 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RocParams {
    /// 기간 (기본: 10).
    pub period: usize,
}

impl Default for RocParams {
    fn default() -> Self {
        Self { period: 10 }
    }
}

/// CCI 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CciParams {
    /// 기간 (기본: 20).
    pub period: usize,
}

impl Default for CciParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// MFI 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MfiParams {
    /// 기간 (기본: 14).
    pub period: usize,
}

impl Default for MfiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 모멘텀 지표 계산기.
#[derive(Debug, Default)]
pub struct MomentumIndicators {
    trend: TrendIndicators,
}

impl MomentumIndicators {
    /// 새로운 모멘텀 계산기 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// RSI (Relative Strength Index) 계산.
    ///
    /// RSI = 100 - (100 / (1 + RS)), RS = 평균 상승폭 / 평균 하락폭
    ///
    /// 처음 `period`개 변화량의 단순 평균으로 시작한 뒤
    /// `avg = (avg × (period-1) + new) / period`로 평활합니다.
    ///
    /// # 반환
    /// `period`번째 봉부터 시작하는 0~100 사이의 RSI 값
    pub fn rsi(&self, prices: &[Decimal], params: RsiParams) -> IndicatorResult<Series> {
        let period = params.period;
        ensure_period(period)?;

        if prices.len() < period + 1 {
            return Ok(Series::empty(prices.len()));
        }

        let (gains, losses): (Vec<Decimal>, Vec<Decimal>) = prices
            .windows(2)
            .map(|w| {
                let delta = w[1] - w[0];
                if delta > Decimal::ZERO {
                    (delta, Decimal::ZERO)
                } else {
                    (Decimal::ZERO, -delta)
                }
            })
            .unzip();

        let mut avg_gain = mean(&gains[..period]);
        let mut avg_loss = mean(&losses[..period]);

        let mut values = Vec::with_capacity(prices.len() - period);
        values.push(rsi_from_averages(avg_gain, avg_loss));
        for (gain, loss) in gains[period..].iter().zip(&losses[period..]) {
            avg_gain = wilder_step(avg_gain, *gain, period);
            avg_loss = wilder_step(avg_loss, *loss, period);
            values.push(rsi_from_averages(avg_gain, avg_loss));
        }

        Ok(Series::new(period, values))
    }

    /// 스토캐스틱 오실레이터 계산.
    ///
    /// Raw %K = (종가 - 최저가) / (최고가 - 최저가) × 100 (범위 0이면 50)
    /// Slow %K = Raw %K의 SMA(smooth)
    /// %D = Slow %K의 SMA(d)
    pub fn stochastic(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: StochasticParams,
    ) -> IndicatorResult<StochasticResult> {
        ensure_period(params.k_period)?;
        ensure_period(params.d_period)?;
        ensure_period(params.smooth)?;
        ensure_same_len(&[high.len(), low.len(), close.len()])?;

        let n = close.len();
        let raw = self.range_position(high, low, close, params.k_period, |pos| pos, dec!(50));

        let slow = self.trend.sma(&raw.values, SmaParams { period: params.smooth })?;
        let k = if slow.is_empty() {
            Series::empty(n)
        } else {
            Series::new(raw.first_index + slow.first_index, slow.values)
        };

        let d_raw = self.trend.sma(&k.values, SmaParams { period: params.d_period })?;
        let d = if d_raw.is_empty() {
            Series::empty(n)
        } else {
            Series::new(k.first_index + d_raw.first_index, d_raw.values)
        };

        Ok(StochasticResult { k, d })
    }

    /// Williams %R 계산.
    ///
    /// %R = (최고가 - 종가) / (최고가 - 최저가) × -100, 범위는 -100~0.
    pub fn williams_r(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: WilliamsRParams,
    ) -> IndicatorResult<Series> {
        ensure_period(params.period)?;
        ensure_same_len(&[high.len(), low.len(), close.len()])?;

        // 위치(0~100)를 %R(-100~0)로 변환
        Ok(self.range_position(
            high,
            low,
            close,
            params.period,
            |pos| pos - Decimal::ONE_HUNDRED,
            dec!(-50),
        ))
    }

    /// ROC (Rate of Change) 계산.
    ///
    /// ROC = (현재가 - n봉 전 가격) / n봉 전 가격 × 100
    pub fn roc(&self, prices: &[Decimal], params: RocParams) -> IndicatorResult<Series> {
        let period = params.period;
        ensure_period(period)?;

        if prices.len() <= period {
            return Ok(Series::empty(prices.len()));
        }

        let values = (period..prices.len())
            .map(|i| {
                let base = prices[i - period];
                if base.is_zero() {
                    Decimal::ZERO
                } else {
                    (prices[i] - base) / base * Decimal::ONE_HUNDRED
                }
            })
            .collect();

        Ok(Series::new(period, values))
    }

    /// CCI (Commodity Channel Index) 계산.
    ///
    /// CCI = (TP - SMA(TP)) / (0.015 × 평균편차), 평균편차 0이면 0.
    pub fn cci(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: CciParams,
    ) -> IndicatorResult<Series> {
        let period = params.period;
        ensure_period(period)?;
        ensure_same_len(&[high.len(), low.len(), close.len()])?;

        let typical = typical_prices(high, low, close);
        if typical.len() < period {
            return Ok(Series::empty(typical.len()));
        }

        let values = typical
            .windows(period)
            .map(|window| {
                let avg = mean(window);
                let mean_dev = window.iter().map(|tp| (*tp - avg).abs()).sum::<Decimal>()
                    / Decimal::from(period);
                let current = window[period - 1];
                if mean_dev.is_zero() {
                    Decimal::ZERO
                } else {
                    (current - avg) / (dec!(0.015) * mean_dev)
                }
            })
            .collect();

        Ok(Series::new(period - 1, values))
    }

    /// MFI (Money Flow Index) 계산.
    ///
    /// 대표가 상승 봉의 자금흐름(TP × 거래량)을 양, 하락 봉을 음으로 누적해
    /// MFI = 100 - 100 / (1 + 양/음)을 구합니다.
    /// 음의 흐름이 0이면 양의 흐름이 있을 때 100, 없으면 50.
    pub fn mfi(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        volume: &[Decimal],
        params: MfiParams,
    ) -> IndicatorResult<Series> {
        let period = params.period;
        ensure_period(period)?;
        ensure_same_len(&[high.len(), low.len(), close.len(), volume.len()])?;

        let n = close.len();
        if n < period + 1 {
            return Ok(Series::empty(n));
        }

        let typical = typical_prices(high, low, close);
        let mut positive = vec![Decimal::ZERO; n];
        let mut negative = vec![Decimal::ZERO; n];
        for i in 1..n {
            let flow = typical[i] * volume[i];
            if typical[i] > typical[i - 1] {
                positive[i] = flow;
            } else if typical[i] < typical[i - 1] {
                negative[i] = flow;
            }
        }

        let values = (period..n)
            .map(|i| {
                let window = i + 1 - period..=i;
                let pos: Decimal = positive[window.clone()].iter().sum();
                let neg: Decimal = negative[window].iter().sum();
                if neg.is_zero() {
                    if pos.is_zero() {
                        dec!(50)
                    } else {
                        Decimal::ONE_HUNDRED
                    }
                } else {
                    Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + pos / neg)
                }
            })
            .collect();

        Ok(Series::new(period, values))
    }

    /// 기간 고저 범위 안에서 종가 위치(0~100)를 구해 변환합니다.
    fn range_position<F>(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        period: usize,
        transform: F,
        flat_value: Decimal,
    ) -> Series
    where
        F: Fn(Decimal) -> Decimal,
    {
        let n = close.len();
        if n < period {
            return Series::empty(n);
        }

        let values = (period - 1..n)
            .map(|i| {
                let window = i + 1 - period..=i;
                let hh = highest(&high[window.clone()]);
                let ll = lowest(&low[window]);
                let range = hh - ll;
                if range.is_zero() {
                    flat_value
                } else {
                    transform((close[i] - ll) / range * Decimal::ONE_HUNDRED)
                }
            })
            .collect();

        Series::new(period - 1, values)
    }
}

/// 평균 상승/하락폭으로 RSI 값을 계산합니다.
fn rsi_from_averages(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        // 변화가 전혀 없으면 중립
        return if avg_gain.is_zero() {
            dec!(50)
        } else {
            Decimal::ONE_HUNDRED
        };
    }
    let rs = avg_gain / avg_loss;
    Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs)
}

/// 대표가 (H + L + C) / 3.
pub(crate) fn typical_prices(high: &[Decimal], low: &[Decimal], close: &[Decimal]) -> Vec<Decimal> {
    let three = Decimal::from(3);
    high.iter()
        .zip(low)
        .zip(close)
        .map(|((h, l), c)| (*h + *l + *c) / three)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ohlc() -> (Vec<Decimal>, Vec<Decimal>, Vec<Decimal>) {
        let close = vec![
            dec!(44.34), dec!(44.09), dec!(44.15), dec!(43.61), dec!(44.33),
            dec!(44.83), dec!(45.10), dec!(45.42), dec!(45.84), dec!(46.08),
            dec!(45.89), dec!(46.03), dec!(45.61), dec!(46.28), dec!(46.28),
            dec!(46.00), dec!(46.03), dec!(46.41), dec!(46.22), dec!(45.64),
        ];
        let high = close.iter().map(|c| *c + dec!(0.5)).collect();
        let low = close.iter().map(|c| *c - dec!(0.5)).collect();
        (high, low, close)
    }

    #[test]
    fn test_rsi_range_and_alignment() {
        let momentum = MomentumIndicators::new();
        let (_, _, close) = sample_ohlc();
        let rsi = momentum.rsi(&close, RsiParams::default()).unwrap();

        assert_eq!(rsi.first_index, 14);
        assert_eq!(rsi.end_index(), close.len());
        for v in &rsi.values {
            assert!(*v >= Decimal::ZERO && *v <= dec!(100));
        }
        // 상승 우위 구간
        assert!(rsi.values[0] > dec!(60));
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let momentum = MomentumIndicators::new();
        let prices: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        let rsi = momentum.rsi(&prices, RsiParams::default()).unwrap();
        assert_eq!(rsi.last_or(Decimal::ZERO), dec!(100));
    }

    #[test]
    fn test_rsi_flat_is_neutral() {
        let momentum = MomentumIndicators::new();
        let rsi = momentum.rsi(&vec![dec!(100); 30], RsiParams::default()).unwrap();
        assert!(rsi.values.iter().all(|v| *v == dec!(50)));
    }

    #[test]
    fn test_rsi_short_input() {
        let momentum = MomentumIndicators::new();
        let rsi = momentum.rsi(&[dec!(1), dec!(2)], RsiParams::default()).unwrap();
        assert!(rsi.is_empty());
        assert_eq!(rsi.first_index, 2);
    }

    #[test]
    fn test_stochastic_alignment_and_flat() {
        let momentum = MomentumIndicators::new();
        let (high, low, close) = sample_ohlc();
        let stoch = momentum
            .stochastic(&high, &low, &close, StochasticParams::default())
            .unwrap();
        // raw %K 13, slow %K 15, %D 17
        assert_eq!(stoch.k.first_index, 15);
        assert_eq!(stoch.d.first_index, 17);
        assert!(stoch.k.values.iter().all(|v| *v >= Decimal::ZERO && *v <= dec!(100)));

        let flat = vec![dec!(10); 20];
        let stoch = momentum
            .stochastic(&flat, &flat, &flat, StochasticParams::default())
            .unwrap();
        assert_eq!(stoch.k.last_or(Decimal::ZERO), dec!(50));
        assert_eq!(stoch.d.last_or(Decimal::ZERO), dec!(50));
    }

    #[test]
    fn test_williams_r() {
        let momentum = MomentumIndicators::new();
        let high = vec![dec!(10), dec!(12), dec!(14)];
        let low = vec![dec!(8), dec!(9), dec!(10)];
        let close = vec![dec!(9), dec!(11), dec!(14)];
        let wr = momentum
            .williams_r(&high, &low, &close, WilliamsRParams { period: 3 })
            .unwrap();
        // 종가가 최고가 → 0
        assert_eq!(wr.values, vec![Decimal::ZERO]);

        let flat = vec![dec!(5); 3];
        let wr = momentum
            .williams_r(&flat, &flat, &flat, WilliamsRParams { period: 3 })
            .unwrap();
        assert_eq!(wr.values, vec![dec!(-50)]);
    }

    #[test]
    fn test_roc() {
        let momentum = MomentumIndicators::new();
        let prices = vec![dec!(100), dec!(105), dec!(110)];
        let roc = momentum.roc(&prices, RocParams { period: 2 }).unwrap();
        assert_eq!(roc.first_index, 2);
        assert_eq!(roc.values, vec![dec!(10)]);
    }

    #[test]
    fn test_cci_flat_is_zero() {
        let momentum = MomentumIndicators::new();
        let flat = vec![dec!(50); 25];
        let cci = momentum.cci(&flat, &flat, &flat, CciParams::default()).unwrap();
        assert!(cci.values.iter().all(|v| v.is_zero()));
    }

    #[test]
    fn test_mfi_bounds_and_defaults() {
        let momentum = MomentumIndicators::new();
        let (high, low, close) = sample_ohlc();
        let volume = vec![dec!(1000); close.len()];
        let mfi = momentum
            .mfi(&high, &low, &close, &volume, MfiParams::default())
            .unwrap();
        assert_eq!(mfi.first_index, 14);
        assert!(mfi.values.iter().all(|v| *v >= Decimal::ZERO && *v <= dec!(100)));

        let flat = vec![dec!(10); 20];
        let mfi = momentum
            .mfi(&flat, &flat, &flat, &volume, MfiParams::default())
            .unwrap();
        assert_eq!(mfi.last_or(Decimal::ZERO), dec!(50));
    }
}
