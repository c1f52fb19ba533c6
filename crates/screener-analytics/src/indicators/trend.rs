//! 추세 지표 (Trend Indicators).
//!
//! 이동평균 및 방향성 기반의 추세 지표들을 제공합니다.
//! - SMA (Simple Moving Average)
//! - EMA (Exponential Moving Average)
//! - MACD (Moving Average Convergence Divergence)
//! - ADX / +DI / -DI (Average Directional Index)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::volatility::true_range;
use super::{ensure_period, ensure_same_len, mean, wilder_smooth, IndicatorResult, Series};

/// SMA 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SmaParams {
    /// 이동평균 기간.
    pub period: usize,
}

impl Default for SmaParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// EMA 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmaParams {
    /// 이동평균 기간.
    pub period: usize,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// MACD 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdParams {
    /// 단기 EMA 기간 (기본: 12).
    pub fast_period: usize,
    /// 장기 EMA 기간 (기본: 26).
    pub slow_period: usize,
    /// 시그널 라인 기간 (기본: 9).
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// MACD 결과.
///
/// 세 시계열은 시작 봉이 다릅니다 (시그널/히스토그램이 더 늦게 시작).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdResult {
    /// MACD 라인 (단기 EMA - 장기 EMA).
    pub macd: Series,
    /// 시그널 라인 (MACD의 EMA).
    pub signal: Series,
    /// 히스토그램 (MACD - 시그널).
    pub histogram: Series,
}

/// ADX 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdxParams {
    /// 평활 기간 (기본: 14).
    pub period: usize,
}

impl Default for AdxParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// ADX 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdxResult {
    /// ADX (0~100).
    pub adx: Series,
    /// +DI (0~100).
    pub plus_di: Series,
    /// -DI (0~100).
    pub minus_di: Series,
}

/// 추세 지표 계산기.
#[derive(Debug, Default)]
pub struct TrendIndicators;

impl TrendIndicators {
    /// 새로운 추세 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 단순 이동평균 (SMA) 계산.
    ///
    /// SMA = (P1 + P2 + ... + Pn) / n
    ///
    /// 입력이 기간보다 짧으면 빈 시계열을 반환합니다.
    pub fn sma(&self, prices: &[Decimal], params: SmaParams) -> IndicatorResult<Series> {
        let period = params.period;
        ensure_period(period)?;

        if prices.len() < period {
            return Ok(Series::empty(prices.len()));
        }

        let values = prices.windows(period).map(mean).collect();
        Ok(Series::new(period - 1, values))
    }

    /// 지수 이동평균 (EMA) 계산.
    ///
    /// EMA = 이전 EMA + k × (현재가 - 이전 EMA)
    /// k = 2 / (period + 1)
    ///
    /// 첫 값은 앞 `period`개(입력이 더 짧으면 전체)의 단순 평균입니다.
    /// 상수 입력에 대해서는 정확히 같은 상수를 반환합니다.
    ///
    /// # 인자
    /// * `prices` - 가격 데이터
    /// * `params` - EMA 파라미터
    ///
    /// # 반환
    /// `min(period, n) - 1`번째 봉부터 시작하는 EMA 시계열
    pub fn ema(&self, prices: &[Decimal], params: EmaParams) -> IndicatorResult<Series> {
        let period = params.period;
        ensure_period(period)?;

        if prices.is_empty() {
            return Ok(Series::empty(0));
        }

        let seed_len = period.min(prices.len());
        let multiplier = dec!(2) / Decimal::from(period + 1);

        let mut values = Vec::with_capacity(prices.len() - seed_len + 1);
        let mut prev = mean(&prices[..seed_len]);
        values.push(prev);

        for price in &prices[seed_len..] {
            prev += multiplier * (*price - prev);
            values.push(prev);
        }

        Ok(Series::new(seed_len - 1, values))
    }

    /// MACD 계산.
    ///
    /// MACD 라인 = 단기 EMA - 장기 EMA (장기 EMA 시작 봉부터)
    /// 시그널 라인 = MACD 라인의 EMA
    /// 히스토그램 = MACD 라인 - 시그널 라인
    pub fn macd(&self, prices: &[Decimal], params: MacdParams) -> IndicatorResult<MacdResult> {
        ensure_period(params.fast_period)?;
        ensure_period(params.slow_period)?;
        ensure_period(params.signal_period)?;

        let fast = self.ema(prices, EmaParams { period: params.fast_period })?;
        let slow = self.ema(prices, EmaParams { period: params.slow_period })?;

        // 장기 EMA가 시작하는 봉부터 정렬
        let start = slow.first_index.max(fast.first_index);
        let line_values: Vec<Decimal> = (start..prices.len())
            .filter_map(|i| Some(*fast.at(i)? - *slow.at(i)?))
            .collect();
        let macd = Series::new(start, line_values);

        let signal_raw = self.ema(&macd.values, EmaParams { period: params.signal_period })?;
        // 시그널은 MACD 값이 `signal_period`개 모인 뒤부터 유효
        let signal = if macd.len() >= params.signal_period {
            Series::new(macd.first_index + signal_raw.first_index, signal_raw.values)
        } else {
            Series::empty(prices.len())
        };

        let histogram = Series::new(
            signal.first_index,
            signal
                .iter_indexed()
                .filter_map(|(i, s)| Some(*macd.at(i)? - *s))
                .collect(),
        );

        Ok(MacdResult {
            macd,
            signal,
            histogram,
        })
    }

    /// ADX / +DI / -DI 계산.
    ///
    /// 1. 봉마다 TR, +DM, -DM 계산 (1번째 봉부터)
    /// 2. 각각 Wilder 평활
    /// 3. ±DI = 평활 DM / 평활 TR × 100 (TR이 0이면 0)
    /// 4. DX = |+DI - -DI| / (+DI + -DI) × 100 (합이 0이면 0)
    /// 5. ADX = DX의 Wilder 평활
    pub fn adx(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: AdxParams,
    ) -> IndicatorResult<AdxResult> {
        let period = params.period;
        ensure_period(period)?;
        ensure_same_len(&[high.len(), low.len(), close.len()])?;

        let n = close.len();
        if n < 2 {
            return Ok(AdxResult {
                adx: Series::empty(n),
                plus_di: Series::empty(n),
                minus_di: Series::empty(n),
            });
        }

        let tr = true_range(high, low, close);
        let mut plus_dm = Vec::with_capacity(n - 1);
        let mut minus_dm = Vec::with_capacity(n - 1);
        for i in 1..n {
            let up = high[i] - high[i - 1];
            let down = low[i - 1] - low[i];
            plus_dm.push(if up > down && up > Decimal::ZERO { up } else { Decimal::ZERO });
            minus_dm.push(if down > up && down > Decimal::ZERO { down } else { Decimal::ZERO });
        }

        // DM과 TR 모두 1번째 봉부터 평활
        let tr_s = wilder_smooth(&tr[1..], period, 1);
        let plus_s = wilder_smooth(&plus_dm, period, 1);
        let minus_s = wilder_smooth(&minus_dm, period, 1);

        let hundred = Decimal::ONE_HUNDRED;
        let di = |dm: &Series| -> Series {
            Series::new(
                dm.first_index,
                dm.iter_indexed()
                    .map(|(i, v)| match tr_s.at(i) {
                        Some(t) if !t.is_zero() => *v / *t * hundred,
                        _ => Decimal::ZERO,
                    })
                    .collect(),
            )
        };
        let plus_di = di(&plus_s);
        let minus_di = di(&minus_s);

        let dx: Vec<Decimal> = plus_di
            .values
            .iter()
            .zip(&minus_di.values)
            .map(|(p, m)| {
                let sum = *p + *m;
                if sum.is_zero() {
                    Decimal::ZERO
                } else {
                    (*p - *m).abs() / sum * hundred
                }
            })
            .collect();
        let adx = wilder_smooth(&dx, period, plus_di.first_index);

        Ok(AdxResult {
            adx,
            plus_di,
            minus_di,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending_ohlc(n: usize) -> (Vec<Decimal>, Vec<Decimal>, Vec<Decimal>) {
        let close: Vec<Decimal> = (0..n).map(|i| dec!(100) + Decimal::from(i)).collect();
        let high = close.iter().map(|c| *c + dec!(1)).collect();
        let low = close.iter().map(|c| *c - dec!(1)).collect();
        (high, low, close)
    }

    #[test]
    fn test_sma() {
        let trend = TrendIndicators::new();
        let prices = vec![dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)];
        let sma = trend.sma(&prices, SmaParams { period: 3 }).unwrap();

        assert_eq!(sma.first_index, 2);
        assert_eq!(sma.values, vec![dec!(2), dec!(3), dec!(4)]);
    }

    #[test]
    fn test_sma_short_input_is_empty() {
        let trend = TrendIndicators::new();
        let sma = trend.sma(&[dec!(1), dec!(2)], SmaParams { period: 3 }).unwrap();
        assert!(sma.is_empty());
    }

    #[test]
    fn test_zero_period_rejected() {
        let trend = TrendIndicators::new();
        assert!(trend.ema(&[dec!(1)], EmaParams { period: 0 }).is_err());
    }

    #[test]
    fn test_ema_seed_and_recursion() {
        let trend = TrendIndicators::new();
        let prices = vec![dec!(2), dec!(4), dec!(6), dec!(8)];
        let ema = trend.ema(&prices, EmaParams { period: 3 }).unwrap();

        // 시드 = (2+4+6)/3 = 4, k = 0.5 → 4 + 0.5*(8-4) = 6
        assert_eq!(ema.first_index, 2);
        assert_eq!(ema.values, vec![dec!(4), dec!(6)]);
    }

    #[test]
    fn test_ema_shorter_than_period() {
        let trend = TrendIndicators::new();
        let ema = trend
            .ema(&[dec!(10), dec!(20)], EmaParams { period: 50 })
            .unwrap();
        assert_eq!(ema.first_index, 1);
        assert_eq!(ema.values, vec![dec!(15)]);
    }

    #[test]
    fn test_ema_constant_series() {
        let trend = TrendIndicators::new();
        let prices = vec![dec!(100); 300];
        let ema = trend.ema(&prices, EmaParams { period: 20 }).unwrap();
        assert!(ema.values.iter().all(|v| *v == dec!(100)));
    }

    #[test]
    fn test_macd_alignment() {
        let trend = TrendIndicators::new();
        let prices: Vec<Decimal> = (0..60).map(|i| dec!(100) + Decimal::from(i)).collect();
        let macd = trend.macd(&prices, MacdParams::default()).unwrap();

        assert_eq!(macd.macd.first_index, 25);
        assert_eq!(macd.signal.first_index, 33);
        assert_eq!(macd.histogram.first_index, 33);
        assert_eq!(macd.macd.end_index(), 60);
        assert_eq!(macd.histogram.end_index(), 60);

        // 꾸준한 상승 → MACD 양수
        assert!(*macd.macd.last().unwrap() > Decimal::ZERO);
        let last = 59;
        assert_eq!(
            macd.histogram.value_at(last).unwrap(),
            macd.macd.value_at(last).unwrap() - macd.signal.value_at(last).unwrap()
        );
    }

    #[test]
    fn test_macd_short_input() {
        let trend = TrendIndicators::new();
        let prices: Vec<Decimal> = (0..20).map(|i| dec!(100) + Decimal::from(i)).collect();
        let macd = trend.macd(&prices, MacdParams::default()).unwrap();
        assert!(macd.signal.is_empty());
        assert!(macd.histogram.is_empty());
    }

    #[test]
    fn test_adx_uptrend() {
        let trend = TrendIndicators::new();
        let (high, low, close) = trending_ohlc(60);
        let adx = trend.adx(&high, &low, &close, AdxParams::default()).unwrap();

        assert_eq!(adx.plus_di.first_index, 14);
        assert_eq!(adx.adx.first_index, 27);
        assert!(adx.plus_di.last_or(Decimal::ZERO) > adx.minus_di.last_or(Decimal::ZERO));
        let value = adx.adx.last_or(Decimal::ZERO);
        assert!(value > dec!(50) && value <= dec!(100));
    }

    #[test]
    fn test_adx_flat_is_zero() {
        let trend = TrendIndicators::new();
        let flat = vec![dec!(100); 100];
        let adx = trend.adx(&flat, &flat, &flat, AdxParams::default()).unwrap();
        assert_eq!(adx.adx.last_or(dec!(-1)), Decimal::ZERO);
        assert_eq!(adx.plus_di.last_or(dec!(-1)), Decimal::ZERO);
    }

    #[test]
    fn test_adx_mismatched_lengths() {
        let trend = TrendIndicators::new();
        let result = trend.adx(&[dec!(1)], &[dec!(1), dec!(2)], &[dec!(1)], AdxParams::default());
        assert!(result.is_err());
    }
}
