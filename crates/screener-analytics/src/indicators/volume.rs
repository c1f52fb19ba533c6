//! 거래량 기반 지표 (Volume-Based Indicators).
//!
//! ## OBV (On-Balance Volume)
//! - 종가 상승: OBV += 거래량
//! - 종가 하락: OBV -= 거래량
//! - 종가 동일: OBV 변화 없음
//!
//! ## A/D Line (Accumulation/Distribution)
//! - CLV = ((종가 - 저가) - (고가 - 종가)) / (고가 - 저가), 범위 0이면 0
//! - A/D += CLV × 거래량
//!
//! ## VWAP (Volume Weighted Average Price)
//! - Typical Price (TP) = (High + Low + Close) / 3
//! - VWAP = Σ(TP × Volume) / Σ(Volume), 최근 `period`봉 롤링
//! - 거래량 합이 0이면 TP 그대로

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::momentum::typical_prices;
use super::{ensure_period, ensure_same_len, IndicatorResult, Series};

/// VWAP 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VwapParams {
    /// 롤링 기간 (기본: 20).
    pub period: usize,
}

impl Default for VwapParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// 거래량 지표 계산기.
#[derive(Debug, Default)]
pub struct VolumeIndicators;

impl VolumeIndicators {
    /// 새로운 거래량 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// OBV (On-Balance Volume) 계산. 0에서 시작합니다.
    pub fn obv(&self, close: &[Decimal], volume: &[Decimal]) -> IndicatorResult<Series> {
        ensure_same_len(&[close.len(), volume.len()])?;

        if close.is_empty() {
            return Ok(Series::empty(0));
        }

        let mut obv = Decimal::ZERO;
        let mut values = Vec::with_capacity(close.len());
        values.push(obv);
        for i in 1..close.len() {
            if close[i] > close[i - 1] {
                obv += volume[i];
            } else if close[i] < close[i - 1] {
                obv -= volume[i];
            }
            values.push(obv);
        }

        Ok(Series::new(0, values))
    }

    /// A/D Line (누적/분산선) 계산.
    pub fn ad_line(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        volume: &[Decimal],
    ) -> IndicatorResult<Series> {
        ensure_same_len(&[high.len(), low.len(), close.len(), volume.len()])?;

        let mut ad = Decimal::ZERO;
        let values = (0..close.len())
            .map(|i| {
                let range = high[i] - low[i];
                let clv = if range.is_zero() {
                    Decimal::ZERO
                } else {
                    ((close[i] - low[i]) - (high[i] - close[i])) / range
                };
                ad += clv * volume[i];
                ad
            })
            .collect();

        Ok(Series::new(0, values))
    }

    /// 롤링 VWAP 계산.
    pub fn vwap(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        volume: &[Decimal],
        params: VwapParams,
    ) -> IndicatorResult<Series> {
        let period = params.period;
        ensure_period(period)?;
        ensure_same_len(&[high.len(), low.len(), close.len(), volume.len()])?;

        let n = close.len();
        if n < period {
            return Ok(Series::empty(n));
        }

        let typical = typical_prices(high, low, close);
        let values = (period - 1..n)
            .map(|i| {
                let window = i + 1 - period..=i;
                let vol_sum: Decimal = volume[window.clone()].iter().sum();
                if vol_sum.is_zero() {
                    return typical[i];
                }
                let pv: Decimal = typical[window.clone()]
                    .iter()
                    .zip(&volume[window])
                    .map(|(tp, v)| *tp * *v)
                    .sum();
                pv / vol_sum
            })
            .collect();

        Ok(Series::new(period - 1, values))
    }

    /// OBV가 최근 `lookback`개 평균 위에 있는지 확인합니다.
    pub fn obv_trending_up(&self, obv: &Series, lookback: usize) -> bool {
        if obv.len() < lookback || lookback == 0 {
            return false;
        }
        let recent = &obv.values[obv.len() - lookback..];
        let avg = super::mean(recent);
        obv.last().is_some_and(|last| *last > avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_obv() {
        let volume_ind = VolumeIndicators::new();
        let close = vec![dec!(10), dec!(11), dec!(10), dec!(10), dec!(12)];
        let volume = vec![dec!(100), dec!(200), dec!(150), dec!(300), dec!(50)];
        let obv = volume_ind.obv(&close, &volume).unwrap();

        assert_eq!(obv.first_index, 0);
        assert_eq!(
            obv.values,
            vec![dec!(0), dec!(200), dec!(50), dec!(50), dec!(100)]
        );
        assert!(volume_ind.obv_trending_up(&obv, 5));
    }

    #[test]
    fn test_ad_line_flat_range() {
        let volume_ind = VolumeIndicators::new();
        let flat = vec![dec!(10); 3];
        let volume = vec![dec!(100); 3];
        let ad = volume_ind.ad_line(&flat, &flat, &flat, &volume).unwrap();
        assert!(ad.values.iter().all(|v| v.is_zero()));
    }

    #[test]
    fn test_ad_line_close_at_high() {
        let volume_ind = VolumeIndicators::new();
        let ad = volume_ind
            .ad_line(&[dec!(12)], &[dec!(10)], &[dec!(12)], &[dec!(100)])
            .unwrap();
        assert_eq!(ad.values, vec![dec!(100)]);
    }

    #[test]
    fn test_vwap() {
        let volume_ind = VolumeIndicators::new();
        let price = vec![dec!(10), dec!(20)];
        let volume = vec![dec!(1), dec!(3)];
        let vwap = volume_ind
            .vwap(&price, &price, &price, &volume, VwapParams { period: 2 })
            .unwrap();
        // (10×1 + 20×3) / 4 = 17.5
        assert_eq!(vwap.values, vec![dec!(17.5)]);

        let zero_vol = vec![Decimal::ZERO; 2];
        let vwap = volume_ind
            .vwap(&price, &price, &price, &zero_vol, VwapParams { period: 2 })
            .unwrap();
        assert_eq!(vwap.values, vec![dec!(20)]);
    }
}
