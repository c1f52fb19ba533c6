//! 주봉 추세 건강도.
//!
//! 일봉을 주봉으로 리샘플링하고 주봉 EMA20 / RSI14 / MACD 히스토그램으로
//! 중기 추세가 일봉 신호와 같은 방향인지 판단합니다.
//!
//! # 리샘플링 규칙
//!
//! - **주 키**: 해당 ISO 주의 월요일
//! - **Open**: 주 첫 거래일의 시가
//! - **High / Low**: 주 중 최고가 / 최저가
//! - **Close**: 주 마지막 거래일의 종가 (진행 중인 주는 가장 최근 종가)
//! - **Volume**: 주 전체 거래량 합계

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use screener_core::Candle;

use crate::indicators::{
    EmaParams, IndicatorResult, MacdParams, MomentumIndicators, RsiParams, TrendIndicators,
};

/// 주봉 추세 판정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeeklyStatus {
    /// 주봉 추세 정렬 (+5)
    Aligned,
    /// 주봉 역추세 (-10)
    CounterTrend,
    /// 혼조 (0)
    #[default]
    Mixed,
}

impl WeeklyStatus {
    /// 점수 기여도.
    pub fn score(&self) -> i32 {
        match self {
            Self::Aligned => 5,
            Self::CounterTrend => -10,
            Self::Mixed => 0,
        }
    }

    /// 한글 설명.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Aligned => "주봉 추세 정렬",
            Self::CounterTrend => "주봉 역추세",
            Self::Mixed => "주봉 혼조",
        }
    }
}

/// 주봉 추세 건강도.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeeklyTrendHealth {
    pub close_above_ema20: bool,
    pub rsi_above_40: bool,
    pub macd_hist_positive: bool,
    pub status: WeeklyStatus,
    pub score: i32,
    /// 주봉 개수
    pub weeks: usize,
    pub weekly_close: Option<Decimal>,
    pub weekly_ema20: Option<Decimal>,
    pub weekly_rsi: Option<Decimal>,
    pub weekly_macd_hist: Option<Decimal>,
}

/// 날짜가 속한 ISO 주의 월요일.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// 일봉 → 주봉 리샘플링.
///
/// 주봉 캔들의 `date`는 해당 주의 월요일입니다.
/// 입력은 날짜 오름차순이어야 하며, 마지막(미완성) 주도 포함합니다.
pub fn resample_to_weekly(daily: &[Candle]) -> Vec<Candle> {
    let mut weekly: Vec<Candle> = Vec::new();

    for candle in daily {
        let key = week_start(candle.date);
        match weekly.last_mut() {
            Some(week) if week.date == key => {
                week.high = week.high.max(candle.high);
                week.low = week.low.min(candle.low);
                week.close = candle.close;
                week.volume += candle.volume;
            }
            _ => weekly.push(Candle::new(
                key,
                candle.open,
                candle.high,
                candle.low,
                candle.close,
                candle.volume,
            )),
        }
    }

    weekly
}

/// 주봉 추세 분석기.
#[derive(Debug, Default)]
pub struct WeeklyTrendAnalyzer {
    trend: TrendIndicators,
    momentum: MomentumIndicators,
}

impl WeeklyTrendAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 일봉 히스토리로부터 주봉 추세 건강도를 계산합니다.
    ///
    /// 주봉 값이 하나라도 계산되지 않으면 `Mixed`로 판정합니다.
    pub fn analyze(&self, daily: &[Candle]) -> IndicatorResult<WeeklyTrendHealth> {
        let weekly = resample_to_weekly(daily);
        let closes: Vec<Decimal> = weekly.iter().map(|c| c.close).collect();

        let ema20 = self.trend.ema(&closes, EmaParams { period: 20 })?.last().copied();
        let rsi = self.momentum.rsi(&closes, RsiParams { period: 14 })?.last().copied();
        let hist = self
            .trend
            .macd(&closes, MacdParams::default())?
            .histogram
            .last()
            .copied();
        let close = closes.last().copied();

        let close_above_ema20 = matches!((close, ema20), (Some(c), Some(e)) if c > e);
        let close_below_ema20 = matches!((close, ema20), (Some(c), Some(e)) if c < e);
        let rsi_above_40 = rsi.is_some_and(|r| r > dec!(40));
        let macd_hist_positive = hist.is_some_and(|h| h > Decimal::ZERO);
        let macd_hist_negative = hist.is_some_and(|h| h < Decimal::ZERO);

        let status = if close_above_ema20 && rsi_above_40 && macd_hist_positive {
            WeeklyStatus::Aligned
        } else if close_below_ema20 && macd_hist_negative {
            WeeklyStatus::CounterTrend
        } else {
            WeeklyStatus::Mixed
        };

        Ok(WeeklyTrendHealth {
            close_above_ema20,
            rsi_above_40,
            macd_hist_positive,
            status,
            score: status.score(),
            weeks: weekly.len(),
            weekly_close: close,
            weekly_ema20: ema20,
            weekly_rsi: rsi,
            weekly_macd_hist: hist,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily_with(days: i64, price_at: impl Fn(usize) -> Decimal) -> Vec<Candle> {
        // 2024-01-01은 월요일
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..days)
            .map(|d| start + Duration::days(d))
            .filter(|date| date.weekday().num_days_from_monday() < 5)
            .enumerate()
            .map(|(i, date)| {
                let price = price_at(i);
                Candle::new(date, price, price + dec!(1), price - dec!(1), price, dec!(100))
            })
            .collect()
    }

    fn daily(days: i64, start_price: Decimal, step: Decimal) -> Vec<Candle> {
        daily_with(days, |i| start_price + step * Decimal::from(i))
    }

    #[test]
    fn test_week_start_is_monday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(week_start(sunday), monday);
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn test_resample_to_weekly() {
        let candles = daily(14, dec!(100), dec!(1));
        let weekly = resample_to_weekly(&candles);

        assert_eq!(weekly.len(), 2);
        let first = &weekly[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(first.open, dec!(100));
        assert_eq!(first.close, dec!(104));
        assert_eq!(first.high, dec!(105));
        assert_eq!(first.low, dec!(99));
        assert_eq!(first.volume, dec!(500));
        assert_eq!(weekly[1].open, dec!(105));
    }

    #[test]
    fn test_partial_week_uses_latest_close() {
        let mut candles = daily(7, dec!(100), dec!(1));
        let tuesday = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        candles.push(Candle::new(tuesday, dec!(110), dec!(112), dec!(109), dec!(111), dec!(10)));

        let weekly = resample_to_weekly(&candles);
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[1].close, dec!(111));
    }

    #[test]
    fn test_weekly_uptrend_is_aligned() {
        // 가속 상승: 주봉 MACD 히스토그램이 양수로 유지됨
        let candles = daily_with(7 * 60, |i| {
            let i = Decimal::from(i);
            dec!(100) + dec!(0.002) * i * i
        });
        let health = WeeklyTrendAnalyzer::new().analyze(&candles).unwrap();

        assert_eq!(health.status, WeeklyStatus::Aligned);
        assert_eq!(health.score, 5);
        assert!(health.close_above_ema20 && health.rsi_above_40 && health.macd_hist_positive);
    }

    #[test]
    fn test_weekly_downtrend_is_counter_trend() {
        let candles = daily_with(7 * 60, |i| {
            let i = Decimal::from(i);
            dec!(500) - dec!(0.002) * i * i
        });
        let health = WeeklyTrendAnalyzer::new().analyze(&candles).unwrap();
        assert_eq!(health.status, WeeklyStatus::CounterTrend);
        assert_eq!(health.score, -10);
    }

    #[test]
    fn test_short_history_is_mixed() {
        let candles = daily(30, dec!(100), dec!(1));
        let health = WeeklyTrendAnalyzer::new().analyze(&candles).unwrap();
        assert_eq!(health.status, WeeklyStatus::Mixed);
        assert!(health.weekly_macd_hist.is_none());
    }
}
