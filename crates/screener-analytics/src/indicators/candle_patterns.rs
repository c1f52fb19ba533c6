//! 강세 반전 캔들 패턴 감지.
//!
//! 마지막 봉에서 아래 패턴을 확인합니다.
//! - **강세 장악형 (Bullish Engulfing)**: 음봉 다음 양봉의 몸통이 이전 몸통을 완전히 감쌈
//! - **망치형 (Hammer)**: 하락 이후 긴 아래꼬리와 작은 위꼬리를 가진 봉
//!
//! 두 패턴이 동시에 성립하면 장악형을 우선합니다.

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use screener_core::Candle;

/// 하락 추세 확인 기간.
const TREND_PERIOD: usize = 5;

/// 감지된 강세 패턴.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BullishPattern {
    /// 망치형
    Hammer,
    /// 강세 장악형
    BullishEngulfing,
}

impl BullishPattern {
    /// 한글 이름.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hammer => "망치형",
            Self::BullishEngulfing => "강세 장악형",
        }
    }
}

/// 마지막 봉의 강세 반전 패턴을 감지합니다.
pub fn detect_bullish_pattern(candles: &[Candle]) -> Option<BullishPattern> {
    let (last, rest) = candles.split_last()?;
    let prev = rest.last()?;

    if is_bullish_engulfing(last, prev) {
        return Some(BullishPattern::BullishEngulfing);
    }

    if is_hammer(last) && follows_decline(rest) {
        return Some(BullishPattern::Hammer);
    }

    None
}

fn is_bullish_engulfing(candle: &Candle, prev: &Candle) -> bool {
    prev.is_bearish() && candle.is_bullish() && candle.open < prev.close && candle.close > prev.open
}

/// 아래꼬리 ≥ 몸통 × 2, 위꼬리 < 몸통 × 0.5.
fn is_hammer(candle: &Candle) -> bool {
    let body = candle.body_size();
    !body.is_zero()
        && candle.lower_shadow() >= body * dec!(2)
        && candle.upper_shadow() < body * dec!(0.5)
}

/// 직전 봉 종가가 `TREND_PERIOD`봉 전보다 2% 이상 낮은지 확인합니다.
fn follows_decline(prior: &[Candle]) -> bool {
    let n = prior.len();
    if n <= TREND_PERIOD {
        return false;
    }
    prior[n - 1].close < prior[n - 1 - TREND_PERIOD].close * dec!(0.98)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn candle(day: u32, o: Decimal, h: Decimal, l: Decimal, c: Decimal) -> Candle {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        Candle::new(date, o, h, l, c, dec!(1000))
    }

    fn declining(days: u32) -> Vec<Candle> {
        (1..=days)
            .map(|d| {
                let c = dec!(120) - Decimal::from(d * 2);
                candle(d, c + dec!(1), c + dec!(2), c - dec!(1), c)
            })
            .collect()
    }

    #[test]
    fn test_bullish_engulfing() {
        let candles = vec![
            candle(1, dec!(105), dec!(106), dec!(99), dec!(100)),
            candle(2, dec!(99), dec!(108), dec!(98), dec!(107)),
        ];
        assert_eq!(
            detect_bullish_pattern(&candles),
            Some(BullishPattern::BullishEngulfing)
        );
    }

    #[test]
    fn test_hammer_after_decline() {
        let mut candles = declining(8);
        // 몸통 1, 아래꼬리 4, 위꼬리 0.2
        candles.push(candle(9, dec!(103), dec!(104.2), dec!(99), dec!(104)));
        assert_eq!(detect_bullish_pattern(&candles), Some(BullishPattern::Hammer));
    }

    #[test]
    fn test_hammer_without_decline_is_ignored() {
        let mut candles: Vec<Candle> = (1..=8)
            .map(|d| candle(d, dec!(100), dec!(101), dec!(99), dec!(100.5)))
            .collect();
        candles.push(candle(9, dec!(103), dec!(104.2), dec!(99), dec!(104)));
        assert_eq!(detect_bullish_pattern(&candles), None);
    }

    #[test]
    fn test_too_few_candles() {
        assert_eq!(detect_bullish_pattern(&[]), None);
        let one = vec![candle(1, dec!(1), dec!(2), dec!(0.5), dec!(1.5))];
        assert_eq!(detect_bullish_pattern(&one), None);
    }
}
