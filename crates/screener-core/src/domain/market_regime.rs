//! MarketRegime - 시장 레짐 분류와 레짐별 적응형 임계값.
//!
//! 벤치마크 지수의 추세 상태를 3단계로 분류하고, 레짐이 약할수록
//! 스크리닝 기준을 단조적으로 강화합니다 (BULL → SIDEWAYS → BEAR).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 기본 ADX 하한.
pub const DEFAULT_MIN_ADX: Decimal = dec!(20);

/// 기본 거래량 배수.
pub const DEFAULT_VOLUME_MULTIPLIER: Decimal = dec!(1.5);

/// 벤치마크 기준 시장 레짐.
///
/// # 판정 순서
///
/// 1. ADX < 20 → **Sideways** (추세 없음)
/// 2. 종가 > EMA50 그리고 EMA20 > EMA50 → **Bull**
/// 3. 종가 < EMA50 그리고 EMA20 < EMA50 → **Bear**
/// 4. 그 외 (이동평균 혼조) → **Sideways** (전환 구간)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketRegime {
    /// 상승장
    Bull,
    /// 횡보장 / 전환 구간
    #[default]
    Sideways,
    /// 하락장
    Bear,
}

impl MarketRegime {
    /// 모든 레짐 (완화 → 강화 순서).
    pub const ALL: [MarketRegime; 3] = [Self::Bull, Self::Sideways, Self::Bear];

    /// 설명 문자열
    pub fn description(self) -> &'static str {
        match self {
            Self::Bull => "상승장",
            Self::Sideways => "횡보/전환 구간",
            Self::Bear => "하락장",
        }
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bull => "BULL",
            Self::Sideways => "SIDEWAYS",
            Self::Bear => "BEAR",
        };
        write!(f, "{}", s)
    }
}

/// 레짐별 적응형 임계값.
///
/// 학습값이 아닌 레짐 기준 고정 테이블입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveThresholds {
    /// ADX 하한
    pub min_adx: Decimal,
    /// 모멘텀 RSI 하단
    pub rsi_low: Decimal,
    /// 모멘텀 RSI 상단
    pub rsi_high: Decimal,
    /// 거래량 배수 (평균 대비)
    pub volume_multiplier: Decimal,
    /// 최소 손익비
    pub min_risk_reward: Decimal,
    /// STRONG_BUY 점수 하한
    pub strong_buy_threshold: i32,
    /// BUY 점수 하한
    pub buy_threshold: i32,
    /// WATCH 점수 하한
    pub watch_threshold: i32,
}

impl AdaptiveThresholds {
    /// 레짐에 해당하는 임계값을 반환합니다.
    pub fn for_regime(regime: MarketRegime) -> Self {
        let (adx_factor, rsi_low, rsi_high, volume_factor, min_rr, floors) = match regime {
            MarketRegime::Bull => (dec!(1.0), dec!(40), dec!(75), dec!(1.0), dec!(2), (75, 55, 35)),
            MarketRegime::Sideways => {
                (dec!(1.2), dec!(45), dec!(65), dec!(1.25), dec!(2.5), (80, 60, 40))
            }
            MarketRegime::Bear => (dec!(1.4), dec!(50), dec!(60), dec!(1.67), dec!(3), (85, 65, 45)),
        };

        Self {
            min_adx: DEFAULT_MIN_ADX * adx_factor,
            rsi_low,
            rsi_high,
            volume_multiplier: DEFAULT_VOLUME_MULTIPLIER * volume_factor,
            min_risk_reward: min_rr,
            strong_buy_threshold: floors.0,
            buy_threshold: floors.1,
            watch_threshold: floors.2,
        }
    }
}

/// 시장 레짐 판정 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRegimeInfo {
    /// 판정된 레짐
    pub regime: MarketRegime,
    /// 벤치마크 종가
    pub benchmark_close: Decimal,
    /// 벤치마크 EMA20
    pub benchmark_ema20: Decimal,
    /// 벤치마크 EMA50
    pub benchmark_ema50: Decimal,
    /// 벤치마크 ADX(14)
    pub benchmark_adx: Decimal,
    /// 시장 변동성 지수 (선택)
    pub volatility_index: Option<Decimal>,
    /// 판정 설명
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_tighten_monotonically() {
        let t: Vec<AdaptiveThresholds> = MarketRegime::ALL
            .iter()
            .map(|r| AdaptiveThresholds::for_regime(*r))
            .collect();

        for pair in t.windows(2) {
            assert!(pair[1].min_adx > pair[0].min_adx);
            assert!(pair[1].rsi_low > pair[0].rsi_low);
            assert!(pair[1].rsi_high < pair[0].rsi_high);
            assert!(pair[1].volume_multiplier > pair[0].volume_multiplier);
            assert!(pair[1].min_risk_reward > pair[0].min_risk_reward);
            assert!(pair[1].buy_threshold > pair[0].buy_threshold);
        }
    }

    #[test]
    fn test_bear_thresholds() {
        let bear = AdaptiveThresholds::for_regime(MarketRegime::Bear);
        assert_eq!(bear.min_adx, dec!(28.0));
        assert_eq!(bear.rsi_low, dec!(50));
        assert_eq!(bear.rsi_high, dec!(60));
        assert_eq!(bear.min_risk_reward, dec!(3));
        assert_eq!(
            (bear.strong_buy_threshold, bear.buy_threshold, bear.watch_threshold),
            (85, 65, 45)
        );
    }

    #[test]
    fn test_display_and_default() {
        assert_eq!(MarketRegime::Bull.to_string(), "BULL");
        assert_eq!(MarketRegime::default(), MarketRegime::Sideways);
        assert_eq!(
            serde_json::to_string(&MarketRegime::Bear).unwrap(),
            "\"BEAR\""
        );
    }
}
