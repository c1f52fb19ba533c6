//! 점수 구간, 신호 분류, 리스크 블록 계산.
//!
//! 구간 경계값은 고정 상수이며 조정하지 않습니다.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use screener_core::{DecimalExt, ScreenerConfig, Signal};

use super::phases::{Phase, PhaseTable, RiskBlock};

/// 최종 점수 범위.
pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

// 단계 통과 가산점
pub const LIQUIDITY_PASS_POINTS: i32 = 15;
pub const TREND_PASS_POINTS: i32 = 10;

// 2단계 보조 확인 (합계 최대 +10)
pub const MACD_CONFIRM_POINTS: i32 = 3;
pub const SUPERTREND_CONFIRM_POINTS: i32 = 3;
pub const SAR_CONFIRM_POINTS: i32 = 2;
pub const CLOUD_CONFIRM_POINTS: i32 = 2;
pub const MAX_CONFIRMATION_POINTS: i32 = 10;

// 3단계
pub const PULLBACK_POINTS: i32 = 5;
pub const ROC_POINTS: i32 = 4;
pub const DI_POINTS: i32 = 4;
pub const STOCH_POINTS: i32 = 3;
pub const MACD_HIST_POINTS: i32 = 2;
pub const PATTERN_POINTS: i32 = 2;
/// Stochastic %K 강세 기준
pub const STOCH_BULLISH_LEVEL: Decimal = dec!(50);
/// 3단계 통과에 필요한 조건 수 (5개 중)
pub const MOMENTUM_MIN_CONDITIONS: usize = 3;

// 4단계
pub const OBV_POINTS: i32 = 5;
pub const MFI_POINTS: i32 = 5;
pub const ABOVE_AVG_VOLUME_POINTS: i32 = 3;
/// 4단계 통과에 필요한 조건 수
pub const VOLUME_MIN_CONDITIONS: usize = 2;

// 5단계
pub const ATR_POINTS: i32 = 4;
pub const EXPANSION_POINTS: i32 = 3;
pub const UPPER_BAND_POINTS: i32 = 3;
/// 상단 밴드 판정 %B
pub const UPPER_BAND_PERCENT_B: Decimal = dec!(0.8);

// 단계 무관 보너스
pub const STRONG_ADX_LEVEL: Decimal = dec!(35);
pub const STRONG_ADX_POINTS: i32 = 3;
pub const STRONG_RS_LEVEL: Decimal = dec!(5);
pub const STRONG_RS_POINTS: i32 = 2;

// RSI 구간 경계
pub const RSI_OPTIMAL_LOW: Decimal = dec!(45);
pub const RSI_OPTIMAL_HIGH: Decimal = dec!(55);
pub const RSI_GOOD_HIGH: Decimal = dec!(65);
pub const RSI_CAUTION_LOW: Decimal = dec!(40);
pub const RSI_CAUTION_HIGH: Decimal = dec!(70);
pub const RSI_EXHAUSTION_HIGH: Decimal = dec!(75);

/// RSI 구간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiTier {
    /// 45~55 (+5)
    Optimal,
    /// 55~65 (+4)
    Good,
    /// [40,45) 또는 (65,70] (+2)
    Caution,
    /// (70,75] (0)
    Exhaustion,
    /// 그 외 (-3)
    #[default]
    Outside,
}

impl RsiTier {
    pub fn classify(rsi: Decimal) -> Self {
        if (RSI_OPTIMAL_LOW..=RSI_OPTIMAL_HIGH).contains(&rsi) {
            Self::Optimal
        } else if rsi > RSI_OPTIMAL_HIGH && rsi <= RSI_GOOD_HIGH {
            Self::Good
        } else if (rsi >= RSI_CAUTION_LOW && rsi < RSI_OPTIMAL_LOW)
            || (rsi > RSI_GOOD_HIGH && rsi <= RSI_CAUTION_HIGH)
        {
            Self::Caution
        } else if rsi > RSI_CAUTION_HIGH && rsi <= RSI_EXHAUSTION_HIGH {
            Self::Exhaustion
        } else {
            Self::Outside
        }
    }

    pub fn score(self) -> i32 {
        match self {
            Self::Optimal => 5,
            Self::Good => 4,
            Self::Caution => 2,
            Self::Exhaustion => 0,
            Self::Outside => -3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Optimal => "최적",
            Self::Good => "양호",
            Self::Caution => "주의",
            Self::Exhaustion => "과열 근접",
            Self::Outside => "구간 이탈",
        }
    }
}

/// 최근 3봉 거래량 추세.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    /// 연속 증가 (+5)
    Accelerating,
    /// 유지 (+2)
    Steady,
    /// 감소 (-3)
    #[default]
    Declining,
}

impl VolumeTrend {
    /// `[v-2, v-1, v0]` 거래량으로 추세를 분류합니다.
    ///
    /// 연속 증가면 가속, 연속 감소면 감소, 그 외에는 마지막 봉이
    /// 앞 두 봉 평균보다 크면 유지, 아니면 감소입니다.
    pub fn classify(volumes: [Decimal; 3]) -> Self {
        let [a, b, c] = volumes;
        if a < b && b < c {
            Self::Accelerating
        } else if a > b && b > c {
            Self::Declining
        } else if c > (a + b) / dec!(2) {
            Self::Steady
        } else {
            Self::Declining
        }
    }

    pub fn score(self) -> i32 {
        match self {
            Self::Accelerating => 5,
            Self::Steady => 2,
            Self::Declining => -3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Accelerating => "거래량 가속",
            Self::Steady => "거래량 유지",
            Self::Declining => "거래량 감소",
        }
    }
}

/// 단계 통과 여부와 점수로 신호를 분류합니다.
///
/// 점수만 올라갈 때 신호가 낮은 등급으로 내려가는 경우는 없습니다.
pub fn classify_signal(passed: &PhaseTable<bool>, score: i32, params: &ScreenerConfig) -> Signal {
    if passed.passed_through(Phase::Volume) && score >= params.strong_buy_threshold {
        Signal::StrongBuy
    } else if passed.passed_through(Phase::Momentum) && score >= params.buy_threshold {
        Signal::Buy
    } else if passed.passed_through(Phase::Trend) && score >= params.watch_threshold {
        Signal::Watch
    } else if passed[Phase::Liquidity] {
        Signal::Neutral
    } else {
        Signal::Avoid
    }
}

/// 진입/손절/목표가와 포지션 크기를 계산합니다.
///
/// - 손절가 = 진입가 - ATR 배수 × ATR
/// - 목표가 = 진입가 + 주당 리스크 × 최소 손익비
/// - 포지션 = floor(자본 × 리스크% / 100 / 주당 리스크), 주당 리스크가 0 이하면 0
pub fn risk_block(entry: Decimal, atr: Decimal, params: &ScreenerConfig) -> RiskBlock {
    let stop_loss = (entry - params.atr_stop_multiple * atr).round_half_up(2);
    let entry_rounded = entry.round_half_up(2);
    let risk_per_share = (entry_rounded - stop_loss).round_half_up(2);
    let target = (entry_rounded + risk_per_share * params.min_risk_reward).round_half_up(2);

    let position_size = if risk_per_share > Decimal::ZERO {
        (params.account_capital * params.max_capital_risk_pct / Decimal::ONE_HUNDRED / risk_per_share)
            .round_dp_with_strategy(0, RoundingStrategy::ToZero)
    } else {
        Decimal::ZERO
    };

    RiskBlock {
        entry: entry_rounded,
        stop_loss,
        target,
        risk_per_share,
        risk_reward: params.min_risk_reward,
        position_size,
    }
}

/// 점수를 [0, 100]으로 제한합니다.
pub fn clamp_score(raw: i32) -> i32 {
    raw.clamp(MIN_SCORE, MAX_SCORE)
}
