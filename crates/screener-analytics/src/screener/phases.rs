//! 6단계 스크리닝 단계와 단계별 상세 기록.
//!
//! 각 단계는 이전 단계를 통과해야만 평가됩니다.
//! 평가되지 않은 단계도 `NotEvaluated` 상태의 상세 기록을 남깁니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::indicators::BullishPattern;
use crate::weekly::WeeklyStatus;

use super::scoring::{RsiTier, VolumeTrend};

/// 스크리닝 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// 1단계: 유동성
    Liquidity,
    /// 2단계: 추세
    Trend,
    /// 3단계: 모멘텀
    Momentum,
    /// 4단계: 거래량
    Volume,
    /// 5단계: 변동성
    Volatility,
    /// 6단계: 리스크
    Risk,
}

impl Phase {
    pub const COUNT: usize = 6;

    /// 평가 순서.
    pub const ALL: [Phase; Phase::COUNT] = [
        Self::Liquidity,
        Self::Trend,
        Self::Momentum,
        Self::Volume,
        Self::Volatility,
        Self::Risk,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Liquidity => "유동성",
            Self::Trend => "추세",
            Self::Momentum => "모멘텀",
            Self::Volume => "거래량",
            Self::Volatility => "변동성",
            Self::Risk => "리스크",
        }
    }
}

/// 단계 키 고정 크기 테이블.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTable<T>([T; Phase::COUNT]);

impl<T> PhaseTable<T> {
    /// (단계, 값) 순회 (평가 순서).
    pub fn entries(&self) -> impl Iterator<Item = (Phase, &T)> + '_ {
        Phase::ALL.iter().map(move |p| (*p, &self[*p]))
    }
}

impl<T> Index<Phase> for PhaseTable<T> {
    type Output = T;

    fn index(&self, phase: Phase) -> &T {
        &self.0[phase.index()]
    }
}

impl<T> IndexMut<Phase> for PhaseTable<T> {
    fn index_mut(&mut self, phase: Phase) -> &mut T {
        &mut self.0[phase.index()]
    }
}

impl PhaseTable<bool> {
    /// 주어진 단계까지 모두 통과했는지.
    pub fn passed_through(&self, last: Phase) -> bool {
        Phase::ALL[..=last.index()].iter().all(|p| self[*p])
    }
}

/// 단계 평가 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// 이전 단계 탈락으로 평가하지 않음
    #[default]
    NotEvaluated,
    Passed,
    Failed,
}

impl PhaseStatus {
    pub fn from_pass(passed: bool) -> Self {
        if passed {
            Self::Passed
        } else {
            Self::Failed
        }
    }

    pub fn is_evaluated(self) -> bool {
        self != Self::NotEvaluated
    }

    pub fn is_passed(self) -> bool {
        self == Self::Passed
    }
}

/// 1단계: 유동성.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LiquidityDetail {
    pub status: PhaseStatus,
    pub avg_turnover: Decimal,
    pub min_avg_turnover: Decimal,
    pub score: i32,
}

/// 2단계: 추세.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrendDetail {
    pub status: PhaseStatus,
    /// 종가 > EMA20 > EMA50 > EMA200
    pub ema_aligned: bool,
    pub adx: Decimal,
    pub min_adx: Decimal,
    pub relative_strength_3m: Decimal,
    pub macd_bullish: bool,
    pub supertrend_up: bool,
    pub sar_below_price: bool,
    pub above_cloud: bool,
    /// 보조 확인 점수 (최대 +10)
    pub confirmation_score: i32,
    pub weekly_status: WeeklyStatus,
    pub weekly_score: i32,
    pub score: i32,
}

/// 3단계: 모멘텀.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MomentumDetail {
    pub status: PhaseStatus,
    /// EMA20 / EMA50 중 가까운 쪽까지의 거리 (%)
    pub ema_distance_pct: Decimal,
    pub near_ema: bool,
    pub rsi: Decimal,
    pub rsi_tier: RsiTier,
    pub rsi_in_band: bool,
    pub roc_positive: bool,
    pub di_bullish: bool,
    pub stoch_bullish: bool,
    pub macd_hist_positive: bool,
    pub pattern: Option<BullishPattern>,
    pub divergence_score: i32,
    /// 5개 조건 중 충족 개수
    pub conditions_met: usize,
    pub score: i32,
}

/// 4단계: 거래량.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VolumeDetail {
    pub status: PhaseStatus,
    pub obv_up: bool,
    /// 마지막 거래량 / 평균 거래량
    pub volume_ratio: Decimal,
    pub above_average: bool,
    pub mfi: Decimal,
    pub mfi_healthy: bool,
    pub volume_trend: VolumeTrend,
    pub conditions_met: usize,
    pub score: i32,
}

/// 5단계: 변동성.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VolatilityDetail {
    pub status: PhaseStatus,
    pub atr_pct: Decimal,
    pub max_atr_pct: Decimal,
    pub atr_ok: bool,
    pub bb_expanding: bool,
    /// %B ≥ 0.8 (참고용)
    pub upper_band: bool,
    pub score: i32,
}

/// 6단계: 리스크.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskDetail {
    pub status: PhaseStatus,
    pub risk_per_share: Decimal,
}

/// 진입/손절/목표가 블록 (소수점 2자리).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskBlock {
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub target: Decimal,
    pub risk_per_share: Decimal,
    pub risk_reward: Decimal,
    /// floor(자본 × 리스크% / 100 / 주당 리스크)
    pub position_size: Decimal,
}

/// 단계별 상세 기록 묶음.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseDetails {
    pub liquidity: LiquidityDetail,
    pub trend: TrendDetail,
    pub momentum: MomentumDetail,
    pub volume: VolumeDetail,
    pub volatility: VolatilityDetail,
    pub risk: RiskDetail,
}

impl PhaseDetails {
    /// 단계별 평가 상태.
    pub fn statuses(&self) -> PhaseTable<PhaseStatus> {
        PhaseTable([
            self.liquidity.status,
            self.trend.status,
            self.momentum.status,
            self.volume.status,
            self.volatility.status,
            self.risk.status,
        ])
    }

    /// 단계별 통과 여부.
    pub fn passed(&self) -> PhaseTable<bool> {
        let statuses = self.statuses();
        let mut passed = PhaseTable::default();
        for (phase, status) in statuses.entries() {
            passed[phase] = status.is_passed();
        }
        passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_table_indexing() {
        let mut table: PhaseTable<usize> = PhaseTable::default();
        table[Phase::Momentum] += 2;
        table[Phase::Risk] += 1;
        assert_eq!(table[Phase::Momentum], 2);
        let phases: Vec<Phase> = table.entries().map(|(p, _)| p).collect();
        assert_eq!(phases, Phase::ALL.to_vec());
    }

    #[test]
    fn test_passed_through() {
        let mut passed: PhaseTable<bool> = PhaseTable::default();
        passed[Phase::Liquidity] = true;
        passed[Phase::Trend] = true;
        assert!(passed.passed_through(Phase::Trend));
        assert!(!passed.passed_through(Phase::Momentum));
    }

    #[test]
    fn test_default_details_not_evaluated() {
        let details = PhaseDetails::default();
        assert!(details
            .statuses()
            .entries()
            .all(|(_, s)| *s == PhaseStatus::NotEvaluated));
        assert!(!details.passed()[Phase::Liquidity]);
    }
}
