//! 스크리너 매매 신호 등급.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// 스크리너 신호 등급.
///
/// 선언 순서가 곧 강도 순서입니다 (`Avoid` < ... < `StrongBuy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    /// 회피
    Avoid,
    /// 중립
    Neutral,
    /// 관찰
    Watch,
    /// 매수
    Buy,
    /// 강력 매수
    StrongBuy,
}

impl Signal {
    /// 전체 등급 수.
    pub const COUNT: usize = 5;

    /// 모든 등급 (강한 순서).
    pub const ALL: [Signal; Signal::COUNT] = [
        Self::StrongBuy,
        Self::Buy,
        Self::Watch,
        Self::Neutral,
        Self::Avoid,
    ];

    /// 등급 테이블 인덱스.
    pub fn index(self) -> usize {
        self as usize
    }

    /// 설명 문자열
    pub fn description(self) -> &'static str {
        match self {
            Self::StrongBuy => "강력 매수",
            Self::Buy => "매수",
            Self::Watch => "관찰",
            Self::Neutral => "중립",
            Self::Avoid => "회피",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StrongBuy => "STRONG_BUY",
            Self::Buy => "BUY",
            Self::Watch => "WATCH",
            Self::Neutral => "NEUTRAL",
            Self::Avoid => "AVOID",
        };
        write!(f, "{}", s)
    }
}

/// 신호 등급별 집계 테이블.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts([usize; Signal::COUNT]);

impl SignalCounts {
    /// 신호 목록에서 집계합니다.
    pub fn tally<I: IntoIterator<Item = Signal>>(signals: I) -> Self {
        let mut counts = Self::default();
        for signal in signals {
            counts[signal] += 1;
        }
        counts
    }

    /// 전체 건수.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// (등급, 건수) 목록 (강한 순서).
    pub fn entries(&self) -> impl Iterator<Item = (Signal, usize)> + '_ {
        Signal::ALL.iter().map(move |s| (*s, self[*s]))
    }
}

impl Index<Signal> for SignalCounts {
    type Output = usize;

    fn index(&self, signal: Signal) -> &usize {
        &self.0[signal.index()]
    }
}

impl IndexMut<Signal> for SignalCounts {
    fn index_mut(&mut self, signal: Signal) -> &mut usize {
        &mut self.0[signal.index()]
    }
}
