//! 가격-지표 다이버전스 탐지.
//!
//! 종가에서 프랙탈 스윙 고점/저점을 찾고, 최근 두 스윙에서
//! 가격과 지표(RSI, MACD 히스토그램, OBV, MFI)의 방향이 엇갈리는지 확인합니다.
//!
//! # 규칙 (평가 순서)
//!
//! | 종류 | 가격 | 지표 | 점수 |
//! |------|------|------|------|
//! | RSI 강세 | 저점 하락 | 저점 상승 | +8 |
//! | RSI 약세 | 고점 상승 | 고점 하락 | -10 |
//! | MACD 강세 | 저점 하락 | 저점 상승 | +8 |
//! | MACD 약세 | 고점 상승 | 고점 하락 | -10 |
//! | OBV 경고 | 고점 상승 | 보합 또는 하락 | -5 |
//! | MFI 경고 | 고점 상승 | 하락 | -5 |
//!
//! 순점수는 [-15, +8]로 제한됩니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use screener_core::DivergenceSettings;

use crate::indicators::Series;

/// 순점수 하한.
pub const MIN_NET_SCORE: i32 = -15;
/// 순점수 상한.
pub const MAX_NET_SCORE: i32 = 8;

/// 가격 변화 정규화 기준 (10%).
const PRICE_MOVE_SCALE: Decimal = dec!(0.10);

/// 스윙 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingKind {
    High,
    Low,
}

/// 프랙탈 스윙 포인트.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwingPoint {
    /// 봉 인덱스
    pub index: usize,
    /// 종가
    pub value: Decimal,
    pub kind: SwingKind,
}

/// 다이버전스 비교 대상 지표.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceIndicator {
    Rsi,
    MacdHistogram,
    Obv,
    Mfi,
}

impl DivergenceIndicator {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rsi => "RSI",
            Self::MacdHistogram => "MACD 히스토그램",
            Self::Obv => "OBV",
            Self::Mfi => "MFI",
        }
    }
}

/// 다이버전스 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceDirection {
    Bullish,
    Bearish,
}

/// 감지된 다이버전스.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence {
    pub indicator: DivergenceIndicator,
    pub direction: DivergenceDirection,
    /// 비교한 두 스윙 (이전, 최근)
    pub price_swings: [SwingPoint; 2],
    /// 두 스윙 봉의 지표 값 (이전, 최근)
    pub indicator_values: [Decimal; 2],
    /// 강도 (0~1)
    pub strength: Decimal,
    /// 최근 스윙이 마지막 봉으로부터 몇 봉 전인지
    pub bars_ago: usize,
    pub score_impact: i32,
    pub description: String,
}

/// 종목 하나의 다이버전스 분석 결과.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DivergenceResult {
    /// 평가 순서대로 정렬된 다이버전스
    pub divergences: Vec<Divergence>,
    /// [-15, +8]로 제한된 순점수
    pub net_score: i32,
    pub has_bullish: bool,
    pub has_bearish: bool,
}

impl DivergenceResult {
    /// 감지된 다이버전스 설명 목록 (평가 순서).
    pub fn summary(&self) -> Vec<&str> {
        self.divergences
            .iter()
            .map(|d| d.description.as_str())
            .collect()
    }

    fn push(&mut self, divergence: Divergence) {
        match divergence.direction {
            DivergenceDirection::Bullish => self.has_bullish = true,
            DivergenceDirection::Bearish => self.has_bearish = true,
        }
        self.divergences.push(divergence);
    }
}

/// 다이버전스 탐지에 필요한 입력.
///
/// 모든 지표 시계열은 `closes`와 같은 봉 인덱스로 정렬되어 있어야 합니다.
#[derive(Debug, Clone, Copy)]
pub struct DivergenceInputs<'a> {
    pub closes: &'a [Decimal],
    pub rsi: &'a Series,
    pub macd_histogram: &'a Series,
    pub obv: &'a Series,
    pub mfi: &'a Series,
}

/// 다이버전스 탐지기.
#[derive(Debug, Clone, Default)]
pub struct DivergenceDetector {
    settings: DivergenceSettings,
}

impl DivergenceDetector {
    pub fn new(settings: DivergenceSettings) -> Self {
        Self { settings }
    }

    /// 최근 `lookback`봉 안의 스윙 고점/저점을 찾습니다.
    ///
    /// 봉 `i`는 좌우 `order`봉보다 모두 엄격히 높을(낮을) 때 스윙이 됩니다.
    /// 같은 유형의 스윙이 `min_separation`봉보다 가까우면 더 극단적인 쪽만 남깁니다.
    pub fn find_swings(&self, closes: &[Decimal]) -> (Vec<SwingPoint>, Vec<SwingPoint>) {
        let order = self.settings.order;
        let n = closes.len();
        let mut highs = Vec::new();
        let mut lows = Vec::new();

        if order == 0 || n < 2 * order + 1 {
            return (highs, lows);
        }

        let start = n.saturating_sub(self.settings.lookback).max(order);
        for i in start..n - order {
            let value = closes[i];
            let mut neighbors = closes[i - order..i]
                .iter()
                .chain(&closes[i + 1..=i + order]);

            if neighbors.clone().all(|v| value > *v) {
                highs.push(SwingPoint {
                    index: i,
                    value,
                    kind: SwingKind::High,
                });
            } else if neighbors.all(|v| value < *v) {
                lows.push(SwingPoint {
                    index: i,
                    value,
                    kind: SwingKind::Low,
                });
            }
        }

        (
            merge_close_swings(highs, self.settings.min_separation),
            merge_close_swings(lows, self.settings.min_separation),
        )
    }

    /// 다이버전스를 탐지합니다.
    pub fn detect(&self, inputs: &DivergenceInputs<'_>) -> DivergenceResult {
        let (highs, lows) = self.find_swings(inputs.closes);
        let last_bar = inputs.closes.len().saturating_sub(1);
        let mut result = DivergenceResult::default();

        let latest_lows = latest_pair(&lows);
        let latest_highs = latest_pair(&highs);

        let checks: [(DivergenceIndicator, &Series); 2] = [
            (DivergenceIndicator::Rsi, inputs.rsi),
            (DivergenceIndicator::MacdHistogram, inputs.macd_histogram),
        ];
        for (indicator, series) in checks {
            // 강세: 가격 저점 하락 + 지표 저점 상승
            if let Some(d) = latest_lows.and_then(|pair| {
                compare(pair, series, last_bar, indicator, DivergenceDirection::Bullish, 8, |p, i| {
                    p < Decimal::ZERO && i > Decimal::ZERO
                })
            }) {
                result.push(d);
            }
            // 약세: 가격 고점 상승 + 지표 고점 하락
            if let Some(d) = latest_highs.and_then(|pair| {
                compare(pair, series, last_bar, indicator, DivergenceDirection::Bearish, -10, |p, i| {
                    p > Decimal::ZERO && i < Decimal::ZERO
                })
            }) {
                result.push(d);
            }
        }

        if let Some(d) = latest_highs.and_then(|pair| {
            compare(pair, inputs.obv, last_bar, DivergenceIndicator::Obv, DivergenceDirection::Bearish, -5, |p, i| {
                p > Decimal::ZERO && i <= Decimal::ZERO
            })
        }) {
            result.push(d);
        }

        if let Some(d) = latest_highs.and_then(|pair| {
            compare(pair, inputs.mfi, last_bar, DivergenceIndicator::Mfi, DivergenceDirection::Bearish, -5, |p, i| {
                p > Decimal::ZERO && i < Decimal::ZERO
            })
        }) {
            result.push(d);
        }

        let raw: i32 = result.divergences.iter().map(|d| d.score_impact).sum();
        result.net_score = raw.clamp(MIN_NET_SCORE, MAX_NET_SCORE);

        if !result.divergences.is_empty() {
            tracing::trace!(
                count = result.divergences.len(),
                net_score = result.net_score,
                "다이버전스 감지"
            );
        }

        result
    }
}

/// 가까운 같은 유형 스윙을 병합합니다.
fn merge_close_swings(swings: Vec<SwingPoint>, min_separation: usize) -> Vec<SwingPoint> {
    let mut merged: Vec<SwingPoint> = Vec::with_capacity(swings.len());
    for swing in swings {
        match merged.last_mut() {
            Some(prev) if swing.index - prev.index < min_separation => {
                let more_extreme = match swing.kind {
                    SwingKind::High => swing.value > prev.value,
                    SwingKind::Low => swing.value < prev.value,
                };
                if more_extreme {
                    *prev = swing;
                }
            }
            _ => merged.push(swing),
        }
    }
    merged
}

fn latest_pair(swings: &[SwingPoint]) -> Option<[SwingPoint; 2]> {
    match swings {
        [.., first, second] => Some([*first, *second]),
        _ => None,
    }
}

/// 두 스윙의 가격 변화와 지표 변화를 비교합니다.
///
/// `rule(가격 변화, 지표 변화)`가 참이면 다이버전스를 반환합니다.
/// 어느 한쪽 봉에 지표 값이 없으면 건너뜁니다.
fn compare(
    pair: [SwingPoint; 2],
    series: &Series,
    last_bar: usize,
    indicator: DivergenceIndicator,
    direction: DivergenceDirection,
    score_impact: i32,
    rule: impl Fn(Decimal, Decimal) -> bool,
) -> Option<Divergence> {
    let [first, second] = pair;
    let i1 = series.value_at(first.index)?;
    let i2 = series.value_at(second.index)?;

    let price_move = second.value - first.value;
    let indicator_move = i2 - i1;
    if !rule(price_move, indicator_move) {
        return None;
    }

    let direction_label = match (indicator, direction) {
        (_, DivergenceDirection::Bullish) => "강세 다이버전스",
        (DivergenceIndicator::Obv | DivergenceIndicator::Mfi, _) => "미확인 경고",
        (_, DivergenceDirection::Bearish) => "약세 다이버전스",
    };

    Some(Divergence {
        indicator,
        direction,
        price_swings: pair,
        indicator_values: [i1, i2],
        strength: strength(first.value, price_move, i1, i2),
        bars_ago: last_bar.saturating_sub(second.index),
        score_impact,
        description: format!("{} {}", indicator.label(), direction_label),
    })
}

/// 강도 = (가격 변화율 / 10% + 지표 변화 / 큰 쪽 절대값) / 2, 각 항목은 1로 제한.
fn strength(first_price: Decimal, price_move: Decimal, i1: Decimal, i2: Decimal) -> Decimal {
    let price_term = if first_price.is_zero() {
        Decimal::ZERO
    } else {
        (price_move.abs() / first_price / PRICE_MOVE_SCALE).min(Decimal::ONE)
    };

    let scale = i1.abs().max(i2.abs());
    let indicator_term = if scale.is_zero() {
        Decimal::ZERO
    } else {
        ((i2 - i1).abs() / scale).min(Decimal::ONE)
    };

    ((price_term + indicator_term) / dec!(2)).clamp(Decimal::ZERO, Decimal::ONE)
}
