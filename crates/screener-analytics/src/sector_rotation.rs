//! 섹터 로테이션 순위 계산기.
//!
//! 종목별 3개월 상대강도, 주간 등락률, EMA50 상회 여부를 섹터 단위로 모아
//! 주도 섹터와 소외 섹터를 식별합니다.
//!
//! # 계산 공식
//!
//! - **정규화**: 섹터 평균 RS / 주간 등락률을 섹터 집합 내에서 min-max로 0~100 변환
//! - **종합 점수**: 정규화 RS × 0.5 + 시장폭(%) × 0.3 + 정규화 주간 등락률 × 0.2
//! - **상위/하위 그룹**: 섹터가 6개 초과면 각 3개, 아니면 각 ceil(N/3)개

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// 상위 섹터 가산점.
pub const TOP_SECTOR_IMPACT: i32 = 5;
/// 하위 섹터 감점.
pub const BOTTOM_SECTOR_IMPACT: i32 = -5;

/// 섹터 순위 계산 입력 (종목 1개).
#[derive(Debug, Clone)]
pub struct SectorInput<'a> {
    pub symbol: &'a str,
    /// 섹터가 없으면 순위 계산에서 제외됩니다.
    pub sector: Option<&'a str>,
    /// 3개월 상대강도 (%p)
    pub relative_strength_3m: Decimal,
    /// 주간 등락률 (%)
    pub week_change: Decimal,
    /// 종가가 EMA50 위인지
    pub above_ema50: bool,
}

/// 섹터별 집계 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorMetrics {
    /// 섹터명
    pub sector: String,
    /// 섹터 내 종목 수
    pub stock_count: usize,
    /// 평균 3개월 상대강도
    pub avg_relative_strength_3m: Decimal,
    /// 평균 주간 등락률
    pub avg_week_change: Decimal,
    /// EMA50 상회 종목 비율 (%)
    pub breadth_pct: Decimal,
    /// 종합 점수
    pub composite_score: Decimal,
    /// 순위 (1이 가장 높음)
    pub rank: usize,
}

/// 섹터 순위 전체.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectorRankings {
    /// 순위순 정렬된 섹터
    pub sectors: Vec<SectorMetrics>,
    pub total_sectors: usize,
    pub top_sectors: BTreeSet<String>,
    pub bottom_sectors: BTreeSet<String>,
}

/// 종목 하나의 섹터 맥락.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectorContext {
    pub sector: Option<String>,
    pub rank: Option<usize>,
    pub total_sectors: usize,
    pub is_top: bool,
    pub is_bottom: bool,
    /// +5 (상위), -5 (하위), 0
    pub score_impact: i32,
}

impl SectorRankings {
    /// 섹터명으로 종목의 섹터 맥락을 조회합니다.
    ///
    /// 섹터가 없거나 순위에 없는 섹터는 중립 맥락을 받습니다.
    pub fn context_for(&self, sector: Option<&str>) -> SectorContext {
        let Some(name) = sector else {
            return SectorContext {
                total_sectors: self.total_sectors,
                ..SectorContext::default()
            };
        };

        let rank = self
            .sectors
            .iter()
            .find(|m| m.sector == name)
            .map(|m| m.rank);
        let is_top = self.top_sectors.contains(name);
        let is_bottom = self.bottom_sectors.contains(name);

        let score_impact = match (is_top, is_bottom) {
            (true, false) => TOP_SECTOR_IMPACT,
            (false, true) => BOTTOM_SECTOR_IMPACT,
            _ => 0,
        };

        SectorContext {
            sector: Some(name.to_string()),
            rank,
            total_sectors: self.total_sectors,
            is_top,
            is_bottom,
            score_impact,
        }
    }
}

/// 섹터 누적값.
#[derive(Debug, Default)]
struct SectorAccumulator {
    count: usize,
    rs_sum: Decimal,
    week_sum: Decimal,
    above_ema50: usize,
}

/// 섹터 로테이션 순위 계산기.
#[derive(Debug)]
pub struct SectorRotationRanker {
    rs_weight: Decimal,
    breadth_weight: Decimal,
    week_weight: Decimal,
}

impl Default for SectorRotationRanker {
    fn default() -> Self {
        Self {
            rs_weight: dec!(0.50),
            breadth_weight: dec!(0.30),
            week_weight: dec!(0.20),
        }
    }
}

impl SectorRotationRanker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 섹터 순위를 계산합니다.
    ///
    /// 종합 점수 내림차순, 동점이면 섹터명 오름차순입니다.
    pub fn rank(&self, inputs: &[SectorInput<'_>]) -> SectorRankings {
        // 1. 섹터별 누적
        let mut groups: HashMap<&str, SectorAccumulator> = HashMap::new();
        for input in inputs {
            let Some(sector) = input.sector else {
                continue;
            };
            let acc = groups.entry(sector).or_default();
            acc.count += 1;
            acc.rs_sum += input.relative_strength_3m;
            acc.week_sum += input.week_change;
            if input.above_ema50 {
                acc.above_ema50 += 1;
            }
        }

        if groups.is_empty() {
            return SectorRankings::default();
        }

        // 2. 평균 및 정규화
        let averages: Vec<(&str, &SectorAccumulator, Decimal, Decimal)> = groups
            .iter()
            .map(|(name, acc)| {
                let n = Decimal::from(acc.count);
                (*name, acc, acc.rs_sum / n, acc.week_sum / n)
            })
            .collect();

        let rs_norm = MinMax::over(averages.iter().map(|a| a.2));
        let week_norm = MinMax::over(averages.iter().map(|a| a.3));

        let mut sectors: Vec<SectorMetrics> = averages
            .into_iter()
            .map(|(name, acc, avg_rs, avg_week)| {
                let breadth_pct =
                    Decimal::from(acc.above_ema50) / Decimal::from(acc.count) * Decimal::ONE_HUNDRED;
                let composite_score = self.rs_weight * rs_norm.scale(avg_rs)
                    + self.breadth_weight * breadth_pct
                    + self.week_weight * week_norm.scale(avg_week);

                SectorMetrics {
                    sector: name.to_string(),
                    stock_count: acc.count,
                    avg_relative_strength_3m: avg_rs,
                    avg_week_change: avg_week,
                    breadth_pct,
                    composite_score,
                    rank: 0,
                }
            })
            .collect();

        // 3. 정렬 및 순위
        sectors.sort_by(|a, b| {
            b.composite_score
                .cmp(&a.composite_score)
                .then_with(|| a.sector.cmp(&b.sector))
        });
        for (idx, sector) in sectors.iter_mut().enumerate() {
            sector.rank = idx + 1;
        }

        let total = sectors.len();
        let group = if total > 6 { 3 } else { total.div_ceil(3) };
        let top_sectors = sectors.iter().take(group).map(|s| s.sector.clone()).collect();
        let bottom_sectors = sectors
            .iter()
            .rev()
            .take(group)
            .map(|s| s.sector.clone())
            .collect();

        tracing::debug!(total_sectors = total, group_size = group, "섹터 순위 계산 완료");

        SectorRankings {
            sectors,
            total_sectors: total,
            top_sectors,
            bottom_sectors,
        }
    }
}

/// min-max 정규화 (0~100). 모든 값이 같으면 범위 1을 사용합니다.
struct MinMax {
    min: Decimal,
    range: Decimal,
}

impl MinMax {
    fn over(values: impl Iterator<Item = Decimal> + Clone) -> Self {
        let min = values.clone().min().unwrap_or_default();
        let max = values.max().unwrap_or_default();
        let range = if max == min { Decimal::ONE } else { max - min };
        Self { min, range }
    }

    fn scale(&self, value: Decimal) -> Decimal {
        (value - self.min) / self.range * Decimal::ONE_HUNDRED
    }
}
