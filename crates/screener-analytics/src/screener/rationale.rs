//! 스크리닝 근거 문장 생성.
//!
//! 문장 순서는 고정입니다: 섹터, 추세 확인, 주봉, 모멘텀, 거래량,
//! 변동성, 다이버전스, 진입/손절/목표가.

use crate::divergence::DivergenceResult;
use crate::sector_rotation::SectorContext;

use super::phases::{PhaseDetails, RiskBlock};

/// 근거 문장 목록을 만듭니다.
///
/// 평가되지 않은 단계의 항목은 포함하지 않습니다.
pub fn build_rationale(
    details: &PhaseDetails,
    sector: &SectorContext,
    divergence: &DivergenceResult,
    risk: &RiskBlock,
) -> Vec<String> {
    let mut lines = Vec::new();

    sector_clause(sector, &mut lines);

    let trend = &details.trend;
    if trend.status.is_evaluated() {
        if trend.ema_aligned {
            lines.push("이동평균 정배열 (종가 > EMA20 > EMA50 > EMA200)".to_string());
        }
        lines.push(format!("ADX {:.1} (기준 {:.1})", trend.adx, trend.min_adx));
        if trend.macd_bullish {
            lines.push("MACD 상승 확인".to_string());
        }
        if trend.supertrend_up {
            lines.push("SuperTrend 상승".to_string());
        }
        if trend.sar_below_price {
            lines.push("Parabolic SAR 가격 아래".to_string());
        }
        if trend.above_cloud {
            lines.push("일목 구름대 위".to_string());
        }
        lines.push(format!(
            "{} ({:+})",
            trend.weekly_status.description(),
            trend.weekly_score
        ));
    }

    let momentum = &details.momentum;
    if momentum.status.is_evaluated() {
        if momentum.near_ema {
            lines.push(format!("EMA 눌림목 (이격 {:.2}%)", momentum.ema_distance_pct));
        }
        lines.push(format!(
            "RSI {:.1} ({})",
            momentum.rsi,
            momentum.rsi_tier.label()
        ));
        if momentum.roc_positive {
            lines.push("ROC 양수".to_string());
        }
        if momentum.di_bullish {
            lines.push("+DI > -DI".to_string());
        }
        if momentum.stoch_bullish {
            lines.push("Stochastic %K 50 상회".to_string());
        }
        if let Some(pattern) = momentum.pattern {
            lines.push(format!("{} 패턴", pattern.label()));
        }
    }

    let volume = &details.volume;
    if volume.status.is_evaluated() {
        lines.push(format!(
            "{} (평균 대비 {:.2}배)",
            volume.volume_trend.label(),
            volume.volume_ratio
        ));
    }

    let volatility = &details.volatility;
    if volatility.status.is_evaluated() {
        let note = if volatility.atr_ok {
            "변동성 적정"
        } else {
            "변동성 과다"
        };
        let expansion = if volatility.bb_expanding {
            ", 밴드 확장"
        } else {
            ""
        };
        lines.push(format!(
            "{} (ATR {:.2}%{})",
            note, volatility.atr_pct, expansion
        ));
    }

    lines.extend(divergence.summary().into_iter().map(str::to_string));

    lines.push(format!(
        "진입 {:.2} / 손절 {:.2} / 목표 {:.2}",
        risk.entry, risk.stop_loss, risk.target
    ));

    lines
}

fn sector_clause(sector: &SectorContext, lines: &mut Vec<String>) {
    if sector.score_impact == 0 {
        return;
    }
    let name = sector.sector.as_deref().unwrap_or("-");
    let standing = if sector.score_impact > 0 {
        "주도 섹터"
    } else {
        "소외 섹터"
    };
    match sector.rank {
        Some(rank) => lines.push(format!(
            "{} {} ({}/{}위)",
            standing, name, rank, sector.total_sectors
        )),
        None => lines.push(format!("{} {}", standing, name)),
    }
}
