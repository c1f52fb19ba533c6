//! 배치 결과 출력 (table, csv, json).

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

use screener_analytics::{BatchReport, ScreenerResult};
use screener_core::Signal;

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(anyhow::anyhow!(
                "Invalid format: {}. Use: table, csv, json",
                s
            )),
        }
    }
}

/// 신호 문자열 파싱 (대소문자 무시, `-`와 `_` 동일 취급).
pub fn parse_signal(s: &str) -> Result<Signal> {
    let normalized = s.trim().to_uppercase().replace('-', "_");
    Signal::ALL
        .iter()
        .copied()
        .find(|signal| signal.to_string() == normalized)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid signal: {}. Use: strong_buy, buy, watch, neutral, avoid",
                s
            )
        })
}

/// 결과 필터 및 출력 옵션.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub format: OutputFormat,
    /// 이 등급 이상만 출력
    pub min_signal: Option<Signal>,
    /// 최대 출력 종목 수 (0 = 무제한)
    pub limit: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            min_signal: None,
            limit: 0,
        }
    }
}

impl ReportOptions {
    /// 필터를 적용한 결과 목록 (정렬 순서 유지).
    pub fn select<'a>(&self, results: &'a [ScreenerResult]) -> Vec<&'a ScreenerResult> {
        let filtered = results
            .iter()
            .filter(|r| self.min_signal.map_or(true, |min| r.signal >= min));
        if self.limit > 0 {
            filtered.take(self.limit).collect()
        } else {
            filtered.collect()
        }
    }
}

/// CSV 한 행.
#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    rank: usize,
    symbol: &'a str,
    sector: &'a str,
    date: String,
    close: Decimal,
    score: i32,
    signal: Signal,
    last_phase: &'static str,
    entry: Decimal,
    stop_loss: Decimal,
    target: Decimal,
    position_size: Decimal,
    rationale: String,
}

impl<'a> ResultRow<'a> {
    fn new(rank: usize, result: &'a ScreenerResult) -> Self {
        Self {
            rank,
            symbol: &result.symbol,
            sector: result.sector.as_deref().unwrap_or(""),
            date: result.date.to_string(),
            close: result.close,
            score: result.overall_score,
            signal: result.signal,
            last_phase: last_phase_label(result),
            entry: result.risk.entry,
            stop_loss: result.risk.stop_loss,
            target: result.risk.target,
            position_size: result.risk.position_size,
            rationale: result.rationale.join(" | "),
        }
    }
}

fn last_phase_label(result: &ScreenerResult) -> &'static str {
    result.last_passed_phase().map_or("-", |p| p.label())
}

/// 보고서를 문자열로 렌더링합니다.
pub fn render_report(report: &BatchReport, options: &ReportOptions) -> Result<String> {
    match options.format {
        OutputFormat::Table => Ok(format_table(report, options)),
        OutputFormat::Csv => format_csv(report, options),
        OutputFormat::Json => format_json(report, options),
    }
}

/// 파일 또는 stdout에 출력합니다.
pub fn write_output(content: &str, output_path: Option<&Path>) -> Result<()> {
    if let Some(path) = output_path {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .context("Failed to write to file")?;
        info!("Output written to: {}", path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

/// 테이블 형식 출력.
fn format_table(report: &BatchReport, options: &ReportOptions) -> String {
    let mut output = String::new();

    // 요약
    output.push_str(&format!(
        "Regime: {} - {}\n",
        report.regime.regime, report.regime.description
    ));
    let params = &report.effective_config.params;
    output.push_str(&format!(
        "Thresholds ({:?}): ADX>={} RSI {}~{} VOLx{} RR>={} | STRONG_BUY>={} BUY>={} WATCH>={}\n",
        report.effective_config.source,
        params.min_adx,
        params.rsi_low,
        params.rsi_high,
        params.volume_multiplier,
        params.min_risk_reward,
        params.strong_buy_threshold,
        params.buy_threshold,
        params.watch_threshold
    ));
    for warning in &report.warnings {
        output.push_str(&format!("Warning: {}\n", warning));
    }
    if report.cancelled {
        output.push_str("Warning: 배치가 취소되어 일부 종목만 처리되었습니다\n");
    }
    output.push('\n');

    // 결과
    output.push_str(&format!(
        "{:<5} {:<12} {:<16} {:>6} {:<11} {:<8} {:>12} {:>12} {:>12} {:>10}\n",
        "RANK", "SYMBOL", "SECTOR", "SCORE", "SIGNAL", "PHASE", "CLOSE", "STOP", "TARGET", "SIZE"
    ));
    output.push_str(&"-".repeat(112));
    output.push('\n');

    let selected = options.select(&report.results);
    for (i, result) in selected.iter().enumerate() {
        output.push_str(&format!(
            "{:<5} {:<12} {:<16} {:>6} {:<11} {:<8} {:>12} {:>12} {:>12} {:>10}\n",
            i + 1,
            truncate(&result.symbol, 12),
            truncate(result.sector.as_deref().unwrap_or("-"), 16),
            result.overall_score,
            result.signal.to_string(),
            last_phase_label(result),
            result.close.round_dp(2),
            result.risk.stop_loss,
            result.risk.target,
            result.risk.position_size
        ));
    }

    output.push('\n');
    output.push_str(&format!(
        "Total: {} shown / {} screened / {} skipped",
        selected.len(),
        report.results.len(),
        report.skipped.len()
    ));

    // 신호별 집계
    output.push_str("\n\nBy Signal:\n");
    for (signal, count) in report.signal_counts.entries() {
        output.push_str(&format!("  {:<11} {}\n", signal.to_string(), count));
    }

    // 단계별 통과
    output.push_str("\nFunnel:\n");
    for (phase, evaluated) in report.funnel.evaluated.entries() {
        output.push_str(&format!(
            "  {:<8} {}/{}\n",
            phase.label(),
            report.funnel.passed[phase],
            evaluated
        ));
    }

    // 섹터 순위
    if !report.sector_rankings.sectors.is_empty() {
        output.push_str("\nSectors:\n");
        for sector in &report.sector_rankings.sectors {
            let tag = if report.sector_rankings.top_sectors.contains(&sector.sector) {
                " (주도)"
            } else if report.sector_rankings.bottom_sectors.contains(&sector.sector) {
                " (소외)"
            } else {
                ""
            };
            output.push_str(&format!(
                "  {:>2}. {:<16} score {:>8} week {:>7}% breadth {:>6}%{}\n",
                sector.rank,
                truncate(&sector.sector, 16),
                sector.composite_score.round_dp(2),
                sector.avg_week_change.round_dp(2),
                sector.breadth_pct.round_dp(1),
                tag
            ));
        }
    }

    // 제외 종목
    if !report.skipped.is_empty() {
        output.push_str("\nSkipped:\n");
        for skipped in &report.skipped {
            output.push_str(&format!(
                "  {:<12} {:?}: {}\n",
                skipped.symbol, skipped.reason, skipped.message
            ));
        }
    }

    output
}

/// CSV 형식 출력.
fn format_csv(report: &BatchReport, options: &ReportOptions) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (i, result) in options.select(&report.results).into_iter().enumerate() {
        writer
            .serialize(ResultRow::new(i + 1, result))
            .context("Failed to write CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// JSON 형식 출력.
///
/// 필터가 있으면 결과 목록만 필터링하고 나머지 집계는 그대로 둡니다.
fn format_json(report: &BatchReport, options: &ReportOptions) -> Result<String> {
    let selected: Vec<ScreenerResult> = options
        .select(&report.results)
        .into_iter()
        .cloned()
        .collect();
    let filtered = BatchReport {
        results: selected,
        ..report.clone()
    };
    serde_json::to_string_pretty(&filtered).context("Failed to serialize to JSON")
}

/// 문자열 자르기 (UTF-8 안전).
fn truncate(s: &str, max_len: usize) -> String {
    // 문자 수로 계산 (바이트가 아님)
    let char_count = s.chars().count();

    if char_count <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
