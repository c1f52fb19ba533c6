//! 단일 종목 지표 스냅샷 명령어.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::PathBuf;

use screener_analytics::{IndicatorEngine, IndicatorSet};
use screener_core::{AppConfig, SymbolHistory};

use crate::commands::data::load_candles;
use crate::commands::report::write_output;

/// 지표 명령 설정.
#[derive(Debug, Clone)]
pub struct IndicatorsCommandConfig {
    /// 종목 일봉 CSV
    pub input: PathBuf,
    /// 심볼 (없으면 파일명)
    pub symbol: Option<String>,
    pub sector: Option<String>,
    /// 상대강도 계산용 벤치마크 CSV (없으면 상대강도 0)
    pub benchmark: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// 종목 하나의 지표 스냅샷을 계산합니다.
pub fn compute_indicators(
    app_config: &AppConfig,
    config: &IndicatorsCommandConfig,
) -> Result<IndicatorSet> {
    let symbol = match &config.symbol {
        Some(symbol) => symbol.clone(),
        None => config
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .context("Cannot derive symbol from file name, use --symbol")?,
    };

    let candles = load_candles(&config.input)?;
    let benchmark_closes: Vec<Decimal> = match &config.benchmark {
        Some(path) => load_candles(path)?.into_iter().map(|c| c.close).collect(),
        None => Vec::new(),
    };

    let history = SymbolHistory::new(symbol, config.sector.clone(), candles);
    let engine = IndicatorEngine::new(&app_config.screener, &app_config.pipeline);
    engine
        .compute(&history, &benchmark_closes)
        .with_context(|| format!("Failed to compute indicators for {}", history.symbol))
}

/// 지표 스냅샷을 JSON으로 출력합니다.
pub fn run_indicators(app_config: &AppConfig, config: IndicatorsCommandConfig) -> Result<IndicatorSet> {
    let set = compute_indicators(app_config, &config)?;
    let content = serde_json::to_string_pretty(&set).context("Failed to serialize to JSON")?;
    write_output(&content, config.output.as_deref())?;
    Ok(set)
}
