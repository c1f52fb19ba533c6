//! 시장 레짐 조회 명령어.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;

use screener_analytics::MarketRegimeCalculator;
use screener_core::{AdaptiveThresholds, AppConfig, MarketRegimeInfo};

use crate::commands::data::load_candles;
use crate::commands::report::{write_output, OutputFormat};

/// 레짐 명령 설정.
#[derive(Debug, Clone)]
pub struct RegimeCommandConfig {
    pub benchmark: PathBuf,
    pub volatility_index: Option<Decimal>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

/// 레짐 판정과 적용될 임계값.
#[derive(Debug, Clone, Serialize)]
pub struct RegimeSummary {
    #[serde(flatten)]
    pub info: MarketRegimeInfo,
    pub thresholds: AdaptiveThresholds,
}

/// 벤치마크 CSV로 레짐을 판정합니다.
pub fn evaluate_regime(app_config: &AppConfig, config: &RegimeCommandConfig) -> Result<RegimeSummary> {
    let benchmark = load_candles(&config.benchmark)?;
    let info = MarketRegimeCalculator::new(app_config.pipeline.min_history_bars)
        .calculate(&benchmark, config.volatility_index)
        .context("Failed to calculate market regime")?;
    let thresholds = AdaptiveThresholds::for_regime(info.regime);
    Ok(RegimeSummary { info, thresholds })
}

/// 레짐을 판정하고 출력합니다.
pub fn run_regime(app_config: &AppConfig, config: RegimeCommandConfig) -> Result<RegimeSummary> {
    let summary = evaluate_regime(app_config, &config)?;
    let content = match config.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&summary).context("Failed to serialize to JSON")?
        }
        OutputFormat::Table | OutputFormat::Csv => format_summary(&summary),
    };
    write_output(&content, config.output.as_deref())?;
    Ok(summary)
}

fn format_summary(summary: &RegimeSummary) -> String {
    let info = &summary.info;
    let t = &summary.thresholds;
    let mut output = String::new();

    output.push_str(&format!("Regime:      {}\n", info.regime));
    output.push_str(&format!("Description: {}\n", info.description));
    output.push_str(&format!(
        "Benchmark:   close {} / EMA20 {} / EMA50 {} / ADX {}\n",
        info.benchmark_close.round_dp(2),
        info.benchmark_ema20.round_dp(2),
        info.benchmark_ema50.round_dp(2),
        info.benchmark_adx.round_dp(2)
    ));
    output.push('\n');
    output.push_str("Thresholds:\n");
    output.push_str(&format!("  min ADX            {}\n", t.min_adx));
    output.push_str(&format!("  RSI band           {} ~ {}\n", t.rsi_low, t.rsi_high));
    output.push_str(&format!("  volume multiplier  {}\n", t.volume_multiplier));
    output.push_str(&format!("  min risk/reward    {}\n", t.min_risk_reward));
    output.push_str(&format!(
        "  score floors       STRONG_BUY {} / BUY {} / WATCH {}",
        t.strong_buy_threshold, t.buy_threshold, t.watch_threshold
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use rust_decimal_macros::dec;
    use screener_core::MarketRegime;
    use std::fmt::Write as _;
    use std::fs;
    use tempfile::tempdir;

    fn benchmark_csv(n: usize, slope: Decimal) -> String {
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut body = String::from("date,open,high,low,close,volume\n");
        for i in 0..n {
            let close = dec!(1000) + Decimal::from(i) * slope;
            writeln!(
                body,
                "{},{},{},{},{},1000000",
                first + Duration::days(i as i64),
                close - slope,
                close.max(close - slope) + dec!(2),
                close.min(close - slope) - dec!(2),
                close
            )
            .unwrap();
        }
        body
    }

    fn config(benchmark: PathBuf) -> RegimeCommandConfig {
        RegimeCommandConfig {
            benchmark,
            volatility_index: None,
            format: OutputFormat::Table,
            output: None,
        }
    }

    #[test]
    fn test_downtrend_is_bear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.csv");
        fs::write(&path, benchmark_csv(120, dec!(-3))).unwrap();

        let summary = evaluate_regime(&AppConfig::default(), &config(path)).unwrap();
        assert_eq!(summary.info.regime, MarketRegime::Bear);
        assert_eq!(summary.thresholds, AdaptiveThresholds::for_regime(MarketRegime::Bear));
        assert!(format_summary(&summary).contains("BUY 65"));
    }

    #[test]
    fn test_short_benchmark_is_sideways() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.csv");
        fs::write(&path, benchmark_csv(30, dec!(5))).unwrap();

        let mut cfg = config(path);
        cfg.volatility_index = Some(dec!(30));
        let summary = evaluate_regime(&AppConfig::default(), &cfg).unwrap();
        assert_eq!(summary.info.regime, MarketRegime::Sideways);
        assert!(summary.info.description.contains("벤치마크 데이터 부족"));
        assert!(summary.info.description.contains("30.00"));
    }

    #[test]
    fn test_json_output_flattens_info() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.csv");
        fs::write(&path, benchmark_csv(120, dec!(3))).unwrap();

        let summary = evaluate_regime(&AppConfig::default(), &config(path)).unwrap();
        let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["regime"], "BULL");
        assert_eq!(json["thresholds"]["buy_threshold"], 55);
    }
}
