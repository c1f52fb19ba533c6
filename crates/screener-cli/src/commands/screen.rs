//! 유니버스 스크리닝 명령어.
//!
//! # 사용 예시
//!
//! ```bash
//! # data/kr 디렉토리의 종목 CSV를 KOSPI 지수 기준으로 스크리닝
//! screener screen -d data/kr -b data/index/KOSPI.csv -s data/sectors.csv
//!
//! # 하락장 임계값을 강제하고 BUY 이상만 JSON으로 저장
//! screener screen -d data/kr -b data/index/KOSPI.csv --regime bear --min-signal buy -f json -o report.json
//! ```

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use screener_analytics::{BatchReport, BatchRequest, BatchRunner};
use screener_core::{AdaptiveThresholds, AppConfig, MarketRegime};

use crate::commands::data::{load_candles, load_sector_map, load_universe};
use crate::commands::report::{render_report, write_output, ReportOptions};

/// 스크리닝 명령 설정.
#[derive(Debug, Clone)]
pub struct ScreenCommandConfig {
    /// 종목 CSV 디렉토리
    pub data_dir: PathBuf,
    /// 벤치마크 지수 CSV
    pub benchmark: PathBuf,
    /// 섹터 매핑 CSV
    pub sectors: Option<PathBuf>,
    /// 시장 변동성 지수
    pub volatility_index: Option<Decimal>,
    /// 판정 레짐 대신 사용할 레짐 임계값
    pub regime_override: Option<MarketRegime>,
    pub report: ReportOptions,
    /// 출력 파일 경로 (없으면 stdout)
    pub output: Option<PathBuf>,
    /// 진행률 표시 여부
    pub progress: bool,
}

/// 레짐 문자열 파싱 (BULL, SIDEWAYS, BEAR).
pub fn parse_regime(s: &str) -> Result<MarketRegime> {
    let normalized = s.trim().to_uppercase();
    MarketRegime::ALL
        .iter()
        .copied()
        .find(|regime| regime.to_string() == normalized)
        .ok_or_else(|| anyhow::anyhow!("Invalid regime: {}. Use: bull, sideways, bear", s))
}

/// 스크리닝을 실행하고 보고서를 출력합니다.
///
/// 배치는 블로킹 스레드에서 실행되며 Ctrl-C를 받으면 취소 토큰을 발동합니다.
/// 취소된 경우에도 처리된 결과까지는 출력합니다.
pub async fn run_screen(app_config: AppConfig, config: ScreenCommandConfig) -> Result<BatchReport> {
    let runner = BatchRunner::new(app_config).context("Invalid screener configuration")?;

    let sectors = match &config.sectors {
        Some(path) => load_sector_map(path)?,
        None => HashMap::new(),
    };
    let benchmark = load_candles(&config.benchmark)?;
    let universe = load_universe(&config.data_dir, &sectors, Some(&config.benchmark))?;
    if universe.file_count() == 0 {
        anyhow::bail!("No symbol CSV files found in {}", config.data_dir.display());
    }
    let unreadable = universe.unreadable;
    let histories = universe.histories;

    info!(
        symbols = histories.len(),
        unreadable = unreadable.len(),
        benchmark_bars = benchmark.len(),
        "Starting screening"
    );

    let progress = if config.progress {
        let pb = ProgressBar::new(histories.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling screening");
                cancel.cancel();
            }
        })
    };

    let override_thresholds = config.regime_override.map(AdaptiveThresholds::for_regime);
    let volatility_index = config.volatility_index;
    let pb = progress.clone();

    let outcome = tokio::task::spawn_blocking(move || {
        let mut request = BatchRequest::new(&histories, &benchmark);
        if let Some(vix) = volatility_index {
            request = request.with_volatility_index(vix);
        }
        if let Some(thresholds) = override_thresholds.as_ref() {
            request = request.with_threshold_override(thresholds);
        }
        runner.run_with_progress(request, &cancel, || pb.inc(1))
    })
    .await;

    ctrl_c.abort();
    progress.finish_and_clear();

    let mut report = outcome
        .context("Screening task failed")?
        .context("Screening failed")?;

    // 읽지 못한 파일도 제외 종목으로 보고
    if !unreadable.is_empty() {
        report.skipped.extend(unreadable);
        report.skipped.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    }

    if report.cancelled {
        warn!(
            completed = report.results.len(),
            "Screening cancelled, printing partial results"
        );
    }

    let content = render_report(&report, &config.report)?;
    write_output(&content, config.output.as_deref())?;

    Ok(report)
}
