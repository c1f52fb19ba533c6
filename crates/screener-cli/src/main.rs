//! 주식 스크리너 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 기본 설정 파일 생성
//! screener init-config
//!
//! # 종목 디렉토리 스크리닝 (섹터 매핑 포함)
//! screener screen -d data/kr -b data/index/KOSPI.csv -s data/sectors.csv
//!
//! # 시장 레짐 확인 (변동성 지수 포함)
//! screener regime data/index/KOSPI.csv --vix 18.5
//!
//! # 단일 종목 지표 스냅샷
//! screener indicators data/kr/005930.csv -b data/index/KOSPI.csv
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::info;

use screener_cli::commands::indicators::{run_indicators, IndicatorsCommandConfig};
use screener_cli::commands::init_config::write_default_config;
use screener_cli::commands::regime::{run_regime, RegimeCommandConfig};
use screener_cli::commands::report::{parse_signal, OutputFormat, ReportOptions};
use screener_cli::commands::screen::{parse_regime, run_screen, ScreenCommandConfig};
use screener_core::{init_logging, AppConfig, LogConfig};

const DEFAULT_CONFIG_PATH: &str = "config/screener.toml";

#[derive(Parser)]
#[command(name = "screener")]
#[command(about = "Equity screener - 레짐 적응형 6단계 스윙 매매 후보 스크리닝", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (기본: config/screener.toml, 없으면 기본값 + 환경 변수)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (설정 파일 값보다 우선)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 종목 유니버스 스크리닝
    Screen {
        /// 종목 일봉 CSV 디렉토리 (파일명 = 심볼)
        #[arg(short, long)]
        data_dir: PathBuf,

        /// 벤치마크 지수 일봉 CSV
        #[arg(short, long)]
        benchmark: PathBuf,

        /// 섹터 매핑 CSV (symbol,sector)
        #[arg(short, long)]
        sectors: Option<PathBuf>,

        /// 시장 변동성 지수 (설명에만 사용)
        #[arg(long)]
        vix: Option<Decimal>,

        /// 판정 레짐 대신 적용할 레짐 임계값 (bull, sideways, bear)
        #[arg(long)]
        regime: Option<String>,

        /// 출력 형식 (table, csv, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// 출력 파일 경로 (지정하지 않으면 stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 이 신호 이상만 출력 (strong_buy, buy, watch, neutral, avoid)
        #[arg(long)]
        min_signal: Option<String>,

        /// 최대 결과 수 (0 = 무제한)
        #[arg(long, default_value = "0")]
        limit: usize,

        /// 진행률 표시 끄기
        #[arg(long, default_value = "false")]
        no_progress: bool,
    },

    /// 벤치마크 기준 시장 레짐과 적응형 임계값 조회
    Regime {
        /// 벤치마크 지수 일봉 CSV
        benchmark: PathBuf,

        /// 시장 변동성 지수
        #[arg(long)]
        vix: Option<Decimal>,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// 출력 파일 경로
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 단일 종목 지표 스냅샷 (JSON)
    Indicators {
        /// 종목 일봉 CSV
        input: PathBuf,

        /// 심볼 (기본: 파일명)
        #[arg(long)]
        symbol: Option<String>,

        /// 섹터명
        #[arg(long)]
        sector: Option<String>,

        /// 상대강도 계산용 벤치마크 CSV
        #[arg(short, long)]
        benchmark: Option<PathBuf>,

        /// 출력 파일 경로
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 기본 설정 파일 생성
    InitConfig {
        /// 생성할 경로
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        output: PathBuf,

        /// 기존 파일 덮어쓰기
        #[arg(long, default_value = "false")]
        force: bool,
    },
}

/// 설정 로드 순서: 지정 파일 → 기본 경로 파일 → 기본값 + 환경 변수.
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            AppConfig::load_default().context("Failed to load default config")
        }
        None => AppConfig::from_env().context("Failed to load config from environment"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // init-config는 기존 설정 파일과 무관하게 동작
    if let Commands::InitConfig { output, force } = &cli.command {
        init_logging(LogConfig::new(cli.log_level.as_deref().unwrap_or("info")))
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
        write_default_config(output, *force)?;
        println!("설정 파일 생성: {}", output.display());
        return Ok(());
    }

    let app_config = load_config(cli.config.as_deref())?;

    let mut log_config = LogConfig::from_settings(&app_config.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    run_command(cli.command, app_config).await
}

async fn run_command(command: Commands, app_config: AppConfig) -> Result<()> {
    match command {
        Commands::Screen {
            data_dir,
            benchmark,
            sectors,
            vix,
            regime,
            format,
            output,
            min_signal,
            limit,
            no_progress,
        } => {
            let regime_override = regime.as_deref().map(parse_regime).transpose()?;
            let report = ReportOptions {
                format: OutputFormat::parse(&format)?,
                min_signal: min_signal.as_deref().map(parse_signal).transpose()?,
                limit,
            };

            let config = ScreenCommandConfig {
                data_dir,
                benchmark,
                sectors,
                volatility_index: vix,
                regime_override,
                report,
                output,
                progress: !no_progress,
            };

            let report = run_screen(app_config, config).await?;
            info!(
                screened = report.results.len(),
                skipped = report.skipped.len(),
                cancelled = report.cancelled,
                "Screening finished"
            );
        }

        Commands::Regime {
            benchmark,
            vix,
            format,
            output,
        } => {
            let config = RegimeCommandConfig {
                benchmark,
                volatility_index: vix,
                format: OutputFormat::parse(&format)?,
                output,
            };
            let summary = run_regime(&app_config, config)?;
            info!(regime = %summary.info.regime, "Regime evaluated");
        }

        Commands::Indicators {
            input,
            symbol,
            sector,
            benchmark,
            output,
        } => {
            let config = IndicatorsCommandConfig {
                input,
                symbol,
                sector,
                benchmark,
                output,
            };
            let set = run_indicators(&app_config, config)?;
            info!(symbol = %set.symbol, bars = set.bars, "Indicators computed");
        }

        Commands::InitConfig { output, force } => {
            write_default_config(&output, force)?;
        }
    }

    Ok(())
}
