//! 종목 유니버스 배치 스크리닝.
//!
//! 실행 순서:
//!
//! 1. 설정 검증 (실패 시 계산 시작 전 종료)
//! 2. 벤치마크로 시장 레짐 판정, 최종 임계값 결정
//! 3. **A 단계**: 종목별 지표 스냅샷 병렬 계산
//! 4. 섹터 순위 계산 (모든 스냅샷이 모인 뒤)
//! 5. **B 단계**: 종목별 6단계 평가 병렬 수행
//!
//! 취소 토큰은 종목 단위로 확인하며, 이미 계산된 결과는 그대로 반환합니다.

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use screener_core::{
    AdaptiveThresholds, AppConfig, Candle, CoreResult, EffectiveConfig, MarketRegimeInfo,
    ScreenerError, SignalCounts, SymbolHistory,
};

use crate::indicator_set::{IndicatorEngine, IndicatorSet};
use crate::market_regime_calculator::MarketRegimeCalculator;
use crate::screener::{sort_results, PhaseTable, Screener, ScreenerResult};
use crate::sector_rotation::{SectorInput, SectorRankings, SectorRotationRanker};

/// 배치 입력.
#[derive(Debug, Clone, Copy)]
pub struct BatchRequest<'a> {
    /// 종목별 일봉 히스토리 (오래된 순)
    pub universe: &'a [SymbolHistory],
    /// 벤치마크 지수 일봉
    pub benchmark: &'a [Candle],
    /// 시장 변동성 지수 (선택)
    pub volatility_index: Option<Decimal>,
    /// 레짐 대신 사용할 임계값 (선택)
    pub threshold_override: Option<&'a AdaptiveThresholds>,
}

impl<'a> BatchRequest<'a> {
    pub fn new(universe: &'a [SymbolHistory], benchmark: &'a [Candle]) -> Self {
        Self {
            universe,
            benchmark,
            volatility_index: None,
            threshold_override: None,
        }
    }

    pub fn with_volatility_index(mut self, value: Decimal) -> Self {
        self.volatility_index = Some(value);
        self
    }

    pub fn with_threshold_override(mut self, thresholds: &'a AdaptiveThresholds) -> Self {
        self.threshold_override = Some(thresholds);
        self
    }
}

/// 종목 제외 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientHistory,
    MalformedCandle,
    Indicator,
    Cancelled,
}

impl From<&ScreenerError> for SkipReason {
    fn from(err: &ScreenerError) -> Self {
        match err {
            ScreenerError::InsufficientHistory { .. } => Self::InsufficientHistory,
            ScreenerError::MalformedCandle { .. } => Self::MalformedCandle,
            ScreenerError::Cancelled => Self::Cancelled,
            _ => Self::Indicator,
        }
    }
}

/// 제외된 종목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
    pub message: String,
}

/// 배치 경고.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchWarning {
    /// 벤치마크 히스토리 부족 (레짐은 횡보장, 상대강도는 0)
    MissingBenchmark { bars: usize, required: usize },
    /// 상대강도 기간보다 짧은 벤치마크 (상대강도는 0)
    ShortRelativeStrengthWindow { bars: usize, required: usize },
}

impl std::fmt::Display for BatchWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingBenchmark { bars, required } => write!(
                f,
                "벤치마크 히스토리 부족: {}봉 (필요 {}봉)",
                bars, required
            ),
            Self::ShortRelativeStrengthWindow { bars, required } => write!(
                f,
                "상대강도 계산 불가: 벤치마크 {}봉 (필요 {}봉 초과)",
                bars, required
            ),
        }
    }
}

/// 단계별 평가/통과 종목 수.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseFunnel {
    pub evaluated: PhaseTable<usize>,
    pub passed: PhaseTable<usize>,
}

impl PhaseFunnel {
    pub fn tally<'a>(results: impl IntoIterator<Item = &'a ScreenerResult>) -> Self {
        let mut funnel = Self::default();
        for result in results {
            for (phase, status) in result.details.statuses().entries() {
                if status.is_evaluated() {
                    funnel.evaluated[phase] += 1;
                }
                if status.is_passed() {
                    funnel.passed[phase] += 1;
                }
            }
        }
        funnel
    }
}

/// 배치 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// 점수 내림차순 결과
    pub results: Vec<ScreenerResult>,
    pub sector_rankings: SectorRankings,
    pub regime: MarketRegimeInfo,
    /// 이번 배치에 적용된 설정
    pub effective_config: EffectiveConfig,
    pub skipped: Vec<SkippedSymbol>,
    pub warnings: Vec<BatchWarning>,
    pub funnel: PhaseFunnel,
    pub signal_counts: SignalCounts,
    /// 취소로 일부 종목이 처리되지 않았는지
    pub cancelled: bool,
}

/// 배치 실행기.
pub struct BatchRunner {
    config: AppConfig,
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("config", &self.config)
            .field("dedicated_pool", &self.pool.is_some())
            .finish()
    }
}

impl BatchRunner {
    /// 설정을 검증하고 실행기를 생성합니다.
    ///
    /// `pipeline.worker_threads`가 있으면 전용 스레드 풀을 만듭니다.
    pub fn new(config: AppConfig) -> CoreResult<Self> {
        config.validate()?;

        let pool = match config.pipeline.worker_threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("screener-worker-{}", i))
                    .build()
                    .map_err(|e| ScreenerError::Config(e.to_string()))?,
            ),
            None => None,
        };

        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 배치를 실행합니다.
    pub fn run(&self, request: BatchRequest<'_>, cancel: &CancellationToken) -> CoreResult<BatchReport> {
        self.run_with_progress(request, cancel, || {})
    }

    /// 종목 하나의 평가가 끝날 때마다 `on_progress`를 호출하며 배치를 실행합니다.
    pub fn run_with_progress<F>(
        &self,
        request: BatchRequest<'_>,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> CoreResult<BatchReport>
    where
        F: Fn() + Sync,
    {
        match &self.pool {
            Some(pool) => pool.install(|| self.execute(request, cancel, &on_progress)),
            None => self.execute(request, cancel, &on_progress),
        }
    }

    fn execute(
        &self,
        request: BatchRequest<'_>,
        cancel: &CancellationToken,
        on_progress: &(dyn Fn() + Sync),
    ) -> CoreResult<BatchReport> {
        let pipeline = &self.config.pipeline;
        tracing::info!(
            symbols = request.universe.len(),
            benchmark_bars = request.benchmark.len(),
            "배치 스크리닝 시작"
        );

        // 레짐 및 최종 설정
        let regime_calc = MarketRegimeCalculator::new(pipeline.min_history_bars);
        let mut warnings = Vec::new();
        if !regime_calc.has_sufficient_history(request.benchmark) {
            warnings.push(BatchWarning::MissingBenchmark {
                bars: request.benchmark.len(),
                required: pipeline.min_history_bars,
            });
        } else if request.benchmark.len() <= pipeline.rs_period {
            tracing::warn!(
                bars = request.benchmark.len(),
                rs_period = pipeline.rs_period,
                "벤치마크가 상대강도 기간보다 짧아 상대강도를 0으로 처리"
            );
            warnings.push(BatchWarning::ShortRelativeStrengthWindow {
                bars: request.benchmark.len(),
                required: pipeline.rs_period,
            });
        }
        let regime = regime_calc.calculate(request.benchmark, request.volatility_index)?;

        let adaptive = match request.threshold_override {
            Some(thresholds) => Some(*thresholds),
            None if pipeline.adaptive_thresholds => Some(AdaptiveThresholds::for_regime(regime.regime)),
            None => None,
        };
        let effective = EffectiveConfig::resolve(&self.config.screener, adaptive.as_ref());
        tracing::info!(regime = %regime.regime, source = ?effective.source, "임계값 결정");

        let benchmark_closes: Vec<Decimal> = request.benchmark.iter().map(|c| c.close).collect();

        // A 단계: 지표 스냅샷
        let engine = IndicatorEngine::new(&effective.params, pipeline);
        let computed: Vec<Result<IndicatorSet, SkippedSymbol>> = request
            .universe
            .par_iter()
            .map(|history| {
                if cancel.is_cancelled() {
                    return Err(skipped(&history.symbol, &ScreenerError::Cancelled));
                }
                let span = screener_core::screening_span!("indicators", history.symbol);
                let _guard = span.enter();
                engine
                    .compute(history, &benchmark_closes)
                    .map_err(|e| skipped(&history.symbol, &e))
            })
            .collect();

        let mut sets = Vec::with_capacity(computed.len());
        let mut skipped_symbols = Vec::new();
        for item in computed {
            match item {
                Ok(set) => sets.push(set),
                Err(skip) => skipped_symbols.push(skip),
            }
        }

        // 섹터 순위 (모든 스냅샷 필요)
        let sector_inputs: Vec<SectorInput<'_>> = sets
            .iter()
            .map(|set| SectorInput {
                symbol: &set.symbol,
                sector: set.sector.as_deref(),
                relative_strength_3m: set.relative_strength_3m,
                week_change: set.week_change,
                above_ema50: set.above_ema50(),
            })
            .collect();
        let sector_rankings = SectorRotationRanker::new().rank(&sector_inputs);

        // B 단계: 6단계 평가
        let screener = Screener::new(effective.clone());
        let scored: Vec<Result<ScreenerResult, SkippedSymbol>> = sets
            .par_iter()
            .map(|set| {
                if cancel.is_cancelled() {
                    return Err(skipped(&set.symbol, &ScreenerError::Cancelled));
                }
                let context = sector_rankings.context_for(set.sector.as_deref());
                let result = screener.evaluate(set, &context);
                on_progress();
                Ok(result)
            })
            .collect();

        let mut results = Vec::with_capacity(scored.len());
        for item in scored {
            match item {
                Ok(result) => results.push(result),
                Err(skip) => skipped_symbols.push(skip),
            }
        }
        sort_results(&mut results);
        skipped_symbols.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let cancelled = skipped_symbols
            .iter()
            .any(|s| s.reason == SkipReason::Cancelled);
        let funnel = PhaseFunnel::tally(&results);
        let signal_counts = SignalCounts::tally(results.iter().map(|r| r.signal));

        if cancelled {
            tracing::warn!(completed = results.len(), "배치가 취소되어 일부 종목만 처리됨");
        }
        tracing::info!(
            results = results.len(),
            skipped = skipped_symbols.len(),
            sectors = sector_rankings.total_sectors,
            "배치 스크리닝 완료"
        );

        Ok(BatchReport {
            results,
            sector_rankings,
            regime,
            effective_config: effective,
            skipped: skipped_symbols,
            warnings,
            funnel,
            signal_counts,
            cancelled,
        })
    }
}

fn skipped(symbol: &str, err: &ScreenerError) -> SkippedSymbol {
    tracing::debug!(symbol, error = %err, "종목 제외");
    SkippedSymbol {
        symbol: symbol.to_string(),
        reason: SkipReason::from(err),
        message: err.to_string(),
    }
}
