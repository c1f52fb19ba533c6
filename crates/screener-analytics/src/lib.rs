//! 스크리너 분석 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 기술적 지표 계산 (추세, 모멘텀, 변동성, 거래량)
//! - 스윙 포인트 기반 다이버전스 탐지
//! - 일봉 → 주봉 추세 분석
//! - 시장 레짐 판정
//! - 섹터 로테이션 순위
//! - 6단계 스크리닝 파이프라인과 배치 실행기
//!
//! # Re-exports
//!
//! - [`indicators`]: 지표 계산기와 파라미터
//! - [`screener`]: 단계 평가, 점수, 신호, 근거
//! - [`batch`]: 유니버스 단위 병렬 실행

pub mod batch;
pub mod divergence;
pub mod indicator_set;
pub mod indicators;
pub mod market_regime_calculator;
pub mod screener;
pub mod sector_rotation;
pub mod weekly;

// Indicators 모듈 re-exports
pub use indicators::{
    // 추세 지표
    AdxParams,
    AdxResult,
    EmaParams,
    MacdParams,
    MacdResult,
    SmaParams,
    TrendIndicators,
    // 모멘텀 지표
    CciParams,
    MfiParams,
    MomentumIndicators,
    RocParams,
    RsiParams,
    StochasticParams,
    StochasticResult,
    WilliamsRParams,
    // 변동성 지표
    AtrParams,
    BollingerBandsParams,
    BollingerPoint,
    VolatilityIndicators,
    // 거래량 지표
    VolumeIndicators,
    VwapParams,
    // 추세 보조
    IchimokuIndicator,
    IchimokuParams,
    IchimokuResult,
    ParabolicSarIndicator,
    ParabolicSarParams,
    SuperTrendIndicator,
    SuperTrendParams,
    // 공통
    IndicatorError,
    IndicatorResult,
    PriceColumns,
    Series,
};

// 다이버전스 re-export
pub use divergence::{
    Divergence, DivergenceDetector, DivergenceDirection, DivergenceIndicator, DivergenceInputs,
    DivergenceResult, SwingKind, SwingPoint,
};

// 주봉 추세 re-export
pub use weekly::{resample_to_weekly, WeeklyStatus, WeeklyTrendAnalyzer, WeeklyTrendHealth};

// 지표 스냅샷 re-export
pub use indicator_set::{IndicatorEngine, IndicatorSet};

// MarketRegime 계산기 re-export
pub use market_regime_calculator::{classify_regime, MarketRegimeCalculator};

// 섹터 로테이션 re-export
pub use sector_rotation::{
    SectorContext, SectorInput, SectorMetrics, SectorRankings, SectorRotationRanker,
};

// Screener re-export
pub use screener::{
    sort_results, Phase, PhaseDetails, PhaseStatus, PhaseTable, RiskBlock, Screener,
    ScreenerResult,
};

// Batch re-export
pub use batch::{
    BatchReport, BatchRequest, BatchRunner, BatchWarning, PhaseFunnel, SkipReason, SkippedSymbol,
};
