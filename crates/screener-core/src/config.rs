//! 설정 관리.
//!
//! 스크리너 설정을 정의하고 파일/환경 변수에서 로드합니다.
//! 배치 시작 전에 [`AppConfig::validate`]로 모든 값을 검사하며,
//! 레짐별 임계값은 [`EffectiveConfig::resolve`]로 병합합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::AdaptiveThresholds;
use crate::error::{CoreResult, ScreenerError};

/// 환경 변수 접두사.
pub const ENV_PREFIX: &str = "SCREENER";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 스크리닝 기준
    pub screener: ScreenerConfig,
    /// 파이프라인 실행 설정
    pub pipeline: PipelineConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 로깅 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 6단계 스크리닝 기준.
///
/// 실행 중에는 변경되지 않으며, 레짐 임계값이 있으면
/// [`EffectiveConfig::resolve`]로 일부 값이 대체됩니다.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScreenerConfig {
    // ==================== 1단계: 유동성 ====================
    /// 최소 평균 거래대금
    pub min_avg_turnover: Decimal,
    /// 평균 거래대금 계산 기간
    pub turnover_lookback: usize,

    // ==================== 2단계: 추세 ====================
    /// 종가 > EMA20 > EMA50 > EMA200 정배열 요구
    pub require_ema_alignment: bool,
    /// ADX 하한
    pub min_adx: Decimal,
    /// 3개월 상대강도 > 0 요구
    pub require_positive_rs: bool,
    /// MACD > 시그널 그리고 MACD > 0 요구
    pub require_macd_bullish: bool,
    /// SuperTrend 상승 요구
    pub require_supertrend_up: bool,

    // ==================== 3단계: 모멘텀 ====================
    /// RSI 밴드 하단
    pub rsi_low: Decimal,
    /// RSI 밴드 상단
    pub rsi_high: Decimal,
    /// EMA20/EMA50 근접 허용 폭 (%)
    pub ema_proximity_pct: Decimal,

    // ==================== 4단계: 거래량 ====================
    /// 평균 거래량 대비 배수
    pub volume_multiplier: Decimal,
    /// 평균 거래량 계산 기간
    pub volume_avg_period: usize,
    /// MFI 건강 구간 하단
    pub mfi_low: Decimal,
    /// MFI 건강 구간 상단
    pub mfi_high: Decimal,
    /// OBV 상승을 통과 조건에 포함
    pub use_obv: bool,

    // ==================== 5단계: 변동성 ====================
    /// ATR/가격 상한 (%)
    pub max_atr_pct: Decimal,
    /// 볼린저 밴드폭 확장 요구
    pub require_bb_expansion: bool,

    // ==================== 6단계: 리스크 ====================
    /// 손절 ATR 배수
    pub atr_stop_multiple: Decimal,
    /// 최소 손익비
    pub min_risk_reward: Decimal,
    /// 운용 자본 (포지션 크기 계산용)
    pub account_capital: Decimal,
    /// 거래당 최대 자본 리스크 (%)
    pub max_capital_risk_pct: Decimal,

    // ==================== 신호 ====================
    /// STRONG_BUY 점수 하한
    pub strong_buy_threshold: i32,
    /// BUY 점수 하한
    pub buy_threshold: i32,
    /// WATCH 점수 하한
    pub watch_threshold: i32,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            min_avg_turnover: dec!(1000000),
            turnover_lookback: 20,
            require_ema_alignment: true,
            min_adx: dec!(20),
            require_positive_rs: true,
            require_macd_bullish: false,
            require_supertrend_up: false,
            rsi_low: dec!(40),
            rsi_high: dec!(75),
            ema_proximity_pct: dec!(5),
            volume_multiplier: dec!(1.5),
            volume_avg_period: 20,
            mfi_low: dec!(40),
            mfi_high: dec!(80),
            use_obv: true,
            max_atr_pct: dec!(5),
            require_bb_expansion: false,
            atr_stop_multiple: dec!(2),
            min_risk_reward: dec!(2),
            account_capital: dec!(10000000),
            max_capital_risk_pct: dec!(1),
            strong_buy_threshold: 75,
            buy_threshold: 55,
            watch_threshold: 35,
        }
    }
}

impl ScreenerConfig {
    /// 값 범위를 검사합니다. 첫 번째 위반 항목에서 에러를 반환합니다.
    pub fn validate(&self) -> CoreResult<()> {
        let hundred = Decimal::ONE_HUNDRED;

        non_negative("screener.min_avg_turnover", self.min_avg_turnover)?;
        positive_period("screener.turnover_lookback", self.turnover_lookback)?;
        positive_period("screener.volume_avg_period", self.volume_avg_period)?;
        within("screener.min_adx", self.min_adx, Decimal::ZERO, hundred)?;
        band("screener.rsi", self.rsi_low, self.rsi_high)?;
        band("screener.mfi", self.mfi_low, self.mfi_high)?;
        non_negative("screener.ema_proximity_pct", self.ema_proximity_pct)?;
        positive("screener.volume_multiplier", self.volume_multiplier)?;
        positive("screener.max_atr_pct", self.max_atr_pct)?;
        positive("screener.atr_stop_multiple", self.atr_stop_multiple)?;
        positive("screener.min_risk_reward", self.min_risk_reward)?;
        non_negative("screener.account_capital", self.account_capital)?;
        positive("screener.max_capital_risk_pct", self.max_capital_risk_pct)?;
        within(
            "screener.max_capital_risk_pct",
            self.max_capital_risk_pct,
            Decimal::ZERO,
            hundred,
        )?;

        for (field, value) in [
            ("screener.strong_buy_threshold", self.strong_buy_threshold),
            ("screener.buy_threshold", self.buy_threshold),
            ("screener.watch_threshold", self.watch_threshold),
        ] {
            if !(0..=100).contains(&value) {
                return Err(ScreenerError::validation(field, "0~100 범위여야 합니다"));
            }
        }
        if !(self.watch_threshold <= self.buy_threshold
            && self.buy_threshold <= self.strong_buy_threshold)
        {
            return Err(ScreenerError::validation(
                "screener.thresholds",
                "watch <= buy <= strong_buy 순서여야 합니다",
            ));
        }

        Ok(())
    }
}

/// 다이버전스 탐지 설정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DivergenceSettings {
    /// 스윙 확인에 필요한 좌우 봉 수
    pub order: usize,
    /// 스윙 탐색 구간 (최근 봉 수)
    pub lookback: usize,
    /// 같은 유형 스윙 간 최소 간격
    pub min_separation: usize,
}

impl Default for DivergenceSettings {
    fn default() -> Self {
        Self {
            order: 5,
            lookback: 50,
            min_separation: 5,
        }
    }
}

/// 파이프라인 실행 설정.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 종목 평가에 필요한 최소 일봉 수
    pub min_history_bars: usize,
    /// 상대강도 기간 (약 3개월)
    pub rs_period: usize,
    /// 주간 등락률 기간
    pub week_change_period: usize,
    /// 레짐별 적응형 임계값 사용 여부
    pub adaptive_thresholds: bool,
    /// 워커 스레드 수 (없으면 CPU 수)
    pub worker_threads: Option<usize>,
    /// 다이버전스 설정
    pub divergence: DivergenceSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_history_bars: 60,
            rs_period: 63,
            week_change_period: 5,
            adaptive_thresholds: true,
            worker_threads: None,
            divergence: DivergenceSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// 값 범위를 검사합니다.
    pub fn validate(&self) -> CoreResult<()> {
        if self.min_history_bars < 2 {
            return Err(ScreenerError::validation(
                "pipeline.min_history_bars",
                "2 이상이어야 합니다",
            ));
        }
        positive_period("pipeline.rs_period", self.rs_period)?;
        positive_period("pipeline.week_change_period", self.week_change_period)?;
        if self.worker_threads == Some(0) {
            return Err(ScreenerError::validation(
                "pipeline.worker_threads",
                "0보다 커야 합니다",
            ));
        }

        let d = &self.divergence;
        positive_period("pipeline.divergence.order", d.order)?;
        positive_period("pipeline.divergence.min_separation", d.min_separation)?;
        if d.lookback <= d.order * 2 {
            return Err(ScreenerError::validation(
                "pipeline.divergence.lookback",
                "order의 2배보다 커야 합니다",
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// 파일 없이 기본값과 환경 변수만으로 설정을 로드합니다.
    pub fn from_env() -> CoreResult<Self> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> CoreResult<Self> {
        Self::load("config/screener.toml")
    }

    /// 모든 섹션을 검사합니다.
    pub fn validate(&self) -> CoreResult<()> {
        self.screener.validate()?;
        self.pipeline.validate()
    }
}

/// 임계값 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    /// 기본 설정 그대로
    Base,
    /// 레짐 적응형 임계값으로 대체
    Adaptive,
}

/// 한 번의 배치에 적용되는 최종 설정.
///
/// 기본 설정과 적응형 임계값을 병합한 완전한 설정입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// 병합된 기준
    pub params: ScreenerConfig,
    /// 임계값 출처
    pub source: ThresholdSource,
}

impl EffectiveConfig {
    /// 기본 설정에 적응형 임계값을 덮어씌웁니다.
    pub fn resolve(base: &ScreenerConfig, adaptive: Option<&AdaptiveThresholds>) -> Self {
        let Some(t) = adaptive else {
            return Self {
                params: base.clone(),
                source: ThresholdSource::Base,
            };
        };

        let params = ScreenerConfig {
            min_adx: t.min_adx,
            rsi_low: t.rsi_low,
            rsi_high: t.rsi_high,
            volume_multiplier: t.volume_multiplier,
            min_risk_reward: t.min_risk_reward,
            strong_buy_threshold: t.strong_buy_threshold,
            buy_threshold: t.buy_threshold,
            watch_threshold: t.watch_threshold,
            ..base.clone()
        };

        Self {
            params,
            source: ThresholdSource::Adaptive,
        }
    }
}

fn positive_period(field: &str, value: usize) -> CoreResult<()> {
    if value == 0 {
        return Err(ScreenerError::validation(field, "0보다 커야 합니다"));
    }
    Ok(())
}

fn positive(field: &str, value: Decimal) -> CoreResult<()> {
    if value <= Decimal::ZERO {
        return Err(ScreenerError::validation(field, "0보다 커야 합니다"));
    }
    Ok(())
}

fn non_negative(field: &str, value: Decimal) -> CoreResult<()> {
    if value < Decimal::ZERO {
        return Err(ScreenerError::validation(field, "음수일 수 없습니다"));
    }
    Ok(())
}

fn within(field: &str, value: Decimal, low: Decimal, high: Decimal) -> CoreResult<()> {
    if value < low || value > high {
        return Err(ScreenerError::validation(
            field,
            format!("{}~{} 범위여야 합니다 (현재 {})", low, high, value),
        ));
    }
    Ok(())
}

fn band(field: &str, low: Decimal, high: Decimal) -> CoreResult<()> {
    within(field, low, Decimal::ZERO, Decimal::ONE_HUNDRED)?;
    within(field, high, Decimal::ZERO, Decimal::ONE_HUNDRED)?;
    if low >= high {
        return Err(ScreenerError::validation(field, "하단이 상단보다 작아야 합니다"));
    }
    Ok(())
}
