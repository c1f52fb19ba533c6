//! 종목별 지표 스냅샷.
//!
//! 한 종목의 전체 일봉 히스토리로 모든 지표를 한 번에 계산하고,
//! 마지막 봉 기준 값만 모아 [`IndicatorSet`]으로 고정합니다.
//! 값이 없는 지표는 중립 기본값을 사용합니다 (RSI 50, MFI 50, Stochastic 50 등).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use screener_core::{CoreResult, PipelineConfig, ScreenerConfig, SymbolHistory};

use crate::divergence::{DivergenceDetector, DivergenceInputs, DivergenceResult};
use crate::indicators::{
    detect_bullish_pattern, relative_strength, AdxParams, AtrParams, BollingerBandsParams,
    BollingerPoint, BullishPattern, CciParams, EmaParams, IchimokuIndicator, IchimokuParams,
    IchimokuResult, MacdParams, MfiParams, MomentumIndicators, ParabolicSarIndicator,
    ParabolicSarParams, PriceColumns, RocParams, RsiParams, SarPoint, StochasticParams,
    SuperTrendIndicator, SuperTrendParams, SuperTrendPoint, TrendIndicators,
    VolatilityIndicators, VolumeIndicators, VwapParams, WilliamsRParams,
};
use crate::weekly::{WeeklyTrendAnalyzer, WeeklyTrendHealth};

/// 밴드폭 확장 비교 간격 (봉).
const BB_EXPANSION_LOOKBACK: usize = 5;
/// OBV 추세 판단 기간.
const OBV_TREND_LOOKBACK: usize = 20;

/// 종목 하나의 마지막 봉 기준 지표 스냅샷.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub symbol: String,
    pub sector: Option<String>,
    /// 마지막 봉 날짜
    pub date: NaiveDate,
    /// 사용한 일봉 수
    pub bars: usize,
    pub close: Decimal,

    // 유동성
    /// 최근 평균 거래대금 (종가 × 거래량)
    pub avg_turnover: Decimal,

    // 추세
    pub ema20: Decimal,
    pub ema50: Decimal,
    pub ema200: Decimal,
    pub adx: Decimal,
    pub plus_di: Decimal,
    pub minus_di: Decimal,
    pub macd: Decimal,
    pub macd_signal: Option<Decimal>,
    pub macd_histogram: Option<Decimal>,
    pub supertrend: Option<SuperTrendPoint>,
    pub sar: Option<SarPoint>,
    pub ichimoku: IchimokuResult,

    // 모멘텀
    pub rsi: Decimal,
    pub stoch_k: Decimal,
    pub stoch_d: Decimal,
    pub williams_r: Decimal,
    pub roc: Decimal,
    pub cci: Decimal,
    pub mfi: Decimal,

    // 변동성
    pub atr: Decimal,
    /// ATR / 종가 (%)
    pub atr_pct: Decimal,
    pub bollinger: Option<BollingerPoint>,
    /// 밴드폭이 5봉 전보다 큰지
    pub bb_expanding: bool,

    // 거래량
    pub obv: Decimal,
    pub obv_trending_up: bool,
    pub ad_line: Decimal,
    pub vwap: Option<Decimal>,
    pub volume: Decimal,
    /// 마지막 봉 이전 `volume_avg_period`봉 평균 거래량
    pub avg_volume: Decimal,
    /// 최근 3봉 거래량 (오래된 순)
    pub recent_volumes: [Decimal; 3],

    // 상대 지표
    /// 벤치마크 대비 3개월 상대강도 (%p)
    pub relative_strength_3m: Decimal,
    /// 주간 등락률 (%)
    pub week_change: Decimal,

    pub weekly: WeeklyTrendHealth,
    pub divergence: DivergenceResult,
    pub pattern: Option<BullishPattern>,
}

impl IndicatorSet {
    /// 종가가 EMA50 위인지 (섹터 시장폭 계산용).
    pub fn above_ema50(&self) -> bool {
        self.close > self.ema50
    }

    /// MACD 라인이 시그널 위이면서 0 위인지.
    pub fn macd_bullish(&self) -> bool {
        self.macd_signal
            .is_some_and(|signal| self.macd > signal && self.macd > Decimal::ZERO)
    }
}

/// 지표 스냅샷 계산기.
///
/// 설정에서 필요한 기간 값만 복사해 두므로 스레드 간 공유가 가능합니다.
#[derive(Debug, Default)]
pub struct IndicatorEngine {
    trend: TrendIndicators,
    momentum: MomentumIndicators,
    volatility: VolatilityIndicators,
    volume: VolumeIndicators,
    supertrend: SuperTrendIndicator,
    sar: ParabolicSarIndicator,
    ichimoku: IchimokuIndicator,
    weekly: WeeklyTrendAnalyzer,
    divergence: DivergenceDetector,
    settings: EngineSettings,
}

#[derive(Debug, Clone, Copy)]
struct EngineSettings {
    min_history_bars: usize,
    turnover_lookback: usize,
    volume_avg_period: usize,
    rs_period: usize,
    week_change_period: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&ScreenerConfig::default(), &PipelineConfig::default())
    }
}

impl EngineSettings {
    fn from_config(config: &ScreenerConfig, pipeline: &PipelineConfig) -> Self {
        Self {
            min_history_bars: pipeline.min_history_bars,
            turnover_lookback: config.turnover_lookback,
            volume_avg_period: config.volume_avg_period,
            rs_period: pipeline.rs_period,
            week_change_period: pipeline.week_change_period,
        }
    }
}

impl IndicatorEngine {
    pub fn new(config: &ScreenerConfig, pipeline: &PipelineConfig) -> Self {
        Self {
            divergence: DivergenceDetector::new(pipeline.divergence),
            settings: EngineSettings::from_config(config, pipeline),
            ..Self::default()
        }
    }

    /// 종목 하나의 지표 스냅샷을 계산합니다.
    ///
    /// 캔들 검증과 최소 히스토리 확인을 먼저 수행하며,
    /// 실패하면 `MalformedCandle` 또는 `InsufficientHistory`를 반환합니다.
    pub fn compute(
        &self,
        history: &SymbolHistory,
        benchmark_closes: &[Decimal],
    ) -> CoreResult<IndicatorSet> {
        history.validate()?;
        history.ensure_min_history(self.settings.min_history_bars.max(1))?;

        let candles = &history.candles;
        let cols = PriceColumns::from_candles(candles);
        let (high, low, close, volume) = (&cols.high, &cols.low, &cols.close, &cols.volume);
        let n = cols.len();
        let last_close = close[n - 1];
        let last = &candles[n - 1];

        // 추세
        let ema = |period| self.trend.ema(close, EmaParams { period });
        let ema20 = ema(20)?.last_or(last_close);
        let ema50 = ema(50)?.last_or(last_close);
        let ema200 = ema(200)?.last_or(last_close);
        let adx = self.trend.adx(high, low, close, AdxParams::default())?;
        let macd = self.trend.macd(close, MacdParams::default())?;
        let supertrend = self
            .supertrend
            .calculate(high, low, close, SuperTrendParams::default())?;
        let sar = self
            .sar
            .calculate(high, low, close, ParabolicSarParams::default())?;
        let ichimoku = self
            .ichimoku
            .calculate(high, low, close, IchimokuParams::default())?;

        // 모멘텀
        let rsi = self.momentum.rsi(close, RsiParams::default())?;
        let stoch = self
            .momentum
            .stochastic(high, low, close, StochasticParams::default())?;
        let williams = self
            .momentum
            .williams_r(high, low, close, WilliamsRParams::default())?;
        let roc = self.momentum.roc(close, RocParams::default())?;
        let cci = self.momentum.cci(high, low, close, CciParams::default())?;
        let mfi = self
            .momentum
            .mfi(high, low, close, volume, MfiParams::default())?;

        // 변동성
        let atr = self
            .volatility
            .atr(high, low, close, AtrParams::default())?
            .last_or(Decimal::ZERO);
        let bollinger = self
            .volatility
            .bollinger_bands(close, BollingerBandsParams::default())?;
        let bb_expanding = match (bollinger.last(), bollinger.ago(BB_EXPANSION_LOOKBACK)) {
            (Some(now), Some(before)) => now.bandwidth > before.bandwidth,
            _ => false,
        };

        // 거래량
        let obv = self.volume.obv(close, volume)?;
        let ad_line = self.volume.ad_line(high, low, close, volume)?;
        let vwap = self
            .volume
            .vwap(high, low, close, volume, VwapParams::default())?;

        let divergence = self.divergence.detect(&DivergenceInputs {
            closes: close,
            rsi: &rsi,
            macd_histogram: &macd.histogram,
            obv: &obv,
            mfi: &mfi,
        });

        let set = IndicatorSet {
            symbol: history.symbol.clone(),
            sector: history.sector.clone(),
            date: last.date,
            bars: n,
            close: last_close,
            avg_turnover: average_turnover(candles, self.settings.turnover_lookback),
            ema20,
            ema50,
            ema200,
            adx: adx.adx.last_or(Decimal::ZERO),
            plus_di: adx.plus_di.last_or(Decimal::ZERO),
            minus_di: adx.minus_di.last_or(Decimal::ZERO),
            macd: macd.macd.last_or(Decimal::ZERO),
            macd_signal: macd.signal.last().copied(),
            macd_histogram: macd.histogram.last().copied(),
            supertrend: supertrend.last().copied(),
            sar: sar.last().copied(),
            ichimoku,
            rsi: rsi.last_or(dec!(50)),
            stoch_k: stoch.k.last_or(dec!(50)),
            stoch_d: stoch.d.last_or(dec!(50)),
            williams_r: williams.last_or(dec!(-50)),
            roc: roc.last_or(Decimal::ZERO),
            cci: cci.last_or(Decimal::ZERO),
            mfi: mfi.last_or(dec!(50)),
            atr,
            atr_pct: self.volatility.atr_percent(atr, last_close),
            bollinger: bollinger.last().copied(),
            bb_expanding,
            obv_trending_up: self.volume.obv_trending_up(&obv, OBV_TREND_LOOKBACK),
            obv: obv.last_or(Decimal::ZERO),
            ad_line: ad_line.last_or(Decimal::ZERO),
            vwap: vwap.last().copied(),
            volume: last.volume,
            avg_volume: average_prior_volume(volume, self.settings.volume_avg_period),
            recent_volumes: recent_volumes(volume),
            relative_strength_3m: relative_strength(close, benchmark_closes, self.settings.rs_period),
            week_change: period_change(close, self.settings.week_change_period),
            weekly: self.weekly.analyze(candles)?,
            divergence,
            pattern: detect_bullish_pattern(candles),
        };

        tracing::trace!(
            symbol = %set.symbol,
            close = %set.close,
            rsi = %set.rsi,
            adx = %set.adx,
            "지표 계산 완료"
        );

        Ok(set)
    }
}

/// 최근 `lookback`봉 평균 거래대금.
fn average_turnover(candles: &[screener_core::Candle], lookback: usize) -> Decimal {
    let window = &candles[candles.len().saturating_sub(lookback)..];
    if window.is_empty() {
        return Decimal::ZERO;
    }
    window.iter().map(|c| c.turnover()).sum::<Decimal>() / Decimal::from(window.len())
}

/// 마지막 봉을 제외한 직전 `period`봉 평균 거래량.
fn average_prior_volume(volume: &[Decimal], period: usize) -> Decimal {
    let Some((_, prior)) = volume.split_last() else {
        return Decimal::ZERO;
    };
    let window = &prior[prior.len().saturating_sub(period)..];
    if window.is_empty() {
        return Decimal::ZERO;
    }
    window.iter().sum::<Decimal>() / Decimal::from(window.len())
}

/// 최근 3봉 거래량 (부족하면 앞쪽을 0으로 채움).
fn recent_volumes(volume: &[Decimal]) -> [Decimal; 3] {
    let mut out = [Decimal::ZERO; 3];
    let tail = &volume[volume.len().saturating_sub(3)..];
    out[3 - tail.len()..].copy_from_slice(tail);
    out
}

/// `period`봉 전 대비 등락률 (%). 히스토리가 부족하면 0.
fn period_change(close: &[Decimal], period: usize) -> Decimal {
    use screener_core::DecimalExt;

    let n = close.len();
    if period == 0 || n <= period {
        return Decimal::ZERO;
    }
    close[n - 1].pct_change_from(close[n - 1 - period])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use screener_core::{Candle, ScreenerError};

    fn history(n: usize, price_at: impl Fn(usize) -> Decimal) -> SymbolHistory {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let candles = (0..n)
            .map(|i| {
                let c = price_at(i);
                Candle::new(
                    start + Duration::days(i as i64),
                    c,
                    c + dec!(1),
                    c - dec!(1),
                    c,
                    dec!(100000),
                )
            })
            .collect();
        SymbolHistory::new("TEST", Some("IT".to_string()), candles)
    }

    #[test]
    fn test_flat_series_defaults() {
        let engine = IndicatorEngine::default();
        let flat = SymbolHistory::new(
            "FLAT",
            None,
            (0..300)
                .map(|i| {
                    Candle::new(
                        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + Duration::days(i),
                        dec!(100),
                        dec!(100),
                        dec!(100),
                        dec!(100),
                        dec!(1000),
                    )
                })
                .collect(),
        );
        let set = engine.compute(&flat, &[]).unwrap();

        assert_eq!(set.adx, Decimal::ZERO);
        assert_eq!(set.rsi, dec!(50));
        assert_eq!(set.stoch_k, dec!(50));
        assert_eq!(set.williams_r, dec!(-50));
        assert_eq!(set.cci, Decimal::ZERO);
        assert_eq!(set.mfi, dec!(50));
        assert_eq!(set.ema20, dec!(100));
        assert_eq!(set.ema200, dec!(100));
        assert_eq!(set.bollinger.unwrap().percent_b, dec!(0.5));
        assert!(!set.bb_expanding);
        assert_eq!(set.relative_strength_3m, Decimal::ZERO);
        assert!(set.divergence.divergences.is_empty());
    }

    #[test]
    fn test_uptrend_snapshot() {
        let engine = IndicatorEngine::default();
        let h = history(260, |i| dec!(100) + Decimal::from(i) * dec!(0.5));
        let bench: Vec<Decimal> = (0..260).map(|_| dec!(100)).collect();
        let set = engine.compute(&h, &bench).unwrap();

        assert_eq!(set.bars, 260);
        assert!(set.close > set.ema20 && set.ema20 > set.ema50 && set.ema50 > set.ema200);
        assert!(set.plus_di > set.minus_di);
        assert!(set.relative_strength_3m > Decimal::ZERO);
        assert!(set.supertrend.unwrap().is_uptrend);
        assert!(set.above_ema50());
        assert_eq!(set.recent_volumes, [dec!(100000); 3]);
        assert_eq!(set.avg_volume, dec!(100000));
    }

    #[test]
    fn test_short_history_is_rejected() {
        let engine = IndicatorEngine::default();
        let h = history(30, |_| dec!(50));
        let err = engine.compute(&h, &[]).unwrap_err();
        assert!(matches!(
            err,
            ScreenerError::InsufficientHistory {
                required: 60,
                provided: 30,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_candle_is_rejected() {
        let engine = IndicatorEngine::default();
        let mut h = history(80, |_| dec!(50));
        h.candles[10].low = dec!(60);
        let err = engine.compute(&h, &[]).unwrap_err();
        assert!(matches!(err, ScreenerError::MalformedCandle { index: 10, .. }));
    }

    #[test]
    fn test_helpers() {
        assert_eq!(recent_volumes(&[dec!(5)]), [dec!(0), dec!(0), dec!(5)]);
        assert_eq!(
            average_prior_volume(&[dec!(10), dec!(20), dec!(90)], 20),
            dec!(15)
        );
        assert_eq!(period_change(&[dec!(100), dec!(110)], 1), dec!(10));
        assert_eq!(period_change(&[dec!(100)], 5), Decimal::ZERO);
    }
}
