//! 6단계 스크리닝 파이프라인.
//!
//! 지표 스냅샷과 섹터 맥락을 받아 점수(0~100), 신호, 근거를 산출합니다.
//!
//! # 단계 (앞 단계 통과 시에만 평가)
//!
//! 1. **유동성**: 평균 거래대금 ≥ 하한 (+15)
//! 2. **추세**: 정배열, ADX, 상대강도, MACD, SuperTrend (+10, 보조 확인 최대 +10, 주봉 +5/-10/0)
//! 3. **모멘텀**: EMA 근접, RSI 밴드, ROC, DI, Stochastic 중 3개 이상
//! 4. **거래량**: 평균 상회, MFI 건강, OBV 상승 중 2개 이상
//! 5. **변동성**: ATR% 상한 (필수), 밴드 확장 (선택)
//! 6. **리스크**: 주당 리스크 > 0
//!
//! 평가된 단계의 세부 점수는 통과 여부와 무관하게 합산되며,
//! ADX/상대강도 보너스와 섹터 가감점은 단계와 무관하게 적용됩니다.

pub mod phases;
pub mod rationale;
pub mod scoring;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use screener_core::{DecimalExt, EffectiveConfig, ScreenerConfig, Signal};

use crate::indicator_set::IndicatorSet;
use crate::indicators::CloudPosition;
use crate::sector_rotation::SectorContext;

pub use phases::{
    LiquidityDetail, MomentumDetail, Phase, PhaseDetails, PhaseStatus, PhaseTable, RiskBlock,
    RiskDetail, TrendDetail, VolatilityDetail, VolumeDetail,
};
pub use rationale::build_rationale;
pub use scoring::{classify_signal, clamp_score, risk_block, RsiTier, VolumeTrend};

use scoring::*;

/// 종목 하나의 스크리닝 결과.
///
/// 매 실행마다 새로 생성되며 생성 후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenerResult {
    pub symbol: String,
    pub sector: Option<String>,
    pub date: NaiveDate,
    pub close: Decimal,
    /// 단계별 통과 여부
    pub passed: PhaseTable<bool>,
    /// 단계별 상세 기록
    pub details: PhaseDetails,
    pub sector_context: SectorContext,
    /// [0, 100]으로 제한된 종합 점수
    pub overall_score: i32,
    pub signal: Signal,
    pub risk: RiskBlock,
    /// 고정 순서의 근거 문장
    pub rationale: Vec<String>,
}

impl ScreenerResult {
    /// 마지막으로 통과한 단계.
    pub fn last_passed_phase(&self) -> Option<Phase> {
        Phase::ALL
            .iter()
            .take_while(|p| self.passed[**p])
            .last()
            .copied()
    }
}

/// 결과를 점수 내림차순, 동점이면 심볼 오름차순으로 정렬합니다.
pub fn sort_results(results: &mut [ScreenerResult]) {
    results.sort_by(|a, b| {
        b.overall_score
            .cmp(&a.overall_score)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}

/// 6단계 스크리너.
///
/// 한 배치 동안 하나의 [`EffectiveConfig`]를 공유합니다.
#[derive(Debug, Clone)]
pub struct Screener {
    config: EffectiveConfig,
}

impl Screener {
    pub fn new(config: EffectiveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    fn params(&self) -> &ScreenerConfig {
        &self.config.params
    }

    /// 종목 하나를 평가합니다.
    pub fn evaluate(&self, set: &IndicatorSet, sector: &SectorContext) -> ScreenerResult {
        let params = self.params();
        let mut details = PhaseDetails::default();
        let mut score = 0;

        // 1단계: 유동성
        details.liquidity = self.liquidity(set);
        score += details.liquidity.score;

        // 2단계: 추세
        if details.liquidity.status.is_passed() {
            details.trend = self.trend(set);
            score += details.trend.score;
        }

        // 3단계: 모멘텀
        if details.trend.status.is_passed() {
            details.momentum = self.momentum(set);
            score += details.momentum.score;
        }

        // 4단계: 거래량
        if details.momentum.status.is_passed() {
            details.volume = self.volume(set);
            score += details.volume.score;
        }

        // 5단계: 변동성
        if details.volume.status.is_passed() {
            details.volatility = self.volatility(set);
            score += details.volatility.score;
        }

        let risk = risk_block(set.close, set.atr, params);

        // 6단계: 리스크
        if details.volatility.status.is_passed() {
            details.risk = RiskDetail {
                status: PhaseStatus::from_pass(risk.risk_per_share > Decimal::ZERO),
                risk_per_share: risk.risk_per_share,
            };
        }

        // 단계 무관 보너스
        if set.adx > STRONG_ADX_LEVEL {
            score += STRONG_ADX_POINTS;
        }
        if set.relative_strength_3m > STRONG_RS_LEVEL {
            score += STRONG_RS_POINTS;
        }
        score += sector.score_impact;

        let overall_score = clamp_score(score);
        let passed = details.passed();
        let signal = classify_signal(&passed, overall_score, params);
        let rationale = build_rationale(&details, sector, &set.divergence, &risk);

        tracing::debug!(
            symbol = %set.symbol,
            raw_score = score,
            overall_score,
            %signal,
            "종목 평가 완료"
        );

        ScreenerResult {
            symbol: set.symbol.clone(),
            sector: set.sector.clone(),
            date: set.date,
            close: set.close,
            passed,
            details,
            sector_context: sector.clone(),
            overall_score,
            signal,
            risk,
            rationale,
        }
    }

    fn liquidity(&self, set: &IndicatorSet) -> LiquidityDetail {
        let min_avg_turnover = self.params().min_avg_turnover;
        let passed = set.avg_turnover >= min_avg_turnover;
        LiquidityDetail {
            status: PhaseStatus::from_pass(passed),
            avg_turnover: set.avg_turnover,
            min_avg_turnover,
            score: if passed { LIQUIDITY_PASS_POINTS } else { 0 },
        }
    }

    fn trend(&self, set: &IndicatorSet) -> TrendDetail {
        let params = self.params();

        let ema_aligned = set.close > set.ema20 && set.ema20 > set.ema50 && set.ema50 > set.ema200;
        let macd_bullish = set.macd_bullish();
        let supertrend_up = set.supertrend.is_some_and(|st| st.is_uptrend);
        let sar_below_price = set.sar.is_some_and(|sar| sar.sar < set.close);
        let above_cloud = set.ichimoku.position == CloudPosition::Above;

        let passed = (!params.require_ema_alignment || ema_aligned)
            && set.adx >= params.min_adx
            && (!params.require_positive_rs || set.relative_strength_3m > Decimal::ZERO)
            && (!params.require_macd_bullish || macd_bullish)
            && (!params.require_supertrend_up || supertrend_up);

        let confirmation_score = [
            (macd_bullish, MACD_CONFIRM_POINTS),
            (supertrend_up, SUPERTREND_CONFIRM_POINTS),
            (sar_below_price, SAR_CONFIRM_POINTS),
            (above_cloud, CLOUD_CONFIRM_POINTS),
        ]
        .iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, points)| points)
        .sum::<i32>()
        .min(MAX_CONFIRMATION_POINTS);

        let weekly_status = set.weekly.status;
        let weekly_score = weekly_status.score();
        let pass_points = if passed { TREND_PASS_POINTS } else { 0 };

        TrendDetail {
            status: PhaseStatus::from_pass(passed),
            ema_aligned,
            adx: set.adx,
            min_adx: params.min_adx,
            relative_strength_3m: set.relative_strength_3m,
            macd_bullish,
            supertrend_up,
            sar_below_price,
            above_cloud,
            confirmation_score,
            weekly_status,
            weekly_score,
            score: pass_points + confirmation_score + weekly_score,
        }
    }

    fn momentum(&self, set: &IndicatorSet) -> MomentumDetail {
        let params = self.params();

        let ema_distance_pct = ema_distance_pct(set.close, set.ema20)
            .min(ema_distance_pct(set.close, set.ema50));
        let near_ema = ema_distance_pct <= params.ema_proximity_pct;
        let rsi_tier = RsiTier::classify(set.rsi);
        let rsi_in_band = set.rsi >= params.rsi_low && set.rsi <= params.rsi_high;
        let roc_positive = set.roc > Decimal::ZERO;
        let di_bullish = set.plus_di > set.minus_di;
        let stoch_bullish = set.stoch_k > STOCH_BULLISH_LEVEL;
        let macd_hist_positive = set.macd_histogram.is_some_and(|h| h > Decimal::ZERO);
        let divergence_score = set.divergence.net_score;

        let conditions_met = [near_ema, rsi_in_band, roc_positive, di_bullish, stoch_bullish]
            .iter()
            .filter(|c| **c)
            .count();

        let mut score = rsi_tier.score() + divergence_score;
        for (hit, points) in [
            (near_ema, PULLBACK_POINTS),
            (roc_positive, ROC_POINTS),
            (di_bullish, DI_POINTS),
            (stoch_bullish, STOCH_POINTS),
            (macd_hist_positive, MACD_HIST_POINTS),
            (set.pattern.is_some(), PATTERN_POINTS),
        ] {
            if hit {
                score += points;
            }
        }

        MomentumDetail {
            status: PhaseStatus::from_pass(conditions_met >= MOMENTUM_MIN_CONDITIONS),
            ema_distance_pct,
            near_ema,
            rsi: set.rsi,
            rsi_tier,
            rsi_in_band,
            roc_positive,
            di_bullish,
            stoch_bullish,
            macd_hist_positive,
            pattern: set.pattern,
            divergence_score,
            conditions_met,
            score,
        }
    }

    fn volume(&self, set: &IndicatorSet) -> VolumeDetail {
        let params = self.params();

        let obv_up = set.obv_trending_up;
        let volume_ratio = set.volume.div_or(set.avg_volume, Decimal::ZERO).round_half_up(2);
        let above_average = set.volume > set.avg_volume * params.volume_multiplier;
        let mfi_healthy = set.mfi >= params.mfi_low && set.mfi <= params.mfi_high;
        let volume_trend = VolumeTrend::classify(set.recent_volumes);

        let conditions_met = [above_average, mfi_healthy, params.use_obv && obv_up]
            .iter()
            .filter(|c| **c)
            .count();

        let mut score = volume_trend.score();
        for (hit, points) in [
            (obv_up, OBV_POINTS),
            (mfi_healthy, MFI_POINTS),
            (above_average, ABOVE_AVG_VOLUME_POINTS),
        ] {
            if hit {
                score += points;
            }
        }

        VolumeDetail {
            status: PhaseStatus::from_pass(conditions_met >= VOLUME_MIN_CONDITIONS),
            obv_up,
            volume_ratio,
            above_average,
            mfi: set.mfi,
            mfi_healthy,
            volume_trend,
            conditions_met,
            score,
        }
    }

    fn volatility(&self, set: &IndicatorSet) -> VolatilityDetail {
        let params = self.params();

        let atr_ok = set.atr_pct < params.max_atr_pct;
        let bb_expanding = set.bb_expanding;
        let upper_band = set
            .bollinger
            .is_some_and(|bb| bb.percent_b >= UPPER_BAND_PERCENT_B);

        let passed = atr_ok && (!params.require_bb_expansion || bb_expanding);

        let mut score = 0;
        for (hit, points) in [
            (atr_ok, ATR_POINTS),
            (bb_expanding, EXPANSION_POINTS),
            (upper_band, UPPER_BAND_POINTS),
        ] {
            if hit {
                score += points;
            }
        }

        VolatilityDetail {
            status: PhaseStatus::from_pass(passed),
            atr_pct: set.atr_pct,
            max_atr_pct: params.max_atr_pct,
            atr_ok,
            bb_expanding,
            upper_band,
            score,
        }
    }
}

/// 종가와 EMA 사이의 거리 (%). EMA가 0이면 최대 거리로 봅니다.
fn ema_distance_pct(close: Decimal, ema: Decimal) -> Decimal {
    if ema.is_zero() {
        return Decimal::MAX;
    }
    ((close - ema) / ema * Decimal::ONE_HUNDRED).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::divergence::DivergenceResult;
    use crate::indicators::{BollingerPoint, IchimokuResult, SarPoint, SuperTrendPoint};
    use crate::weekly::{WeeklyStatus, WeeklyTrendHealth};
    use rust_decimal_macros::dec;
    use screener_core::{AdaptiveThresholds, MarketRegime};

    /// 1~3단계를 통과하는 기본 스냅샷 (점수 조정 전).
    fn snapshot() -> IndicatorSet {
        IndicatorSet {
            symbol: "005930".to_string(),
            sector: Some("반도체".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            bars: 260,
            close: dec!(100),
            avg_turnover: dec!(5000000),
            ema20: dec!(98),
            ema50: dec!(95),
            ema200: dec!(90),
            adx: dec!(30),
            plus_di: dec!(28),
            minus_di: dec!(15),
            macd: dec!(-0.5),
            macd_signal: Some(dec!(-0.2)),
            macd_histogram: Some(dec!(-0.3)),
            supertrend: None,
            sar: None,
            ichimoku: IchimokuResult::default(),
            rsi: dec!(68),
            stoch_k: dec!(60),
            stoch_d: dec!(55),
            williams_r: dec!(-30),
            roc: dec!(2),
            cci: dec!(50),
            mfi: dec!(90),
            atr: dec!(8),
            atr_pct: dec!(8),
            bollinger: None,
            bb_expanding: false,
            obv: dec!(1000),
            obv_trending_up: false,
            ad_line: dec!(0),
            vwap: None,
            volume: dec!(1000),
            avg_volume: dec!(1000),
            recent_volumes: [dec!(1000); 3],
            relative_strength_3m: dec!(3),
            week_change: dec!(1),
            weekly: WeeklyTrendHealth {
                status: WeeklyStatus::Mixed,
                ..WeeklyTrendHealth::default()
            },
            divergence: DivergenceResult::default(),
            pattern: None,
        }
    }

    fn screener_for(regime: MarketRegime) -> Screener {
        let thresholds = AdaptiveThresholds::for_regime(regime);
        Screener::new(EffectiveConfig::resolve(
            &ScreenerConfig::default(),
            Some(&thresholds),
        ))
    }

    #[test]
    fn test_score_breakdown() {
        let result = screener_for(MarketRegime::Bull).evaluate(&snapshot(), &SectorContext::default());

        assert!(result.passed[Phase::Liquidity]);
        assert!(result.passed[Phase::Trend]);
        assert!(result.passed[Phase::Momentum]);
        assert!(!result.passed[Phase::Volume]);
        assert_eq!(result.details.volatility.status, PhaseStatus::NotEvaluated);

        // 15 + 10 + (5 + 2 + 4 + 4 + 3) - 3
        assert_eq!(result.details.momentum.rsi_tier, RsiTier::Caution);
        assert_eq!(result.details.volume.score, -3);
        assert_eq!(result.overall_score, 40);
        assert_eq!(result.signal, Signal::Watch);
    }

    #[test]
    fn test_bear_regime_degrades_buy_to_watch() {
        // 추세 확인 +10, MACD 히스토그램 +2, ADX 보너스 +3, 섹터 +5: 40 + 20 = 60
        let mut set = snapshot();
        set.macd = dec!(1.2);
        set.macd_signal = Some(dec!(0.8));
        set.macd_histogram = Some(dec!(0.4));
        set.supertrend = Some(SuperTrendPoint {
            value: dec!(92),
            is_uptrend: true,
        });
        set.sar = Some(SarPoint {
            sar: dec!(94),
            is_uptrend: true,
        });
        set.ichimoku.position = CloudPosition::Above;
        let sector = SectorContext {
            sector: Some("반도체".to_string()),
            rank: Some(1),
            total_sectors: 10,
            is_top: true,
            is_bottom: false,
            score_impact: 5,
        };
        set.adx = dec!(40);

        let bull = screener_for(MarketRegime::Bull).evaluate(&set, &sector);
        assert_eq!(bull.overall_score, 60);
        assert!(bull.passed.passed_through(Phase::Momentum));
        assert_eq!(bull.signal, Signal::Buy);

        let bear = screener_for(MarketRegime::Bear).evaluate(&set, &sector);
        // RSI 68은 약세장 밴드 [50, 60] 밖
        assert!(!bear.details.momentum.rsi_in_band);
        assert_eq!(bear.overall_score, 60);
        assert_eq!(bear.signal, Signal::Watch);
    }

    #[test]
    fn test_liquidity_failure_skips_later_phases() {
        let mut set = snapshot();
        set.avg_turnover = dec!(10);
        let result = screener_for(MarketRegime::Bull).evaluate(&set, &SectorContext::default());

        assert_eq!(result.details.liquidity.status, PhaseStatus::Failed);
        assert_eq!(result.details.trend.status, PhaseStatus::NotEvaluated);
        assert_eq!(result.details.risk.status, PhaseStatus::NotEvaluated);
        assert_eq!(result.overall_score, 0);
        assert_eq!(result.signal, Signal::Avoid);
        // 리스크 블록은 항상 계산
        assert_eq!(result.risk.stop_loss, dec!(84));
        assert_eq!(result.rationale.len(), 1);
    }

    #[test]
    fn test_full_pass_reaches_strong_buy() {
        let mut set = snapshot();
        set.rsi = dec!(50);
        set.mfi = dec!(60);
        set.obv_trending_up = true;
        set.volume = dec!(2000);
        set.recent_volumes = [dec!(800), dec!(1200), dec!(2000)];
        set.atr = dec!(2);
        set.atr_pct = dec!(2);
        set.bb_expanding = true;
        set.bollinger = Some(BollingerPoint {
            upper: dec!(101),
            middle: dec!(96),
            lower: dec!(91),
            percent_b: dec!(0.9),
            bandwidth: dec!(0.1),
        });
        set.macd = dec!(1.2);
        set.macd_signal = Some(dec!(0.8));
        set.macd_histogram = Some(dec!(0.4));
        set.supertrend = Some(SuperTrendPoint {
            value: dec!(92),
            is_uptrend: true,
        });
        set.weekly.status = WeeklyStatus::Aligned;
        set.adx = dec!(40);
        set.relative_strength_3m = dec!(12);

        let result = screener_for(MarketRegime::Bull).evaluate(&set, &SectorContext::default());

        assert!(result.passed.passed_through(Phase::Risk));
        assert_eq!(result.details.risk.status, PhaseStatus::Passed);
        assert_eq!(result.details.trend.confirmation_score, 6);
        assert_eq!(result.details.volume.volume_trend, VolumeTrend::Accelerating);
        assert_eq!(result.signal, Signal::StrongBuy);
        assert!(result.overall_score <= 100);
        assert_eq!(result.risk.stop_loss, dec!(96));
        assert_eq!(result.risk.target, dec!(108));
        assert_eq!(result.last_passed_phase(), Some(Phase::Risk));
    }

    #[test]
    fn test_score_is_clamped_at_zero() {
        let mut set = snapshot();
        set.weekly.status = WeeklyStatus::CounterTrend;
        set.rsi = dec!(90);
        set.divergence.net_score = -15;
        set.roc = dec!(-1);
        set.plus_di = dec!(5);
        set.stoch_k = dec!(10);
        set.avg_turnover = dec!(0);
        let sector = SectorContext {
            score_impact: -5,
            ..SectorContext::default()
        };
        let result = screener_for(MarketRegime::Bear).evaluate(&set, &sector);
        assert_eq!(result.overall_score, 0);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let screener = screener_for(MarketRegime::Sideways);
        let set = snapshot();
        let a = screener.evaluate(&set, &SectorContext::default());
        let b = screener.evaluate(&set, &SectorContext::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_sort_results() {
        let screener = screener_for(MarketRegime::Bull);
        let mut low = snapshot();
        low.symbol = "AAA".to_string();
        low.avg_turnover = dec!(0);
        let mut tie_b = snapshot();
        tie_b.symbol = "BBB".to_string();
        let mut tie_a = snapshot();
        tie_a.symbol = "ABC".to_string();

        let ctx = SectorContext::default();
        let mut results = vec![
            screener.evaluate(&low, &ctx),
            screener.evaluate(&tie_b, &ctx),
            screener.evaluate(&tie_a, &ctx),
        ];
        sort_results(&mut results);

        let symbols: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ABC", "BBB", "AAA"]);
    }

    #[test]
    fn test_ema_distance() {
        assert_eq!(ema_distance_pct(dec!(105), dec!(100)), dec!(5));
        assert_eq!(ema_distance_pct(dec!(95), dec!(100)), dec!(5));
        assert_eq!(ema_distance_pct(dec!(95), Decimal::ZERO), Decimal::MAX);
    }
}
