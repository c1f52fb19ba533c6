//! MarketRegime 계산기
//!
//! 벤치마크 지수의 종가, EMA20, EMA50, ADX(14)로 시장 레짐을 판정합니다.

use rust_decimal::Decimal;
use screener_core::{Candle, MarketRegime, MarketRegimeInfo, DEFAULT_MIN_ADX};

use crate::indicators::{AdxParams, EmaParams, IndicatorResult, PriceColumns, TrendIndicators};

/// 시장 레짐 판정.
///
/// 1. ADX < 20 → Sideways (추세 없음)
/// 2. 종가 > EMA50 그리고 EMA20 > EMA50 → Bull
/// 3. 종가 < EMA50 그리고 EMA20 < EMA50 → Bear
/// 4. 그 외 → Sideways (전환 구간)
pub fn classify_regime(close: Decimal, ema20: Decimal, ema50: Decimal, adx: Decimal) -> MarketRegime {
    if adx < DEFAULT_MIN_ADX {
        MarketRegime::Sideways
    } else if close > ema50 && ema20 > ema50 {
        MarketRegime::Bull
    } else if close < ema50 && ema20 < ema50 {
        MarketRegime::Bear
    } else {
        MarketRegime::Sideways
    }
}

/// MarketRegime 계산기
#[derive(Debug)]
pub struct MarketRegimeCalculator {
    trend: TrendIndicators,
    min_history_bars: usize,
}

impl MarketRegimeCalculator {
    /// 새 계산기 생성
    pub fn new(min_history_bars: usize) -> Self {
        Self {
            trend: TrendIndicators::new(),
            min_history_bars,
        }
    }

    /// 벤치마크 히스토리가 판정에 충분한지 확인합니다.
    pub fn has_sufficient_history(&self, benchmark: &[Candle]) -> bool {
        !benchmark.is_empty() && benchmark.len() >= self.min_history_bars
    }

    /// 벤치마크 캔들로 레짐을 계산합니다.
    ///
    /// 히스토리가 부족하면 Sideways와 "벤치마크 데이터 부족" 설명을 반환합니다.
    /// 변동성 지수는 설명에만 반영되며 판정에는 영향을 주지 않습니다.
    pub fn calculate(
        &self,
        benchmark: &[Candle],
        volatility_index: Option<Decimal>,
    ) -> IndicatorResult<MarketRegimeInfo> {
        if !self.has_sufficient_history(benchmark) {
            tracing::warn!(
                bars = benchmark.len(),
                required = self.min_history_bars,
                "벤치마크 히스토리 부족, 횡보장으로 간주"
            );
            return Ok(MarketRegimeInfo {
                regime: MarketRegime::Sideways,
                benchmark_close: benchmark.last().map(|c| c.close).unwrap_or_default(),
                benchmark_ema20: Decimal::ZERO,
                benchmark_ema50: Decimal::ZERO,
                benchmark_adx: Decimal::ZERO,
                volatility_index,
                description: with_volatility("벤치마크 데이터 부족".to_string(), volatility_index),
            });
        }

        let cols = PriceColumns::from_candles(benchmark);
        let close = cols.close.last().copied().unwrap_or_default();
        let ema20 = self.trend.ema(&cols.close, EmaParams { period: 20 })?.last_or(close);
        let ema50 = self.trend.ema(&cols.close, EmaParams { period: 50 })?.last_or(close);
        let adx = self
            .trend
            .adx(&cols.high, &cols.low, &cols.close, AdxParams { period: 14 })?
            .adx
            .last_or(Decimal::ZERO);

        let regime = classify_regime(close, ema20, ema50, adx);
        let reason = if adx < DEFAULT_MIN_ADX {
            format!("{} (추세 없음, ADX {:.1})", regime.description(), adx)
        } else {
            format!("{} (ADX {:.1})", regime.description(), adx)
        };

        tracing::info!(%regime, %close, %ema20, %ema50, %adx, "시장 레짐 판정");

        Ok(MarketRegimeInfo {
            regime,
            benchmark_close: close,
            benchmark_ema20: ema20,
            benchmark_ema50: ema50,
            benchmark_adx: adx,
            volatility_index,
            description: with_volatility(reason, volatility_index),
        })
    }
}

fn with_volatility(description: String, volatility_index: Option<Decimal>) -> String {
    match volatility_index {
        Some(vix) => format!("{}, 변동성 지수 {:.2}", description, vix),
        None => description,
    }
}
