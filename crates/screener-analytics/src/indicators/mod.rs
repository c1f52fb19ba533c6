//! 기술적 지표 모듈.
//!
//! 가격/거래량 배열을 받아 지표 시계열을 반환하는 순수 함수 모음입니다.
//! 모든 계산은 `Decimal`로 수행됩니다.
//!
//! # 지원 지표
//!
//! ## 추세 지표 (Trend Indicators)
//! - **SMA / EMA**: 단순/지수 이동평균
//! - **MACD**: 이동평균 수렴/확산
//! - **ADX / +DI / -DI**: 평균 방향성 지수
//! - **SuperTrend**, **Parabolic SAR**, **Ichimoku Cloud**
//!
//! ## 모멘텀 지표 (Momentum Indicators)
//! - **RSI** (Wilder), **Stochastic**, **Williams %R**, **ROC**, **CCI**, **MFI**
//!
//! ## 변동성 지표 (Volatility Indicators)
//! - **ATR** (Wilder), **Bollinger Bands** (%B, 밴드폭)
//!
//! ## 거래량 지표 (Volume Indicators)
//! - **OBV**, **A/D Line**, **VWAP**
//!
//! ## 상대강도
//! - 벤치마크 대비 초과 수익률
//!
//! # 시계열 정렬
//!
//! 지표 결과는 [`Series`]로 반환됩니다. `values[k]`는 입력의
//! `first_index + k`번째 봉에 해당하므로, 봉 인덱스로 직접 조회할 수 있습니다.
//!
//! 입력이 필요한 기간보다 짧으면 에러 대신 빈(또는 일부만 계산된)
//! 시계열을 반환합니다. 에러는 잘못된 파라미터에만 사용됩니다.
//!
//! # 사용 예시
//!
//! ```ignore
//! use screener_analytics::indicators::{MomentumIndicators, RsiParams};
//!
//! let rsi = MomentumIndicators::new().rsi(&closes, RsiParams::default())?;
//! let latest = rsi.last().copied().unwrap_or(dec!(50));
//! ```

pub mod candle_patterns;
pub mod ichimoku;
pub mod momentum;
pub mod parabolic_sar;
pub mod relative_strength;
pub mod supertrend;
pub mod trend;
pub mod volatility;
pub mod volume;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use screener_core::Candle;
use thiserror::Error;

pub use candle_patterns::{detect_bullish_pattern, BullishPattern};
pub use ichimoku::{CloudPosition, IchimokuIndicator, IchimokuParams, IchimokuResult};
pub use momentum::{
    CciParams, MfiParams, MomentumIndicators, RocParams, RsiParams, StochasticParams,
    StochasticResult, WilliamsRParams,
};
pub use parabolic_sar::{ParabolicSarIndicator, ParabolicSarParams, SarPoint};
pub use relative_strength::relative_strength;
pub use supertrend::{SuperTrendIndicator, SuperTrendParams, SuperTrendPoint};
pub use trend::{AdxParams, AdxResult, EmaParams, MacdParams, MacdResult, SmaParams, TrendIndicators};
pub use volatility::{AtrParams, BollingerBandsParams, BollingerPoint, VolatilityIndicators};
pub use volume::{VolumeIndicators, VwapParams};

/// 지표 계산 오류.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// 잘못된 파라미터 (기간 0, 입력 길이 불일치)
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

impl From<IndicatorError> for screener_core::ScreenerError {
    fn from(err: IndicatorError) -> Self {
        screener_core::ScreenerError::Indicator(err.to_string())
    }
}

/// 입력 봉 인덱스와 정렬된 지표 시계열.
///
/// `values[k]`는 입력의 `first_index + k`번째 봉 값입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series<T = Decimal> {
    /// 계산된 값
    pub values: Vec<T>,
    /// 첫 값이 대응하는 봉 인덱스
    pub first_index: usize,
}

impl<T> Series<T> {
    /// 새 시계열을 생성합니다.
    pub fn new(first_index: usize, values: Vec<T>) -> Self {
        Self {
            values,
            first_index,
        }
    }

    /// 길이 `input_len` 입력에 대한 빈 시계열.
    pub fn empty(input_len: usize) -> Self {
        Self {
            values: Vec::new(),
            first_index: input_len,
        }
    }

    /// 값 개수.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 값이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 마지막 값 다음 봉 인덱스 (배타적 끝).
    pub fn end_index(&self) -> usize {
        self.first_index + self.values.len()
    }

    /// `bar`번째 봉의 값.
    pub fn at(&self, bar: usize) -> Option<&T> {
        bar.checked_sub(self.first_index)
            .and_then(|k| self.values.get(k))
    }

    /// 가장 최근 값.
    pub fn last(&self) -> Option<&T> {
        self.values.last()
    }

    /// 가장 최근 값의 봉 인덱스.
    pub fn last_index(&self) -> Option<usize> {
        self.end_index().checked_sub(1).filter(|_| !self.is_empty())
    }

    /// 최근 값에서 `n`봉 이전 값.
    pub fn ago(&self, n: usize) -> Option<&T> {
        let k = self.values.len().checked_sub(n + 1)?;
        self.values.get(k)
    }

    /// (봉 인덱스, 값) 순회.
    pub fn iter_indexed(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(k, v)| (self.first_index + k, v))
    }

}

impl Series<Decimal> {
    /// 가장 최근 값, 없으면 중립 기본값.
    pub fn last_or(&self, default: Decimal) -> Decimal {
        self.last().copied().unwrap_or(default)
    }

    /// `bar`번째 봉 값 (복사).
    pub fn value_at(&self, bar: usize) -> Option<Decimal> {
        self.at(bar).copied()
    }
}

/// 캔들에서 추출한 열 데이터.
#[derive(Debug, Clone, Default)]
pub struct PriceColumns {
    pub open: Vec<Decimal>,
    pub high: Vec<Decimal>,
    pub low: Vec<Decimal>,
    pub close: Vec<Decimal>,
    pub volume: Vec<Decimal>,
}

impl PriceColumns {
    /// 캔들 목록을 열 단위로 분리합니다.
    pub fn from_candles(candles: &[Candle]) -> Self {
        let mut cols = Self {
            open: Vec::with_capacity(candles.len()),
            high: Vec::with_capacity(candles.len()),
            low: Vec::with_capacity(candles.len()),
            close: Vec::with_capacity(candles.len()),
            volume: Vec::with_capacity(candles.len()),
        };
        for c in candles {
            cols.open.push(c.open);
            cols.high.push(c.high);
            cols.low.push(c.low);
            cols.close.push(c.close);
            cols.volume.push(c.volume);
        }
        cols
    }

    /// 봉 개수.
    pub fn len(&self) -> usize {
        self.close.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }
}

// ==================== 공통 헬퍼 ====================

pub(crate) fn ensure_period(period: usize) -> IndicatorResult<()> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "기간은 0보다 커야 합니다".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_same_len(lens: &[usize]) -> IndicatorResult<()> {
    if lens.windows(2).any(|w| w[0] != w[1]) {
        return Err(IndicatorError::InvalidParameter(
            "입력 데이터의 길이가 일치하지 않습니다".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}

pub(crate) fn highest(values: &[Decimal]) -> Decimal {
    values.iter().copied().max().unwrap_or(Decimal::ZERO)
}

pub(crate) fn lowest(values: &[Decimal]) -> Decimal {
    values.iter().copied().min().unwrap_or(Decimal::ZERO)
}

/// Wilder 평활: `avg = (avg × (n-1) + x) / n`.
pub(crate) fn wilder_step(prev: Decimal, value: Decimal, period: usize) -> Decimal {
    let n = Decimal::from(period);
    (prev * (n - Decimal::ONE) + value) / n
}

/// 첫 `period`개 평균으로 시작하는 Wilder 평활 시계열.
///
/// `values[0]`이 입력 봉 `offset`에 대응할 때, 결과 첫 값은
/// `offset + period - 1`번째 봉에 놓입니다.
pub(crate) fn wilder_smooth(values: &[Decimal], period: usize, offset: usize) -> Series {
    if values.len() < period {
        return Series::empty(offset + values.len());
    }
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut avg = mean(&values[..period]);
    out.push(avg);
    for v in &values[period..] {
        avg = wilder_step(avg, *v, period);
        out.push(avg);
    }
    Series::new(offset + period - 1, out)
}
