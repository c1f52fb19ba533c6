//! 일봉 캔들 및 종목 히스토리.
//!
//! - `Candle` - 하루치 OHLCV
//! - `SymbolHistory` - 스크리닝 대상 종목의 전체 일봉 히스토리

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ScreenerError};
use crate::types::{Price, Quantity};

/// 일봉 OHLCV 캔들.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    pub volume: Quantity,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    pub fn new(
        date: NaiveDate,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Quantity,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 캔들 몸통 크기(절대값)를 반환합니다.
    pub fn body_size(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// 캔들 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 양봉(종가 > 시가)인지 확인합니다.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 음봉(종가 < 시가)인지 확인합니다.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// 대표가(고가+저가+종가 평균)를 반환합니다.
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }

    /// 거래대금(종가 × 거래량)을 반환합니다.
    pub fn turnover(&self) -> Decimal {
        self.close * self.volume
    }

    /// 상단 그림자 크기.
    pub fn upper_shadow(&self) -> Decimal {
        self.high - self.open.max(self.close)
    }

    /// 하단 그림자 크기.
    pub fn lower_shadow(&self) -> Decimal {
        self.open.min(self.close) - self.low
    }

    /// 캔들 자체의 정합성 문제를 설명으로 반환합니다.
    fn defect(&self) -> Option<&'static str> {
        if self.open <= Decimal::ZERO
            || self.high <= Decimal::ZERO
            || self.low <= Decimal::ZERO
            || self.close <= Decimal::ZERO
        {
            return Some("가격은 0보다 커야 합니다");
        }
        if self.high < self.low {
            return Some("고가가 저가보다 낮습니다");
        }
        if self.high < self.open.max(self.close) {
            return Some("고가가 시가/종가보다 낮습니다");
        }
        if self.low > self.open.min(self.close) {
            return Some("저가가 시가/종가보다 높습니다");
        }
        if self.volume < Decimal::ZERO {
            return Some("거래량이 음수입니다");
        }
        None
    }
}

/// 스크리닝 대상 종목의 일봉 히스토리.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolHistory {
    /// 종목 심볼
    pub symbol: String,
    /// 섹터명 (없으면 섹터 순위에서 제외)
    #[serde(default)]
    pub sector: Option<String>,
    /// 일봉 (날짜 오름차순)
    pub candles: Vec<Candle>,
}

impl SymbolHistory {
    /// 새 히스토리를 생성합니다.
    pub fn new(symbol: impl Into<String>, sector: Option<String>, candles: Vec<Candle>) -> Self {
        Self {
            symbol: symbol.into(),
            sector,
            candles,
        }
    }

    /// 캔들 정합성과 날짜 순서를 검사합니다.
    ///
    /// 첫 번째 문제 캔들에서 `MalformedCandle`을 반환합니다.
    pub fn validate(&self) -> CoreResult<()> {
        validate_candles(&self.symbol, &self.candles)
    }

    /// 최소 히스토리 길이를 확인합니다.
    pub fn ensure_min_history(&self, required: usize) -> CoreResult<()> {
        if self.candles.len() < required {
            return Err(ScreenerError::InsufficientHistory {
                symbol: self.symbol.clone(),
                required,
                provided: self.candles.len(),
            });
        }
        Ok(())
    }
}

/// 캔들 목록의 정합성을 검사합니다.
pub fn validate_candles(symbol: &str, candles: &[Candle]) -> CoreResult<()> {
    for (index, candle) in candles.iter().enumerate() {
        if let Some(reason) = candle.defect() {
            return Err(ScreenerError::MalformedCandle {
                symbol: symbol.to_string(),
                index,
                reason: reason.to_string(),
            });
        }
        if index > 0 && candles[index - 1].date >= candle.date {
            return Err(ScreenerError::MalformedCandle {
                symbol: symbol.to_string(),
                index,
                reason: "날짜가 오름차순이 아닙니다".to_string(),
            });
        }
    }
    Ok(())
}
