//! 스크리너의 에러 타입.
//!
//! 종목 단위로 건너뛰는 결과(데이터 부족, 잘못된 캔들)와
//! 배치 시작 전에 즉시 실패해야 하는 설정 오류를 구분합니다.
//! 벤치마크 부족은 에러가 아니라 배치 경고로 보고됩니다.

use thiserror::Error;

/// 핵심 스크리너 에러.
#[derive(Debug, Error)]
pub enum ScreenerError {
    /// 설정 로드/역직렬화 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 설정 값 범위 오류
    #[error("설정 값 오류 ({field}): {reason}")]
    ConfigValidation { field: String, reason: String },

    /// 히스토리 부족
    #[error("히스토리 부족 ({symbol}): 필요 {required}개, 제공 {provided}개")]
    InsufficientHistory {
        symbol: String,
        required: usize,
        provided: usize,
    },

    /// 잘못된 캔들
    #[error("잘못된 캔들 ({symbol}, #{index}): {reason}")]
    MalformedCandle {
        symbol: String,
        index: usize,
        reason: String,
    },

    /// 지표 계산 에러
    #[error("지표 에러: {0}")]
    Indicator(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 취소됨
    #[error("작업이 취소되었습니다")]
    Cancelled,
}

/// 스크리너 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, ScreenerError>;

impl ScreenerError {
    /// 배치를 중단하지 않고 해당 종목만 건너뛰는 에러인지 확인합니다.
    pub fn is_symbol_skip(&self) -> bool {
        matches!(
            self,
            ScreenerError::InsufficientHistory { .. }
                | ScreenerError::MalformedCandle { .. }
                | ScreenerError::Indicator(_)
                | ScreenerError::Cancelled
        )
    }

    /// 계산 시작 전에 배치 전체를 실패시켜야 하는 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScreenerError::Config(_) | ScreenerError::ConfigValidation { .. }
        )
    }

    /// 설정 값 오류를 생성합니다.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ScreenerError::ConfigValidation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ScreenerError {
    fn from(err: serde_json::Error) -> Self {
        ScreenerError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ScreenerError {
    fn from(err: config::ConfigError) -> Self {
        ScreenerError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_skip() {
        let short = ScreenerError::InsufficientHistory {
            symbol: "AAPL".to_string(),
            required: 60,
            provided: 12,
        };
        assert!(short.is_symbol_skip());
        assert!(!short.is_fatal());

        let bad = ScreenerError::validation("min_adx", "음수일 수 없습니다");
        assert!(!bad.is_symbol_skip());
        assert!(bad.is_fatal());
    }

    #[test]
    fn test_error_message() {
        let err = ScreenerError::MalformedCandle {
            symbol: "MSFT".to_string(),
            index: 3,
            reason: "고가가 저가보다 낮습니다".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "잘못된 캔들 (MSFT, #3): 고가가 저가보다 낮습니다"
        );
    }
}
