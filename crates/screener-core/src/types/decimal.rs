//! 정밀한 가격 계산을 위한 Decimal 유틸리티.
//!
//! 지표 계산은 모두 `Decimal`로 수행되어 동일한 입력에 대해
//! 항상 동일한 결과를 냅니다.

use rust_decimal::{Decimal, RoundingStrategy};

/// 가격 타입.
pub type Price = Decimal;

/// 거래량 타입.
pub type Quantity = Decimal;

/// 퍼센트 타입 (5 = 5%).
pub type Percentage = Decimal;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 분모가 0이면 `fallback`을 반환하는 나눗셈.
    fn div_or(&self, denominator: Decimal, fallback: Decimal) -> Decimal;

    /// `base` 대비 변화율(%)을 반환합니다. `base`가 0이면 0.
    fn pct_change_from(&self, base: Decimal) -> Percentage;

    /// 지정된 소수점 자릿수로 반올림합니다 (0.5는 0에서 먼 쪽으로).
    fn round_half_up(&self, dp: u32) -> Decimal;

    /// 퍼센트 문자열로 변환합니다 (예: "5.25%").
    fn to_percentage_string(&self) -> String;
}

impl DecimalExt for Decimal {
    fn div_or(&self, denominator: Decimal, fallback: Decimal) -> Decimal {
        if denominator.is_zero() {
            fallback
        } else {
            *self / denominator
        }
    }

    fn pct_change_from(&self, base: Decimal) -> Percentage {
        (*self - base).div_or(base, Decimal::ZERO) * Decimal::ONE_HUNDRED
    }

    fn round_half_up(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
    }

    fn to_percentage_string(&self) -> String {
        format!("{:.2}%", self)
    }
}
