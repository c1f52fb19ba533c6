//! 벤치마크 대비 상대강도.
//!
//! RS = 종목의 `period`봉 수익률(%) - 벤치마크의 `period`봉 수익률(%)

use rust_decimal::Decimal;

use screener_core::types::DecimalExt;

/// 최근 `period`봉 기준 종목과 벤치마크의 수익률 차이 (%p).
///
/// 어느 한쪽이라도 `period`봉 이하이거나 기준 가격이 0이면 0을 반환합니다.
pub fn relative_strength(symbol_closes: &[Decimal], benchmark_closes: &[Decimal], period: usize) -> Decimal {
    match (
        trailing_return(symbol_closes, period),
        trailing_return(benchmark_closes, period),
    ) {
        (Some(symbol), Some(benchmark)) => symbol - benchmark,
        _ => Decimal::ZERO,
    }
}

fn trailing_return(closes: &[Decimal], period: usize) -> Option<Decimal> {
    let n = closes.len();
    if period == 0 || n <= period {
        return None;
    }
    let base = closes[n - 1 - period];
    if base.is_zero() {
        return None;
    }
    Some(closes[n - 1].pct_change_from(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_relative_strength() {
        let symbol = vec![dec!(100), dec!(105), dec!(120)];
        let benchmark = vec![dec!(100), dec!(101), dec!(110)];
        // 20% - 10%
        assert_eq!(relative_strength(&symbol, &benchmark, 2), dec!(10));
    }

    #[test]
    fn test_relative_strength_short_benchmark() {
        let symbol: Vec<Decimal> = (1..=100).map(Decimal::from).collect();
        let benchmark: Vec<Decimal> = (1..=30).map(Decimal::from).collect();
        assert_eq!(relative_strength(&symbol, &benchmark, 63), Decimal::ZERO);
        assert_eq!(relative_strength(&symbol, &[], 63), Decimal::ZERO);
    }

    #[test]
    fn test_relative_strength_exact_period_length_is_zero() {
        let closes: Vec<Decimal> = (1..=63).map(Decimal::from).collect();
        assert_eq!(relative_strength(&closes, &closes, 63), Decimal::ZERO);
    }
}
