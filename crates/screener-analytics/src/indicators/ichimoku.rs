//! 일목균형표 (Ichimoku Cloud).
//!
//! - 전환선 (Tenkan) = 9봉 (최고가 + 최저가) / 2
//! - 기준선 (Kijun) = 26봉 (최고가 + 최저가) / 2
//! - 선행스팬 A = (전환선 + 기준선) / 2
//! - 선행스팬 B = 52봉 (최고가 + 최저가) / 2
//!
//! 스팬은 선행 이동 없이 마지막 봉 기준으로 평가합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{ensure_period, ensure_same_len, highest, lowest, IndicatorResult};

/// 일목균형표 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IchimokuParams {
    pub tenkan_period: usize,
    pub kijun_period: usize,
    pub senkou_b_period: usize,
}

impl Default for IchimokuParams {
    fn default() -> Self {
        Self {
            tenkan_period: 9,
            kijun_period: 26,
            senkou_b_period: 52,
        }
    }
}

/// 가격과 구름대의 위치 관계.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudPosition {
    /// 구름대 위
    Above,
    /// 구름대 아래
    Below,
    /// 구름대 내부 (또는 판단 불가)
    #[default]
    Inside,
}

/// 마지막 봉 기준 일목균형표 값.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IchimokuResult {
    pub tenkan: Option<Decimal>,
    pub kijun: Option<Decimal>,
    pub senkou_a: Option<Decimal>,
    pub senkou_b: Option<Decimal>,
    pub position: CloudPosition,
}

/// 일목균형표 계산기.
#[derive(Debug, Default)]
pub struct IchimokuIndicator;

impl IchimokuIndicator {
    pub fn new() -> Self {
        Self
    }

    /// 마지막 봉의 일목균형표 값과 구름대 위치를 계산합니다.
    ///
    /// 선행스팬 A 또는 B를 계산할 수 없으면 위치는 `Inside`입니다.
    pub fn calculate(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: IchimokuParams,
    ) -> IndicatorResult<IchimokuResult> {
        ensure_period(params.tenkan_period)?;
        ensure_period(params.kijun_period)?;
        ensure_period(params.senkou_b_period)?;
        ensure_same_len(&[high.len(), low.len(), close.len()])?;

        let tenkan = midpoint(high, low, params.tenkan_period);
        let kijun = midpoint(high, low, params.kijun_period);
        let senkou_a = tenkan.zip(kijun).map(|(t, k)| (t + k) / dec!(2));
        let senkou_b = midpoint(high, low, params.senkou_b_period);

        let position = match (senkou_a, senkou_b, close.last()) {
            (Some(a), Some(b), Some(price)) => {
                if *price > a.max(b) {
                    CloudPosition::Above
                } else if *price < a.min(b) {
                    CloudPosition::Below
                } else {
                    CloudPosition::Inside
                }
            }
            _ => CloudPosition::Inside,
        };

        Ok(IchimokuResult {
            tenkan,
            kijun,
            senkou_a,
            senkou_b,
            position,
        })
    }
}

/// 최근 `period`봉 (최고가 + 최저가) / 2.
fn midpoint(high: &[Decimal], low: &[Decimal], period: usize) -> Option<Decimal> {
    let n = high.len();
    if n < period {
        return None;
    }
    Some((highest(&high[n - period..]) + lowest(&low[n - period..])) / dec!(2))
}
