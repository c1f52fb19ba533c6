//! 스크리닝을 위한 도메인 모델.

mod candle;
mod market_regime;
mod signal;

pub use candle::*;
pub use market_regime::*;
pub use signal::*;
