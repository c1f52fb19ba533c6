//! 기본 타입 정의.

mod decimal;

pub use decimal::*;
