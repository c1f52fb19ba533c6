//! # Screener Core
//!
//! 주식 스크리너의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 스크리닝 파이프라인 전반에서 사용되는 기본 타입을 제공합니다:
//! - 일봉 캔들 및 종목 히스토리
//! - 시장 레짐과 레짐별 적응형 임계값
//! - 매매 신호 등급
//! - 설정 관리 및 유효성 검증
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
