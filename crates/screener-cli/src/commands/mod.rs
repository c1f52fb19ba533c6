//! CLI 명령어 구현 모듈.

pub mod data;
pub mod indicators;
pub mod init_config;
pub mod regime;
pub mod report;
pub mod screen;

// 각 서브모듈 직접 사용 권장 (ambiguous re-export 방지)
