//! 스크리너 CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - CSV 일봉/섹터 매핑 로더
//! - 유니버스 배치 스크리닝과 보고서 출력
//! - 시장 레짐, 단일 종목 지표 조회
//! - 기본 설정 파일 생성

pub mod commands;
