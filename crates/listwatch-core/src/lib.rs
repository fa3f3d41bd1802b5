//! # Listwatch Core
//!
//! 상장 상태 수집기의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 파이프라인 전반에서 사용되는 기본 타입을 제공합니다:
//! - 상장 이벤트 (`ListingEvent`) 및 소스 식별자 (`SourceName`)
//! - 최근 종가 요약 (`PriceSummary`)
//! - 최종 리포트 행 (`ReportRow`, `Report`)
//! - 심볼 정규화
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
