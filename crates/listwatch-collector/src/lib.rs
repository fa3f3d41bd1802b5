//! Listing-status collector.
//!
//! 이 crate는 상장 상태 수집 바이너리를 제공합니다:
//! - 규제 목록 수집 (NYSE 2종, Nasdaq 3종)
//! - 요청 심볼의 최근 3거래일 종가 요약
//! - 두 결과를 조인한 리포트 저장

pub mod error;
pub mod input;
pub mod modules;
pub mod stats;

pub use error::{CollectorError, Result};
pub use stats::RunStats;
