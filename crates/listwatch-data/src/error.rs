//! 소스/가격/코덱/출력 에러 타입.
//!
//! 소스 하나, 심볼 하나의 실패는 여기 정의된 타입으로 경계에서 붙잡혀
//! 구조화된 경고로 수집됩니다.

use std::fmt;
use std::path::PathBuf;

use listwatch_core::SourceName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::RawRecord;

/// 소스 에러 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    /// 네트워크/타임아웃 (재시도 가능)
    Unavailable,
    /// 구조 변경 등으로 필요한 요소가 없음 (재시도 불가)
    Parse,
    /// 페이지네이션 안전 한도 도달 (부분 데이터 유지)
    Exhausted,
    /// 실행 취소
    Cancelled,
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceErrorKind::Unavailable => write!(f, "unavailable"),
            SourceErrorKind::Parse => write!(f, "parse_error"),
            SourceErrorKind::Exhausted => write!(f, "exhausted"),
            SourceErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// 소스 어댑터 에러.
#[derive(Debug, Error)]
pub enum SourceError {
    /// 네트워크/연결/타임아웃 에러
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// 필요한 구조 요소가 없음
    #[error("Source parse error: {0}")]
    Parse(String),

    /// 페이지네이션 한도 도달, 그때까지 추출한 행을 포함
    #[error("Pagination limit reached after {pages} pages ({kept} rows kept)", kept = .partial.len())]
    Exhausted {
        pages: usize,
        partial: Vec<RawRecord>,
    },

    /// 실행 취소
    #[error("Cancelled")]
    Cancelled,
}

/// 소스 작업을 위한 Result 타입.
pub type SourceResult<T> = Result<T, SourceError>;

impl SourceError {
    /// 재시도 가능한 에러인지 확인.
    ///
    /// 구조 에러는 사이트 형식 변경으로 보고 재시도하지 않습니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }

    /// 에러 분류 반환.
    pub fn kind(&self) -> SourceErrorKind {
        match self {
            SourceError::Unavailable(_) => SourceErrorKind::Unavailable,
            SourceError::Parse(_) => SourceErrorKind::Parse,
            SourceError::Exhausted { .. } => SourceErrorKind::Exhausted,
            SourceError::Cancelled => SourceErrorKind::Cancelled,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            // timeout, connect, status, request, body 모두 일시 장애로 취급
            SourceError::Unavailable(err.to_string())
        }
    }
}

/// 소스 하나의 최종 실패 (호출자에게 표시).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{source_name} failed after {attempts} attempt(s) [{error_kind}]: {message}")]
pub struct SourceFailed {
    pub source_name: SourceName,
    pub error_kind: SourceErrorKind,
    pub message: String,
    pub attempts: u32,
}

/// 가격 제공자 에러.
#[derive(Debug, Error)]
pub enum PriceError {
    /// 제공자 연결 생성 실패
    #[error("Price provider connection error: {0}")]
    Connection(String),

    /// 심볼을 찾을 수 없음
    #[error("Symbol not resolved ({symbol}): {message}")]
    Unresolved { symbol: String, message: String },

    /// 조회 실패
    #[error("Price fetch error ({symbol}): {message}")]
    Fetch { symbol: String, message: String },

    /// 잘못된 조회 구간
    #[error("Invalid date range: {0}")]
    InvalidRange(String),
}

/// 가격 경고 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceWarningReason {
    /// 조회는 성공했으나 구간 내 데이터 없음 (요약은 모두 unknown으로 포함)
    NoData,
    /// 제공자 조회 실패 (요약은 모두 unknown으로 포함)
    FetchFailed,
    /// 심볼을 찾지 못함 (가격 쪽에서 제외)
    Unresolved,
}

impl fmt::Display for PriceWarningReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceWarningReason::NoData => write!(f, "no_data"),
            PriceWarningReason::FetchFailed => write!(f, "fetch_failed"),
            PriceWarningReason::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// 심볼별 가격 경고 (실행을 중단시키지 않음).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{symbol}: price data unavailable ({reason}): {message}")]
pub struct PriceDataUnavailable {
    pub symbol: String,
    pub reason: PriceWarningReason,
    pub message: String,
}

/// 표 인코딩/디코딩 에러.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// 출력 sink 에러.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink I/O error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
