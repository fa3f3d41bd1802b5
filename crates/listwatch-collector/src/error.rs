//! 에러 타입 정의.

use std::fmt;

use listwatch_core::ListwatchError;
use listwatch_data::{CodecError, SinkError};

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 실행 중단 에러 (입력, 설정, 취소 등)
    Run(ListwatchError),
    /// 입력 파일 에러
    Input(String),
    /// 인코딩 에러
    Codec(CodecError),
    /// 출력 저장 에러
    Sink(SinkError),
}

impl CollectorError {
    /// 취소로 인한 종료인지 확인합니다.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Run(err) if err.is_cancelled())
    }
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run(e) => write!(f, "{}", e),
            Self::Input(msg) => write!(f, "Input error: {}", msg),
            Self::Codec(e) => write!(f, "Encoding error: {}", e),
            Self::Sink(e) => write!(f, "Output error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Run(e) => Some(e),
            Self::Codec(e) => Some(e),
            Self::Sink(e) => Some(e),
            Self::Input(_) => None,
        }
    }
}

impl From<ListwatchError> for CollectorError {
    fn from(err: ListwatchError) -> Self {
        Self::Run(err)
    }
}

impl From<CodecError> for CollectorError {
    fn from(err: CodecError) -> Self {
        Self::Codec(err)
    }
}

impl From<SinkError> for CollectorError {
    fn from(err: SinkError) -> Self {
        Self::Sink(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
