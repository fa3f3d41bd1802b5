//! 실행 단위 에러 타입.
//!
//! 소스 하나 또는 심볼 하나의 실패는 경고로 수집되며 여기에 속하지 않습니다.
//! 이 모듈의 에러는 실행 전체를 중단시키는 경우에만 사용됩니다.

use thiserror::Error;

/// 실행 전체를 중단시키는 에러.
#[derive(Debug, Error)]
pub enum ListwatchError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 입력 (빈 심볼 목록, 잘못된 심볼 형식 등)
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 필수 기능을 사용할 수 없음 (활성 소스 없음, 가격 제공자 생성 실패 등)
    #[error("필수 기능 사용 불가: {0}")]
    Capability(String),

    /// 호출자가 실행을 취소함
    #[error("실행이 취소되었습니다")]
    Cancelled,

    /// 입출력 에러
    #[error("입출력 에러: {0}")]
    Io(#[from] std::io::Error),
}

/// 실행 작업을 위한 Result 타입.
pub type ListwatchResult<T> = Result<T, ListwatchError>;

impl ListwatchError {
    /// 취소로 인한 에러인지 확인합니다.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ListwatchError::Cancelled)
    }

    /// 입력을 고쳐야 하는 에러인지 확인합니다.
    pub fn is_input_error(&self) -> bool {
        matches!(self, ListwatchError::InvalidInput(_))
    }
}

impl From<config::ConfigError> for ListwatchError {
    fn from(err: config::ConfigError) -> Self {
        ListwatchError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ListwatchError::Cancelled.is_cancelled());
        assert!(!ListwatchError::Config("x".to_string()).is_cancelled());
        assert!(ListwatchError::InvalidInput("empty".to_string()).is_input_error());
    }

    #[test]
    fn test_error_display() {
        let err = ListwatchError::InvalidInput("심볼 목록이 비어 있습니다".to_string());
        assert_eq!(err.to_string(), "잘못된 입력: 심볼 목록이 비어 있습니다");
    }
}
