//! 소스 재시도 정책.
//!
//! 고정 간격으로 최대 `max_attempts`회 시도합니다. 재시도 여부는 predicate로 판단하며
//! 기본값은 `SourceError::is_retryable` (일시 장애만 재시도)입니다.

use std::future::Future;
use std::time::Duration;

use listwatch_core::{RetryConfig, SourceName};
use tracing::{error, warn};

use crate::error::{SourceError, SourceFailed, SourceResult};
use crate::source::{RawRecord, SourceAdapter};

/// 재시도 여부 판단 함수.
pub type RetryPredicate = fn(&SourceError) -> bool;

/// 재시도 후에도 실패한 소스.
#[derive(Debug)]
pub struct RetryError {
    pub source_name: SourceName,
    pub attempts: u32,
    pub last_error: SourceError,
}

impl RetryError {
    /// 호출자에게 보여줄 실패 정보.
    pub fn to_failure(&self) -> SourceFailed {
        SourceFailed {
            source_name: self.source_name,
            error_kind: self.last_error.kind(),
            message: self.last_error.to_string(),
            attempts: self.attempts,
        }
    }

    /// 한도 도달 시 남은 부분 데이터. 그 외에는 빈 목록.
    pub fn into_partial(self) -> Vec<RawRecord> {
        match self.last_error {
            SourceError::Exhausted { partial, .. } => partial,
            _ => Vec::new(),
        }
    }
}

/// 고정 간격 재시도 정책.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    retryable: RetryPredicate,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            retryable: SourceError::is_retryable,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.delay())
    }

    /// 재시도 판단 함수를 바꿉니다.
    pub fn with_retryable(mut self, retryable: RetryPredicate) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 작업을 정책에 따라 실행합니다.
    pub async fn run<T, F, Fut>(&self, source: SourceName, mut operation: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SourceResult<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && (self.retryable)(&err) => {
                    warn!(
                        source = %source,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %err,
                        "소스 조회 실패, 재시도 예정"
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(err) => {
                    if !matches!(err, SourceError::Exhausted { .. }) {
                        error!(source = %source, attempts = attempt, error = %err, "소스 조회 최종 실패");
                    }
                    return Err(RetryError {
                        source_name: source,
                        attempts: attempt,
                        last_error: err,
                    });
                }
            }
        }
    }

    /// 어댑터 조회를 정책에 따라 실행합니다.
    pub async fn execute(&self, adapter: &dyn SourceAdapter) -> Result<Vec<RawRecord>, RetryError> {
        self.run(adapter.source(), || adapter.fetch()).await
    }
}
