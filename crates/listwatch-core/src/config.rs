//! 설정 관리.
//!
//! 기본값 → TOML 파일(선택) → `LISTWATCH__` 환경 변수 순으로 덮어씁니다.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::{JoinMode, SourceName};
use crate::error::{ListwatchError, ListwatchResult};
use crate::logging::LogFormat;

/// 소스 요청에 사용하는 기본 User-Agent (데스크톱 브라우저).
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 스크래핑 설정
    pub scrape: ScrapeConfig,
    /// 재시도 설정
    pub retry: RetryConfig,
    /// 가격 조회 설정
    pub prices: PriceConfig,
    /// 리포트 설정
    pub report: ReportConfig,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: LogFormat,
    /// JSON 줄 형식으로 함께 남길 로그 파일
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// 스크래핑 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// 동시에 실행할 최대 소스 수 (소스당 세션 하나)
    pub max_concurrency: usize,
    /// 페이지 이동 타임아웃 (초)
    pub navigation_timeout_secs: u64,
    /// 셀렉터 대기 타임아웃 (초)
    pub selector_timeout_secs: u64,
    /// 다운로드 대기 타임아웃 (초)
    pub download_timeout_secs: u64,
    /// 셀렉터 대기 중 재조회 간격 (밀리초)
    pub poll_interval_ms: u64,
    /// 페이지네이션 최대 페이지 수
    pub max_pages: usize,
    /// 요청 User-Agent
    pub user_agent: String,
    /// 실행할 소스 목록
    pub sources: Vec<SourceName>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            navigation_timeout_secs: 60,
            selector_timeout_secs: 60,
            download_timeout_secs: 60,
            poll_interval_ms: 1000,
            max_pages: 50,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            sources: SourceName::all().to_vec(),
        }
    }
}

impl ScrapeConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.selector_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// 재시도 설정.
///
/// 일시적 장애(`SourceUnavailable`)에만 적용됩니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 시도 간 고정 대기 시간 (밀리초)
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// 가격 조회 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PriceConfig {
    /// 기준일 이전 조회 일수 (달력 기준)
    pub lookback_days: i64,
    /// 동시 조회 워커 수
    pub workers: usize,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            workers: 4,
        }
    }
}

/// 리포트 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 조인 방식
    pub join: JoinMode,
    /// 출력 디렉토리
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            join: JoinMode::Full,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    pub fn load(path: Option<&Path>) -> ListwatchResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        // 환경 변수로 오버라이드 (예: LISTWATCH__RETRY__MAX_ATTEMPTS=3)
        builder = builder.add_source(
            config::Environment::with_prefix("LISTWATCH")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 값의 범위를 검증합니다.
    pub fn validate(&self) -> ListwatchResult<()> {
        if self.retry.max_attempts == 0 {
            return Err(ListwatchError::Config(
                "retry.max_attempts는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.scrape.max_concurrency == 0 {
            return Err(ListwatchError::Config(
                "scrape.max_concurrency는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.scrape.max_pages == 0 {
            return Err(ListwatchError::Config(
                "scrape.max_pages는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.prices.workers == 0 {
            return Err(ListwatchError::Config(
                "prices.workers는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.prices.lookback_days < 1 {
            return Err(ListwatchError::Config(
                "prices.lookback_days는 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}
