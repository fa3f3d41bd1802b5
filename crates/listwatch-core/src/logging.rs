//! tracing 구독자 초기화.
//!
//! 콘솔 출력 형식과 레벨 필터는 `[logging]` 설정을 따르고 `RUST_LOG`, `LOG_FORMAT`이 우선합니다.
//! `logging.file`이 있으면 같은 이벤트를 JSON 줄 형식으로 파일에도 남깁니다.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::error::{ListwatchError, ListwatchResult};

/// 콘솔 로그 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 여러 줄, 색상 (개발용)
    #[default]
    Pretty,
    /// 로그 수집기용
    Json,
    /// 한 줄 형식
    Compact,
}

impl FromStr for LogFormat {
    type Err = ListwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(ListwatchError::Config(format!("알 수 없는 로그 형식: {}", s))),
        }
    }
}

/// 초기화에 쓰는 최종 로깅 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` 지시문 (예: "info,listwatch_data=debug")
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl LogConfig {
    /// `[logging]` 설정에 `RUST_LOG`, `LOG_FORMAT` 환경 변수를 반영합니다.
    pub fn from_settings(settings: &LoggingConfig) -> Self {
        Self::resolve(
            settings,
            std::env::var("RUST_LOG").ok(),
            std::env::var("LOG_FORMAT").ok(),
        )
    }

    fn resolve(
        settings: &LoggingConfig,
        rust_log: Option<String>,
        log_format: Option<String>,
    ) -> Self {
        let level = rust_log
            .filter(|level| !level.trim().is_empty())
            .unwrap_or_else(|| settings.level.clone());
        // 잘못된 LOG_FORMAT은 무시하고 설정값 사용
        let format = log_format
            .and_then(|format| format.parse().ok())
            .unwrap_or(settings.format);

        Self {
            level,
            format,
            file: settings.file.clone(),
        }
    }
}

/// 전역 구독자를 설치합니다. 프로세스당 한 번만 호출합니다.
pub fn init_logging(config: LogConfig) -> ListwatchResult<()> {
    let filter = EnvFilter::try_new(&config.level).map_err(|e| {
        ListwatchError::Config(format!("잘못된 로그 레벨 '{}': {}", config.level, e))
    })?;

    let console = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    let file = match &config.file {
        Some(path) => Some(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?))
                .boxed(),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| ListwatchError::Config(format!("로깅 초기화 실패: {}", e)))?;

    tracing::debug!(
        level = %config.level,
        format = ?config.format,
        file = ?config.file,
        "로깅 초기화"
    );
    Ok(())
}

/// 로그 파일을 추가 모드로 엽니다. 상위 디렉토리가 없으면 만듭니다.
fn open_log_file(path: &Path) -> ListwatchResult<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            ListwatchError::Config(format!("로그 디렉토리 생성 실패 ({}): {}", parent.display(), e))
        })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ListwatchError::Config(format!("로그 파일 열기 실패 ({}): {}", path.display(), e)))
}
