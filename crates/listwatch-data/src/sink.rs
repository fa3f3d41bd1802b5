//! 결과 출력 대상.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use tracing::info;

use crate::error::SinkError;

/// 인코딩된 결과를 저장하고 위치를 돌려줍니다.
pub trait ReportSink: Send + Sync {
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<String, SinkError>;
}

/// `<prefix>_<YYYY-MM-DD>.<extension>` 형식의 파일명.
pub fn report_file_name(prefix: &str, as_of: NaiveDate, extension: &str) -> String {
    format!("{}_{}.{}", prefix, as_of.format("%Y-%m-%d"), extension)
}

/// 디렉토리에 파일로 저장합니다 (디렉토리는 필요할 때 생성).
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportSink for FileSink {
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<String, SinkError> {
        fs::create_dir_all(&self.dir).map_err(|source| SinkError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(file_name);
        fs::write(&path, bytes).map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), size = bytes.len(), "파일 저장 완료");
        Ok(path.display().to_string())
    }
}

/// 메모리에 보관하는 sink (임베딩/테스트용).
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 (파일명, 내용) 목록.
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        match self.files.lock() {
            Ok(files) => files.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ReportSink for MemorySink {
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<String, SinkError> {
        let mut files = match self.files.lock() {
            Ok(files) => files,
            Err(poisoned) => poisoned.into_inner(),
        };
        files.push((file_name.to_string(), bytes.to_vec()));
        Ok(format!("memory://{}", file_name))
    }
}
