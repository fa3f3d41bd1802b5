//! 상장 상태 소스 어댑터.
//!
//! 어댑터는 소스 하나에서 원시 행(`RawRecord`)만 추출합니다.
//! 도메인 타입으로의 변환은 `normalizer`가 담당합니다.

pub mod catalog;
pub mod export;
pub mod table;

pub use catalog::SourceCatalog;
pub use export::{ExportSourceAdapter, ExportSourceSpec};
pub use table::{CellRule, ColumnRule, Pagination, Readiness, TableSourceAdapter, TableSourceSpec};

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use listwatch_core::{ScrapeConfig, SourceName};

use crate::error::SourceResult;

/// 값을 찾지 못한 셀에 넣는 자리표시자.
pub const PLACEHOLDER: &str = "N/A";

/// 어댑터가 내보내는 원시 필드 키.
pub mod fields {
    pub const ISSUER: &str = "Issuer";
    pub const SYMBOL: &str = "Symbol";
    pub const DEFICIENCY: &str = "Deficiency";
    pub const DATE: &str = "Date";
    pub const INITIATION: &str = "Initiation";
    pub const NOTIFICATION_DATE: &str = "Notification Date";
    pub const REASON: &str = "Reason";
    pub const EFFECTIVE_DATE: &str = "Effective Date";
    pub const SECURITY_NAME: &str = "Security Name";
    pub const AFFECTED_ISSUES: &str = "Affected Issues";
}

/// 소스 행 하나의 원시 필드.
///
/// 키가 항상 있다고 가정하지 않습니다. 없는 키는 `get`에서 `None`입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// 빌더 형태의 `insert`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 어댑터 단계별 대기 시간.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceTimeouts {
    /// 페이지 로드/셀렉터 대기
    pub selector: Duration,
    /// 다운로드 대기
    pub download: Duration,
}

impl Default for SourceTimeouts {
    fn default() -> Self {
        Self {
            selector: Duration::from_secs(60),
            download: Duration::from_secs(60),
        }
    }
}

impl From<&ScrapeConfig> for SourceTimeouts {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            selector: config.selector_timeout(),
            download: config.download_timeout(),
        }
    }
}

/// 소스 하나에서 원시 행을 가져오는 어댑터.
///
/// 호출마다 새 세션을 열고, 성공/실패와 관계없이 닫습니다.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// 소스 식별자.
    fn source(&self) -> SourceName;

    /// 원시 행 추출.
    async fn fetch(&self) -> SourceResult<Vec<RawRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_absent_key() {
        let record = RawRecord::new().with(fields::SYMBOL, "ACME");
        assert_eq!(record.get(fields::SYMBOL), Some("ACME"));
        assert_eq!(record.get(fields::ISSUER), None);
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_raw_record_from_pairs() {
        let record: RawRecord = vec![("Symbol", "A"), ("Date", "2024-05-01")]
            .into_iter()
            .collect();
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["Date", "Symbol"]);
    }
}
