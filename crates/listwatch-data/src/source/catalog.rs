//! 소스 카탈로그.
//!
//! 다섯 소스의 URL, 준비 조건, 셀렉터, 페이지네이션 정의와
//! 실행마다 새 어댑터를 만드는 `SourceCatalog`.

use std::collections::HashMap;
use std::sync::Arc;

use listwatch_core::{ScrapeConfig, SourceName};

use super::export::{ExportSourceAdapter, ExportSourceSpec};
use super::fields;
use super::table::{ColumnRule, Pagination, Readiness, TableSourceAdapter, TableSourceSpec};
use super::{SourceAdapter, SourceTimeouts};
use crate::codec::TableCodec;
use crate::fetcher::SessionFactory;
use crate::pipeline::AdapterProvider;

const NASDAQ_NEXT_PAGE: &str = "a.rgPageNext, input.rgPageNext, button.rgPageNext";
const NASDAQ_EXPORT_TARGET: &str = "ctl00$MainContent$btnExport";

/// NYSE 기준 미달 발행사.
pub fn nyse_noncompliant_spec(url: &str) -> TableSourceSpec {
    TableSourceSpec {
        source: SourceName::NyseNoncompliant,
        url: url.to_string(),
        readiness: Readiness {
            wait_for_load_idle: false,
            selector: "table tbody tr".to_string(),
        },
        row_selector: "table tbody tr".to_string(),
        columns: vec![
            ColumnRule::text(fields::ISSUER, "td:nth-child(1)"),
            ColumnRule::items(fields::SYMBOL, "td:nth-child(2)", "span"),
            ColumnRule::text(fields::DEFICIENCY, "td:nth-child(4)"),
            ColumnRule::text(fields::DATE, "td:nth-child(5)"),
        ],
        pagination: None,
    }
}

/// NYSE 상장폐지.
pub fn nyse_delisting_spec(url: &str) -> TableSourceSpec {
    TableSourceSpec {
        source: SourceName::NyseDelisting,
        url: url.to_string(),
        readiness: Readiness {
            wait_for_load_idle: false,
            selector: "table tbody tr".to_string(),
        },
        row_selector: "table tbody tr".to_string(),
        columns: vec![
            ColumnRule::text(fields::ISSUER, "td:nth-child(1)"),
            ColumnRule::items(fields::SYMBOL, "td:nth-child(2)", "span"),
            ColumnRule::text(fields::INITIATION, "td:nth-child(3)"),
            ColumnRule::text(fields::NOTIFICATION_DATE, "td:nth-child(4)"),
        ],
        pagination: None,
    }
}

/// Nasdaq 거래정지/상장폐지 예정 (Telerik 그리드, 여러 페이지).
pub fn nasdaq_pending_suspension_spec(url: &str, max_pages: usize) -> TableSourceSpec {
    TableSourceSpec {
        source: SourceName::NasdaqPendingSuspension,
        url: url.to_string(),
        readiness: Readiness {
            wait_for_load_idle: true,
            selector: "tbody tr.rgRow".to_string(),
        },
        row_selector: "tbody tr.rgRow, tbody tr.rgAltRow".to_string(),
        columns: vec![
            ColumnRule::text(fields::ISSUER, "td:nth-child(1)"),
            ColumnRule::text(fields::SYMBOL, "td:nth-child(2)"),
            ColumnRule::text(fields::REASON, "td:nth-child(3)"),
            ColumnRule::text(fields::EFFECTIVE_DATE, "td:nth-child(5)"),
        ],
        pagination: Some(Pagination {
            next_selector: NASDAQ_NEXT_PAGE.to_string(),
            max_pages,
        }),
    }
}

/// Nasdaq Reg SHO threshold 목록.
pub fn nasdaq_threshold_spec(url: &str) -> TableSourceSpec {
    TableSourceSpec {
        source: SourceName::NasdaqThreshold,
        url: url.to_string(),
        readiness: Readiness {
            wait_for_load_idle: true,
            selector: "table tbody tr".to_string(),
        },
        row_selector: "table tbody tr".to_string(),
        columns: vec![
            ColumnRule::text(fields::SYMBOL, "td:nth-child(1)"),
            ColumnRule::text(fields::SECURITY_NAME, "td:nth-child(2)"),
            ColumnRule::text(fields::REASON, "td:nth-child(3)"),
            ColumnRule::text(fields::DATE, "td:nth-child(4)"),
        ],
        pagination: None,
    }
}

/// Nasdaq 기준 미달 기업 CSV 내보내기.
pub fn nasdaq_noncompliant_export_spec(url: &str) -> ExportSourceSpec {
    ExportSourceSpec {
        source: SourceName::NasdaqNoncompliantExport,
        url: url.to_string(),
        readiness_selector: "form".to_string(),
        event_target: NASDAQ_EXPORT_TARGET.to_string(),
        required_tokens: vec!["__VIEWSTATE".to_string(), "__EVENTVALIDATION".to_string()],
        optional_tokens: vec!["__VIEWSTATEGENERATOR".to_string()],
        required_column: fields::AFFECTED_ISSUES.to_string(),
    }
}

/// 선택된 소스의 어댑터를 만듭니다.
///
/// 어댑터는 상태를 갖지 않으며 세션은 `fetch` 호출마다 새로 열립니다.
pub struct SourceCatalog {
    sessions: Arc<dyn SessionFactory>,
    codec: Arc<dyn TableCodec>,
    timeouts: SourceTimeouts,
    max_pages: usize,
    sources: Vec<SourceName>,
    url_overrides: HashMap<SourceName, String>,
}

impl SourceCatalog {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        codec: Arc<dyn TableCodec>,
        config: &ScrapeConfig,
    ) -> Self {
        let mut sources = config.sources.clone();
        sources.sort();
        sources.dedup();

        Self {
            sessions,
            codec,
            timeouts: SourceTimeouts::from(config),
            max_pages: config.max_pages,
            sources,
            url_overrides: HashMap::new(),
        }
    }

    /// 소스의 URL을 바꿉니다 (미러, 로컬 테스트 서버 등).
    pub fn with_url(mut self, source: SourceName, url: impl Into<String>) -> Self {
        self.url_overrides.insert(source, url.into());
        self
    }

    pub fn sources(&self) -> &[SourceName] {
        &self.sources
    }

    fn url(&self, source: SourceName) -> &str {
        self.url_overrides
            .get(&source)
            .map(String::as_str)
            .unwrap_or_else(|| source.canonical_url())
    }

    /// 소스 하나의 어댑터.
    pub fn adapter(&self, source: SourceName) -> Box<dyn SourceAdapter> {
        let url = self.url(source);
        let table = |spec: TableSourceSpec| -> Box<dyn SourceAdapter> {
            Box::new(TableSourceAdapter::new(
                spec,
                Arc::clone(&self.sessions),
                self.timeouts,
            ))
        };

        match source {
            SourceName::NyseNoncompliant => table(nyse_noncompliant_spec(url)),
            SourceName::NyseDelisting => table(nyse_delisting_spec(url)),
            SourceName::NasdaqPendingSuspension => {
                table(nasdaq_pending_suspension_spec(url, self.max_pages))
            }
            SourceName::NasdaqThreshold => table(nasdaq_threshold_spec(url)),
            SourceName::NasdaqNoncompliantExport => Box::new(ExportSourceAdapter::new(
                nasdaq_noncompliant_export_spec(url),
                Arc::clone(&self.sessions),
                Arc::clone(&self.codec),
                self.timeouts,
            )),
        }
    }
}

impl AdapterProvider for SourceCatalog {
    fn adapters(&self) -> Vec<Box<dyn SourceAdapter>> {
        self.sources.iter().map(|&source| self.adapter(source)).collect()
    }
}
