//! HTML 표 기반 소스 어댑터.
//!
//! 페이지 이동 → 준비 대기 → 행 추출 → (다음 페이지가 있으면) 클릭 후 반복.
//! 페이지 수는 `Pagination::max_pages`를 넘지 않습니다.

use std::sync::Arc;

use async_trait::async_trait;
use listwatch_core::SourceName;
use tracing::{debug, info, warn};

use super::{RawRecord, SourceAdapter, SourceTimeouts, PLACEHOLDER};
use crate::error::{SourceError, SourceResult};
use crate::fetcher::{ElementHandle, PageFetcher, SessionFactory};

/// 셀 값을 읽는 방법.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellRule {
    /// 행 안에서 셀렉터와 일치하는 첫 요소의 텍스트
    Text(String),
    /// `cell` 안의 `item` 요소들의 텍스트를 ", "로 연결.
    /// `item`이 없으면 셀 텍스트 전체.
    Items { cell: String, item: String },
}

/// 원시 필드 하나의 추출 규칙.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRule {
    pub field: String,
    pub rule: CellRule,
}

impl ColumnRule {
    pub fn text(field: &str, selector: &str) -> Self {
        Self {
            field: field.to_string(),
            rule: CellRule::Text(selector.to_string()),
        }
    }

    pub fn items(field: &str, cell: &str, item: &str) -> Self {
        Self {
            field: field.to_string(),
            rule: CellRule::Items {
                cell: cell.to_string(),
                item: item.to_string(),
            },
        }
    }
}

/// 페이지 준비 조건.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    /// 요청이 모두 끝날 때까지 먼저 대기
    pub wait_for_load_idle: bool,
    /// 이 셀렉터가 나타날 때까지 대기
    pub selector: String,
}

/// 다음 페이지 버튼과 최대 페이지 수.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub next_selector: String,
    pub max_pages: usize,
}

/// 표 소스 정의.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSourceSpec {
    pub source: SourceName,
    pub url: String,
    pub readiness: Readiness,
    pub row_selector: String,
    pub columns: Vec<ColumnRule>,
    pub pagination: Option<Pagination>,
}

/// HTML 표 소스 어댑터.
pub struct TableSourceAdapter {
    spec: TableSourceSpec,
    sessions: Arc<dyn SessionFactory>,
    timeouts: SourceTimeouts,
}

impl TableSourceAdapter {
    pub fn new(
        spec: TableSourceSpec,
        sessions: Arc<dyn SessionFactory>,
        timeouts: SourceTimeouts,
    ) -> Self {
        Self {
            spec,
            sessions,
            timeouts,
        }
    }

    pub fn spec(&self) -> &TableSourceSpec {
        &self.spec
    }

    async fn await_ready(&self, page: &mut dyn PageFetcher) -> SourceResult<()> {
        if self.spec.readiness.wait_for_load_idle {
            page.wait_for_load_idle(self.timeouts.selector).await?;
        }
        page.wait_for_selector(&self.spec.readiness.selector, self.timeouts.selector)
            .await
    }

    async fn scrape(&self, page: &mut dyn PageFetcher) -> SourceResult<Vec<RawRecord>> {
        let source = self.spec.source;

        page.goto(&self.spec.url).await?;
        self.await_ready(page).await?;

        let mut records = Vec::new();
        let mut pages = 1;

        loop {
            let rows = self.extract_rows(page)?;
            debug!(source = %source, page = pages, rows = rows.len(), "페이지 추출");
            records.extend(rows);

            let Some(pagination) = &self.spec.pagination else {
                break;
            };
            let Some(next) = find_enabled(page, &pagination.next_selector)? else {
                break;
            };
            if pages >= pagination.max_pages {
                warn!(
                    source = %source,
                    pages,
                    rows = records.len(),
                    "페이지네이션 한도 도달, 부분 데이터 반환"
                );
                return Err(SourceError::Exhausted {
                    pages,
                    partial: records,
                });
            }

            page.click(next).await?;
            self.await_ready(page).await?;
            pages += 1;
        }

        info!(source = %source, pages, rows = records.len(), "소스 추출 완료");
        Ok(records)
    }

    fn extract_rows(&self, page: &mut dyn PageFetcher) -> SourceResult<Vec<RawRecord>> {
        let rows = page.query_selector_all(&self.spec.row_selector)?;
        rows.into_iter()
            .map(|row| self.extract_row(page, row))
            .collect()
    }

    fn extract_row(&self, page: &mut dyn PageFetcher, row: ElementHandle) -> SourceResult<RawRecord> {
        let mut record = RawRecord::new();
        for column in &self.spec.columns {
            let value = match &column.rule {
                CellRule::Text(selector) => {
                    let found = page.query_selector_all_within(row, selector)?;
                    found.first().and_then(|el| page.text_content(*el))
                }
                CellRule::Items { cell, item } => read_items(page, row, cell, item)?,
            };
            let value = value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| PLACEHOLDER.to_string());
            record.insert(column.field.as_str(), value);
        }
        Ok(record)
    }
}

fn read_items(
    page: &mut dyn PageFetcher,
    row: ElementHandle,
    cell: &str,
    item: &str,
) -> SourceResult<Option<String>> {
    let Some(&cell) = page.query_selector_all_within(row, cell)?.first() else {
        return Ok(None);
    };
    let items: Vec<String> = page
        .query_selector_all_within(cell, item)?
        .into_iter()
        .filter_map(|el| page.text_content(el))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    if items.is_empty() {
        Ok(page.text_content(cell))
    } else {
        Ok(Some(items.join(", ")))
    }
}

fn find_enabled(page: &mut dyn PageFetcher, selector: &str) -> SourceResult<Option<ElementHandle>> {
    let candidates = page.query_selector_all(selector)?;
    Ok(candidates.into_iter().find(|el| page.is_enabled(*el)))
}

#[async_trait]
impl SourceAdapter for TableSourceAdapter {
    fn source(&self) -> SourceName {
        self.spec.source
    }

    async fn fetch(&self) -> SourceResult<Vec<RawRecord>> {
        let mut session = self.sessions.open_session()?;
        let result = self.scrape(session.as_mut()).await;
        session.close().await;
        result
    }
}
