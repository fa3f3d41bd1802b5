//! 폼 제출로 CSV를 내려받는 소스 어댑터 (Nasdaq 기준 미달 목록).
//!
//! 1. 페이지를 열어 ASP.NET 상태 토큰(hidden 필드)을 수집
//! 2. 내보내기 버튼의 postback 폼을 직접 제출
//! 3. 다운로드된 CSV를 행으로 디코딩

use std::sync::Arc;

use async_trait::async_trait;
use listwatch_core::SourceName;
use tracing::{debug, info};

use super::{RawRecord, SourceAdapter, SourceTimeouts};
use crate::codec::TableCodec;
use crate::error::{SourceError, SourceResult};
use crate::fetcher::{PageFetcher, SessionFactory};

/// 내보내기 소스 정의.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSourceSpec {
    pub source: SourceName,
    pub url: String,
    /// 폼이 준비되었음을 알리는 셀렉터
    pub readiness_selector: String,
    /// `__EVENTTARGET`에 넣을 내보내기 버튼 이름
    pub event_target: String,
    /// 반드시 있어야 하는 상태 토큰
    pub required_tokens: Vec<String>,
    /// 있으면 함께 보내는 토큰
    pub optional_tokens: Vec<String>,
    /// 다운로드 파일에 반드시 있어야 하는 컬럼
    pub required_column: String,
}

/// 폼 제출/CSV 다운로드 어댑터.
pub struct ExportSourceAdapter {
    spec: ExportSourceSpec,
    sessions: Arc<dyn SessionFactory>,
    codec: Arc<dyn TableCodec>,
    timeouts: SourceTimeouts,
}

impl ExportSourceAdapter {
    pub fn new(
        spec: ExportSourceSpec,
        sessions: Arc<dyn SessionFactory>,
        codec: Arc<dyn TableCodec>,
        timeouts: SourceTimeouts,
    ) -> Self {
        Self {
            spec,
            sessions,
            codec,
            timeouts,
        }
    }

    pub fn spec(&self) -> &ExportSourceSpec {
        &self.spec
    }

    fn harvest_token(page: &mut dyn PageFetcher, name: &str) -> SourceResult<Option<String>> {
        let selector = format!("input[name='{}']", name);
        let found = page.query_selector_all(&selector)?;
        Ok(found.first().and_then(|el| page.attribute(*el, "value")))
    }

    async fn export(&self, page: &mut dyn PageFetcher) -> SourceResult<Vec<RawRecord>> {
        let source = self.spec.source;

        page.goto(&self.spec.url).await?;
        page.wait_for_selector(&self.spec.readiness_selector, self.timeouts.selector)
            .await?;

        let mut fields = vec![
            ("__EVENTTARGET".to_string(), self.spec.event_target.clone()),
            ("__EVENTARGUMENT".to_string(), String::new()),
        ];
        for name in &self.spec.required_tokens {
            let value = Self::harvest_token(page, name)?.ok_or_else(|| {
                SourceError::Parse(format!("상태 토큰 '{}'을(를) 찾을 수 없습니다", name))
            })?;
            fields.push((name.clone(), value));
        }
        for name in &self.spec.optional_tokens {
            if let Some(value) = Self::harvest_token(page, name)? {
                fields.push((name.clone(), value));
            }
        }

        debug!(source = %source, fields = fields.len(), "내보내기 폼 제출");
        page.submit_form(&self.spec.url, &fields).await?;
        let download = page.wait_for_download(self.timeouts.download).await?;

        let records = self
            .codec
            .decode(&download.bytes)
            .map_err(|e| SourceError::Parse(format!("내보내기 파일 디코딩 실패: {}", e)))?;

        if let Some(first) = records.first() {
            if !first.contains_key(&self.spec.required_column) {
                return Err(SourceError::Parse(format!(
                    "내보내기 파일에 '{}' 컬럼이 없습니다",
                    self.spec.required_column
                )));
            }
        }

        info!(
            source = %source,
            file = download.file_name.as_deref().unwrap_or("-"),
            rows = records.len(),
            "내보내기 파일 수신"
        );
        Ok(records)
    }
}

#[async_trait]
impl SourceAdapter for ExportSourceAdapter {
    fn source(&self) -> SourceName {
        self.spec.source
    }

    async fn fetch(&self) -> SourceResult<Vec<RawRecord>> {
        let mut session = self.sessions.open_session()?;
        let result = self.export(session.as_mut()).await;
        session.close().await;
        result
    }
}
