//! 페이지 조회 기능.
//!
//! 어댑터는 이 trait만 사용하며 구체적인 구현(HTTP, 테스트 스텁 등)은
//! `SessionFactory`를 통해 주입됩니다. 세션 하나는 소스 하나가 독점합니다.

mod http;

pub use http::{HttpFetcherSettings, HttpPageFetcher, HttpSessionFactory};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SourceResult;

/// 현재 페이지의 요소 참조.
///
/// 페이지가 바뀌면(이동, 클릭, 폼 제출) 이전 핸들은 무효가 됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    pub(crate) generation: u64,
    pub(crate) slot: usize,
}

impl ElementHandle {
    /// 구현체가 핸들을 발급할 때 사용합니다.
    pub fn new(generation: u64, slot: usize) -> Self {
        Self { generation, slot }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// 다운로드된 파일.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// 요청 URL
    pub url: String,
    /// Content-Disposition의 파일명
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// 페이지 조회/조작 기능.
///
/// 셀렉터 문법은 CSS 셀렉터입니다. 잘못된 셀렉터는 `SourceError::Parse`입니다.
#[async_trait]
pub trait PageFetcher: Send {
    /// URL로 이동합니다.
    async fn goto(&mut self, url: &str) -> SourceResult<()>;

    /// 셀렉터와 일치하는 요소가 나타날 때까지 대기합니다.
    ///
    /// 시간 초과는 `SourceError::Unavailable`입니다.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> SourceResult<()>;

    /// 진행 중인 요청이 끝날 때까지 대기합니다.
    async fn wait_for_load_idle(&mut self, timeout: Duration) -> SourceResult<()>;

    /// 문서 전체에서 셀렉터와 일치하는 요소 (문서 순서).
    fn query_selector_all(&mut self, selector: &str) -> SourceResult<Vec<ElementHandle>>;

    /// `scope` 요소의 하위에서 셀렉터와 일치하는 요소 (문서 순서).
    fn query_selector_all_within(
        &mut self,
        scope: ElementHandle,
        selector: &str,
    ) -> SourceResult<Vec<ElementHandle>>;

    /// 요소의 텍스트. 무효 핸들이면 `None`.
    fn text_content(&self, element: ElementHandle) -> Option<String>;

    /// 요소의 속성 값. 속성이 없거나 무효 핸들이면 `None`.
    fn attribute(&self, element: ElementHandle, name: &str) -> Option<String>;

    /// 클릭 가능한 상태인지 확인합니다.
    fn is_enabled(&self, element: ElementHandle) -> bool;

    /// 요소를 클릭합니다 (링크 이동 또는 폼 postback).
    async fn click(&mut self, element: ElementHandle) -> SourceResult<()>;

    /// 폼 필드를 POST로 제출합니다.
    async fn submit_form(&mut self, url: &str, fields: &[(String, String)]) -> SourceResult<()>;

    /// 직전 동작으로 시작된 다운로드를 받습니다.
    async fn wait_for_download(&mut self, timeout: Duration) -> SourceResult<Download>;

    /// 세션 자원을 해제합니다.
    async fn close(&mut self) {}
}

/// 소스마다 독립된 세션을 만듭니다.
pub trait SessionFactory: Send + Sync {
    fn open_session(&self) -> SourceResult<Box<dyn PageFetcher>>;
}
