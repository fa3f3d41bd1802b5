//! reqwest + scraper 기반 `PageFetcher`.
//!
//! 스크립트를 실행하지 않는 대신 서버 렌더링 페이지에서 브라우저가 하던 일을 재현합니다:
//! - 셀렉터 대기: 요소가 나타날 때까지 GET 페이지를 주기적으로 다시 조회
//! - 링크 클릭: href로 이동
//! - ASP.NET postback (`__doPostBack`, submit 버튼): hidden 필드를 모아 폼 POST
//! - 첨부 파일/비 HTML 응답: 대기 중인 다운로드로 보관
//! - `<meta http-equiv="refresh">` 내보내기 대기 페이지: 다운로드 대기 중 지정 URL로 이동
//!
//! 페이지는 이동할 때 한 번만 파싱하고, 이후 조회는 캐시된 문서와 요소 순서 색인을 사용합니다
//! (`scraper`의 `atomic` 기능으로 `Html`이 `Send`).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ego_tree::NodeId;
use listwatch_core::{ScrapeConfig, DEFAULT_USER_AGENT};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_DISPOSITION, CONTENT_TYPE,
};
use reqwest::{Client, Method, Url};
use scraper::{ElementRef, Html, Selector};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, trace};

use super::{Download, ElementHandle, PageFetcher, SessionFactory};
use crate::error::{SourceError, SourceResult};

/// HTTP 세션 설정.
#[derive(Debug, Clone)]
pub struct HttpFetcherSettings {
    pub user_agent: String,
    /// 요청 하나의 최대 시간
    pub navigation_timeout: Duration,
    /// 셀렉터 대기 중 재조회 간격
    pub poll_interval: Duration,
}

impl Default for HttpFetcherSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            navigation_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl From<&ScrapeConfig> for HttpFetcherSettings {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            navigation_timeout: config.navigation_timeout(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// 세션마다 쿠키 저장소가 분리된 `HttpPageFetcher`를 만듭니다.
#[derive(Debug, Clone, Default)]
pub struct HttpSessionFactory {
    settings: HttpFetcherSettings,
}

impl HttpSessionFactory {
    pub fn new(settings: HttpFetcherSettings) -> Self {
        Self { settings }
    }

    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(HttpFetcherSettings::from(config))
    }
}

impl SessionFactory for HttpSessionFactory {
    fn open_session(&self) -> SourceResult<Box<dyn PageFetcher>> {
        Ok(Box::new(HttpPageFetcher::new(self.settings.clone())?))
    }
}

struct LoadedPage {
    url: Url,
    method: Method,
    document: ParsedDocument,
}

/// 파싱된 문서와 전위 순회 순서 색인.
struct ParsedDocument {
    html: Html,
    nodes: Vec<NodeId>,
    order: HashMap<NodeId, usize>,
}

impl ParsedDocument {
    fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        let nodes: Vec<NodeId> = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .map(|element| element.id())
            .collect();
        let order = nodes
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();

        Self { html, nodes, order }
    }

    fn element(&self, index: usize) -> Option<ElementRef<'_>> {
        let id = *self.nodes.get(index)?;
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    /// `scope` 순서의 요소 안(없으면 문서 전체)에서 셀렉터와 일치하는 요소.
    fn select(&self, scope: Option<usize>, selector: &Selector) -> Vec<ElementData> {
        let matches: Vec<ElementRef<'_>> = match scope {
            None => self.html.select(selector).collect(),
            Some(index) => match self.element(index) {
                Some(element) => element.select(selector).collect(),
                None => Vec::new(),
            },
        };

        matches
            .into_iter()
            .filter_map(|element| {
                self.order
                    .get(&element.id())
                    .map(|&index| ElementData::capture(index, element))
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
struct ElementData {
    /// 문서 내 요소의 전위 순회 순서
    order: usize,
    tag: String,
    text: String,
    attrs: HashMap<String, String>,
}

impl ElementData {
    fn capture(order: usize, element: ElementRef<'_>) -> Self {
        let text = element
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let attrs = element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        Self {
            order,
            tag: element.value().name().to_ascii_lowercase(),
            text,
            attrs,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    fn is_enabled(&self) -> bool {
        if self.attrs.contains_key("disabled") {
            return false;
        }
        if let Some(class) = self.attr("class") {
            if class
                .split_whitespace()
                .any(|c| c.eq_ignore_ascii_case("disabled") || c.ends_with("Disabled"))
            {
                return false;
            }
        }
        if let Some(onclick) = self.attr("onclick") {
            let compact: String = onclick.split_whitespace().collect();
            if compact.starts_with("returnfalse") {
                return false;
            }
        }
        if self.tag == "a" {
            let has_href = self
                .attr("href")
                .map(|h| {
                    let h = h.trim();
                    !h.is_empty() && h != "#"
                })
                .unwrap_or(false);
            return has_href || self.attr("onclick").is_some_and(|s| s.contains("__doPostBack"));
        }
        true
    }

    fn is_submit(&self) -> bool {
        let kind = self.attr("type").map(|t| t.to_ascii_lowercase());
        match self.tag.as_str() {
            "button" => kind.is_none() || kind.as_deref() == Some("submit"),
            "input" => matches!(kind.as_deref(), Some("submit") | Some("image")),
            _ => false,
        }
    }
}

/// reqwest + scraper 기반 페이지 세션.
pub struct HttpPageFetcher {
    client: Client,
    settings: HttpFetcherSettings,
    page: Option<LoadedPage>,
    generation: u64,
    elements: Vec<ElementData>,
    pending_download: Option<Download>,
}

impl HttpPageFetcher {
    pub fn new(settings: HttpFetcherSettings) -> SourceResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(settings.navigation_timeout)
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| SourceError::Unavailable(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            settings,
            page: None,
            generation: 0,
            elements: Vec::new(),
            pending_download: None,
        })
    }

    /// 현재 페이지 URL.
    pub fn current_url(&self) -> Option<&str> {
        self.page.as_ref().map(|p| p.url.as_str())
    }

    fn resolve(&self, target: &str) -> SourceResult<Url> {
        let resolved = match &self.page {
            Some(page) => page.url.join(target),
            None => Url::parse(target),
        };
        resolved.map_err(|e| SourceError::Parse(format!("잘못된 URL '{}': {}", target, e)))
    }

    async fn navigate(
        &mut self,
        method: Method,
        url: Url,
        form: Option<&[(String, String)]>,
    ) -> SourceResult<()> {
        let limit = self.settings.navigation_timeout;
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(fields) = form {
            request = request.form(fields);
        }

        trace!(method = %method, url = %url, "요청 전송");

        let response = timeout(limit, request.send())
            .await
            .map_err(|_| SourceError::Unavailable(format!("페이지 이동 시간 초과: {}", url)))??;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "HTTP {} 응답: {}",
                status, url
            )));
        }

        let final_url = response.url().clone();
        let content_type = header_value(response.headers(), CONTENT_TYPE);
        let disposition = header_value(response.headers(), CONTENT_DISPOSITION);

        let body = timeout(limit, response.bytes())
            .await
            .map_err(|_| SourceError::Unavailable(format!("응답 수신 시간 초과: {}", url)))??;

        if is_download(content_type.as_deref(), disposition.as_deref(), &body) {
            debug!(url = %final_url, size = body.len(), "다운로드 수신");
            self.pending_download = Some(Download {
                url: final_url.to_string(),
                file_name: disposition.as_deref().and_then(attachment_file_name),
                content_type,
                bytes: body.to_vec(),
            });
            return Ok(());
        }

        let document = ParsedDocument::parse(&String::from_utf8_lossy(&body));
        trace!(url = %final_url, elements = document.nodes.len(), "페이지 파싱");
        self.page = Some(LoadedPage {
            url: final_url,
            method,
            document,
        });
        self.generation += 1;
        self.elements.clear();
        Ok(())
    }

    /// 현재 GET 페이지를 다시 조회합니다. POST 결과 페이지는 다시 제출하지 않습니다.
    async fn reload(&mut self) -> SourceResult<()> {
        let Some((method, url)) = self.page.as_ref().map(|p| (p.method.clone(), p.url.clone()))
        else {
            return Err(not_loaded());
        };
        if method == Method::GET {
            self.navigate(Method::GET, url, None).await?;
        }
        Ok(())
    }

    fn element(&self, handle: ElementHandle) -> Option<&ElementData> {
        if handle.generation != self.generation {
            return None;
        }
        self.elements.get(handle.slot)
    }

    fn select(&self, scope: Option<ElementHandle>, selector: &str) -> SourceResult<Vec<ElementData>> {
        let page = self.page.as_ref().ok_or_else(not_loaded)?;
        let parsed = parse_selector(selector)?;
        let scope_order = match scope {
            Some(handle) => Some(self.element(handle).ok_or_else(stale_handle)?.order),
            None => None,
        };

        Ok(page.document.select(scope_order, &parsed))
    }

    fn register(&mut self, found: Vec<ElementData>) -> Vec<ElementHandle> {
        let generation = self.generation;
        found
            .into_iter()
            .map(|data| {
                self.elements.push(data);
                ElementHandle::new(generation, self.elements.len() - 1)
            })
            .collect()
    }

    /// 현재 폼의 action URL과 hidden 필드.
    fn form_state(&self) -> SourceResult<(Url, Vec<(String, String)>)> {
        let page = self.page.as_ref().ok_or_else(not_loaded)?;

        let fields = self
            .select(None, "input[type='hidden']")?
            .into_iter()
            .filter_map(|data| {
                let name = data.attr("name")?.to_string();
                let value = data.attr("value").unwrap_or_default().to_string();
                Some((name, value))
            })
            .collect();

        let action = self
            .select(None, "form")?
            .into_iter()
            .next()
            .and_then(|form| form.attr("action").map(str::to_string))
            .filter(|action| !action.trim().is_empty());

        let url = match action {
            Some(action) => self.resolve(&action)?,
            None => page.url.clone(),
        };
        Ok((url, fields))
    }

    /// 현재 페이지의 meta refresh (지연, 이동할 URL).
    fn meta_refresh(&self) -> SourceResult<Option<(Duration, String)>> {
        let Some(page) = self.page.as_ref() else {
            return Ok(None);
        };

        let refresh = self
            .select(None, "meta[http-equiv]")?
            .into_iter()
            .find(|meta| {
                meta.attr("http-equiv")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"))
            })
            .and_then(|meta| meta.attr("content").and_then(parse_refresh));

        Ok(refresh.map(|(delay, target)| {
            (delay, target.unwrap_or_else(|| page.url.to_string()))
        }))
    }

    async fn postback(&mut self, overrides: Vec<(String, String)>) -> SourceResult<()> {
        let (action, mut fields) = self.form_state()?;
        for (name, value) in overrides {
            upsert_field(&mut fields, name, value);
        }
        debug!(url = %action, fields = fields.len(), "postback 제출");
        self.navigate(Method::POST, action, Some(fields.as_slice()))
            .await
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn goto(&mut self, url: &str) -> SourceResult<()> {
        let url = self.resolve(url)?;
        debug!(url = %url, "페이지 이동");
        self.navigate(Method::GET, url, None).await
    }

    async fn wait_for_selector(&mut self, selector: &str, limit: Duration) -> SourceResult<()> {
        let deadline = Instant::now() + limit;
        loop {
            if !self.select(None, selector)?.is_empty() {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(SourceError::Unavailable(format!(
                    "셀렉터 대기 시간 초과: '{}' ({:?})",
                    selector, limit
                )));
            }
            sleep(self.settings.poll_interval.min(deadline - now)).await;
            self.reload().await?;
        }
    }

    async fn wait_for_load_idle(&mut self, _limit: Duration) -> SourceResult<()> {
        // 응답 본문을 끝까지 받은 뒤에만 페이지가 교체되므로 대기할 요청이 없음
        if self.page.is_some() {
            Ok(())
        } else {
            Err(not_loaded())
        }
    }

    fn query_selector_all(&mut self, selector: &str) -> SourceResult<Vec<ElementHandle>> {
        let found = self.select(None, selector)?;
        Ok(self.register(found))
    }

    fn query_selector_all_within(
        &mut self,
        scope: ElementHandle,
        selector: &str,
    ) -> SourceResult<Vec<ElementHandle>> {
        let found = self.select(Some(scope), selector)?;
        Ok(self.register(found))
    }

    fn text_content(&self, element: ElementHandle) -> Option<String> {
        self.element(element).map(|data| data.text.clone())
    }

    fn attribute(&self, element: ElementHandle, name: &str) -> Option<String> {
        self.element(element)
            .and_then(|data| data.attr(name))
            .map(str::to_string)
    }

    fn is_enabled(&self, element: ElementHandle) -> bool {
        self.element(element).is_some_and(ElementData::is_enabled)
    }

    async fn click(&mut self, element: ElementHandle) -> SourceResult<()> {
        let data = self.element(element).cloned().ok_or_else(stale_handle)?;
        if !data.is_enabled() {
            return Err(SourceError::Parse(format!(
                "비활성 요소는 클릭할 수 없습니다: <{}>",
                data.tag
            )));
        }

        let script = data
            .attr("href")
            .filter(|href| href.contains("__doPostBack"))
            .or_else(|| data.attr("onclick").filter(|s| s.contains("__doPostBack")));
        if let Some((target, argument)) = script.and_then(parse_postback) {
            return self
                .postback(vec![
                    ("__EVENTTARGET".to_string(), target),
                    ("__EVENTARGUMENT".to_string(), argument),
                ])
                .await;
        }

        if let Some(href) = data.attr("href").map(str::trim) {
            let lower = href.to_ascii_lowercase();
            if !href.is_empty() && !href.starts_with('#') && !lower.starts_with("javascript:") {
                let url = self.resolve(href)?;
                return self.navigate(Method::GET, url, None).await;
            }
        }

        if data.is_submit() {
            let mut overrides = vec![
                ("__EVENTTARGET".to_string(), String::new()),
                ("__EVENTARGUMENT".to_string(), String::new()),
            ];
            if let Some(name) = data.attr("name") {
                overrides.push((
                    name.to_string(),
                    data.attr("value").unwrap_or_default().to_string(),
                ));
            }
            return self.postback(overrides).await;
        }

        Err(SourceError::Parse(format!(
            "클릭 동작을 알 수 없는 요소: <{}>",
            data.tag
        )))
    }

    async fn submit_form(&mut self, url: &str, fields: &[(String, String)]) -> SourceResult<()> {
        let url = self.resolve(url)?;
        debug!(url = %url, fields = fields.len(), "폼 제출");
        self.navigate(Method::POST, url, Some(fields)).await
    }

    async fn wait_for_download(&mut self, limit: Duration) -> SourceResult<Download> {
        let waited = timeout(limit, async {
            loop {
                if let Some(download) = self.pending_download.take() {
                    return Ok::<_, SourceError>(download);
                }
                let Some((delay, target)) = self.meta_refresh()? else {
                    return Err(SourceError::Unavailable(
                        "다운로드가 시작되지 않았습니다".to_string(),
                    ));
                };
                debug!(target = %target, delay = ?delay, "meta refresh 대기");
                sleep(delay).await;
                let url = self.resolve(&target)?;
                self.navigate(Method::GET, url, None).await?;
            }
        })
        .await;

        waited.map_err(|_| {
            SourceError::Unavailable(format!("다운로드 대기 시간 초과 ({:?})", limit))
        })?
    }

    async fn close(&mut self) {
        self.page = None;
        self.elements.clear();
        self.pending_download = None;
        self.generation += 1;
    }
}

fn not_loaded() -> SourceError {
    SourceError::Unavailable("로드된 페이지가 없습니다".to_string())
}

fn stale_handle() -> SourceError {
    SourceError::Parse("무효한 요소 핸들 (페이지가 변경됨)".to_string())
}

fn parse_selector(selector: &str) -> SourceResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| SourceError::Parse(format!("잘못된 셀렉터 '{}': {:?}", selector, e)))
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn is_download(content_type: Option<&str>, disposition: Option<&str>, body: &[u8]) -> bool {
    if disposition.is_some_and(|d| d.to_ascii_lowercase().contains("attachment")) {
        return true;
    }
    match content_type {
        Some(ct) => {
            let ct = ct.to_ascii_lowercase();
            !(ct.contains("text/html") || ct.contains("application/xhtml"))
        }
        None => !looks_like_html(body),
    }
}

fn looks_like_html(body: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&body[..body.len().min(512)]).to_ascii_lowercase();
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with('<') && (head.contains("<html") || head.contains("<!doctype"))
}

fn attachment_file_name(disposition: &str) -> Option<String> {
    let start = disposition.find("filename=")? + "filename=".len();
    let name = disposition[start..].split(';').next()?.trim().trim_matches('"');
    (!name.is_empty()).then(|| name.to_string())
}

/// `__doPostBack('target','argument')`에서 (target, argument) 추출.
fn parse_postback(script: &str) -> Option<(String, String)> {
    const CALL: &str = "__doPostBack(";
    let start = script.find(CALL)? + CALL.len();
    let rest = &script[start..];
    let args = &rest[..rest.find(')')?];

    let mut parts = args
        .split(',')
        .map(|arg| arg.trim().trim_matches(|c| c == '\'' || c == '"').to_string());
    let target = parts.next().filter(|t| !t.is_empty())?;
    let argument = parts.next().unwrap_or_default();
    Some((target, argument))
}

/// meta refresh `content` 값 (`"5; url=/file.csv"`)에서 (지연, URL) 추출.
fn parse_refresh(content: &str) -> Option<(Duration, Option<String>)> {
    let (delay, rest) = match content.split_once(|c| c == ';' || c == ',') {
        Some((delay, rest)) => (delay, Some(rest)),
        None => (content, None),
    };
    let seconds: u64 = delay.trim().parse().ok()?;

    let target = rest.and_then(|rest| {
        let rest = rest.trim();
        let url = if rest.to_ascii_lowercase().starts_with("url") {
            rest[3..].trim_start().strip_prefix('=')?.trim()
        } else {
            rest
        };
        let url = url.trim_matches(|c| c == '\'' || c == '"');
        (!url.is_empty()).then(|| url.to_string())
    });

    Some((Duration::from_secs(seconds), target))
}

fn upsert_field(fields: &mut Vec<(String, String)>, name: String, value: String) {
    match fields.iter_mut().find(|(existing, _)| *existing == name) {
        Some(field) => field.1 = value,
        None => fields.push((name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const TABLE_HTML: &str = r#"<!DOCTYPE html>
<html><body>
<table class="results"><tbody>
<tr><td>Acme Corp</td><td><span>ACME</span><span>ACME.WS</span></td><td>x</td><td>Late filing</td><td>05/01/2024</td></tr>
<tr><td>Beta   Inc</td><td><span>BETA</span></td><td>x</td><td>Price below $1</td><td>05/02/2024</td></tr>
</tbody></table>
<a id="next" href="/list?page=2">Next</a>
</body></html>"#;

    fn settings() -> HttpFetcherSettings {
        HttpFetcherSettings {
            user_agent: "listwatch-test".to_string(),
            navigation_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
        }
    }

    fn html_page(body: &str) -> String {
        format!("<!DOCTYPE html><html><body>{}</body></html>", body)
    }

    #[test]
    fn test_parse_postback() {
        assert_eq!(
            parse_postback("javascript:__doPostBack('ctl00$grid','Page$Next')"),
            Some(("ctl00$grid".to_string(), "Page$Next".to_string()))
        );
        assert_eq!(
            parse_postback("__doPostBack(\"btn\", \"\")"),
            Some(("btn".to_string(), String::new()))
        );
        assert_eq!(parse_postback("javascript:void(0)"), None);
        assert_eq!(parse_postback("__doPostBack('', '')"), None);
    }

    #[test]
    fn test_parse_refresh() {
        assert_eq!(
            parse_refresh("0; url=/files/export.csv"),
            Some((Duration::ZERO, Some("/files/export.csv".to_string())))
        );
        assert_eq!(
            parse_refresh("3;URL='export.csv'"),
            Some((Duration::from_secs(3), Some("export.csv".to_string())))
        );
        assert_eq!(parse_refresh("5"), Some((Duration::from_secs(5), None)));
        assert_eq!(parse_refresh("soon"), None);
    }

    #[test]
    fn test_attachment_file_name() {
        assert_eq!(
            attachment_file_name("attachment; filename=\"export.csv\""),
            Some("export.csv".to_string())
        );
        assert_eq!(
            attachment_file_name("attachment; filename=a.csv; size=10"),
            Some("a.csv".to_string())
        );
        assert_eq!(attachment_file_name("inline"), None);
    }

    #[test]
    fn test_is_download_detection() {
        assert!(is_download(Some("text/csv"), None, b"a,b\n"));
        assert!(is_download(
            Some("text/html"),
            Some("attachment; filename=x.csv"),
            b"a,b\n"
        ));
        assert!(!is_download(Some("text/html; charset=utf-8"), None, b"<html>"));
        assert!(!is_download(None, None, b"<!DOCTYPE html><html></html>"));
        assert!(is_download(None, None, b"Symbol,Name\n"));
    }

    #[tokio::test]
    async fn test_goto_and_query_within_rows() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/list")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(TABLE_HTML)
            .create_async()
            .await;

        let mut page = HttpPageFetcher::new(settings()).unwrap();
        page.goto(&format!("{}/list", server.url())).await.unwrap();

        let rows = page.query_selector_all("table.results tbody tr").unwrap();
        assert_eq!(rows.len(), 2);

        let spans = page
            .query_selector_all_within(rows[0], "td:nth-child(2) span")
            .unwrap();
        let symbols: Vec<String> = spans.iter().filter_map(|s| page.text_content(*s)).collect();
        assert_eq!(symbols, vec!["ACME", "ACME.WS"]);

        let issuer = page.query_selector_all_within(rows[1], "td:nth-child(1)").unwrap();
        assert_eq!(page.text_content(issuer[0]).as_deref(), Some("Beta Inc"));

        let next = page.query_selector_all("a#next").unwrap();
        assert_eq!(page.attribute(next[0], "href").as_deref(), Some("/list?page=2"));
        assert!(page.is_enabled(next[0]));
    }

    #[tokio::test]
    async fn test_wait_for_selector_times_out_as_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/empty")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(html_page("<p>loading</p>"))
            .expect_at_least(1)
            .create_async()
            .await;

        let mut page = HttpPageFetcher::new(settings()).unwrap();
        page.goto(&format!("{}/empty", server.url())).await.unwrap();

        let err = page
            .wait_for_selector("table.results", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/down")
            .with_status(503)
            .create_async()
            .await;

        let mut page = HttpPageFetcher::new(settings()).unwrap();
        let err = page
            .goto(&format!("{}/down", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_postback_click_replays_hidden_fields() {
        let mut server = mockito::Server::new_async().await;
        let first = html_page(
            r#"<form method="post" action="./grid">
<input type="hidden" name="__VIEWSTATE" value="vs1" />
<input type="hidden" name="__EVENTTARGET" value="" />
<table><tbody><tr class="rgRow"><td>P1</td></tr></tbody></table>
<a class="rgPageNext" href="javascript:__doPostBack('ctl00$grid','Page$Next')">Next</a>
</form>"#,
        );
        let second = html_page(
            r#"<table><tbody><tr class="rgRow"><td>P2</td></tr></tbody></table>"#,
        );

        let _get = server
            .mock("GET", "/grid")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(first)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/grid")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("__EVENTTARGET".into(), "ctl00$grid".into()),
                Matcher::UrlEncoded("__EVENTARGUMENT".into(), "Page$Next".into()),
                Matcher::UrlEncoded("__VIEWSTATE".into(), "vs1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(second)
            .create_async()
            .await;

        let mut page = HttpPageFetcher::new(settings()).unwrap();
        page.goto(&format!("{}/grid", server.url())).await.unwrap();

        let before = page.query_selector_all("tr.rgRow td").unwrap();
        let next = page.query_selector_all("a.rgPageNext").unwrap();
        assert!(page.is_enabled(next[0]));
        page.click(next[0]).await.unwrap();
        post.assert_async().await;

        // 이전 페이지의 핸들은 무효
        assert_eq!(page.text_content(before[0]), None);

        let cells = page.query_selector_all("tr.rgRow td").unwrap();
        assert_eq!(page.text_content(cells[0]).as_deref(), Some("P2"));
    }

    #[tokio::test]
    async fn test_disabled_elements() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/pager")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(html_page(
                r##"<a id="a" class="rgPageNext" href="#" onclick="return false;">Next</a>
<input id="b" type="submit" class="rgPageNext aspNetDisabled" disabled="disabled" />
<a id="c" class="next" href="/page/3">Next</a>
<input id="d" type="submit" name="ctl00$go" value="Go" />"##,
            ))
            .create_async()
            .await;

        let mut page = HttpPageFetcher::new(settings()).unwrap();
        page.goto(&format!("{}/pager", server.url())).await.unwrap();

        let enabled: Vec<bool> = ["#a", "#b", "#c", "#d"]
            .iter()
            .map(|sel| {
                let handle = page.query_selector_all(sel).unwrap()[0];
                page.is_enabled(handle)
            })
            .collect();
        assert_eq!(enabled, vec![false, false, true, true]);

        let disabled = page.query_selector_all("#a").unwrap()[0];
        assert!(matches!(
            page.click(disabled).await,
            Err(SourceError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_form_submit_yields_download() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", "/export")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(html_page(
                r#"<form action="/export"><input type="hidden" name="__VIEWSTATE" value="abc" /></form>"#,
            ))
            .create_async()
            .await;
        let _post = server
            .mock("POST", "/export")
            .match_body(Matcher::UrlEncoded("__VIEWSTATE".into(), "abc".into()))
            .with_status(200)
            .with_header("content-type", "text/csv")
            .with_header("content-disposition", "attachment; filename=\"noncompliant.csv\"")
            .with_body("Company,Affected Issues\nAcme,ACME\n")
            .create_async()
            .await;

        let mut page = HttpPageFetcher::new(settings()).unwrap();
        page.goto(&format!("{}/export", server.url())).await.unwrap();

        assert!(page.wait_for_download(Duration::from_secs(1)).await.is_err());

        let fields = vec![("__VIEWSTATE".to_string(), "abc".to_string())];
        page.submit_form("/export", &fields).await.unwrap();

        let download = page.wait_for_download(Duration::from_secs(1)).await.unwrap();
        assert_eq!(download.file_name.as_deref(), Some("noncompliant.csv"));
        assert_eq!(download.bytes, b"Company,Affected Issues\nAcme,ACME\n".to_vec());

        // 다운로드는 현재 페이지를 바꾸지 않음
        assert_eq!(page.query_selector_all("form").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_large_table_rows_extracted() {
        let rows: String = (0..400)
            .map(|i| {
                format!(
                    "<tr><td>Issuer {i}</td><td><span>S{i}</span><span>S{i}.WS</span></td><td>Reason {i}</td></tr>"
                )
            })
            .collect();
        let filler: String = (0..3000)
            .map(|i| format!("<div class=\"filler\"><p>block {i}</p></div>"))
            .collect();
        let body = html_page(&format!(
            r#"{filler}<table class="results"><tbody>{rows}</tbody></table>"#
        ));

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/big")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(body)
            .create_async()
            .await;

        let mut page = HttpPageFetcher::new(settings()).unwrap();
        page.goto(&format!("{}/big", server.url())).await.unwrap();

        let started = std::time::Instant::now();
        let rows = page.query_selector_all("table.results tbody tr").unwrap();
        assert_eq!(rows.len(), 400);

        let mut symbols = 0;
        for (i, row) in rows.iter().enumerate() {
            let issuer = page.query_selector_all_within(*row, "td:nth-child(1)").unwrap();
            assert_eq!(page.text_content(issuer[0]), Some(format!("Issuer {i}")));
            let spans = page
                .query_selector_all_within(*row, "td:nth-child(2) span")
                .unwrap();
            symbols += spans.len();
            let reason = page.query_selector_all_within(*row, "td:nth-child(3)").unwrap();
            assert_eq!(reason.len(), 1);
        }
        assert_eq!(symbols, 800);
        assert!(
            started.elapsed() < Duration::from_secs(10),
            "row extraction took {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn test_meta_refresh_download() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/prepare")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(
                r#"<!DOCTYPE html><html><head><meta http-equiv="Refresh" content="0; url=/files/list.csv"></head><body>Preparing</body></html>"#,
            )
            .create_async()
            .await;
        let _file = server
            .mock("GET", "/files/list.csv")
            .with_status(200)
            .with_header("content-type", "text/csv")
            .with_body("Symbol\nAAA\n")
            .create_async()
            .await;

        let mut page = HttpPageFetcher::new(settings()).unwrap();
        page.goto(&format!("{}/prepare", server.url())).await.unwrap();

        let download = page.wait_for_download(Duration::from_secs(5)).await.unwrap();
        assert!(download.url.ends_with("/files/list.csv"));
        assert_eq!(download.bytes, b"Symbol\nAAA\n".to_vec());
    }

    #[tokio::test]
    async fn test_wait_for_download_times_out() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/prepare")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(
                r#"<!DOCTYPE html><html><head><meta http-equiv="refresh" content="30; url=/files/list.csv"></head><body>Preparing</body></html>"#,
            )
            .create_async()
            .await;

        let mut page = HttpPageFetcher::new(settings()).unwrap();
        page.goto(&format!("{}/prepare", server.url())).await.unwrap();

        let started = std::time::Instant::now();
        let err = page
            .wait_for_download(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
