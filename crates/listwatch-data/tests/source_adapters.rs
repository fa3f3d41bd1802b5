//! HTTP 세션으로 실제 어댑터를 로컬 mock 서버에 대해 실행하는 테스트.

use std::sync::Arc;

use listwatch_core::{ScrapeConfig, SourceName};
use listwatch_data::{
    normalize_all, CsvTableCodec, HttpSessionFactory, SourceCatalog, SourceError,
};
use mockito::{Matcher, Server};

fn scrape_config(sources: Vec<SourceName>) -> ScrapeConfig {
    ScrapeConfig {
        selector_timeout_secs: 2,
        navigation_timeout_secs: 5,
        download_timeout_secs: 2,
        poll_interval_ms: 10,
        max_pages: 3,
        sources,
        ..Default::default()
    }
}

fn catalog(config: &ScrapeConfig) -> SourceCatalog {
    SourceCatalog::new(
        Arc::new(HttpSessionFactory::from_config(config)),
        Arc::new(CsvTableCodec),
        config,
    )
}

fn html(body: &str) -> String {
    format!("<!DOCTYPE html><html><body>{}</body></html>", body)
}

fn grid_page(rows: &[(&str, &str, &str, &str)], next_enabled: bool) -> String {
    let rows: String = rows
        .iter()
        .enumerate()
        .map(|(i, (issuer, symbol, reason, date))| {
            let class = if i % 2 == 0 { "rgRow" } else { "rgAltRow" };
            format!(
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>Nasdaq</td><td>{}</td></tr>",
                class, issuer, symbol, reason, date
            )
        })
        .collect();
    let next = if next_enabled {
        r#"<a class="rgPageNext" href="javascript:__doPostBack('ctl00$grid','Page$Next')">Next</a>"#
    } else {
        r##"<a class="rgPageNext" href="#" onclick="return false;">Next</a>"##
    };
    html(&format!(
        r#"<form method="post" action="./pending">
<input type="hidden" name="__VIEWSTATE" value="state" />
<table><tbody>{}</tbody></table>{}</form>"#,
        rows, next
    ))
}

#[tokio::test]
async fn nyse_noncompliant_rows_expand_sibling_symbols() {
    let mut server = Server::new_async().await;
    let _page = server
        .mock("GET", "/noncompliant")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(html(
            r#"<table><thead><tr><th>Issuer</th></tr></thead><tbody>
<tr><td>Acme Corp</td><td><span>ACME</span><span>ACME.WS</span></td><td>NYSE</td><td>Late 10-K</td><td>04/15/2024</td></tr>
<tr><td>Beta Inc</td><td><span>beta</span></td><td>NYSE</td><td></td><td>04/16/2024</td></tr>
</tbody></table>"#,
        ))
        .create_async()
        .await;

    let config = scrape_config(vec![SourceName::NyseNoncompliant]);
    let catalog = catalog(&config).with_url(
        SourceName::NyseNoncompliant,
        format!("{}/noncompliant", server.url()),
    );

    let records = catalog
        .adapter(SourceName::NyseNoncompliant)
        .fetch()
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("Symbol"), Some("ACME, ACME.WS"));
    assert_eq!(records[1].get("Deficiency"), Some("N/A"));

    let events = normalize_all(&records, SourceName::NyseNoncompliant);
    let symbols: Vec<&str> = events.iter().map(|e| e.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["ACME", "ACME.WS", "BETA"]);
    assert_eq!(events[2].deficiency_or_reason, None);
    assert_eq!(events[0].issuer.as_deref(), Some("Acme Corp"));
    assert_eq!(events[0].source_link, SourceName::NyseNoncompliant.canonical_url());
}

#[tokio::test]
async fn missing_table_is_unavailable() {
    let mut server = Server::new_async().await;
    let _page = server
        .mock("GET", "/delistings")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(html("<p>Maintenance</p>"))
        .create_async()
        .await;

    let mut config = scrape_config(vec![SourceName::NyseDelisting]);
    config.selector_timeout_secs = 0;
    let catalog = catalog(&config)
        .with_url(SourceName::NyseDelisting, format!("{}/delistings", server.url()));

    let err = catalog
        .adapter(SourceName::NyseDelisting)
        .fetch()
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Unavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn pending_suspension_follows_pages_until_next_disabled() {
    let mut server = Server::new_async().await;
    let _first = server
        .mock("GET", "/pending")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(grid_page(
            &[
                ("Alpha Co", "ALPH", "Bid price", "05/20/2024"),
                ("Bravo Co", "BRAV", "Equity", "05/21/2024"),
            ],
            true,
        ))
        .create_async()
        .await;
    let _second = server
        .mock("POST", "/pending")
        .match_body(Matcher::UrlEncoded("__EVENTTARGET".into(), "ctl00$grid".into()))
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(grid_page(&[("Charlie Co", "CHRL", "Filing", "05/22/2024")], false))
        .create_async()
        .await;

    let config = scrape_config(vec![SourceName::NasdaqPendingSuspension]);
    let catalog = catalog(&config).with_url(
        SourceName::NasdaqPendingSuspension,
        format!("{}/pending", server.url()),
    );

    let records = catalog
        .adapter(SourceName::NasdaqPendingSuspension)
        .fetch()
        .await
        .unwrap();
    let events = normalize_all(&records, SourceName::NasdaqPendingSuspension);
    let symbols: Vec<&str> = events.iter().map(|e| e.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["ALPH", "BRAV", "CHRL"]);
    assert_eq!(events[2].date.as_deref(), Some("05/22/2024"));
    assert_eq!(events[0].issuer.as_deref(), Some("Alpha Co"));
}

#[tokio::test]
async fn pagination_stops_at_ceiling_with_partial_rows() {
    let mut server = Server::new_async().await;
    let _first = server
        .mock("GET", "/pending")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(grid_page(&[("Loop Co", "LOOP", "x", "y")], true))
        .create_async()
        .await;
    let again = server
        .mock("POST", "/pending")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(grid_page(&[("Loop Co", "LOOP", "x", "y")], true))
        .expect(2)
        .create_async()
        .await;

    let config = scrape_config(vec![SourceName::NasdaqPendingSuspension]);
    let catalog = catalog(&config).with_url(
        SourceName::NasdaqPendingSuspension,
        format!("{}/pending", server.url()),
    );

    let err = catalog
        .adapter(SourceName::NasdaqPendingSuspension)
        .fetch()
        .await
        .unwrap_err();
    match err {
        SourceError::Exhausted { pages, partial } => {
            assert_eq!(pages, 3);
            assert_eq!(partial.len(), 3);
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
    again.assert_async().await;
}

#[tokio::test]
async fn nasdaq_export_posts_state_and_explodes_affected_issues() {
    let mut server = Server::new_async().await;
    let _form = server
        .mock("GET", "/noncompliant")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(html(
            r#"<form method="post" action="./noncompliant">
<input type="hidden" name="__VIEWSTATE" value="vs" />
<input type="hidden" name="__VIEWSTATEGENERATOR" value="gen" />
<input type="hidden" name="__EVENTVALIDATION" value="ev" />
<a id="ctl00_MainContent_btnExport" href="javascript:__doPostBack('ctl00$MainContent$btnExport','')">Export</a>
</form>"#,
        ))
        .create_async()
        .await;
    let export = server
        .mock("POST", "/noncompliant")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("__EVENTTARGET".into(), "ctl00$MainContent$btnExport".into()),
            Matcher::UrlEncoded("__VIEWSTATE".into(), "vs".into()),
            Matcher::UrlEncoded("__EVENTVALIDATION".into(), "ev".into()),
            Matcher::UrlEncoded("__VIEWSTATEGENERATOR".into(), "gen".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_header("content-disposition", "attachment; filename=NoncompliantCompanies.csv")
        .with_body("\u{feff}Company,Affected Issues,Deficiency,Notification Date\nGamma Holdings,GAMA GAMAW,Bid Price,4/30/2024\nDelta Ltd,DLTA,Annual Meeting,5/1/2024\n")
        .create_async()
        .await;

    let config = scrape_config(vec![SourceName::NasdaqNoncompliantExport]);
    let catalog = catalog(&config).with_url(
        SourceName::NasdaqNoncompliantExport,
        format!("{}/noncompliant", server.url()),
    );

    let records = catalog
        .adapter(SourceName::NasdaqNoncompliantExport)
        .fetch()
        .await
        .unwrap();
    export.assert_async().await;
    assert_eq!(records.len(), 2);

    let events = normalize_all(&records, SourceName::NasdaqNoncompliantExport);
    let symbols: Vec<&str> = events.iter().map(|e| e.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["GAMA", "GAMAW", "DLTA"]);
    assert_eq!(events[1].issuer.as_deref(), Some("Gamma Holdings"));
    assert_eq!(events[1].deficiency_or_reason.as_deref(), Some("Bid Price"));
    assert_eq!(events[2].date.as_deref(), Some("5/1/2024"));
}

#[tokio::test]
async fn nasdaq_export_without_state_token_is_parse_error() {
    let mut server = Server::new_async().await;
    let _form = server
        .mock("GET", "/noncompliant")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(html(
            r#"<form method="post"><input type="hidden" name="__VIEWSTATE" value="vs" /></form>"#,
        ))
        .create_async()
        .await;

    let config = scrape_config(vec![SourceName::NasdaqNoncompliantExport]);
    let catalog = catalog(&config).with_url(
        SourceName::NasdaqNoncompliantExport,
        format!("{}/noncompliant", server.url()),
    );

    let err = catalog
        .adapter(SourceName::NasdaqNoncompliantExport)
        .fetch()
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Parse(_)));
    assert!(!err.is_retryable());
}
