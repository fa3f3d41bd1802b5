//! 소스 수집만 실행합니다 (가격 조회 없음).

use std::time::Instant;

use chrono::NaiveDate;
use listwatch_data::Pipeline;
use tokio_util::sync::CancellationToken;

use super::{CommandReport, Output, EVENTS_PREFIX};
use crate::{Result, RunStats};

/// 이벤트 표를 만들어 저장합니다.
pub async fn scrape_events(
    pipeline: &Pipeline,
    output: &Output<'_>,
    as_of: NaiveDate,
    cancel: &CancellationToken,
) -> Result<CommandReport> {
    let start = Instant::now();
    tracing::info!("소스 수집 시작");

    let aggregation = pipeline.scrape(cancel).await?;

    let bytes = output.codec().encode_events(&aggregation.events)?;
    let location = output.write(EVENTS_PREFIX, as_of, &bytes)?;

    let stats = RunStats {
        sources_ok: aggregation.succeeded(),
        sources_failed: aggregation.failures.len(),
        events: aggregation.events.len(),
        report_rows: aggregation.events.len(),
        elapsed: start.elapsed(),
        ..Default::default()
    };

    Ok(CommandReport {
        stats,
        location,
        source_failures: aggregation.failures,
        price_warnings: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::testing::{as_of, pipeline};
    use listwatch_core::{SourceName, EVENT_COLUMNS};
    use listwatch_data::{CsvTableCodec, MemorySink};

    #[tokio::test]
    async fn test_scrape_writes_events_and_lists_failures() {
        let sink = MemorySink::new();
        let codec = CsvTableCodec;
        let output = Output::new(&codec, &sink);

        let report = scrape_events(&pipeline(), &output, as_of(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.location, "memory://listing_events_2024-05-10.csv");
        let files = sink.files();
        let text = String::from_utf8(files[0].1.clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], EVENT_COLUMNS.join(","));
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("CCC,Charlie Corp,"));

        assert_eq!(report.stats.sources_ok, 1);
        assert_eq!(report.stats.sources_failed, 1);
        assert_eq!(report.source_failures[0].source_name, SourceName::NyseNoncompliant);
        assert!(report.price_warnings.is_empty());
    }
}
