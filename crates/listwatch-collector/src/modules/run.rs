//! 전체 실행: 소스 수집 + 가격 요약 + 조인 리포트.

use std::time::Instant;

use chrono::NaiveDate;
use listwatch_data::Pipeline;
use tokio_util::sync::CancellationToken;

use super::{CommandReport, Output, REPORT_PREFIX};
use crate::{Result, RunStats};

/// 리포트를 만들어 저장합니다.
pub async fn run_report(
    pipeline: &Pipeline,
    output: &Output<'_>,
    symbols: &[String],
    as_of: NaiveDate,
    cancel: &CancellationToken,
) -> Result<CommandReport> {
    let start = Instant::now();
    tracing::info!(symbols = symbols.len(), as_of = %as_of, "리포트 생성 시작");

    let outcome = pipeline.run(symbols, as_of, cancel).await?;

    let bytes = output.codec().encode_report(&outcome.report)?;
    let location = output.write(REPORT_PREFIX, as_of, &bytes)?;

    let stats = RunStats {
        symbols: outcome.symbol_count,
        price_rows: outcome.priced_count,
        price_warnings: outcome.price_warnings.len(),
        sources_ok: outcome
            .source_count
            .saturating_sub(outcome.source_failures.len()),
        sources_failed: outcome.source_failures.len(),
        events: outcome.event_count,
        report_rows: outcome.report.len(),
        elapsed: start.elapsed(),
    };

    Ok(CommandReport {
        stats,
        location,
        source_failures: outcome.source_failures,
        price_warnings: outcome.price_warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::testing::{as_of, pipeline};
    use listwatch_core::REPORT_COLUMNS;
    use listwatch_data::{CsvTableCodec, FileSink};

    #[tokio::test]
    async fn test_run_writes_dated_report() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        let codec = CsvTableCodec;
        let output = Output::new(&codec, &sink);

        let symbols = vec!["AAA".to_string(), "BBB".to_string()];
        let report = run_report(&pipeline(), &output, &symbols, as_of(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.location.ends_with("listing_report_2024-05-10.csv"));
        let text = std::fs::read_to_string(&report.location).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], REPORT_COLUMNS.join(","));
        assert!(lines[1].starts_with("AAA,12,11,10,"));
        assert!(lines[2].starts_with("BBB,,,,,,,"));
        assert!(lines[3].starts_with("CCC,,,,,,,Charlie Corp,Delisting,05/02/2024,"));

        assert_eq!(report.stats.symbols, 2);
        assert_eq!(report.stats.price_rows, 2);
        assert_eq!(report.stats.price_warnings, 1);
        assert_eq!(report.stats.sources_ok, 1);
        assert_eq!(report.stats.sources_failed, 1);
        assert_eq!(report.stats.events, 1);
        assert_eq!(report.stats.report_rows, 3);
        assert_eq!(report.source_failures.len(), 1);
        assert_eq!(report.price_warnings[0].symbol, "BBB");
    }

    #[tokio::test]
    async fn test_cancelled_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("out"));
        let codec = CsvTableCodec;
        let output = Output::new(&codec, &sink);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = run_report(&pipeline(), &output, &["AAA".to_string()], as_of(), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!dir.path().join("out").exists());
    }
}
