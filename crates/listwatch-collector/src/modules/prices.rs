//! 가격 요약만 실행합니다 (소스 수집 없음).

use std::time::Instant;

use chrono::NaiveDate;
use listwatch_data::Pipeline;
use tokio_util::sync::CancellationToken;

use super::{CommandReport, Output, PRICES_PREFIX};
use crate::{Result, RunStats};

/// 종가 요약 표를 만들어 저장합니다.
pub async fn collect_prices(
    pipeline: &Pipeline,
    output: &Output<'_>,
    symbols: &[String],
    as_of: NaiveDate,
    cancel: &CancellationToken,
) -> Result<CommandReport> {
    let start = Instant::now();
    tracing::info!(symbols = symbols.len(), as_of = %as_of, "가격 요약 시작");

    let table = pipeline.prices(symbols, as_of, cancel).await?;

    let bytes = output.codec().encode_prices(&table.summaries)?;
    let location = output.write(PRICES_PREFIX, as_of, &bytes)?;

    let unresolved = table
        .warnings
        .iter()
        .filter(|w| !table.summaries.iter().any(|s| s.symbol == w.symbol))
        .count();

    let stats = RunStats {
        symbols: table.summaries.len() + unresolved,
        price_rows: table.summaries.len(),
        price_warnings: table.warnings.len(),
        report_rows: table.summaries.len(),
        elapsed: start.elapsed(),
        ..Default::default()
    };

    Ok(CommandReport {
        stats,
        location,
        source_failures: Vec::new(),
        price_warnings: table.warnings,
    })
}
