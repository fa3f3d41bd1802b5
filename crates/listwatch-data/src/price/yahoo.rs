//! Yahoo Finance 일봉 종가 제공자.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use listwatch_core::DailyClose;
use time::OffsetDateTime;
use tracing::debug;

use super::DailyCloseProvider;
use crate::error::PriceError;

/// Yahoo Finance 제공자.
pub struct YahooDailyCloseProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooDailyCloseProvider {
    pub fn new() -> Result<Self, PriceError> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| PriceError::Connection(format!("Yahoo Finance 연결 실패: {}", e)))?;
        Ok(Self { connector })
    }
}

#[async_trait]
impl DailyCloseProvider for YahooDailyCloseProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyClose>, PriceError> {
        let start_at = naive_date_to_offset_datetime(start)?;
        let end_at = naive_date_to_offset_datetime(end)?;

        debug!(symbol, start = %start, end = %end, "Yahoo Finance 일봉 조회");

        let response = match self
            .connector
            .get_quote_history_interval(symbol, start_at, end_at, "1d")
            .await
        {
            Ok(response) => response,
            Err(e) => return classify(symbol, e.to_string()),
        };

        // 응답은 왔지만 봉이 없는 경우 (휴장 구간, 거래 정지 등)
        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(e) => {
                debug!(symbol, error = %e, "Yahoo Finance 응답에 봉 없음");
                return Ok(Vec::new());
            }
        };

        Ok(quotes
            .iter()
            .filter_map(|q| {
                let date = Utc.timestamp_opt(q.timestamp as i64, 0).single()?.date_naive();
                Some(DailyClose::new(date, q.close))
            })
            .collect())
    }
}

/// 조회 에러 메시지 분류.
///
/// "No data found, symbol may be delisted"는 상장폐지 종목에서도 나오므로
/// 빈 결과로 취급해 행을 유지합니다.
fn classify(symbol: &str, message: String) -> Result<Vec<DailyClose>, PriceError> {
    let lower = message.to_lowercase();
    if lower.contains("no data") {
        debug!(symbol, error = %message, "Yahoo Finance 데이터 없음");
        Ok(Vec::new())
    } else if lower.contains("not found") || lower.contains("404") {
        Err(PriceError::Unresolved {
            symbol: symbol.to_string(),
            message,
        })
    } else {
        Err(PriceError::Fetch {
            symbol: symbol.to_string(),
            message,
        })
    }
}

fn naive_date_to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, PriceError> {
    let month = time::Month::try_from(date.month() as u8)
        .map_err(|e| PriceError::InvalidRange(format!("{}: {}", date, e)))?;
    let day = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
        .map_err(|e| PriceError::InvalidRange(format!("{}: {}", date, e)))?;
    Ok(day.midnight().assume_utc())
}
