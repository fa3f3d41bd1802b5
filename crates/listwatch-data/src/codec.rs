//! 표 인코딩/디코딩.
//!
//! 다운로드된 CSV를 원시 행으로 읽고, 리포트와 중간 결과를 CSV로 씁니다.

use listwatch_core::{
    is_valid_symbol, ListingEvent, PriceSummary, Report, EVENT_COLUMNS,
    PRICE_COLUMNS, REPORT_COLUMNS,
};

use crate::error::CodecError;
use crate::source::RawRecord;

/// 입력 심볼 파일의 심볼 컬럼 이름.
pub const SYMBOL_COLUMN: &str = "Stock Symbol";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 단일 컬럼 파일에서 데이터가 아닌 헤더로 보는 이름.
const SYMBOL_HEADER_WORDS: [&str; 4] = ["symbol", "symbols", "ticker", "tickers"];

/// 표 형식 변환.
pub trait TableCodec: Send + Sync {
    /// 헤더 행을 키로 하는 원시 행 목록.
    fn decode(&self, bytes: &[u8]) -> Result<Vec<RawRecord>, CodecError>;

    /// 리포트 (`REPORT_COLUMNS`).
    fn encode_report(&self, report: &Report) -> Result<Vec<u8>, CodecError>;

    /// 가격 요약 (`PRICE_COLUMNS`).
    fn encode_prices(&self, prices: &[PriceSummary]) -> Result<Vec<u8>, CodecError>;

    /// 이벤트 (`EVENT_COLUMNS`).
    fn encode_events(&self, events: &[ListingEvent]) -> Result<Vec<u8>, CodecError>;

    /// 파일 확장자.
    fn extension(&self) -> &'static str;
}

/// CSV 코덱.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvTableCodec;

impl CsvTableCodec {
    fn read_table(&self, bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), CodecError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

        // 내보내기 파일이 UTF-8이 아닐 수 있으므로 셀 단위로 손실 허용 디코딩
        let headers: Vec<String> = reader.byte_headers()?.iter().map(decode_cell).collect();
        let mut rows = Vec::new();
        let mut record = csv::ByteRecord::new();
        while reader.read_byte_record(&mut record)? {
            let row: Vec<String> = record.iter().map(decode_cell).collect();
            if row.iter().all(String::is_empty) {
                continue;
            }
            rows.push(row);
        }
        Ok((headers, rows))
    }

    /// 입력 파일에서 심볼 목록을 읽습니다.
    ///
    /// `column` 컬럼을 사용하고, 없으면 단일 컬럼 파일에 한해 첫 컬럼을 사용합니다.
    /// 단일 컬럼 파일의 헤더가 대문자 심볼 형식이면 헤더 없는 파일로 보고 포함합니다.
    /// 정규화/중복 제거는 호출자가 합니다.
    pub fn decode_symbols(&self, bytes: &[u8], column: &str) -> Result<Vec<String>, CodecError> {
        let (headers, rows) = self.read_table(bytes)?;

        let (index, header_is_data) = match headers.iter().position(|h| h.eq_ignore_ascii_case(column)) {
            Some(index) => (index, false),
            None if headers.len() == 1 => {
                let header = headers[0].as_str();
                let is_header_word = SYMBOL_HEADER_WORDS
                    .iter()
                    .any(|word| header.eq_ignore_ascii_case(word));
                let looks_like_symbol = !is_header_word
                    && is_valid_symbol(header)
                    && header == header.to_uppercase();
                (0, looks_like_symbol)
            }
            None => return Err(CodecError::MissingColumn(column.to_string())),
        };

        let mut symbols = Vec::with_capacity(rows.len() + 1);
        if header_is_data {
            symbols.push(headers[0].clone());
        }
        symbols.extend(
            rows.into_iter()
                .filter_map(|row| row.into_iter().nth(index))
                .filter(|cell| !cell.is_empty()),
        );
        Ok(symbols)
    }
}

fn decode_cell(cell: &[u8]) -> String {
    String::from_utf8_lossy(cell).trim().to_string()
}

fn write_table<I>(headers: &[&str], rows: I) -> Result<Vec<u8>, CodecError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer
        .into_inner()
        .map_err(|e| CodecError::Encoding(e.to_string()))
}

impl TableCodec for CsvTableCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<RawRecord>, CodecError> {
        let (headers, rows) = self.read_table(bytes)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                headers
                    .iter()
                    .zip(row)
                    .filter(|(h, _)| !h.is_empty())
                    .map(|(h, v)| (h.clone(), v))
                    .collect()
            })
            .collect())
    }

    fn encode_report(&self, report: &Report) -> Result<Vec<u8>, CodecError> {
        write_table(&REPORT_COLUMNS, report.rows.iter().map(|row| row.to_record()))
    }

    fn encode_prices(&self, prices: &[PriceSummary]) -> Result<Vec<u8>, CodecError> {
        write_table(&PRICE_COLUMNS, prices.iter().map(|p| p.to_record()))
    }

    fn encode_events(&self, events: &[ListingEvent]) -> Result<Vec<u8>, CodecError> {
        write_table(&EVENT_COLUMNS, events.iter().map(|e| e.to_record()))
    }

    fn extension(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use listwatch_core::{DailyClose, ReportRow, SourceName};

    #[test]
    fn test_decode_with_bom_and_ragged_rows() {
        let bytes = b"\xEF\xBB\xBFCompany, Affected Issues ,Deficiency\nAcme Corp, ACME ACMEW ,Bid price\nShort Co,SHRT\n\n";
        let records = CsvTableCodec.decode(bytes).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Company"), Some("Acme Corp"));
        assert_eq!(records[0].get("Affected Issues"), Some("ACME ACMEW"));
        assert_eq!(records[1].get("Affected Issues"), Some("SHRT"));
        assert_eq!(records[1].get("Deficiency"), None);
    }

    #[test]
    fn test_decode_latin1_cells_lossy() {
        let bytes = b"Company,Symbol\nCaf\xE9 Holdings,CAFE\nPlain Co,PLN\n";
        let records = CsvTableCodec.decode(bytes).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Company"), Some("Caf\u{FFFD} Holdings"));
        assert_eq!(records[0].get("Symbol"), Some("CAFE"));
        assert_eq!(records[1].get("Symbol"), Some("PLN"));
    }

    #[test]
    fn test_decode_symbols_by_column() {
        let bytes = b"Name,Stock Symbol\nApple,aapl\nBlank,\nMicrosoft,MSFT\n";
        let symbols = CsvTableCodec.decode_symbols(bytes, SYMBOL_COLUMN).unwrap();
        assert_eq!(symbols, vec!["aapl", "MSFT"]);
    }

    #[test]
    fn test_decode_symbols_single_column_fallback() {
        let symbols = CsvTableCodec
            .decode_symbols(b"Ticker\nAAPL\nMSFT\n", SYMBOL_COLUMN)
            .unwrap();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);

        // 헤더 없는 파일
        let symbols = CsvTableCodec
            .decode_symbols(b"AAPL\nMSFT\n", SYMBOL_COLUMN)
            .unwrap();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);

        let symbols = CsvTableCodec
            .decode_symbols(b"My Symbols\nAAPL\n", SYMBOL_COLUMN)
            .unwrap();
        assert_eq!(symbols, vec!["AAPL"]);

        for header in ["SYMBOL", "TICKERS"] {
            let bytes = format!("{}\nAAPL\nMSFT\n", header);
            let symbols = CsvTableCodec
                .decode_symbols(bytes.as_bytes(), SYMBOL_COLUMN)
                .unwrap();
            assert_eq!(symbols, vec!["AAPL", "MSFT"]);
        }
    }

    #[test]
    fn test_decode_symbols_missing_column() {
        let err = CsvTableCodec
            .decode_symbols(b"Name,Ticker\nApple,AAPL\n", SYMBOL_COLUMN)
            .unwrap_err();
        assert!(matches!(err, CodecError::MissingColumn(_)));
    }

    #[test]
    fn test_encode_report_columns_and_empty_cells() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        let price = PriceSummary::from_closes(
            "AAA",
            &[
                DailyClose::new(d(8), 10.0),
                DailyClose::new(d(9), 11.0),
                DailyClose::new(d(10), 12.0),
            ],
        );
        let event = ListingEvent {
            symbol: "CCC".to_string(),
            issuer: Some("Charlie, Inc".to_string()),
            deficiency_or_reason: None,
            date: None,
            source_link: SourceName::NyseDelisting.canonical_url().to_string(),
            source_name: SourceName::NyseDelisting,
        };
        let report = Report::new(
            d(10),
            vec![
                ReportRow {
                    symbol: "AAA".to_string(),
                    price: Some(price),
                    event: None,
                },
                ReportRow {
                    symbol: "CCC".to_string(),
                    price: None,
                    event: Some(event),
                },
            ],
        );

        let bytes = CsvTableCodec.encode_report(&report).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], REPORT_COLUMNS.join(","));
        assert!(lines[1].starts_with("AAA,12,11,10,"));
        assert!(lines[1].ends_with(",,,,,"));
        assert!(lines[2].starts_with("CCC,,,,,,,\"Charlie, Inc\",,,"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_encode_empty_events_has_header_only() {
        let bytes = CsvTableCodec.encode_events(&[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), format!("{}\n", EVENT_COLUMNS.join(",")));
    }
}
