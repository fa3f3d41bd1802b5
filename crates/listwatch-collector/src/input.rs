//! 심볼 입력과 기준일 결정.

use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use listwatch_core::{normalize_symbol_list, ListwatchError};
use listwatch_data::{CodecError, CsvTableCodec, SYMBOL_COLUMN};

use crate::{CollectorError, Result};

/// `--symbols` 값 파싱 (쉼표 또는 공백 구분).
pub fn parse_symbol_arg(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 심볼 CSV 파일을 읽습니다 (`Stock Symbol` 컬럼, 단일 컬럼 파일은 첫 컬럼).
pub fn read_symbol_file(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path)
        .map_err(|e| CollectorError::Input(format!("{}: {}", path.display(), e)))?;

    CsvTableCodec
        .decode_symbols(&bytes, SYMBOL_COLUMN)
        .map_err(|err| match err {
            CodecError::MissingColumn(column) => CollectorError::Run(ListwatchError::InvalidInput(
                format!("{}에 '{}' 컬럼이 없습니다", path.display(), column),
            )),
            other => CollectorError::Codec(other),
        })
}

/// 명령행 심볼과 입력 파일을 합쳐 정규화합니다 (대문자, 중복 제거, 입력 순서 유지).
pub fn resolve_symbols(symbols: Option<&str>, input: Option<&Path>) -> Result<Vec<String>> {
    let mut raw = Vec::new();
    if let Some(symbols) = symbols {
        raw.extend(parse_symbol_arg(symbols));
    }
    if let Some(path) = input {
        let from_file = read_symbol_file(path)?;
        tracing::info!(path = %path.display(), count = from_file.len(), "심볼 파일 로드");
        raw.extend(from_file);
    }

    Ok(normalize_symbol_list(&raw)?)
}

/// 기준일 기본값: 전날.
pub fn default_as_of(today: NaiveDate) -> NaiveDate {
    today - Duration::days(1)
}
