//! 원시 행 → `ListingEvent` 정규화.
//!
//! 소스마다 정규 필드별 후보 키 목록을 두고, 자리표시자가 아닌 첫 값을 사용합니다.
//! 한 셀에 여러 심볼이 있으면 심볼마다 이벤트 하나로 펼칩니다.

use std::collections::HashSet;

use listwatch_core::{normalize_symbol, ListingEvent, SourceName};
use tracing::debug;

use crate::source::{fields, RawRecord, PLACEHOLDER};

/// 심볼 셀 분리 규칙.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolSplit {
    /// 셀 전체가 심볼 하나
    Single,
    /// 쉼표 구분
    Comma,
    /// 공백 구분
    Whitespace,
}

/// 소스별 필드 매핑.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub symbol: &'static [&'static str],
    pub split: SymbolSplit,
    pub issuer: &'static [&'static str],
    pub reason: &'static [&'static str],
    pub date: &'static [&'static str],
}

impl FieldMapping {
    pub fn for_source(source: SourceName) -> Self {
        match source {
            SourceName::NyseNoncompliant => Self {
                symbol: &[fields::SYMBOL],
                split: SymbolSplit::Comma,
                issuer: &[fields::ISSUER],
                reason: &[fields::DEFICIENCY],
                date: &[fields::DATE],
            },
            SourceName::NyseDelisting => Self {
                symbol: &[fields::SYMBOL],
                split: SymbolSplit::Comma,
                issuer: &[fields::ISSUER],
                reason: &[fields::INITIATION],
                date: &[fields::NOTIFICATION_DATE],
            },
            SourceName::NasdaqPendingSuspension => Self {
                symbol: &[fields::SYMBOL],
                split: SymbolSplit::Single,
                issuer: &[fields::ISSUER],
                reason: &[fields::REASON],
                date: &[fields::EFFECTIVE_DATE],
            },
            SourceName::NasdaqThreshold => Self {
                symbol: &[fields::SYMBOL],
                split: SymbolSplit::Single,
                issuer: &[fields::SECURITY_NAME],
                reason: &[fields::REASON],
                date: &[fields::DATE],
            },
            SourceName::NasdaqNoncompliantExport => Self {
                symbol: &[fields::AFFECTED_ISSUES, fields::SYMBOL],
                split: SymbolSplit::Whitespace,
                issuer: &["Company", "Company Name", fields::ISSUER],
                reason: &[fields::DEFICIENCY, fields::REASON],
                date: &[fields::NOTIFICATION_DATE, fields::DATE],
            },
        }
    }
}

/// 자리표시자가 아닌 첫 후보 값.
fn first_value(record: &RawRecord, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|key| record.get(key))
        .map(str::trim)
        .find(|value| !value.is_empty() && *value != PLACEHOLDER)
        .map(str::to_string)
}

/// 심볼 셀을 정규화된 심볼 목록으로 분리합니다 (행 내 중복 제거, 순서 유지).
pub fn split_symbols(cell: &str, split: SymbolSplit) -> Vec<String> {
    let parts: Vec<&str> = match split {
        SymbolSplit::Single => vec![cell],
        SymbolSplit::Comma => cell.split(',').collect(),
        SymbolSplit::Whitespace => cell.split_whitespace().collect(),
    };

    let mut seen = HashSet::new();
    parts
        .into_iter()
        .filter(|part| part.trim() != PLACEHOLDER)
        .filter_map(normalize_symbol)
        .filter(|symbol| seen.insert(symbol.clone()))
        .collect()
}

/// 원시 행 하나를 이벤트로 변환합니다. 심볼이 없으면 빈 목록.
pub fn normalize(record: &RawRecord, source: SourceName) -> Vec<ListingEvent> {
    let mapping = FieldMapping::for_source(source);

    let symbols = first_value(record, mapping.symbol)
        .map(|cell| split_symbols(&cell, mapping.split))
        .unwrap_or_default();
    if symbols.is_empty() {
        debug!(source = %source, ?record, "심볼 없는 행 제외");
        return Vec::new();
    }

    let issuer = first_value(record, mapping.issuer);
    let reason = first_value(record, mapping.reason);
    let date = first_value(record, mapping.date);

    symbols
        .into_iter()
        .map(|symbol| ListingEvent {
            symbol,
            issuer: issuer.clone(),
            deficiency_or_reason: reason.clone(),
            date: date.clone(),
            source_link: source.canonical_url().to_string(),
            source_name: source,
        })
        .collect()
}

/// 여러 행을 변환합니다 (행 순서 유지).
pub fn normalize_all(records: &[RawRecord], source: SourceName) -> Vec<ListingEvent> {
    records
        .iter()
        .flat_map(|record| normalize(record, source))
        .collect()
}
