//! 최종 리포트.
//!
//! 종가 요약과 상장 이벤트를 심볼 기준으로 합친 행의 모음입니다.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ListingEvent, PriceSummary};

/// 리포트 CSV 컬럼.
pub const REPORT_COLUMNS: [&str; 12] = [
    "Symbol",
    "Close_T",
    "Close_T-1",
    "Close_T-2",
    "T-1 % Change",
    "T-2 % Change",
    "Cumulative % Change",
    "Issuer",
    "Deficiency/Reason",
    "Date",
    "Source",
    "Link",
];

/// 종가 요약 CSV 컬럼.
pub const PRICE_COLUMNS: [&str; 7] = [
    "Symbol",
    "Close_T",
    "Close_T-1",
    "Close_T-2",
    "T-1 % Change",
    "T-2 % Change",
    "Cumulative % Change",
];

/// 이벤트 CSV 컬럼.
pub const EVENT_COLUMNS: [&str; 6] = [
    "Symbol",
    "Issuer",
    "Deficiency/Reason",
    "Date",
    "Source",
    "Link",
];

/// 조인 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinMode {
    /// 완전 외부 조인: 가격 또는 이벤트가 있는 모든 심볼
    #[default]
    Full,
    /// 왼쪽 조인: 요청한 심볼만 (이벤트 전용 심볼 제외)
    Left,
}

impl FromStr for JoinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" | "outer" => Ok(Self::Full),
            "left" => Ok(Self::Left),
            _ => Err(format!("Unknown join mode: {}", s)),
        }
    }
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinMode::Full => write!(f, "full"),
            JoinMode::Left => write!(f, "left"),
        }
    }
}

/// 리포트 한 행.
///
/// 가격 데이터가 없는 심볼은 `price`가 `None`, 이벤트가 없는 심볼은 `event`가 `None`입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub symbol: String,
    pub price: Option<PriceSummary>,
    pub event: Option<ListingEvent>,
}

impl ReportRow {
    /// `REPORT_COLUMNS` 순서의 셀 값.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = Vec::with_capacity(REPORT_COLUMNS.len());
        record.push(self.symbol.clone());
        record.extend(price_cells(self.price.as_ref()));

        match &self.event {
            Some(event) => {
                record.push(cell(event.issuer.as_deref()));
                record.push(cell(event.deficiency_or_reason.as_deref()));
                record.push(cell(event.date.as_deref()));
                record.push(event.source_name.label().to_string());
                record.push(event.source_link.clone());
            }
            None => record.extend(std::iter::repeat(String::new()).take(5)),
        }
        record
    }
}

impl PriceSummary {
    /// `PRICE_COLUMNS` 순서의 셀 값.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![self.symbol.clone()];
        record.extend(price_cells(Some(self)));
        record
    }
}

impl ListingEvent {
    /// `EVENT_COLUMNS` 순서의 셀 값.
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.symbol.clone(),
            cell(self.issuer.as_deref()),
            cell(self.deficiency_or_reason.as_deref()),
            cell(self.date.as_deref()),
            self.source_name.label().to_string(),
            self.source_link.clone(),
        ]
    }
}

/// 실행 결과 리포트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// 기준일
    pub as_of: NaiveDate,
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn new(as_of: NaiveDate, rows: Vec<ReportRow>) -> Self {
        Self { as_of, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 특정 심볼의 행.
    pub fn rows_for<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a ReportRow> + 'a {
        self.rows
            .iter()
            .filter(move |row| row.symbol.eq_ignore_ascii_case(symbol))
    }
}

fn price_cells(price: Option<&PriceSummary>) -> Vec<String> {
    match price {
        Some(p) => vec![
            number(p.close_t),
            number(p.close_t1),
            number(p.close_t2),
            percent(p.pct_change_t1),
            percent(p.pct_change_t2),
            percent(p.cumulative_pct_change),
        ],
        None => vec![String::new(); 6],
    }
}

fn cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn percent(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_default()
}
