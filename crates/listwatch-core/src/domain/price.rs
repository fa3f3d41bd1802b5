//! 최근 거래일 종가 요약.
//!
//! 조회 구간의 일별 종가에서 마지막 3거래일(T, T-1, T-2)을 읽고
//! 단기 등락률을 계산합니다.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 요약에 사용하는 거래일 수.
pub const SUMMARY_TRADING_DAYS: usize = 3;

/// 하루치 종가.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    /// 거래일
    pub date: NaiveDate,
    /// 종가
    pub close: f64,
}

impl DailyClose {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// 심볼별 종가 요약.
///
/// 거래일이 3일 미만이면 존재하는 종가만 채워지고 등락률은 모두 `None`입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    /// 심볼
    pub symbol: String,
    /// 가장 최근 거래일 종가 (T)
    pub close_t: Option<f64>,
    /// 직전 거래일 종가 (T-1)
    pub close_t1: Option<f64>,
    /// 그 이전 거래일 종가 (T-2)
    pub close_t2: Option<f64>,
    /// T-1 → T 등락률 (%)
    pub pct_change_t1: Option<f64>,
    /// T-2 → T-1 등락률 (%)
    pub pct_change_t2: Option<f64>,
    /// T-2 → T 누적 등락률 (%), 두 단계 등락률의 합이 아님
    pub cumulative_pct_change: Option<f64>,
}

impl PriceSummary {
    /// 모든 값이 비어 있는 요약 생성.
    pub fn unknown(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            close_t: None,
            close_t1: None,
            close_t2: None,
            pct_change_t1: None,
            pct_change_t2: None,
            cumulative_pct_change: None,
        }
    }

    /// 일별 종가에서 요약 생성.
    ///
    /// 종가는 거래일 오름차순으로 정렬한 뒤 뒤에서부터 읽습니다.
    /// 유한하지 않은 값은 버리고, 같은 날짜가 중복되면 나중 값을 사용합니다.
    pub fn from_closes(symbol: impl Into<String>, closes: &[DailyClose]) -> Self {
        let by_date: BTreeMap<NaiveDate, f64> = closes
            .iter()
            .filter(|c| c.close.is_finite())
            .map(|c| (c.date, c.close))
            .collect();

        // tail[0] = T, tail[1] = T-1, tail[2] = T-2
        let tail: Vec<f64> = by_date
            .values()
            .rev()
            .take(SUMMARY_TRADING_DAYS)
            .copied()
            .collect();

        let mut summary = Self::unknown(symbol);
        summary.close_t = tail.first().copied();
        summary.close_t1 = tail.get(1).copied();
        summary.close_t2 = tail.get(2).copied();

        if tail.len() == SUMMARY_TRADING_DAYS {
            summary.pct_change_t1 = pct_change(summary.close_t1, summary.close_t);
            summary.pct_change_t2 = pct_change(summary.close_t2, summary.close_t1);
            summary.cumulative_pct_change = pct_change(summary.close_t2, summary.close_t);
        }

        summary
    }

    /// 종가가 하나라도 있는지 확인.
    pub fn has_data(&self) -> bool {
        self.close_t.is_some()
    }
}

/// `prior` → `current` 등락률 (%).
///
/// 입력 중 하나라도 없거나 `prior`가 0이면 `None`.
pub fn pct_change(prior: Option<f64>, current: Option<f64>) -> Option<f64> {
    let (prior, current) = (prior?, current?);
    if prior == 0.0 {
        return None;
    }
    let change = (current - prior) * 100.0 / prior;
    change.is_finite().then_some(change)
}
