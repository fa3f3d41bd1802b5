//! 가격 요약 ↔ 상장 이벤트 조인.
//!
//! 키는 대문자 심볼입니다. 한 심볼에 이벤트가 여러 개면 이벤트마다 한 행이 생기고
//! 가격 값은 복제됩니다. 행 순서는 가격 입력 순서, 그다음 이벤트에만 있는 심볼의
//! 첫 등장 순서입니다.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use listwatch_core::{JoinMode, ListingEvent, PriceSummary, Report, ReportRow};
use tracing::debug;

/// 조인 실행기.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciler {
    mode: JoinMode,
}

impl Reconciler {
    pub fn new(mode: JoinMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> JoinMode {
        self.mode
    }

    /// 가격 요약과 이벤트를 합쳐 리포트를 만듭니다.
    pub fn merge(
        &self,
        as_of: NaiveDate,
        prices: &[PriceSummary],
        events: &[ListingEvent],
    ) -> Report {
        let mut by_symbol: HashMap<String, Vec<&ListingEvent>> = HashMap::new();
        let mut event_order: Vec<String> = Vec::new();
        for event in events {
            let key = event.symbol.trim().to_uppercase();
            let group = by_symbol.entry(key.clone()).or_default();
            if group.is_empty() {
                event_order.push(key);
            }
            group.push(event);
        }

        let mut rows = Vec::with_capacity(prices.len().max(events.len()));
        let mut priced: HashSet<String> = HashSet::new();

        for price in prices {
            let key = price.symbol.trim().to_uppercase();
            match by_symbol.get(&key) {
                Some(group) => rows.extend(group.iter().map(|event| ReportRow {
                    symbol: key.clone(),
                    price: Some(price.clone()),
                    event: Some((*event).clone()),
                })),
                None => rows.push(ReportRow {
                    symbol: key.clone(),
                    price: Some(price.clone()),
                    event: None,
                }),
            }
            priced.insert(key);
        }

        if self.mode == JoinMode::Full {
            for key in event_order.iter().filter(|key| !priced.contains(*key)) {
                if let Some(group) = by_symbol.get(key) {
                    rows.extend(group.iter().map(|event| ReportRow {
                        symbol: key.clone(),
                        price: None,
                        event: Some((*event).clone()),
                    }));
                }
            }
        }

        debug!(
            mode = %self.mode,
            prices = prices.len(),
            events = events.len(),
            rows = rows.len(),
            "조인 완료"
        );
        Report::new(as_of, rows)
    }
}
