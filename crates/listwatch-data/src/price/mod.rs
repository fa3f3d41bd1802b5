//! 최근 종가 요약 조회.
//!
//! 기준일 T에 대해 `[T - lookback, T + 1]` 구간의 일봉 종가를 받아
//! T 이하의 마지막 3거래일로 `PriceSummary`를 만듭니다.

mod yahoo;

pub use yahoo::YahooDailyCloseProvider;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use futures::stream::{self, StreamExt};
use listwatch_core::{DailyClose, ListwatchError, ListwatchResult, PriceConfig, PriceSummary};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{PriceDataUnavailable, PriceError, PriceWarningReason};

/// 일봉 종가 제공자.
#[async_trait]
pub trait DailyCloseProvider: Send + Sync {
    /// 제공자 이름 (로그용).
    fn name(&self) -> &str;

    /// `[start, end]` 구간의 일봉 종가. 순서는 보장하지 않습니다.
    async fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyClose>, PriceError>;
}

/// 심볼 하나의 조회 결과.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceLookup {
    /// 종가가 하나 이상 있음
    Found(PriceSummary),
    /// 구간 내 데이터 없음 또는 조회 실패. 모든 값이 unknown인 요약을 포함
    NoData {
        summary: PriceSummary,
        warning: PriceDataUnavailable,
    },
    /// 심볼 자체를 찾지 못함. 가격 쪽에서 제외
    Unresolved(PriceDataUnavailable),
}

impl PriceLookup {
    pub fn summary(&self) -> Option<&PriceSummary> {
        match self {
            PriceLookup::Found(summary) | PriceLookup::NoData { summary, .. } => Some(summary),
            PriceLookup::Unresolved(_) => None,
        }
    }

    pub fn warning(&self) -> Option<&PriceDataUnavailable> {
        match self {
            PriceLookup::Found(_) => None,
            PriceLookup::NoData { warning, .. } | PriceLookup::Unresolved(warning) => Some(warning),
        }
    }

    fn into_parts(self) -> (Option<PriceSummary>, Option<PriceDataUnavailable>) {
        match self {
            PriceLookup::Found(summary) => (Some(summary), None),
            PriceLookup::NoData { summary, warning } => (Some(summary), Some(warning)),
            PriceLookup::Unresolved(warning) => (None, Some(warning)),
        }
    }
}

/// 여러 심볼의 조회 결과.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    /// 입력 순서의 요약 (조회 실패 심볼 제외)
    pub summaries: Vec<PriceSummary>,
    pub warnings: Vec<PriceDataUnavailable>,
}

/// 최근 종가 요약 조회기.
pub struct PriceHistoryFetcher {
    provider: Arc<dyn DailyCloseProvider>,
    lookback_days: i64,
    workers: usize,
}

impl PriceHistoryFetcher {
    pub fn new(provider: Arc<dyn DailyCloseProvider>, lookback_days: i64, workers: usize) -> Self {
        Self {
            provider,
            lookback_days: lookback_days.max(1),
            workers: workers.max(1),
        }
    }

    pub fn from_config(provider: Arc<dyn DailyCloseProvider>, config: &PriceConfig) -> Self {
        Self::new(provider, config.lookback_days, config.workers)
    }

    /// 조회 구간 `(as_of - lookback, as_of + 1)`.
    pub fn window(&self, as_of: NaiveDate) -> (NaiveDate, NaiveDate) {
        (
            as_of - Duration::days(self.lookback_days),
            as_of + Duration::days(1),
        )
    }

    /// 심볼 하나의 요약.
    pub async fn fetch(&self, symbol: &str, as_of: NaiveDate) -> PriceLookup {
        let (start, end) = self.window(as_of);

        let closes = match self.provider.daily_closes(symbol, start, end).await {
            Ok(closes) => closes,
            Err(err @ PriceError::Unresolved { .. }) => {
                warn!(symbol, provider = self.provider.name(), error = %err, "심볼 조회 불가");
                return PriceLookup::Unresolved(PriceDataUnavailable {
                    symbol: symbol.to_string(),
                    reason: PriceWarningReason::Unresolved,
                    message: err.to_string(),
                });
            }
            // 일시 장애도 행은 유지 (모든 값 unknown)
            Err(err) => {
                warn!(symbol, provider = self.provider.name(), error = %err, "가격 조회 실패");
                return PriceLookup::NoData {
                    summary: PriceSummary::unknown(symbol),
                    warning: PriceDataUnavailable {
                        symbol: symbol.to_string(),
                        reason: PriceWarningReason::FetchFailed,
                        message: err.to_string(),
                    },
                };
            }
        };

        // T 이후의 봉은 사용하지 않음
        let closes: Vec<DailyClose> = closes
            .into_iter()
            .filter(|c| c.date >= start && c.date <= as_of)
            .collect();

        let summary = PriceSummary::from_closes(symbol, &closes);
        if summary.has_data() {
            debug!(symbol, closes = closes.len(), "가격 요약 생성");
            PriceLookup::Found(summary)
        } else {
            warn!(symbol, start = %start, as_of = %as_of, "구간 내 가격 데이터 없음");
            PriceLookup::NoData {
                summary,
                warning: PriceDataUnavailable {
                    symbol: symbol.to_string(),
                    reason: PriceWarningReason::NoData,
                    message: format!("{} ~ {} 구간에 종가가 없습니다", start, as_of),
                },
            }
        }
    }

    /// 여러 심볼을 `workers`개씩 동시에 조회합니다. 결과는 입력 순서입니다.
    pub async fn fetch_all(
        &self,
        symbols: &[String],
        as_of: NaiveDate,
        cancel: &CancellationToken,
    ) -> ListwatchResult<PriceTable> {
        let total = symbols.len();
        info!(symbols = total, workers = self.workers, as_of = %as_of, "가격 조회 시작");

        let lookups = stream::iter(symbols.iter().enumerate())
            .map(|(index, symbol)| async move {
                info!(current = index + 1, total, symbol = %symbol, "가격 조회");
                (index, self.fetch(symbol, as_of).await)
            })
            .buffer_unordered(self.workers)
            .collect::<Vec<_>>();

        let mut lookups = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("가격 조회 취소됨");
                return Err(ListwatchError::Cancelled);
            }
            lookups = lookups => lookups,
        };
        lookups.sort_by_key(|(index, _)| *index);

        let mut table = PriceTable::default();
        for (_, lookup) in lookups {
            let (summary, warning) = lookup.into_parts();
            table.summaries.extend(summary);
            table.warnings.extend(warning);
        }

        info!(
            symbols = total,
            summaries = table.summaries.len(),
            warnings = table.warnings.len(),
            "가격 조회 완료"
        );
        Ok(table)
    }
}
