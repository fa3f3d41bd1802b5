//! 소스 집계.
//!
//! 선택된 소스를 동시에(최대 `max_concurrency`개) 실행합니다. 소스 하나의 실패는
//! `SourceFailed`로 기록되고 나머지 소스의 결과에 영향을 주지 않습니다.
//! 결과는 완료 순서와 관계없이 소스 순서로 합칩니다.

use futures::stream::{self, StreamExt};
use listwatch_core::{ListingEvent, ListwatchError, ListwatchResult, SourceName};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::SourceFailed;
use crate::normalizer::normalize_all;
use crate::retry::RetryPolicy;
use crate::source::SourceAdapter;

/// 집계 결과.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// 모든 소스의 정규화된 이벤트 (소스 순서, 소스 내 행 순서)
    pub events: Vec<ListingEvent>,
    /// 실패한 소스 (한도 도달로 부분 데이터만 있는 소스 포함)
    pub failures: Vec<SourceFailed>,
    /// 실행한 소스 수
    pub sources: usize,
}

impl Aggregation {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// 실패 없이 끝난 소스 수.
    pub fn succeeded(&self) -> usize {
        self.sources.saturating_sub(self.failures.len())
    }
}

struct SourceSlot {
    source: SourceName,
    events: Vec<ListingEvent>,
    failure: Option<SourceFailed>,
}

/// 소스 격리 집계기.
#[derive(Debug, Clone)]
pub struct SourceAggregator {
    retry: RetryPolicy,
    max_concurrency: usize,
}

impl SourceAggregator {
    pub fn new(retry: RetryPolicy, max_concurrency: usize) -> Self {
        Self {
            retry,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// 모든 어댑터를 실행하고 결과를 합칩니다.
    ///
    /// 취소되면 진행 중인 소스를 중단하고 `ListwatchError::Cancelled`를 반환합니다.
    pub async fn aggregate(
        &self,
        adapters: Vec<Box<dyn SourceAdapter>>,
        cancel: &CancellationToken,
    ) -> ListwatchResult<Aggregation> {
        let total = adapters.len();
        info!(sources = total, concurrency = self.max_concurrency, "소스 수집 시작");

        let collect = stream::iter(adapters.iter().map(|adapter| self.collect_one(adapter.as_ref())))
            .buffer_unordered(self.max_concurrency)
            .collect::<Vec<_>>();

        let mut slots = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("소스 수집 취소됨");
                return Err(ListwatchError::Cancelled);
            }
            slots = collect => slots,
        };

        slots.sort_by_key(|slot| slot.source);

        let mut aggregation = Aggregation {
            sources: total,
            ..Default::default()
        };
        for slot in slots {
            aggregation.events.extend(slot.events);
            if let Some(failure) = slot.failure {
                aggregation.failures.push(failure);
            }
        }

        info!(
            sources = total,
            events = aggregation.events.len(),
            failed = aggregation.failures.len(),
            "소스 수집 완료"
        );
        Ok(aggregation)
    }

    async fn collect_one(&self, adapter: &dyn SourceAdapter) -> SourceSlot {
        let source = adapter.source();
        match self.retry.execute(adapter).await {
            Ok(records) => {
                let events = normalize_all(&records, source);
                info!(source = %source, rows = records.len(), events = events.len(), "소스 정규화 완료");
                SourceSlot {
                    source,
                    events,
                    failure: None,
                }
            }
            Err(err) => {
                let failure = err.to_failure();
                let partial = err.into_partial();
                let events = normalize_all(&partial, source);
                if !events.is_empty() {
                    warn!(source = %source, events = events.len(), "부분 데이터 사용");
                }
                SourceSlot {
                    source,
                    events,
                    failure: Some(failure),
                }
            }
        }
    }
}
