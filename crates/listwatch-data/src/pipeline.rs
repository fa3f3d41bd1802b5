//! 수집 파이프라인.
//!
//! 소스 수집(재시도/격리/정규화)과 가격 조회를 동시에 실행하고 결과를 조인합니다.
//! 소스 또는 심볼 단위 실패는 `RunOutcome`의 경고로 돌려주며, 실행 전체를
//! 중단시키는 것은 입력 오류, 사용 가능한 소스 없음, 취소뿐입니다.

use std::sync::Arc;

use chrono::NaiveDate;
use listwatch_core::{
    normalize_symbol_list, AppConfig, ListwatchError, ListwatchResult, Report,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::aggregator::{Aggregation, SourceAggregator};
use crate::codec::{CsvTableCodec, TableCodec};
use crate::error::{PriceDataUnavailable, SourceFailed};
use crate::fetcher::{HttpSessionFactory, SessionFactory};
use crate::price::{PriceHistoryFetcher, PriceTable, YahooDailyCloseProvider};
use crate::reconcile::Reconciler;
use crate::retry::RetryPolicy;
use crate::source::{SourceAdapter, SourceCatalog};

/// 실행마다 새 어댑터 목록을 만듭니다.
pub trait AdapterProvider: Send + Sync {
    fn adapters(&self) -> Vec<Box<dyn SourceAdapter>>;
}

/// 실행 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub report: Report,
    /// 실패했거나 부분 데이터만 낸 소스
    pub source_failures: Vec<SourceFailed>,
    /// 가격을 얻지 못한 심볼
    pub price_warnings: Vec<PriceDataUnavailable>,
    /// 조회한 심볼 수
    pub symbol_count: usize,
    /// 수집한 이벤트 수
    pub event_count: usize,
    /// 실행한 소스 수
    pub source_count: usize,
    /// 가격 요약을 얻은 심볼 수
    pub priced_count: usize,
}

impl RunOutcome {
    pub fn has_warnings(&self) -> bool {
        !self.source_failures.is_empty() || !self.price_warnings.is_empty()
    }
}

/// 수집 파이프라인.
pub struct Pipeline {
    adapters: Arc<dyn AdapterProvider>,
    aggregator: SourceAggregator,
    /// 소스 수집 전용 구성이면 None
    prices: Option<PriceHistoryFetcher>,
    reconciler: Reconciler,
}

impl Pipeline {
    pub fn new(
        adapters: Arc<dyn AdapterProvider>,
        aggregator: SourceAggregator,
        prices: PriceHistoryFetcher,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            adapters,
            aggregator,
            prices: Some(prices),
            reconciler,
        }
    }

    /// 가격 조회 없이 소스 수집만 하는 파이프라인.
    pub fn sources_only(adapters: Arc<dyn AdapterProvider>, aggregator: SourceAggregator) -> Self {
        Self {
            adapters,
            aggregator,
            prices: None,
            reconciler: Reconciler::default(),
        }
    }

    /// 설정에서 HTTP 세션, 소스 카탈로그, Yahoo Finance 제공자로 구성합니다.
    pub fn from_config(config: &AppConfig) -> ListwatchResult<Self> {
        let provider = YahooDailyCloseProvider::new()
            .map_err(|e| ListwatchError::Capability(e.to_string()))?;

        let mut pipeline = Self::sources_from_config(config);
        pipeline.prices = Some(PriceHistoryFetcher::from_config(
            Arc::new(provider),
            &config.prices,
        ));
        pipeline.reconciler = Reconciler::new(config.report.join);
        Ok(pipeline)
    }

    /// 설정에서 소스 수집 전용으로 구성합니다 (가격 제공자를 만들지 않음).
    pub fn sources_from_config(config: &AppConfig) -> Self {
        let sessions: Arc<dyn SessionFactory> =
            Arc::new(HttpSessionFactory::from_config(&config.scrape));
        let codec: Arc<dyn TableCodec> = Arc::new(CsvTableCodec);
        let catalog = SourceCatalog::new(sessions, codec, &config.scrape);

        Self::sources_only(
            Arc::new(catalog),
            SourceAggregator::new(
                RetryPolicy::from_config(&config.retry),
                config.scrape.max_concurrency,
            ),
        )
    }

    fn price_fetcher(&self) -> ListwatchResult<&PriceHistoryFetcher> {
        self.prices.as_ref().ok_or_else(|| {
            ListwatchError::Capability("가격 제공자가 구성되지 않았습니다".to_string())
        })
    }

    fn adapters(&self) -> ListwatchResult<Vec<Box<dyn SourceAdapter>>> {
        let adapters = self.adapters.adapters();
        if adapters.is_empty() {
            return Err(ListwatchError::Capability(
                "활성화된 소스가 없습니다".to_string(),
            ));
        }
        Ok(adapters)
    }

    /// 소스 수집 + 가격 조회 + 조인.
    pub async fn run(
        &self,
        symbols: &[String],
        as_of: NaiveDate,
        cancel: &CancellationToken,
    ) -> ListwatchResult<RunOutcome> {
        let symbols = normalize_symbol_list(symbols)?;
        let adapters = self.adapters()?;
        let price_fetcher = self.price_fetcher()?;

        info!(
            symbols = symbols.len(),
            sources = adapters.len(),
            as_of = %as_of,
            join = %self.reconciler.mode(),
            "실행 시작"
        );

        let (aggregation, prices) = tokio::join!(
            self.aggregator.aggregate(adapters, cancel),
            price_fetcher.fetch_all(&symbols, as_of, cancel),
        );
        let aggregation = aggregation?;
        let prices = prices?;

        let report = self
            .reconciler
            .merge(as_of, &prices.summaries, &aggregation.events);

        info!(
            rows = report.len(),
            source_failures = aggregation.failures.len(),
            price_warnings = prices.warnings.len(),
            "실행 완료"
        );

        Ok(RunOutcome {
            report,
            source_failures: aggregation.failures,
            price_warnings: prices.warnings,
            symbol_count: symbols.len(),
            event_count: aggregation.events.len(),
            source_count: aggregation.sources,
            priced_count: prices.summaries.len(),
        })
    }

    /// 소스 수집만 실행합니다.
    pub async fn scrape(&self, cancel: &CancellationToken) -> ListwatchResult<Aggregation> {
        let adapters = self.adapters()?;
        self.aggregator.aggregate(adapters, cancel).await
    }

    /// 가격 조회만 실행합니다.
    pub async fn prices(
        &self,
        symbols: &[String],
        as_of: NaiveDate,
        cancel: &CancellationToken,
    ) -> ListwatchResult<PriceTable> {
        let symbols = normalize_symbol_list(symbols)?;
        self.price_fetcher()?
            .fetch_all(&symbols, as_of, cancel)
            .await
    }
}
