//! 상장 상태 소스 수집 및 가격 대조.
//!
//! 이 crate는 다음을 제공합니다:
//! - `PageFetcher`: 페이지 조회/조작 기능 (reqwest + scraper 구현 포함)
//! - 소스별 어댑터 (NYSE 2종, Nasdaq 3종)
//! - 원시 행 → `ListingEvent` 정규화
//! - 재시도 정책과 소스 격리 집계
//! - Yahoo Finance 기반 최근 종가 요약
//! - 가격 요약 ↔ 이벤트 외부 조인
//! - CSV 코덱과 출력 sink
//! - 위 구성요소를 묶는 `Pipeline`

pub mod aggregator;
pub mod codec;
pub mod error;
pub mod fetcher;
pub mod normalizer;
pub mod pipeline;
pub mod price;
pub mod reconcile;
pub mod retry;
pub mod sink;
pub mod source;

pub use aggregator::{Aggregation, SourceAggregator};
pub use codec::{CsvTableCodec, TableCodec, SYMBOL_COLUMN};
pub use error::{
    CodecError, PriceDataUnavailable, PriceError, PriceWarningReason, SinkError, SourceError,
    SourceErrorKind, SourceFailed, SourceResult,
};
pub use fetcher::{
    Download, ElementHandle, HttpFetcherSettings, HttpPageFetcher, HttpSessionFactory,
    PageFetcher, SessionFactory,
};
pub use normalizer::{normalize, normalize_all, split_symbols, FieldMapping, SymbolSplit};
pub use pipeline::{AdapterProvider, Pipeline, RunOutcome};
pub use price::{
    DailyCloseProvider, PriceHistoryFetcher, PriceLookup, PriceTable, YahooDailyCloseProvider,
};
pub use reconcile::Reconciler;
pub use retry::{RetryError, RetryPolicy};
pub use sink::{report_file_name, FileSink, MemorySink, ReportSink};
pub use source::{
    RawRecord, SourceAdapter, SourceCatalog, SourceTimeouts, PLACEHOLDER,
};
