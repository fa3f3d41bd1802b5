//! 명령별 실행 모듈.

pub mod prices;
pub mod run;
pub mod scrape;
pub mod sources;

pub use prices::collect_prices;
pub use run::run_report;
pub use scrape::scrape_events;
pub use sources::{list_sources, SourceListing};

use chrono::NaiveDate;
use listwatch_data::{
    report_file_name, PriceDataUnavailable, ReportSink, SourceFailed, TableCodec,
};

use crate::{Result, RunStats};

/// 전체 리포트 파일명 접두사
pub const REPORT_PREFIX: &str = "listing_report";
/// 이벤트 파일명 접두사
pub const EVENTS_PREFIX: &str = "listing_events";
/// 가격 요약 파일명 접두사
pub const PRICES_PREFIX: &str = "closing_prices_summary";

/// 결과 인코딩과 저장 대상.
pub struct Output<'a> {
    codec: &'a dyn TableCodec,
    sink: &'a dyn ReportSink,
}

impl<'a> Output<'a> {
    pub fn new(codec: &'a dyn TableCodec, sink: &'a dyn ReportSink) -> Self {
        Self { codec, sink }
    }

    pub fn codec(&self) -> &dyn TableCodec {
        self.codec
    }

    /// `<prefix>_<as_of>.<ext>`로 저장하고 위치를 반환합니다.
    pub fn write(&self, prefix: &str, as_of: NaiveDate, bytes: &[u8]) -> Result<String> {
        let file_name = report_file_name(prefix, as_of, self.codec.extension());
        Ok(self.sink.write(&file_name, bytes)?)
    }
}

/// 명령 실행 결과.
#[derive(Debug, Clone)]
pub struct CommandReport {
    pub stats: RunStats,
    /// 저장 위치
    pub location: String,
    pub source_failures: Vec<SourceFailed>,
    pub price_warnings: Vec<PriceDataUnavailable>,
}
