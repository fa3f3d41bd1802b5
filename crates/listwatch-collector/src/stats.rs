//! 실행 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 실행 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// 요청 심볼 수
    pub symbols: usize,
    /// 가격 요약 행 수
    pub price_rows: usize,
    /// 가격 경고 수 (데이터 없음, 조회 실패)
    pub price_warnings: usize,
    /// 성공한 소스 수
    pub sources_ok: usize,
    /// 실패했거나 부분 데이터만 낸 소스 수
    pub sources_failed: usize,
    /// 수집 이벤트 수
    pub events: usize,
    /// 출력 행 수
    pub report_rows: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 소스 성공률 (%)
    pub fn source_success_rate(&self) -> f64 {
        let total = self.sources_ok + self.sources_failed;
        if total == 0 {
            0.0
        } else {
            (self.sources_ok as f64 / total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            symbols = self.symbols,
            price_rows = self.price_rows,
            price_warnings = self.price_warnings,
            sources_ok = self.sources_ok,
            sources_failed = self.sources_failed,
            events = self.events,
            report_rows = self.report_rows,
            source_success_rate = format!("{:.1}%", self.source_success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "실행 완료"
        );
    }
}
