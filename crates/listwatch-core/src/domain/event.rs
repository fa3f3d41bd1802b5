//! 상장 상태 이벤트 및 소스 식별자.
//!
//! 모든 소스의 행은 `ListingEvent` 하나의 정규 스키마로 변환됩니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 상장 상태 데이터를 게시하는 외부 소스.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceName {
    /// NYSE 기준 미달 발행사 목록
    NyseNoncompliant,
    /// NYSE 상장폐지 목록
    NyseDelisting,
    /// Nasdaq 거래정지/상장폐지 예정 목록
    NasdaqPendingSuspension,
    /// Nasdaq Reg SHO 공매도 임계 종목 목록
    NasdaqThreshold,
    /// Nasdaq 기준 미달 기업 목록 (CSV 내보내기)
    NasdaqNoncompliantExport,
}

impl SourceName {
    /// 모든 소스 반환.
    pub fn all() -> [SourceName; 5] {
        [
            SourceName::NyseNoncompliant,
            SourceName::NyseDelisting,
            SourceName::NasdaqPendingSuspension,
            SourceName::NasdaqThreshold,
            SourceName::NasdaqNoncompliantExport,
        ]
    }

    /// 설정/CLI에서 쓰는 식별자.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceName::NyseNoncompliant => "nyse_noncompliant",
            SourceName::NyseDelisting => "nyse_delisting",
            SourceName::NasdaqPendingSuspension => "nasdaq_pending_suspension",
            SourceName::NasdaqThreshold => "nasdaq_threshold",
            SourceName::NasdaqNoncompliantExport => "nasdaq_noncompliant_export",
        }
    }

    /// 리포트에 표시할 이름.
    pub fn label(&self) -> &'static str {
        match self {
            SourceName::NyseNoncompliant => "NYSE Noncompliant Issuers",
            SourceName::NyseDelisting => "NYSE Delistings",
            SourceName::NasdaqPendingSuspension => "Nasdaq Pending Suspension/Delisting",
            SourceName::NasdaqThreshold => "Nasdaq Reg SHO Threshold",
            SourceName::NasdaqNoncompliantExport => "Nasdaq Noncompliant Companies",
        }
    }

    /// 소스의 정규 URL (`ListingEvent::source_link`).
    pub fn canonical_url(&self) -> &'static str {
        match self {
            SourceName::NyseNoncompliant => "https://www.nyse.com/regulation/noncompliant-issuers",
            SourceName::NyseDelisting => "https://www.nyse.com/regulation/delistings",
            SourceName::NasdaqPendingSuspension => {
                "https://listingcenter.nasdaq.com/IssuersPendingSuspensionDelisting.aspx"
            }
            SourceName::NasdaqThreshold => {
                "https://www.nasdaqtrader.com/trader.aspx?id=regshothreshold"
            }
            SourceName::NasdaqNoncompliantExport => {
                "https://listingcenter.nasdaq.com/noncompliantcompanylist.aspx"
            }
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        SourceName::all()
            .into_iter()
            .find(|source| source.as_str() == key)
            .ok_or_else(|| format!("Unknown source: {}", s))
    }
}

/// 정규화된 상장 상태 이벤트.
///
/// 여러 심볼이 한 셀에 들어 있는 소스 행은 심볼마다 하나의 이벤트로 펼쳐지며,
/// 심볼 외 필드는 모두 동일합니다. `None`은 소스에 값이 없었음을 뜻합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingEvent {
    /// 대문자 티커 (비어 있지 않음)
    pub symbol: String,
    /// 발행사명
    pub issuer: Option<String>,
    /// 기준 미달 내용 또는 사유
    pub deficiency_or_reason: Option<String>,
    /// 소스 표기 그대로의 날짜 문자열
    pub date: Option<String>,
    /// 원본 소스 URL
    pub source_link: String,
    /// 소스 식별자
    pub source_name: SourceName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_name_round_trip_through_str() {
        for source in SourceName::all() {
            assert_eq!(source.as_str().parse::<SourceName>().unwrap(), source);
        }
        assert_eq!(
            "NYSE-Delisting".parse::<SourceName>().unwrap(),
            SourceName::NyseDelisting
        );
        assert!("nyse".parse::<SourceName>().is_err());
    }

    #[test]
    fn test_source_name_serde() {
        let json = serde_json::to_string(&SourceName::NasdaqThreshold).unwrap();
        assert_eq!(json, "\"nasdaq_threshold\"");
    }

    #[test]
    fn test_canonical_urls_are_https() {
        for source in SourceName::all() {
            assert!(source.canonical_url().starts_with("https://"));
        }
    }
}
