//! 소스 목록 출력.

use std::fmt;

use listwatch_core::SourceName;

/// 소스 하나의 표시 정보.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceListing {
    pub name: SourceName,
    pub label: &'static str,
    pub url: &'static str,
    /// 현재 설정에서 실행 대상인지
    pub enabled: bool,
}

impl fmt::Display for SourceListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.enabled { "*" } else { " " };
        write!(
            f,
            "{} {:<28} {:<28} {}",
            marker,
            self.name.as_str(),
            self.label,
            self.url
        )
    }
}

/// 전체 소스 목록. `enabled`에 포함된 소스는 실행 대상으로 표시됩니다.
pub fn list_sources(enabled: &[SourceName]) -> Vec<SourceListing> {
    SourceName::all()
        .into_iter()
        .map(|name| SourceListing {
            name,
            label: name.label(),
            url: name.canonical_url(),
            enabled: enabled.contains(&name),
        })
        .collect()
}
