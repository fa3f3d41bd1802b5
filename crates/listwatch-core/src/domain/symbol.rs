//! 티커 심볼 정규화.

use std::collections::HashSet;

use crate::error::{ListwatchError, ListwatchResult};

/// 심볼 최대 길이.
const MAX_SYMBOL_LEN: usize = 20;

/// 공백을 제거하고 대문자로 변환합니다. 빈 문자열이면 `None`.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_uppercase();
    (!symbol.is_empty()).then_some(symbol)
}

/// 입력 심볼로 사용할 수 있는 형식인지 확인.
///
/// 영숫자와 `.` `-` `^` `=` `/` 만 허용합니다 (예: BRK.B, BRK-B, ^GSPC, EURUSD=X).
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= MAX_SYMBOL_LEN
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | '/'))
}

/// 입력 심볼 목록 정규화.
///
/// 빈 항목은 건너뛰고 중복은 처음 등장한 순서대로 하나만 남깁니다.
/// 형식이 잘못된 심볼이 있거나 남는 심볼이 없으면 에러입니다.
pub fn normalize_symbol_list<I, S>(raw: I) -> ListwatchResult<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();

    for item in raw {
        let Some(symbol) = normalize_symbol(item.as_ref()) else {
            continue;
        };
        if !is_valid_symbol(&symbol) {
            return Err(ListwatchError::InvalidInput(format!(
                "잘못된 심볼 형식: {:?}",
                item.as_ref()
            )));
        }
        if seen.insert(symbol.clone()) {
            symbols.push(symbol);
        }
    }

    if symbols.is_empty() {
        return Err(ListwatchError::InvalidInput(
            "심볼 목록이 비어 있습니다".to_string(),
        ));
    }

    Ok(symbols)
}
