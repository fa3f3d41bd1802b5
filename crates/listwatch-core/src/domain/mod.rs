//! 상장 상태 리포트를 위한 도메인 모델.

mod event;
mod price;
mod report;
mod symbol;

pub use event::*;
pub use price::*;
pub use report::*;
pub use symbol::*;
