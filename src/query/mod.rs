//! Read-side queries over cases and their documents

mod cases;
mod types;

pub use cases::CaseQueryService;
pub use types::{CaseDetail, Page, PageRequest, Pagination};
