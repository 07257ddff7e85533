//! Document records, engagement, and search.

pub mod engagement;
pub mod search;
pub mod service;

pub use engagement::EngagementService;
pub use search::SearchService;
pub use service::{DocumentService, UploadDocumentRequest};
