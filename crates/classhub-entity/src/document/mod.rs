//! Document domain entities.

pub mod comment;
pub mod like;
pub mod model;
pub mod tag;

pub use comment::{CreateDocumentComment, DocumentComment};
pub use like::{Like, LikeOutcome, LikeToggle};
pub use model::{CreateDocument, Document, DocumentDeletion};
pub use tag::Tag;
