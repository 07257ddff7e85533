//! PostgreSQL implementations of the store traits.
//!
//! One repository per aggregate, each a thin struct around the shared
//! `PgPool`. Multi-statement invariants (admin-set role recompute, join
//! approval, the owner-stays-a-member rule, like toggling, tag linking)
//! run inside explicit transactions; everything else is single-statement
//! atomic.

pub mod class;
pub mod document;
pub mod project;
pub mod user;

pub use class::ClassRepository;
pub use document::DocumentRepository;
pub use project::ProjectRepository;
pub use user::UserRepository;
