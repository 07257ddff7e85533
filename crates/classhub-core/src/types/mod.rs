//! Core type definitions used across the ClassHub workspace.

pub mod session;

pub use session::SessionViews;
