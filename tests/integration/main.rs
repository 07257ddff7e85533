//! Integration tests driving the in-memory hub end to end.

mod helpers;

mod class_test;
mod document_test;
mod project_test;
mod user_test;
