//! Class domain entities.

pub mod model;

pub use model::{AdminSetUpdate, Class, ClassDeletion, CreateClass};
