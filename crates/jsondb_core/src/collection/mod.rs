//! Collection engine.
//!
//! Provides [`Collection`], the create/find/update/delete/list surface over
//! one [`Store`](crate::Store), and the validation it applies.

mod engine;
mod validate;

pub use engine::Collection;
pub use validate::validate;
