//! Domain layer types and invariants.

pub mod accounts;
pub mod content;
pub mod entities;
pub mod seo;
pub mod slug;
pub mod types;
