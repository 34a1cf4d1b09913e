//! Services over the collection store, plus the pure SEO and validation
//! helpers they share.

pub mod ai;
pub mod blog;
pub mod catalog;
pub mod error;
pub mod legal;
pub mod navigation;
pub mod orders;
pub mod scheduler;
pub mod seo;
pub mod store;
pub mod validation;
