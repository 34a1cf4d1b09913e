//! Timberline: content, catalog, and estimate back office for a timber
//! products storefront.
//!
//! The crate is layered the same way throughout: `domain` holds plain records
//! and pure rules, `application` holds services over the collection store,
//! `infra` adapts the outside world (storage backends, the LLM, HTTP), and
//! `config` resolves deployment settings.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
