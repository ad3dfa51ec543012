//! Persisted baselines keyed by app and variant
//!
//! - [`key`]: tracking key derivation and filename sanitization
//! - [`store`]: JSON-backed baseline store

pub mod key;
pub mod store;

pub use key::{sanitize_text, suggested_filename, tracking_key};
pub use store::{Baseline, BaselineStore, TrackerStore, is_superseded};
