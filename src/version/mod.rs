//! Version extraction and comparison
//!
//! # Modules
//!
//! - [`parser`]: pulls version strings out of URLs, filenames, labels and headers
//! - [`comparator`]: "is this newer than the baseline" decisions

pub mod comparator;
pub mod parser;

pub use comparator::{UNSEEN_VERSION, is_newer, is_size_changed};
pub use parser::{ExtractedVersion, ExtractionSource, extract_first, extract_version};
