//! Finding downloadable artifacts on fetched pages
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────┐
//! │  Target URL │────▶│   Router    │────▶│ ArtifactLocator  │
//! └─────────────┘     │ (host rules)│     │ listing/redirect/│
//!                     └─────────────┘     │ direct           │
//!                                         └──────────────────┘
//!                                                  │
//!                                                  ▼
//!                                         ┌──────────────────┐
//!                                         │ CandidateArtifact│
//!                                         └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`]: locator kinds, variants, candidates and target specs
//! - [`traits`]: the [`ArtifactLocator`] trait
//! - [`page`]: HTML helpers shared by the locators
//! - [`listing`]: download boxes with one link per variant
//! - [`redirect`]: stable links followed through redirects
//! - [`direct`]: links that already name the artifact
//! - [`router`]: host rules deciding which locator a URL gets

pub mod direct;
pub mod listing;
pub mod page;
pub mod redirect;
pub mod router;
pub mod traits;
pub mod types;

pub use direct::DirectLinkLocator;
pub use listing::ListingPageLocator;
pub use redirect::RedirectChainLocator;
pub use router::TargetRouter;
pub use traits::ArtifactLocator;
pub use types::{CandidateArtifact, ChangeSignal, LocatorKind, TargetSpec, Variant};
