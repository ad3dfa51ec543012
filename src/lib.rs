pub mod config;
pub mod error;
pub mod fetch;
pub mod locator;
pub mod logging;
pub mod report;
pub mod run;
pub mod tracker;
pub mod version;
