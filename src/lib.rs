//! E-book Fetcher Library
//!
//! Mirrors a numerically indexed online e-book catalog: discovers the newest
//! item id, scrapes each item page for its metadata, streams the associated
//! file to disk and keeps a JSON snapshot so that later runs resume where the
//! previous one stopped.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
