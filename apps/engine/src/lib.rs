//! Citeline - citation search engine
//!
//! Answers structured and free-text queries over a citation catalogue:
//! - Free-text queries compiled through `citeline-query`
//! - Classification matching with AND/OR set algebra and frequency ranking
//! - Partial-date comparator searches
//! - Deterministic multi-key ordering, paging and navigation links
//! - Best-effort search audit logging

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{Error, Result};
