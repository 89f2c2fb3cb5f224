//! Error types for the query crate
//!
//! Parsing, synonym resolution and compilation never fail on user input; the
//! only fallible operation is loading configuration data.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Failed to read stop-word list {path}: {source}")]
    StopWordFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
