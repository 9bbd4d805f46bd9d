//! Error taxonomy for plate planning.
//!
//! Three domain failures exist: [`PlateError::Configuration`] for unusable
//! inputs (empty pools, odd grids, mismatched lists), [`PlateError::Capacity`]
//! when the pair space cannot cover the requested cells, and
//! [`PlateError::Lookup`] when a join or pivot cannot resolve a record.
//! Everything else is a wrapped I/O or format error from a collaborator.
use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum PlateError {
    /// Pool, grid or cell list cannot be used as given.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The usable pair space is smaller than the number of destination cells.
    #[error("Capacity error: {cells} cells requested but only {capacity} distinct forward/reverse pairs are available")]
    Capacity { cells: usize, capacity: usize },

    /// A source label or role could not be resolved against a lookup table.
    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl PlateError {
    /// Shorthand for a [`PlateError::Configuration`].
    pub fn config(message: impl Into<String>) -> Self {
        PlateError::Configuration(message.into())
    }

    /// Shorthand for a [`PlateError::Lookup`].
    pub fn lookup(message: impl Into<String>) -> Self {
        PlateError::Lookup(message.into())
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, PlateError>;
