//! Error types
//!
//! Numerical degeneracies inside the transport core never produce errors: they
//! degrade to zero coefficients, uniform weights or an empty result. The
//! variants below only cover violations at the API boundary (mismatched array
//! lengths, impossible grids) and the I/O surfaces (configuration files, CSV
//! export).

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, LammError>;

/// Errors surfaced at the boundary of the crate
#[derive(Error, Debug)]
pub enum LammError {
    /// Radial bounds or cell count cannot describe a grid
    #[error("invalid radial grid: {0}")]
    InvalidGrid(String),

    /// Two arrays that must describe the same axis disagree in length
    #[error("length mismatch for {what}: expected {expected}, got {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// The engine needs at least one size bin
    #[error("engine configuration must contain at least one size bin")]
    NoBins,

    /// Data handed to an exporter cannot be written
    #[error("invalid export data: {0}")]
    InvalidData(String),

    /// Filesystem failure while reading configuration or writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML configuration
    #[error("configuration parse error: {0}")]
    Config(#[from] toml::de::Error),
}

impl LammError {
    pub(crate) fn length_mismatch(what: &'static str, expected: usize, found: usize) -> Self {
        Self::LengthMismatch { what, expected, found }
    }
}
