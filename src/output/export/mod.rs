//! Data export for external analysis
//!
//! | Format  | Module    |
//! |---------|-----------|
//! | CSV     | [`csv`]   |
//!
//! Exports are write-only reports: the engine state itself is never
//! persisted or reloaded.

pub mod csv;

pub use csv::{CsvConfig, CsvMetadata, bin_label, export_engine_csv, export_profile_csv};
