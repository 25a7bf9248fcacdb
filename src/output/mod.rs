//! Output of simulation results
//!
//! ```text
//! output/
//! ├── mod.rs
//! └── export/
//!     ├── mod.rs
//!     └── csv.rs      ← radial profiles as CSV
//! ```
//!
//! Exporters accept a [`ConcentrationReport`](crate::solver::ConcentrationReport)
//! together with the grid it was sampled on, or the engine directly.

pub mod export;

pub use export::{CsvConfig, CsvMetadata, export_engine_csv, export_profile_csv};
