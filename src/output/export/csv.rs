//! CSV export of radial concentration profiles
//!
//! One row per cell centre: radius, total concentration, then one column per
//! size bin. The file is a write-only report for spreadsheets, pandas or
//! MATLAB; nothing in the crate reads it back.
//!
//! # Quick Example
//!
//! ```rust,no_run
//! use lamm_rs::config::SimulationConfig;
//! use lamm_rs::output::export::{export_engine_csv, CsvConfig, CsvMetadata};
//!
//! let mut engine = SimulationConfig::default().build_engine()?;
//! engine.set_initial_top_load(3);
//! let advanced = engine.advance_by(60.0, 5000).advanced;
//!
//! let config = CsvConfig::default().with_metadata(CsvMetadata::from_engine(&engine, advanced));
//! export_engine_csv(&engine, "profile.csv", Some(&config))?;
//! # Ok::<(), lamm_rs::error::LammError>(())
//! ```
//!
//! **Output** (`profile.csv`):
//! ```text
//! # Lamm Transport Profile
//! # Generated: 2026-02-11T15:30:00+00:00
//! # Omega: 3141.6 rad/s
//! # Temperature: 274.15 K
//! # Simulated Time: 60 s
//! # Bins: 100
//! #
//! Radius (m),Total,d=1.955nm,d=2.231nm,...
//! 6.763806e-2,2.307962e0,1.146001e-3,...
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{LammError, Result};
use crate::physics::RadialGrid;
use crate::solver::{ConcentrationReport, MultiSpeciesLamm};

// =============================================================================
// Configuration Structures
// =============================================================================

/// Formatting options for CSV export
///
/// # Example
///
/// ```rust
/// use lamm_rs::output::export::CsvConfig;
///
/// let config = CsvConfig::european().precision(10);
/// assert_eq!(config.delimiter, ';');
/// assert_eq!(config.decimal_separator, ',');
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Decimal separator (default: '.')
    pub decimal_separator: char,

    /// Number of significant digits in scientific notation (default: 6)
    pub precision: usize,

    /// Write `#`-prefixed metadata lines before the header (default: false)
    pub include_metadata: bool,

    pub metadata: Option<CsvMetadata>,

    /// Header of the radius column (default: "Radius (m)")
    pub radius_header: String,

    /// Header of the total concentration column (default: "Total")
    pub total_header: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            decimal_separator: '.',
            precision: 6,
            include_metadata: false,
            metadata: None,
            radius_header: "Radius (m)".to_string(),
            total_header: "Total".to_string(),
        }
    }
}

impl CsvConfig {
    /// Semicolon delimiter and comma decimal separator
    pub fn european() -> Self {
        Self {
            delimiter: ';',
            decimal_separator: ',',
            ..Default::default()
        }
    }

    /// Builder pattern: set delimiter
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder pattern: set precision
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Builder pattern: enable metadata
    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }
}

/// Run parameters written in the header comments
///
/// Only fields that are `Some` are written.
#[derive(Debug, Clone, Default)]
pub struct CsvMetadata {
    /// Rotor angular velocity (rad/s)
    pub omega: Option<f64>,

    /// Temperature (K)
    pub temperature: Option<f64>,

    /// Simulated time at which the profile was taken (s)
    pub simulated_time: Option<f64>,

    pub n_bins: Option<usize>,

    /// Additional key/value lines
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    /// Rotor state and bin count of `engine`, stamped with `simulated_time`
    pub fn from_engine(engine: &MultiSpeciesLamm, simulated_time: f64) -> Self {
        Self {
            omega: Some(engine.rotor().omega),
            temperature: Some(engine.rotor().temperature),
            simulated_time: Some(simulated_time),
            n_bins: Some(engine.n_bins()),
            custom: Vec::new(),
        }
    }

    pub fn add_custom(&mut self, key: String, value: String) {
        self.custom.push((key, value));
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn write_metadata_header<W: Write>(out: &mut W, metadata: &CsvMetadata) -> Result<()> {
    writeln!(out, "# Lamm Transport Profile")?;
    writeln!(out, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;

    if let Some(omega) = metadata.omega {
        writeln!(out, "# Omega: {omega} rad/s")?;
    }
    if let Some(temperature) = metadata.temperature {
        writeln!(out, "# Temperature: {temperature} K")?;
    }
    if let Some(t) = metadata.simulated_time {
        writeln!(out, "# Simulated Time: {t} s")?;
    }
    if let Some(n) = metadata.n_bins {
        writeln!(out, "# Bins: {n}")?;
    }
    for (key, value) in &metadata.custom {
        writeln!(out, "# {key}: {value}")?;
    }
    writeln!(out, "#")?;
    Ok(())
}

/// Scientific notation with the configured precision and decimal separator
///
/// Concentrations span many decades, so fixed-point formatting would flush
/// small bins to zero.
fn format_number(value: f64, config: &CsvConfig) -> String {
    let formatted = format!("{:.prec$e}", value, prec = config.precision);
    if config.decimal_separator != '.' {
        formatted.replace('.', &config.decimal_separator.to_string())
    } else {
        formatted
    }
}

/// Column label of a bin of diameter `d_nm`
pub fn bin_label(d_nm: f64) -> String {
    format!("d={d_nm:.3}nm")
}

// =============================================================================
// Export Functions
// =============================================================================

/// Writes a concentration report to CSV
///
/// # Arguments
///
/// * `grid` - Grid the report was taken on (provides the radius column)
/// * `report` - Output of [`MultiSpeciesLamm::concentrations`]
/// * `bin_labels` - One header per bin
/// * `output_path` - Destination file, overwritten if present
/// * `configuration` - Formatting options (default if `None`)
///
/// # Errors
///
/// - [`LammError::InvalidData`]: empty report, non-finite values, or a
///   delimiter equal to the decimal separator
/// - [`LammError::LengthMismatch`]: report rows vs grid cells, labels vs bins
/// - [`LammError::Io`]: file creation or write failure
pub fn export_profile_csv<P: AsRef<Path>>(
    grid: &RadialGrid,
    report: &ConcentrationReport,
    bin_labels: &[&str],
    output_path: P,
    configuration: Option<&CsvConfig>,
) -> Result<()> {
    // ============================= Validation =============================

    if report.species.is_empty() || report.total.is_empty() {
        return Err(LammError::InvalidData("concentration report is empty".to_string()));
    }
    if report.species.nrows() != grid.len() {
        return Err(LammError::length_mismatch("report rows", grid.len(), report.species.nrows()));
    }
    if report.total.len() != grid.len() {
        return Err(LammError::length_mismatch("report total", grid.len(), report.total.len()));
    }
    if bin_labels.len() != report.n_bins() {
        return Err(LammError::length_mismatch("bin labels", report.n_bins(), bin_labels.len()));
    }
    for (k, label) in bin_labels.iter().enumerate() {
        if report.bin(k).iter().any(|c| !c.is_finite()) {
            return Err(LammError::InvalidData(format!("NaN or Inf detected in bin {label}")));
        }
    }
    if report.total.iter().any(|c| !c.is_finite()) {
        return Err(LammError::InvalidData("NaN or Inf detected in total concentration".to_string()));
    }

    let binding = CsvConfig::default();
    let configuration = configuration.unwrap_or(&binding);
    if configuration.delimiter == configuration.decimal_separator {
        return Err(LammError::InvalidData(format!(
            "delimiter and decimal separator are both '{}'",
            configuration.delimiter
        )));
    }

    // ============================= Write ==================================

    let mut out = BufWriter::new(File::create(output_path.as_ref())?);
    let d = configuration.delimiter;

    if configuration.include_metadata {
        if let Some(metadata) = &configuration.metadata {
            write_metadata_header(&mut out, metadata)?;
        }
    }

    write!(out, "{}{d}{}", configuration.radius_header, configuration.total_header)?;
    for label in bin_labels {
        write!(out, "{d}{label}")?;
    }
    writeln!(out)?;

    for (i, &r) in grid.centers().iter().enumerate() {
        write!(
            out,
            "{}{d}{}",
            format_number(r, configuration),
            format_number(report.total[i], configuration)
        )?;
        for k in 0..report.n_bins() {
            write!(out, "{d}{}", format_number(report.species[(i, k)], configuration))?;
        }
        writeln!(out)?;
    }

    out.flush()?;
    log::debug!(
        "exported {} rows × {} bins to {}",
        grid.len(),
        report.n_bins(),
        output_path.as_ref().display()
    );
    Ok(())
}

/// Exports the current profile of `engine`, labelling bins by diameter
///
/// Bin diameters are recovered from the engine radii.
pub fn export_engine_csv<P: AsRef<Path>>(
    engine: &MultiSpeciesLamm,
    output_path: P,
    configuration: Option<&CsvConfig>,
) -> Result<()> {
    let labels: Vec<String> = engine.bin_radii().iter().map(|a| bin_label(2.0 * a * 1e9)).collect();
    let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    export_profile_csv(engine.grid(), &engine.concentrations(), &label_refs, output_path, configuration)
}

// =================================================================================================
// Tests
// =================================================================================================
