//! Run configuration
//!
//! [`SimulationConfig`] gathers every parameter of a run. Its `Default`
//! reproduces the reference preset: a 780 → 1426 kg/m³ linear gradient over
//! 6.74–15.31 cm, silicon-core particles with a 1.66 nm organic shell
//! (lognormal, d50 = 7.82 nm) spun at 3141.6 rad/s and 274.15 K.
//!
//! Configurations are read from TOML. Missing top-level tables keep their
//! default value:
//!
//! ```toml
//! radial_cells = 240
//! n_bins = 40
//! time_scale = 100
//!
//! [rotor]
//! omega = 20000.0
//! temperature = 293.15
//!
//! [size_distribution]
//! type = "bimodal_lognormal"
//! d50_nm_1 = 18.0
//! g_sigma_1 = 1.3
//! weight_1 = 0.6
//! d50_nm_2 = 32.0
//! g_sigma_2 = 1.5
//! weight_2 = 0.4
//! ```
//!
//! The radial domain of the engine is the domain of the gradient
//! (`gradient.r_min_m` .. `gradient.r_max_m`).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::distribution::{DistributionSpec, SizeDistribution, build_size_distribution};
use crate::models::gradient::{GradientField, GradientShape, GradientSpec, build_gradient};
use crate::physics::{MaterialParams, RotorParams};
use crate::solver::{EngineConfiguration, FrameDriver, MultiSpeciesLamm, TimeScale};

/// Complete description of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Finite-volume cells across the tube
    pub radial_cells: usize,

    pub gradient: GradientSpec,

    pub size_distribution: DistributionSpec,

    /// Requested size bins (at least 3 are always used)
    pub n_bins: usize,

    pub material: MaterialParams,

    pub rotor: RotorParams,

    /// Simulated seconds per wall-clock second for [`FrameDriver`]
    pub time_scale: TimeScale,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            radial_cells: 180,
            gradient: GradientSpec::new(GradientShape::Linear, 0.0674, 0.1531)
                .with_density(780.0, 1426.0)
                .with_viscosity(0.000751, 0.000694),
            size_distribution: DistributionSpec::lognormal(7.82, 1.5),
            n_bins: 100,
            material: MaterialParams::new(2330.0, 1050.0, 1.66e-9),
            rotor: RotorParams::new(3141.6, 274.15),
            time_scale: TimeScale::X1000,
        }
    }
}

impl SimulationConfig {
    /// Parses a TOML document
    ///
    /// # Errors
    ///
    /// [`LammError::Config`](crate::error::LammError::Config) on malformed
    /// TOML or unknown enum tags.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Reads and parses a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("loaded simulation config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Samples the gradient on `radial_cells` cells
    pub fn build_gradient(&self) -> GradientField {
        build_gradient(&self.gradient, self.radial_cells)
    }

    /// Discretises the size distribution into `n_bins` bins
    pub fn build_distribution(&self) -> SizeDistribution {
        build_size_distribution(&self.size_distribution, self.n_bins)
    }

    /// Engine configuration over the gradient domain
    pub fn engine_configuration(&self) -> EngineConfiguration {
        EngineConfiguration::from_distribution(
            self.gradient.r_min_m,
            self.gradient.r_max_m,
            self.radial_cells,
            self.rotor,
            self.build_gradient(),
            &self.build_distribution(),
            self.material,
        )
    }

    /// Builds gradient and distribution, then the engine
    ///
    /// # Errors
    ///
    /// Same as [`MultiSpeciesLamm::new`], e.g. `radial_cells == 0` or an
    /// inverted gradient domain.
    pub fn build_engine(&self) -> Result<MultiSpeciesLamm> {
        MultiSpeciesLamm::new(self.engine_configuration())
    }

    /// Frame driver running at the configured time scale
    pub fn frame_driver(&self) -> FrameDriver {
        FrameDriver::new(self.time_scale)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
