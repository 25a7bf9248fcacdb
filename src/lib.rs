//! lamm-rs: Multi-species Lamm equation solver
//!
//! Simulates density-gradient ultracentrifugation of a polydisperse particle
//! population. Every size bin sediments (or floats) towards its isopycnic
//! radius while diffusing, inside a tube whose solvent density and viscosity
//! vary with radius.
//!
//! # Architecture
//!
//! ```text
//! GradientSpec ──build_gradient──────────► GradientField ─┐
//!                                                         ├─► MultiSpeciesLamm ◄── FrameDriver
//! DistributionSpec ──build_size_distribution─► bins ──────┘        │
//!                                                                   └─► ConcentrationReport ─► CSV
//! ```
//!
//! 1. **Inputs** ([`models`]): parametric solvent gradient and size distribution
//! 2. **Physics** ([`physics`]): radial grid and per-bin hydrodynamic coefficients
//! 3. **Solver** ([`solver`]): explicit conservative finite-volume engine and
//!    the wall-clock frame driver
//! 4. **Configuration** ([`config`]) and **export** ([`output`])
//!
//! # Quick Start
//!
//! ```rust
//! use lamm_rs::prelude::*;
//!
//! # fn main() -> lamm_rs::error::Result<()> {
//! let config = SimulationConfig::from_toml_str("radial_cells = 90\nn_bins = 12")?;
//! let mut engine = config.build_engine()?;
//! engine.set_initial_top_load(2);
//!
//! let mass_before = engine.compute_masses().total;
//! let mut driver = config.frame_driver();
//! for _ in 0..10 {
//!     driver.advance_frame(&mut engine, 1.0 / 60.0);
//! }
//!
//! let drift = (engine.compute_masses().total - mass_before).abs() / mass_before;
//! assert!(drift < 1e-9);
//! println!("simulated {:.1} s in {} steps", driver.simulated_time(), driver.total_steps());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `parallel`: update size bins concurrently with rayon above
//!   [`solver::parallel_threshold`]
//!
//! # Logging
//!
//! The crate logs through the [`log`] facade and never installs a logger.

pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod physics;
pub mod solver;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use lamm_rs::prelude::*;
    //!
    //! // std's `Result` stays in scope, the crate alias lives in `lamm_rs::error`
    //! fn bins(config: &SimulationConfig) -> Result<usize, LammError> {
    //!     Ok(config.build_engine()?.n_bins())
    //! }
    //! # assert_eq!(bins(&SimulationConfig::default()).unwrap(), 100);
    //! ```
    pub use crate::config::SimulationConfig;
    pub use crate::error::LammError;
    pub use crate::models::{
        DistributionSpec,
        GradientField,
        GradientShape,
        GradientSpec,
        SizeDistribution,
        build_gradient,
        build_size_distribution,
    };
    pub use crate::physics::{MaterialParams, RadialGrid, RotorParams};
    pub use crate::solver::{
        AdvanceResult,
        EngineConfiguration,
        FrameDriver,
        MultiSpeciesLamm,
        TimeScale,
    };
}
