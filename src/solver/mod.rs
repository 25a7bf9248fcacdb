//! Time integration
//!
//! The solver owns the evolving state and everything that touches time:
//!
//! - [`MultiSpeciesLamm`]: the explicit conservative finite-volume engine for
//!   several size bins sharing one radial grid
//! - [`FrameDriver`]: turns wall-clock frames into bounded
//!   [`advance_by`](MultiSpeciesLamm::advance_by) calls
//!
//! # Quick Start
//!
//! ```rust
//! use lamm_rs::models::{build_gradient, build_size_distribution, DistributionSpec, GradientShape, GradientSpec};
//! use lamm_rs::physics::{MaterialParams, RotorParams};
//! use lamm_rs::solver::{EngineConfiguration, FrameDriver, MultiSpeciesLamm, TimeScale};
//!
//! let gradient = GradientSpec::new(GradientShape::Linear, 0.05, 0.07).with_density(1020.0, 1200.0);
//! let distribution = build_size_distribution(&DistributionSpec::lognormal(20.0, 1.3), 8);
//!
//! let config = EngineConfiguration::from_distribution(
//!     0.05,
//!     0.07,
//!     100,
//!     RotorParams::new(22000.0, 293.0),
//!     build_gradient(&gradient, 100),
//!     &distribution,
//!     MaterialParams::new(1200.0, 1020.0, 3e-9),
//! );
//! let mut engine = MultiSpeciesLamm::new(config).unwrap();
//! engine.set_initial_top_load(3);
//!
//! let mut driver = FrameDriver::new(TimeScale::X100);
//! let report = driver.advance_frame(&mut engine, 1.0 / 60.0);
//! assert!(report.advanced > 0.0);
//! ```
//!
//! # Stability
//!
//! The scheme is explicit: every call to `advance_by` recomputes the largest
//! stable step from the current coefficients, so changing the rotor or the
//! gradient between frames is always safe.

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod driver;
pub mod engine;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================
//
// Bins are independent within one step, so with the `parallel` feature the
// engine can update them on the rayon pool. The crossover is a runtime value
// so that benchmarks and tests can move it. Relaxed ordering is enough: the
// value is a performance hint, not a synchronisation point.
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of (cell, bin) pairs above which a step runs in parallel
///
/// Below this, dispatching to the rayon pool costs more than the flux
/// computation itself.
const DEFAULT_PARALLEL_THRESHOLD: usize = 4095;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Current parallel-execution threshold
///
/// [`MultiSpeciesLamm::step`] updates bins sequentially while
/// `n_cells · n_bins` does not exceed this value, and on the rayon pool above
/// it, but only when the crate is compiled with the `parallel` feature.
///
/// # Example
///
/// ```rust
/// use lamm_rs::solver::parallel_threshold;
///
/// assert!(parallel_threshold() > 0);
/// ```
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Sets the parallel-execution threshold
///
/// # Panics
///
/// Panics when `threshold == 0`.
///
/// # Example
///
/// ```rust
/// use lamm_rs::solver::{parallel_threshold, set_parallel_threshold};
///
/// let previous = parallel_threshold();
/// set_parallel_threshold(2048);
/// assert_eq!(parallel_threshold(), 2048);
/// set_parallel_threshold(previous);
/// ```
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be at least 1");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// Serialises tests that move the threshold
#[cfg(test)]
static THRESHOLD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Saves the current threshold on construction and restores it on drop
///
/// Test builds only. Guards are exclusive: a second `save` blocks until the
/// first guard is dropped, so concurrent tests never observe each other's value.
#[cfg(test)]
pub(crate) struct ThresholdGuard {
    previous: usize,
    _lock: std::sync::MutexGuard<'static, ()>,
}

#[cfg(test)]
impl ThresholdGuard {
    pub(crate) fn save(new_value: usize) -> Self {
        let lock = THRESHOLD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = parallel_threshold();
        set_parallel_threshold(new_value);
        Self { previous, _lock: lock }
    }
}

#[cfg(test)]
impl Drop for ThresholdGuard {
    fn drop(&mut self) {
        PARALLEL_THRESHOLD.store(self.previous, Ordering::Relaxed);
    }
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use driver::{DEFAULT_MAX_STEPS_PER_FRAME, FrameDriver, FrameReport, TimeScale};
pub use engine::{
    AdvanceResult,
    ConcentrationReport,
    DEFAULT_SAFETY,
    EngineConfiguration,
    MassReport,
    MultiSpeciesLamm,
};

// =================================================================================================
// Tests
// =================================================================================================
