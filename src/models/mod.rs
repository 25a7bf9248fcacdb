//! Parametric inputs of a run
//!
//! A simulation is defined by two profiles that are built once per
//! configuration and then handed to the engine:
//!
//! ## [`gradient`] — the solvent column
//!
//! Density and viscosity of the solvent at every cell centre, from a
//! [`GradientSpec`] (uniform, linear, power-law or two-step profile).
//!
//! ## [`distribution`] — the particle population
//!
//! Representative diameters and mass fractions of the size bins, from a
//! [`DistributionSpec`] (lognormal, bimodal lognormal or discrete peaks).
//!
//! Both builders are pure functions of a small parameter record and never
//! fail: degenerate inputs fall back to clamped positions or uniform weights.

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod distribution;
pub mod gradient;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use distribution::{DiscreteEntry, DistributionSpec, SizeDistribution, build_size_distribution};
pub use gradient::{GradientField, GradientShape, GradientSpec, build_gradient};
