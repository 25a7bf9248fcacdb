//! Physical building blocks
//!
//! - [`RadialGrid`]: the uniform finite-volume mesh shared by all species
//! - [`HydrodynamicCoefficients`]: per-bin diffusion, sedimentation velocity
//!   and buoyant contrast derived from the particle and solvent properties
//! - [`MaterialParams`] / [`RotorParams`]: the small parameter records the
//!   coefficients depend on
//!
//! Nothing here advances time: the solver owns the state and calls into this
//! module whenever the gradient, rotor or material changes.

pub mod grid;
pub mod hydrodynamics;

pub use grid::RadialGrid;
pub use hydrodynamics::{
    BOLTZMANN,
    HydrodynamicCoefficients,
    MaterialParams,
    RotorParams,
    sphere_volume,
};
