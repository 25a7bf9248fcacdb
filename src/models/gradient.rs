//! Solvent density and viscosity profiles
//!
//! A [`GradientSpec`] describes the solvent column with a handful of numbers:
//! the density $\rho$ and viscosity $\eta$ at the top (inner wall) and bottom
//! (outer wall) of the tube plus a [`GradientShape`]. [`build_gradient`]
//! samples it at the cell centres of a uniform grid, using the normalised
//! position
//!
//! $$\xi = \mathrm{clamp}\left(\frac{r - r_{min}}{r_{max} - r_{min}}, 0, 1\right)$$
//!
//! | Shape      | Interpolation parameter                                  |
//! |------------|----------------------------------------------------------|
//! | `Uniform`  | none, top values everywhere                              |
//! | `Linear`   | $\xi$                                                    |
//! | `Power`    | $\xi^p$                                                  |
//! | `TwoStep`  | two independent linear segments split at $r_{mid}$       |
//!
//! The builder never fails: out-of-range positions are clamped.
//!
//! # Example
//!
//! ```
//! use lamm_rs::models::gradient::{build_gradient, GradientShape, GradientSpec};
//!
//! let spec = GradientSpec::new(GradientShape::Linear, 0.05, 0.07)
//!     .with_density(1020.0, 1200.0)
//!     .with_viscosity(1e-3, 1e-3);
//! let field = build_gradient(&spec, 160);
//! assert_eq!(field.len(), 160);
//! assert!(field.rho()[0] < field.rho()[159]);
//! ```

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{LammError, Result};

// =================================================================================================
// Specification
// =================================================================================================

/// Parametric profile shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GradientShape {
    /// Constant solvent, bottom values ignored
    Uniform,

    /// Straight line from top to bottom
    Linear,

    /// Linear interpolation driven by $\xi^p$ (default $p = 1$)
    ///
    /// $p > 1$ keeps the solvent light near the top and steepens the profile
    /// towards the outer wall; $p < 1$ does the opposite.
    Power { exponent: Option<f64> },

    /// Two linear segments meeting at `r_mid_m` (default: domain midpoint)
    ///
    /// The breakpoint values default to the single linear interpolation at
    /// `r_mid_m` when not supplied.
    TwoStep {
        r_mid_m: Option<f64>,
        rho_mid: Option<f64>,
        eta_mid: Option<f64>,
    },
}

/// Complete description of a solvent gradient
///
/// Units: radii **\[m\]**, densities **\[kg/m³\]**, viscosities **\[Pa·s\]**.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientSpec {
    pub shape: GradientShape,
    pub r_min_m: f64,
    pub r_max_m: f64,
    pub rho_top: f64,
    pub rho_bot: f64,
    pub eta_top: f64,
    pub eta_bot: f64,
}

impl GradientSpec {
    /// Creates a spec over `[r_min_m, r_max_m]` filled with water at 20 °C
    pub fn new(shape: GradientShape, r_min_m: f64, r_max_m: f64) -> Self {
        Self {
            shape,
            r_min_m,
            r_max_m,
            rho_top: 998.2,
            rho_bot: 998.2,
            eta_top: 1.002e-3,
            eta_bot: 1.002e-3,
        }
    }

    /// Builder pattern: set top/bottom density
    pub fn with_density(mut self, rho_top: f64, rho_bot: f64) -> Self {
        self.rho_top = rho_top;
        self.rho_bot = rho_bot;
        self
    }

    /// Builder pattern: set top/bottom viscosity
    pub fn with_viscosity(mut self, eta_top: f64, eta_bot: f64) -> Self {
        self.eta_top = eta_top;
        self.eta_bot = eta_bot;
        self
    }
}

// =================================================================================================
// Sampled field
// =================================================================================================

/// Solvent density and viscosity sampled at cell centres
///
/// Both arrays have one value per cell. The engine refuses a field whose
/// length differs from its own grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientField {
    rho: DVector<f64>,
    eta: DVector<f64>,
}

impl GradientField {
    /// Wraps pre-computed density and viscosity samples
    ///
    /// # Errors
    ///
    /// Returns [`LammError::LengthMismatch`] when the two arrays differ in length.
    pub fn from_vecs(rho: Vec<f64>, eta: Vec<f64>) -> Result<Self> {
        if rho.len() != eta.len() {
            return Err(LammError::length_mismatch("gradient viscosity", rho.len(), eta.len()));
        }
        Ok(Self {
            rho: DVector::from_vec(rho),
            eta: DVector::from_vec(eta),
        })
    }

    /// Uniform solvent over `n_cells` cells
    pub fn uniform(n_cells: usize, rho: f64, eta: f64) -> Self {
        Self {
            rho: DVector::from_element(n_cells, rho),
            eta: DVector::from_element(n_cells, eta),
        }
    }

    /// Number of cells covered
    pub fn len(&self) -> usize {
        self.rho.len()
    }

    /// True when the field covers no cell
    pub fn is_empty(&self) -> bool {
        self.rho.is_empty()
    }

    /// Solvent density per cell **\[kg/m³\]**
    pub fn rho(&self) -> &[f64] {
        self.rho.as_slice()
    }

    /// Solvent viscosity per cell **\[Pa·s\]**
    pub fn eta(&self) -> &[f64] {
        self.eta.as_slice()
    }
}

// =================================================================================================
// Builder
// =================================================================================================

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Clamp to `[0, 1]`, mapping NaN (degenerate domain) to 0
fn clamp01(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Samples `spec` at the centres of a uniform `n_cells` grid over
/// `[spec.r_min_m, spec.r_max_m]`
///
/// This is the only place where the resolution of a gradient is fixed: the
/// engine must be built with the same cell count.
pub fn build_gradient(spec: &GradientSpec, n_cells: usize) -> GradientField {
    let span = spec.r_max_m - spec.r_min_m;
    let dr = span / n_cells as f64;

    let mut rho = Vec::with_capacity(n_cells);
    let mut eta = Vec::with_capacity(n_cells);

    for i in 0..n_cells {
        let r = spec.r_min_m + (i as f64 + 0.5) * dr;
        let xi = clamp01((r - spec.r_min_m) / span);

        let (rho_i, eta_i) = match spec.shape {
            GradientShape::Uniform => (spec.rho_top, spec.eta_top),
            GradientShape::Linear => (
                lerp(spec.rho_top, spec.rho_bot, xi),
                lerp(spec.eta_top, spec.eta_bot, xi),
            ),
            GradientShape::Power { exponent } => {
                let t = xi.powf(exponent.unwrap_or(1.0));
                (
                    lerp(spec.rho_top, spec.rho_bot, t),
                    lerp(spec.eta_top, spec.eta_bot, t),
                )
            }
            GradientShape::TwoStep { r_mid_m, rho_mid, eta_mid } => {
                let r_mid = r_mid_m.unwrap_or(0.5 * (spec.r_min_m + spec.r_max_m));
                let mid_xi = clamp01((r_mid - spec.r_min_m) / span);
                let rho_mid = rho_mid.unwrap_or_else(|| lerp(spec.rho_top, spec.rho_bot, mid_xi));
                let eta_mid = eta_mid.unwrap_or_else(|| lerp(spec.eta_top, spec.eta_bot, mid_xi));

                if xi <= mid_xi {
                    let t = if mid_xi > 0.0 { (xi / mid_xi).min(1.0) } else { 0.0 };
                    (lerp(spec.rho_top, rho_mid, t), lerp(spec.eta_top, eta_mid, t))
                } else {
                    let t = if mid_xi < 1.0 { clamp01((xi - mid_xi) / (1.0 - mid_xi)) } else { 1.0 };
                    (lerp(rho_mid, spec.rho_bot, t), lerp(eta_mid, spec.eta_bot, t))
                }
            }
        };

        rho.push(rho_i);
        eta.push(eta_i);
    }

    GradientField {
        rho: DVector::from_vec(rho),
        eta: DVector::from_vec(eta),
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spec(shape: GradientShape) -> GradientSpec {
        GradientSpec::new(shape, 1.0, 2.0)
            .with_density(1000.0, 1200.0)
            .with_viscosity(1e-3, 2e-3)
    }

    #[test]
    fn test_uniform_ignores_bottom_values() {
        let field = build_gradient(&spec(GradientShape::Uniform), 10);
        assert_eq!(field.len(), 10);
        assert!(field.rho().iter().all(|&r| r == 1000.0));
        assert!(field.eta().iter().all(|&e| e == 1e-3));
    }

    #[test]
    fn test_linear_samples_cell_centres() {
        let field = build_gradient(&spec(GradientShape::Linear), 4);
        // centres at ξ = 0.125, 0.375, 0.625, 0.875
        assert_relative_eq!(field.rho()[0], 1025.0, epsilon = 1e-9);
        assert_relative_eq!(field.rho()[3], 1175.0, epsilon = 1e-9);
        assert_relative_eq!(field.eta()[1], 1.375e-3, epsilon = 1e-15);
    }

    #[test]
    fn test_power_default_exponent_matches_linear() {
        let linear = build_gradient(&spec(GradientShape::Linear), 32);
        let power = build_gradient(&spec(GradientShape::Power { exponent: None }), 32);
        for i in 0..32 {
            assert_relative_eq!(linear.rho()[i], power.rho()[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_power_exponent_bends_profile() {
        let field = build_gradient(&spec(GradientShape::Power { exponent: Some(2.0) }), 2);
        // ξ = 0.25 → t = 0.0625 ; ξ = 0.75 → t = 0.5625
        assert_relative_eq!(field.rho()[0], 1012.5, epsilon = 1e-9);
        assert_relative_eq!(field.rho()[1], 1112.5, epsilon = 1e-9);
    }

    #[test]
    fn test_two_step_defaults_reduce_to_linear() {
        let linear = build_gradient(&spec(GradientShape::Linear), 20);
        let two_step = build_gradient(
            &spec(GradientShape::TwoStep { r_mid_m: None, rho_mid: None, eta_mid: None }),
            20,
        );
        for i in 0..20 {
            assert_relative_eq!(linear.rho()[i], two_step.rho()[i], epsilon = 1e-9);
            assert_relative_eq!(linear.eta()[i], two_step.eta()[i], epsilon = 1e-15);
        }
    }

    #[test]
    fn test_two_step_with_explicit_midpoint() {
        let shape = GradientShape::TwoStep {
            r_mid_m: Some(1.5),
            rho_mid: Some(1150.0),
            eta_mid: None,
        };
        let field = build_gradient(&spec(shape), 4);
        // lower segment: ξ/0.5 = 0.25, 0.75 ; upper: (ξ-0.5)/0.5 = 0.25, 0.75
        assert_relative_eq!(field.rho()[0], 1037.5, epsilon = 1e-9);
        assert_relative_eq!(field.rho()[1], 1112.5, epsilon = 1e-9);
        assert_relative_eq!(field.rho()[2], 1162.5, epsilon = 1e-9);
        assert_relative_eq!(field.rho()[3], 1187.5, epsilon = 1e-9);
    }

    #[test]
    fn test_two_step_midpoint_outside_domain_is_clamped() {
        let shape = GradientShape::TwoStep { r_mid_m: Some(5.0), rho_mid: None, eta_mid: None };
        let field = build_gradient(&spec(shape), 8);
        assert!(field.rho().iter().all(|r| r.is_finite()));
        // mid ξ clamps to 1 → whole domain is the lower segment, same as linear
        let linear = build_gradient(&spec(GradientShape::Linear), 8);
        assert_relative_eq!(field.rho()[7], linear.rho()[7], epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_domain_stays_finite() {
        let flat = GradientSpec::new(GradientShape::Linear, 1.0, 1.0).with_density(1000.0, 1100.0);
        let field = build_gradient(&flat, 5);
        assert!(field.rho().iter().all(|&r| r == 1000.0));
    }

    #[test]
    fn test_from_vecs_rejects_mismatch() {
        assert!(GradientField::from_vecs(vec![1.0; 3], vec![1.0; 4]).is_err());
        assert_eq!(GradientField::from_vecs(vec![1.0; 3], vec![1.0; 3]).unwrap().len(), 3);
    }

    #[test]
    fn test_shape_deserializes_from_toml() {
        let spec: GradientSpec = toml::from_str(
            r#"
            r_min_m = 0.05
            r_max_m = 0.07
            rho_top = 1020.0
            rho_bot = 1200.0
            eta_top = 0.001
            eta_bot = 0.001

            [shape]
            type = "power"
            exponent = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(spec.shape, GradientShape::Power { exponent: Some(1.5) });
    }
}
