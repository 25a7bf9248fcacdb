//! Per-bin hydrodynamic coefficients
//!
//! Every size bin is a rigid sphere of radius $a$ made of a dense core
//! wrapped in a shell of fixed thickness. Inside a solvent of local density
//! $\rho_s(r)$ and viscosity $\eta(r)$ spinning at $\omega$:
//!
//! | Quantity            | Expression                                          | Unit   |
//! |---------------------|-----------------------------------------------------|--------|
//! | friction            | $f = 6 \pi \eta a$                                  | kg/s   |
//! | diffusion           | $D = k_B T / f$                                     | m²/s   |
//! | buoyant contrast    | $\Delta\rho = \rho_{eff} - \rho_s$                  | kg/m³  |
//! | sedimentation speed | $v = \Delta\rho \, V \omega^2 r / f$                | m/s    |
//!
//! with $V = \frac{4}{3}\pi a^3$. A positive $v$ points outward.
//!
//! Degenerate inputs never fail: a non-positive friction yields
//! $D = v = 0$ and every non-finite result is stored as 0.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::models::gradient::GradientField;
use crate::physics::grid::RadialGrid;

/// Boltzmann constant **\[J/K\]**
pub const BOLTZMANN: f64 = 1.380649e-23;

// =================================================================================================
// Parameter records
// =================================================================================================

/// Core–shell particle composition
///
/// Densities in **\[kg/m³\]**, shell thickness in **\[m\]**.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialParams {
    pub rho_core: f64,
    pub rho_shell: f64,
    pub shell_thickness_m: f64,
}

impl MaterialParams {
    pub fn new(rho_core: f64, rho_shell: f64, shell_thickness_m: f64) -> Self {
        Self { rho_core, rho_shell, shell_thickness_m }
    }

    /// Volume-weighted density of a particle of outer radius `radius_m`
    ///
    /// The core radius is `max(radius_m - shell, 0)`, so a shell thicker than
    /// the particle gives a pure-shell particle. Returns 0 for a particle of
    /// zero volume.
    ///
    /// # Example
    ///
    /// ```
    /// use lamm_rs::physics::MaterialParams;
    ///
    /// let bare = MaterialParams::new(2330.0, 1050.0, 0.0);
    /// assert_eq!(bare.effective_density(5e-9), 2330.0);
    ///
    /// let all_shell = MaterialParams::new(2330.0, 1050.0, 10e-9);
    /// assert!((all_shell.effective_density(5e-9) - 1050.0).abs() < 1e-9);
    /// ```
    pub fn effective_density(&self, radius_m: f64) -> f64 {
        let core_radius = (radius_m - self.shell_thickness_m).max(0.0);
        let total_volume = sphere_volume(radius_m);
        if total_volume <= 0.0 || !total_volume.is_finite() {
            return 0.0;
        }
        let core_volume = sphere_volume(core_radius);
        let shell_volume = total_volume - core_volume;
        (self.rho_core * core_volume + self.rho_shell * shell_volume) / total_volume
    }
}

/// Rotor state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotorParams {
    /// Angular velocity **\[rad/s\]**
    pub omega: f64,

    /// Absolute temperature **\[K\]**
    pub temperature: f64,
}

impl RotorParams {
    pub fn new(omega: f64, temperature: f64) -> Self {
        Self { omega, temperature }
    }
}

/// Volume of a sphere of radius `r`
pub fn sphere_volume(r: f64) -> f64 {
    4.0 / 3.0 * std::f64::consts::PI * r * r * r
}

#[inline]
pub(crate) fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

// =================================================================================================
// Coefficient buffers
// =================================================================================================

/// D, v and Δρ for every (cell, bin) pair
///
/// Each buffer has shape `[n_cells × n_bins]`. nalgebra stores matrices
/// column-major, so the coefficients of bin `k` are one contiguous slice,
/// exactly like the engine state.
///
/// The explicit-stability bound
/// $\min\left(\Delta r^2 / 2D,\; \Delta r / |v|\right)$ is computed while the
/// buffers are filled and cached until the next refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct HydrodynamicCoefficients {
    diffusion: DMatrix<f64>,
    velocity: DMatrix<f64>,
    delta_rho: DMatrix<f64>,

    /// `None` when every coefficient is zero
    stability_bound: Option<f64>,
}

impl HydrodynamicCoefficients {
    /// Derives the coefficients of every bin on `grid`
    ///
    /// # Arguments
    ///
    /// * `grid` - Radial mesh, provides cell-centre radii and Δr
    /// * `gradient` - Solvent ρ/η sampled at the same cells as `grid`
    /// * `radii_m` - Outer particle radius of each bin **\[m\]**
    /// * `rotor` - Angular velocity and temperature
    /// * `material` - Core–shell composition shared by all bins
    ///
    /// Callers guarantee `gradient.len() == grid.len()`.
    pub fn compute(
        grid: &RadialGrid,
        gradient: &GradientField,
        radii_m: &[f64],
        rotor: &RotorParams,
        material: &MaterialParams,
    ) -> Self {
        let n = grid.len();
        let n_bins = radii_m.len();
        let mut coefficients = Self {
            diffusion: DMatrix::zeros(n, n_bins),
            velocity: DMatrix::zeros(n, n_bins),
            delta_rho: DMatrix::zeros(n, n_bins),
            stability_bound: None,
        };
        coefficients.refresh(grid, gradient, radii_m, rotor, material);
        coefficients
    }

    /// Recomputes every buffer in place
    ///
    /// Buffers are resized when the bin count changed since the last call.
    pub fn refresh(
        &mut self,
        grid: &RadialGrid,
        gradient: &GradientField,
        radii_m: &[f64],
        rotor: &RotorParams,
        material: &MaterialParams,
    ) {
        let n = grid.len();
        let n_bins = radii_m.len();
        if self.diffusion.shape() != (n, n_bins) {
            self.diffusion = DMatrix::zeros(n, n_bins);
            self.velocity = DMatrix::zeros(n, n_bins);
            self.delta_rho = DMatrix::zeros(n, n_bins);
        }

        let centers = grid.centers();
        let rho_solvent = gradient.rho();
        let eta = gradient.eta();
        let omega_sq = rotor.omega * rotor.omega;
        let dr = grid.dr();
        let mut bound = f64::INFINITY;

        let d_cols = self.diffusion.as_mut_slice().chunks_mut(n);
        let v_cols = self.velocity.as_mut_slice().chunks_mut(n);
        let rho_cols = self.delta_rho.as_mut_slice().chunks_mut(n);

        for (((&a, d_col), v_col), rho_col) in radii_m.iter().zip(d_cols).zip(v_cols).zip(rho_cols) {
            let rho_eff = material.effective_density(a);
            let volume = sphere_volume(a);

            for i in 0..n {
                let delta_rho = finite_or_zero(rho_eff - rho_solvent[i]);
                let friction = 6.0 * std::f64::consts::PI * eta[i] * a;

                let (d, v) = if friction > 0.0 {
                    (
                        finite_or_zero(BOLTZMANN * rotor.temperature / friction),
                        finite_or_zero(delta_rho * volume * omega_sq * centers[i] / friction),
                    )
                } else {
                    (0.0, 0.0)
                };

                if d > 0.0 {
                    bound = bound.min(dr * dr / (2.0 * d));
                }
                if v != 0.0 {
                    bound = bound.min(dr / v.abs());
                }

                d_col[i] = d;
                v_col[i] = v;
                rho_col[i] = delta_rho;
            }
        }

        self.stability_bound = if bound.is_finite() { Some(bound) } else { None };

        log::debug!(
            "hydrodynamic coefficients refreshed: {n} cells × {n_bins} bins, stability bound {:?}",
            self.stability_bound
        );
    }

    /// Diffusion coefficients **\[m²/s\]**, shape `[n_cells × n_bins]`
    pub fn diffusion(&self) -> &DMatrix<f64> {
        &self.diffusion
    }

    /// Sedimentation velocities **\[m/s\]**, shape `[n_cells × n_bins]`
    pub fn velocity(&self) -> &DMatrix<f64> {
        &self.velocity
    }

    /// Buoyant density contrast **\[kg/m³\]**, shape `[n_cells × n_bins]`
    pub fn delta_rho(&self) -> &DMatrix<f64> {
        &self.delta_rho
    }

    /// Diffusion coefficients of bin `k`, one per cell
    ///
    /// # Panics
    ///
    /// Panics when `k` is out of range.
    pub fn diffusion_for_bin(&self, k: usize) -> &[f64] {
        column(&self.diffusion, k)
    }

    /// Sedimentation velocities of bin `k`, one per cell
    ///
    /// # Panics
    ///
    /// Panics when `k` is out of range.
    pub fn velocity_for_bin(&self, k: usize) -> &[f64] {
        column(&self.velocity, k)
    }

    /// Density contrast of bin `k`, one per cell
    ///
    /// # Panics
    ///
    /// Panics when `k` is out of range.
    pub fn delta_rho_for_bin(&self, k: usize) -> &[f64] {
        column(&self.delta_rho, k)
    }

    /// Unscaled explicit-stability bound **\[s\]**, `None` when no coefficient
    /// limits the step
    pub fn stability_bound(&self) -> Option<f64> {
        self.stability_bound
    }
}

fn column(m: &DMatrix<f64>, k: usize) -> &[f64] {
    let n = m.nrows();
    &m.as_slice()[k * n..(k + 1) * n]
}

// =================================================================================================
// Tests
// =================================================================================================
