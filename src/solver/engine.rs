//! Multi-species radial transport engine
//!
//! Each size bin $k$ obeys the radial Lamm equation
//!
//! $$\frac{\partial c_k}{\partial t} = \frac{1}{r}\frac{\partial}{\partial r}
//!     \left[ r \left( D_k \frac{\partial c_k}{\partial r} - v_k c_k \right) \right]$$
//!
//! with no-flux walls at $r_{min}$ and $r_{max}$. The engine evolves the
//! conservative variable $q_k = r \, c_k$, so that the total mass
//! $\sum_k \sum_i q_k[i] \, \Delta r$ is preserved to rounding error by the
//! finite-volume update.
//!
//! # Numerical scheme
//!
//! Forward Euler in time; at every interior face $i$ (between cells $i-1$ and $i$):
//!
//! $$F_i = r_i^{face} \left( -\bar D_i \frac{c_i - c_{i-1}}{\Delta r}
//!        + \bar v_i \, c_{upwind} \right)$$
//!
//! where $\bar D_i$ and $\bar v_i$ are arithmetic means of the two adjacent
//! cells and $c_{upwind}$ is $c_{i-1}$ when $\bar v_i \ge 0$, $c_i$ otherwise.
//! Wall fluxes are zero and
//!
//! $$q_i^{n+1} = q_i^n - \Delta t \, \frac{F_{i+1} - F_i}{\Delta r}$$
//!
//! No clamping is applied: the explicit step stays non-negative as long as
//! $\Delta t$ respects [`MultiSpeciesLamm::compute_stable_dt`].
//!
//! # State layout
//!
//! `q` is a `[n_cells × n_bins]` matrix. nalgebra is column-major, so each
//! bin occupies one contiguous slice and bins can be updated independently.

use nalgebra::{DMatrix, DVector};

use crate::error::{LammError, Result};
use crate::models::distribution::SizeDistribution;
use crate::models::gradient::GradientField;
use crate::physics::hydrodynamics::{HydrodynamicCoefficients, MaterialParams, RotorParams, finite_or_zero};
use crate::physics::grid::RadialGrid;

/// Safety factor applied by [`MultiSpeciesLamm::stable_dt`]
pub const DEFAULT_SAFETY: f64 = 0.3;

// =================================================================================================
// Configuration
// =================================================================================================

/// Everything needed to build a [`MultiSpeciesLamm`]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfiguration {
    /// Inner wall radius **\[m\]**
    pub r_min: f64,

    /// Outer wall radius **\[m\]**
    pub r_max: f64,

    /// Number of finite-volume cells
    pub n_cells: usize,

    pub rotor: RotorParams,

    /// Solvent sampled on `n_cells` cells
    pub gradient: GradientField,

    /// Outer radius of each bin **\[m\]**
    pub bin_radii: Vec<f64>,

    /// Mass fraction of each bin, renormalised by the engine
    pub bin_weights: Vec<f64>,

    pub material: MaterialParams,
}

impl EngineConfiguration {
    /// Takes bin radii and weights from a built size distribution
    pub fn from_distribution(
        r_min: f64,
        r_max: f64,
        n_cells: usize,
        rotor: RotorParams,
        gradient: GradientField,
        distribution: &SizeDistribution,
        material: MaterialParams,
    ) -> Self {
        Self {
            r_min,
            r_max,
            n_cells,
            rotor,
            gradient,
            bin_radii: distribution.radii_m().to_vec(),
            bin_weights: distribution.weights().to_vec(),
            material,
        }
    }

    /// Checks the array shapes
    ///
    /// The radial bounds themselves are validated by [`RadialGrid::new`].
    ///
    /// # Errors
    ///
    /// - [`LammError::NoBins`] when there is no size bin
    /// - [`LammError::LengthMismatch`] when weights or gradient do not match
    ///   the bin count or cell count
    pub fn validate(&self) -> Result<()> {
        if self.bin_radii.is_empty() {
            return Err(LammError::NoBins);
        }
        if self.bin_weights.len() != self.bin_radii.len() {
            return Err(LammError::length_mismatch(
                "bin weights",
                self.bin_radii.len(),
                self.bin_weights.len(),
            ));
        }
        if self.gradient.len() != self.n_cells {
            return Err(LammError::length_mismatch("gradient", self.n_cells, self.gradient.len()));
        }
        Ok(())
    }
}

// =================================================================================================
// Reports
// =================================================================================================

/// Outcome of [`MultiSpeciesLamm::advance_by`]
///
/// `advanced < requested` means the step budget ran out (or no stable step
/// could be found) before the requested span was covered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvanceResult {
    /// Simulated time actually covered **\[s\]**
    pub advanced: f64,

    /// Number of Euler steps taken
    pub steps: usize,
}

/// Integrated mass, $\sum_i q[i] \, \Delta r$
#[derive(Debug, Clone, PartialEq)]
pub struct MassReport {
    pub per_bin: DVector<f64>,
    pub total: f64,
}

/// Concentrations $c = q / r$ at every cell centre
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationReport {
    /// Shape `[n_cells × n_bins]`
    pub species: DMatrix<f64>,

    /// Sum over bins, one value per cell
    pub total: DVector<f64>,
}

impl ConcentrationReport {
    /// Concentration profile of bin `k`
    ///
    /// # Panics
    ///
    /// Panics when `k` is out of range.
    pub fn bin(&self, k: usize) -> &[f64] {
        let n = self.species.nrows();
        &self.species.as_slice()[k * n..(k + 1) * n]
    }

    /// Number of bins in the report
    pub fn n_bins(&self) -> usize {
        self.species.ncols()
    }
}

// =================================================================================================
// Engine
// =================================================================================================

/// Explicit conservative solver for several size bins sharing one grid
///
/// # Example
///
/// ```
/// use lamm_rs::models::gradient::GradientField;
/// use lamm_rs::physics::{MaterialParams, RotorParams};
/// use lamm_rs::solver::{EngineConfiguration, MultiSpeciesLamm};
///
/// let config = EngineConfiguration {
///     r_min: 0.05,
///     r_max: 0.065,
///     n_cells: 60,
///     rotor: RotorParams::new(25000.0, 293.0),
///     gradient: GradientField::uniform(60, 1050.0, 1e-3),
///     bin_radii: vec![10e-9, 15e-9],
///     bin_weights: vec![0.5, 0.5],
///     material: MaterialParams::new(2200.0, 1050.0, 2e-9),
/// };
/// let mut engine = MultiSpeciesLamm::new(config).unwrap();
/// engine.set_initial_top_load(4);
///
/// let before = engine.compute_masses().total;
/// let result = engine.advance_by(1.0, 10_000);
/// assert!(result.steps > 0);
/// assert!((engine.compute_masses().total - before).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct MultiSpeciesLamm {
    grid: RadialGrid,
    rotor: RotorParams,
    material: MaterialParams,
    gradient: GradientField,
    bin_radii: DVector<f64>,
    weights: DVector<f64>,

    /// Conservative state $q = r c$, `[n_cells × n_bins]`
    q: DMatrix<f64>,

    /// Scratch buffer for the next state, swapped with `q` after each step
    q_next: DMatrix<f64>,

    coefficients: HydrodynamicCoefficients,
}

impl MultiSpeciesLamm {
    /// Builds the grid, normalises the weights and derives the coefficients
    ///
    /// The state starts empty (all zeros); use
    /// [`set_initial_concentrations`](Self::set_initial_concentrations) or
    /// [`set_initial_top_load`](Self::set_initial_top_load) to load it.
    ///
    /// # Errors
    ///
    /// - [`LammError::InvalidGrid`] for impossible radial bounds or zero cells
    /// - [`LammError::NoBins`] / [`LammError::LengthMismatch`], see
    ///   [`EngineConfiguration::validate`]
    pub fn new(config: EngineConfiguration) -> Result<Self> {
        let grid = RadialGrid::new(config.r_min, config.r_max, config.n_cells)?;
        config.validate()?;

        let mut weights = DVector::from_vec(config.bin_weights);
        let total: f64 = weights.iter().sum();
        if total == 0.0 {
            log::warn!("bin weights sum to zero, using uniform weights");
            weights.fill(1.0 / weights.len() as f64);
        } else {
            weights /= total;
        }

        let n = grid.len();
        let n_bins = config.bin_radii.len();
        let coefficients = HydrodynamicCoefficients::compute(
            &grid,
            &config.gradient,
            &config.bin_radii,
            &config.rotor,
            &config.material,
        );

        log::debug!(
            "MultiSpeciesLamm: {n} cells over [{}, {}] m, {n_bins} bins, ω = {} rad/s, T = {} K",
            grid.r_min(),
            grid.r_max(),
            config.rotor.omega,
            config.rotor.temperature
        );

        Ok(Self {
            grid,
            rotor: config.rotor,
            material: config.material,
            gradient: config.gradient,
            bin_radii: DVector::from_vec(config.bin_radii),
            weights,
            q: DMatrix::zeros(n, n_bins),
            q_next: DMatrix::zeros(n, n_bins),
            coefficients,
        })
    }

    fn refresh_coefficients(&mut self) {
        self.coefficients.refresh(
            &self.grid,
            &self.gradient,
            self.bin_radii.as_slice(),
            &self.rotor,
            &self.material,
        );
    }

    // ── Runtime parameter changes ───────────────────────────────────────────────────────────────

    /// Replaces the solvent profile and recomputes every coefficient
    ///
    /// # Errors
    ///
    /// [`LammError::LengthMismatch`] when `gradient` does not cover exactly
    /// `n_cells` cells. The engine is left untouched in that case.
    pub fn set_gradient(&mut self, gradient: GradientField) -> Result<()> {
        if gradient.len() != self.grid.len() {
            return Err(LammError::length_mismatch("gradient", self.grid.len(), gradient.len()));
        }
        self.gradient = gradient;
        self.refresh_coefficients();
        Ok(())
    }

    /// Changes rotor speed and/or temperature
    pub fn set_rotor(&mut self, rotor: RotorParams) {
        self.rotor = rotor;
        self.refresh_coefficients();
    }

    /// Changes the particle composition
    pub fn set_material(&mut self, material: MaterialParams) {
        self.material = material;
        self.refresh_coefficients();
    }

    // ── Initial conditions ──────────────────────────────────────────────────────────────────────

    /// Loads bin `k` with `profile(r) · weight_k`
    ///
    /// Negative and non-finite samples are stored as 0.
    pub fn set_initial_concentrations<F>(&mut self, profile: F)
    where
        F: Fn(f64) -> f64,
    {
        let n = self.grid.len();
        let centers = self.grid.centers();
        for (col, &weight) in self.q.as_mut_slice().chunks_mut(n).zip(self.weights.iter()) {
            for (q, &r) in col.iter_mut().zip(centers) {
                let c = profile(r) * weight;
                *q = if c.is_finite() && c > 0.0 { r * c } else { 0.0 };
            }
        }
    }

    /// Spreads the mass of every bin evenly over the first `cells` cells
    ///
    /// `cells` is clamped to `[1, n_cells]`. Bin `k` ends up with mass
    /// `weights[k]`, so the total mass is 1.
    pub fn set_initial_top_load(&mut self, cells: usize) {
        let n = self.grid.len();
        let cells = cells.clamp(1, n);
        let dr = self.grid.dr();
        for (col, &weight) in self.q.as_mut_slice().chunks_mut(n).zip(self.weights.iter()) {
            let q_loaded = weight / cells as f64 / dr;
            col[..cells].fill(q_loaded);
            col[cells..].fill(0.0);
        }
    }

    // ── Time stepping ───────────────────────────────────────────────────────────────────────────

    /// Advances every bin by one explicit step of size `dt`
    ///
    /// Non-finite or non-positive `dt` is ignored. All bins read the state
    /// before the step; the new state is written to a scratch buffer and
    /// swapped in once every bin is done.
    pub fn step(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let n = self.grid.len();
        let n_bins = self.n_bins();
        let kernel = StepKernel {
            centers: self.grid.centers(),
            faces: self.grid.faces(),
            dr: self.grid.dr(),
            dt,
        };
        let q = self.q.as_slice();
        let diffusion = self.coefficients.diffusion().as_slice();
        let velocity = self.coefficients.velocity().as_slice();
        let next = self.q_next.as_mut_slice();

        let update = |(k, out): (usize, &mut [f64])| {
            let range = k * n..(k + 1) * n;
            kernel.advance_bin(&q[range.clone()], &diffusion[range.clone()], &velocity[range], out);
        };

        // without the `parallel` feature a large grid still takes the sequential loop
        let use_pool = cfg!(feature = "parallel") && n * n_bins > crate::solver::parallel_threshold();
        match use_pool {
            #[cfg(feature = "parallel")]
            true => {
                use rayon::prelude::*;
                next.par_chunks_mut(n).enumerate().for_each(update);
            }
            _ => next.chunks_mut(n).enumerate().for_each(update),
        }

        std::mem::swap(&mut self.q, &mut self.q_next);
    }

    /// Largest explicit step allowed by every (bin, cell) pair, times `safety`
    ///
    /// $$\Delta t = s \cdot \min_{k,i}\left(\frac{\Delta r^2}{2 D_{k,i}},\;
    ///   \frac{\Delta r}{|v_{k,i}|}\right)$$
    ///
    /// Pairs with $D = 0$ or $v = 0$ impose no bound. When nothing bounds the
    /// step (all coefficients zero) this returns `safety` itself, or 1 if
    /// `safety` is not positive.
    pub fn compute_stable_dt(&self, safety: f64) -> f64 {
        match self.coefficients.stability_bound() {
            Some(bound) => safety * bound,
            None => {
                if safety > 0.0 { safety } else { 1.0 }
            }
        }
    }

    /// [`compute_stable_dt`](Self::compute_stable_dt) with [`DEFAULT_SAFETY`]
    pub fn stable_dt(&self) -> f64 {
        self.compute_stable_dt(DEFAULT_SAFETY)
    }

    /// Advances by `total_dt` using as many stable steps as needed
    ///
    /// Stops early, without error, once `max_steps` steps have been taken or
    /// when no positive stable step exists. The last step is shortened so that
    /// the requested span is never overshot.
    ///
    /// # Arguments
    ///
    /// * `total_dt` - Simulated span to cover **\[s\]**
    /// * `max_steps` - Upper bound on the number of Euler steps
    pub fn advance_by(&mut self, total_dt: f64, max_steps: usize) -> AdvanceResult {
        let mut advanced = 0.0;
        let mut steps = 0;

        while advanced < total_dt && steps < max_steps {
            let dt_stable = self.stable_dt();
            if !dt_stable.is_finite() || dt_stable <= 0.0 {
                break;
            }
            let dt = dt_stable.min(total_dt - advanced);
            self.step(dt);
            advanced += dt;
            steps += 1;
        }

        log::trace!("advance_by({total_dt}): advanced {advanced} s in {steps} steps");

        AdvanceResult { advanced, steps }
    }

    // ── Queries ─────────────────────────────────────────────────────────────────────────────────

    /// Mass of every bin and their sum
    pub fn compute_masses(&self) -> MassReport {
        let n = self.grid.len();
        let dr = self.grid.dr();
        let per_bin = DVector::from_iterator(
            self.n_bins(),
            self.q.as_slice().chunks(n).map(|col| col.iter().map(|q| q * dr).sum::<f64>()),
        );
        let total = per_bin.iter().sum();
        MassReport { per_bin, total }
    }

    /// Concentration of every bin and the total at every cell centre
    pub fn concentrations(&self) -> ConcentrationReport {
        let n = self.grid.len();
        let centers = self.grid.centers();
        let species = DMatrix::from_fn(n, self.n_bins(), |i, k| self.q[(i, k)] / centers[i]);
        let total = DVector::from_fn(n, |i, _| species.row(i).sum());
        ConcentrationReport { species, total }
    }

    /// Radius where bin `k` is neutrally buoyant
    ///
    /// Scans neighbouring cells for a zero or a sign change of $\Delta\rho$
    /// and interpolates linearly between the two centres. Returns `None` when
    /// the bin is buoyant (or dense) everywhere, or when `k` is out of range.
    pub fn isopycnic_radius_for_bin(&self, k: usize) -> Option<f64> {
        if k >= self.n_bins() {
            return None;
        }
        let deltas = self.coefficients.delta_rho_for_bin(k);
        let r = self.grid.centers();

        for i in 1..deltas.len() {
            let prev = deltas[i - 1];
            let curr = deltas[i];
            if prev == 0.0 {
                return Some(r[i - 1]);
            }
            if curr == 0.0 {
                return Some(r[i]);
            }
            if (prev < 0.0 && curr > 0.0) || (prev > 0.0 && curr < 0.0) {
                let t = prev.abs() / (prev.abs() + curr.abs());
                return Some(r[i - 1] * (1.0 - t) + r[i] * t);
            }
        }
        None
    }

    /// Mass-weighted mean radius of bin `k`
    ///
    /// `None` when `k` is out of range or the bin holds no positive mass.
    pub fn centroid_for_bin(&self, k: usize) -> Option<f64> {
        if k >= self.n_bins() {
            return None;
        }
        let col = self.q.column(k);
        let dr = self.grid.dr();
        let (mass, moment) = col
            .iter()
            .zip(self.grid.centers())
            .fold((0.0, 0.0), |(m, mr), (&q, &r)| (m + q * dr, mr + q * dr * r));
        if mass > 0.0 { Some(moment / mass) } else { None }
    }

    /// Smallest concentration over every bin and cell
    pub fn min_concentration(&self) -> f64 {
        let n = self.grid.len();
        let centers = self.grid.centers();
        self.q
            .as_slice()
            .chunks(n)
            .flat_map(|col| col.iter().zip(centers).map(|(q, r)| q / r))
            .fold(f64::INFINITY, f64::min)
    }

    // ── Accessors ───────────────────────────────────────────────────────────────────────────────

    pub fn grid(&self) -> &RadialGrid {
        &self.grid
    }

    /// Outer particle radius of each bin **\[m\]**
    pub fn bin_radii(&self) -> &[f64] {
        self.bin_radii.as_slice()
    }

    /// Normalised mass fraction of each bin
    pub fn weights(&self) -> &[f64] {
        self.weights.as_slice()
    }

    pub fn n_bins(&self) -> usize {
        self.bin_radii.len()
    }

    pub fn n_cells(&self) -> usize {
        self.grid.len()
    }

    /// Current D, v and Δρ buffers
    pub fn coefficients(&self) -> &HydrodynamicCoefficients {
        &self.coefficients
    }

    pub fn rotor(&self) -> &RotorParams {
        &self.rotor
    }

    pub fn material(&self) -> &MaterialParams {
        &self.material
    }

    pub fn gradient(&self) -> &GradientField {
        &self.gradient
    }

    /// Raw conservative state $q = r c$, `[n_cells × n_bins]`
    pub fn state(&self) -> &DMatrix<f64> {
        &self.q
    }
}

// =================================================================================================
// Step kernel
// =================================================================================================

/// Grid data shared by every bin during one step
///
/// Holds only shared references, so one kernel can be used from several
/// rayon workers at once.
struct StepKernel<'a> {
    centers: &'a [f64],
    faces: &'a [f64],
    dr: f64,
    dt: f64,
}

impl StepKernel<'_> {
    /// Flux through interior face `i` (between cells `i - 1` and `i`)
    #[inline]
    fn face_flux(&self, q: &[f64], d: &[f64], v: &[f64], i: usize) -> f64 {
        let c_left = q[i - 1] / self.centers[i - 1];
        let c_right = q[i] / self.centers[i];
        let grad = (c_right - c_left) / self.dr;

        let d_face = finite_or_zero(0.5 * (d[i - 1] + d[i]));
        let v_face = finite_or_zero(0.5 * (v[i - 1] + v[i]));

        let diffusive = -d_face * grad;
        let advective = if v_face >= 0.0 { v_face * c_left } else { v_face * c_right };
        self.faces[i] * (diffusive + advective)
    }

    /// Writes the updated state of one bin into `out`
    ///
    /// The flux on the right face of cell `i` is the left flux of cell
    /// `i + 1`, so each face is evaluated once.
    fn advance_bin(&self, q: &[f64], d: &[f64], v: &[f64], out: &mut [f64]) {
        let n = q.len();
        let mut flux_left = 0.0;
        for i in 0..n {
            let flux_right = if i + 1 < n { self.face_flux(q, d, v, i + 1) } else { 0.0 };
            out[i] = q[i] - self.dt * (flux_right - flux_left) / self.dr;
            flux_left = flux_right;
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================
