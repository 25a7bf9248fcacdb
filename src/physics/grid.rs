//! Uniform radial mesh shared by every species
//!
//! The domain `[r_min, r_max]` is split into `n` cells of equal width
//! $\Delta r = (r_{max} - r_{min}) / n$:
//!
//! ```text
//!  faces:   r_0 ──── r_1 ──── r_2 ── ⋯ ── r_{n-1} ──── r_n
//!  centres:      c_0      c_1       ⋯          c_{n-1}
//! ```
//!
//! Face radii form an arithmetic progression and every centre is the midpoint
//! of its two faces. The grid is immutable once built.

use nalgebra::DVector;

use crate::error::{LammError, Result};

/// Uniform 1-D radial finite-volume grid
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGrid {
    r_min: f64,
    r_max: f64,
    dr: f64,

    /// Cell-centre radii, length `n`
    centers: DVector<f64>,

    /// Face radii, length `n + 1`
    faces: DVector<f64>,
}

impl RadialGrid {
    /// Builds a grid of `n_cells` cells over `[r_min, r_max]` **\[m\]**
    ///
    /// # Errors
    ///
    /// - `n_cells == 0`
    /// - non-finite bounds, `r_min <= 0` or `r_min >= r_max`
    ///
    /// The inner bound must be strictly positive: concentrations are recovered
    /// as `q / r` at every cell centre.
    ///
    /// # Example
    ///
    /// ```
    /// use lamm_rs::physics::RadialGrid;
    ///
    /// let grid = RadialGrid::new(0.05, 0.07, 4).unwrap();
    /// assert_eq!(grid.len(), 4);
    /// assert!((grid.dr() - 0.005).abs() < 1e-15);
    /// assert!((grid.centers()[0] - 0.0525).abs() < 1e-15);
    /// ```
    pub fn new(r_min: f64, r_max: f64, n_cells: usize) -> Result<Self> {
        if n_cells == 0 {
            return Err(LammError::InvalidGrid("cell count must be at least 1".to_string()));
        }
        if !r_min.is_finite() || !r_max.is_finite() {
            return Err(LammError::InvalidGrid(format!(
                "radial bounds must be finite, got [{r_min}, {r_max}]"
            )));
        }
        if r_min <= 0.0 {
            return Err(LammError::InvalidGrid(format!(
                "inner radius must be strictly positive, got {r_min}"
            )));
        }
        if r_min >= r_max {
            return Err(LammError::InvalidGrid(format!(
                "inner radius {r_min} must be below outer radius {r_max}"
            )));
        }

        let dr = (r_max - r_min) / n_cells as f64;
        let faces = DVector::from_fn(n_cells + 1, |i, _| r_min + i as f64 * dr);
        let centers = DVector::from_fn(n_cells, |i, _| r_min + (i as f64 + 0.5) * dr);

        Ok(Self {
            r_min,
            r_max,
            dr,
            centers,
            faces,
        })
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// Always false: a grid holds at least one cell
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Cell width $\Delta r$ **\[m\]**
    pub fn dr(&self) -> f64 {
        self.dr
    }

    /// Inner wall radius **\[m\]**
    pub fn r_min(&self) -> f64 {
        self.r_min
    }

    /// Outer wall radius **\[m\]**
    pub fn r_max(&self) -> f64 {
        self.r_max
    }

    /// Cell-centre radii **\[m\]**
    pub fn centers(&self) -> &[f64] {
        self.centers.as_slice()
    }

    /// Face radii **\[m\]**, one more than the number of cells
    pub fn faces(&self) -> &[f64] {
        self.faces.as_slice()
    }

    /// Normalised position $\xi = (r - r_{min}) / (r_{max} - r_{min})$ of cell `i`
    pub fn normalized_position(&self, i: usize) -> f64 {
        (self.centers[i] - self.r_min) / (self.r_max - self.r_min)
    }
}
