//! Particle size distributions
//!
//! A polydisperse sample is represented by a small number of size bins. Each
//! bin carries a representative diameter and a weight; weights always sum to
//! one so that bin `k` holds the fraction `weights[k]` of the total mass.
//!
//! Three parametric families are supported:
//!
//! - **Lognormal**: geometric median $d_{50}$ and geometric standard
//!   deviation $\sigma_g$
//!
//!   $$p(x) = \frac{1}{x \ln\sigma_g \sqrt{2\pi}}
//!     \exp\left(-\frac{(\ln x - \ln d_{50})^2}{2 \ln^2\sigma_g}\right)$$
//!
//! - **Bimodal lognormal**: weighted sum of two lognormal densities
//! - **Discrete**: up to [`MAX_DISCRETE_ENTRIES`] narrow Gaussian peaks
//!
//! Bin diameters are linearly spaced over the distribution span, and weights
//! are the (unnormalised) density evaluated at each diameter.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// A distribution always produces at least this many bins
pub const MIN_BINS: usize = 3;

/// Only the first entries of a discrete distribution are used
pub const MAX_DISCRETE_ENTRIES: usize = 5;

/// Full width at half maximum over standard deviation for a Gaussian
const FWHM_PER_SIGMA: f64 = 2.355;

// =================================================================================================
// Specification
// =================================================================================================

/// One peak of a discrete distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscreteEntry {
    pub diameter_nm: f64,
    pub weight: f64,

    /// Peak FWHM **\[nm\]**, falls back to the distribution-level width
    #[serde(default)]
    pub width_nm: Option<f64>,
}

/// Parametric description of a size distribution
///
/// All diameters are in **\[nm\]**. `min_diameter_nm` / `max_diameter_nm`
/// override the default span and clamp the resulting bin diameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionSpec {
    Lognormal {
        d50_nm: f64,
        g_sigma: f64,
        #[serde(default)]
        min_diameter_nm: Option<f64>,
        #[serde(default)]
        max_diameter_nm: Option<f64>,
    },
    BimodalLognormal {
        d50_nm_1: f64,
        g_sigma_1: f64,
        weight_1: f64,
        d50_nm_2: f64,
        g_sigma_2: f64,
        weight_2: f64,
        #[serde(default)]
        min_diameter_nm: Option<f64>,
        #[serde(default)]
        max_diameter_nm: Option<f64>,
    },
    Discrete {
        entries: Vec<DiscreteEntry>,
        /// Default peak FWHM for entries without their own, 2% of the span if unset
        #[serde(default)]
        width_nm: Option<f64>,
        #[serde(default)]
        min_diameter_nm: Option<f64>,
        #[serde(default)]
        max_diameter_nm: Option<f64>,
    },
}

impl DistributionSpec {
    /// Lognormal distribution over its default span
    pub fn lognormal(d50_nm: f64, g_sigma: f64) -> Self {
        Self::Lognormal { d50_nm, g_sigma, min_diameter_nm: None, max_diameter_nm: None }
    }

    /// Discrete distribution of sharp peaks `(diameter_nm, weight)`
    pub fn discrete(entries: &[(f64, f64)]) -> Self {
        Self::Discrete {
            entries: entries
                .iter()
                .map(|&(diameter_nm, weight)| DiscreteEntry { diameter_nm, weight, width_nm: None })
                .collect(),
            width_nm: None,
            min_diameter_nm: None,
            max_diameter_nm: None,
        }
    }

    fn bounds(&self) -> (Option<f64>, Option<f64>) {
        match *self {
            Self::Lognormal { min_diameter_nm, max_diameter_nm, .. }
            | Self::BimodalLognormal { min_diameter_nm, max_diameter_nm, .. }
            | Self::Discrete { min_diameter_nm, max_diameter_nm, .. } => (min_diameter_nm, max_diameter_nm),
        }
    }
}

// =================================================================================================
// Result
// =================================================================================================

/// Bins produced by [`build_size_distribution`]
#[derive(Debug, Clone, PartialEq)]
pub struct SizeDistribution {
    diameters_nm: DVector<f64>,
    radii_m: DVector<f64>,
    weights: DVector<f64>,
}

impl SizeDistribution {
    /// Number of bins
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Bin diameters **\[nm\]**
    pub fn diameters_nm(&self) -> &[f64] {
        self.diameters_nm.as_slice()
    }

    /// Bin radii **\[m\]**
    pub fn radii_m(&self) -> &[f64] {
        self.radii_m.as_slice()
    }

    /// Mass fraction of each bin, sums to 1
    pub fn weights(&self) -> &[f64] {
        self.weights.as_slice()
    }
}

// =================================================================================================
// Helpers
// =================================================================================================

/// Lognormal probability density, 0 for `x <= 0`
pub fn lognormal_pdf(x: f64, d50: f64, g_sigma: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let sigma = g_sigma.ln();
    let z = x.ln() - d50.ln();
    (-(z * z) / (2.0 * sigma * sigma)).exp() / (x * sigma * (2.0 * std::f64::consts::PI).sqrt())
}

fn gaussian(x: f64, mean: f64, sigma: f64) -> f64 {
    let z = (x - mean) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * std::f64::consts::PI).sqrt())
}

/// `n` evenly spaced values over `[start, end]`
///
/// A single point or a zero span repeats `start`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n <= 1 || end == start {
        return vec![start; n];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Scales `weights` so that they sum to one
///
/// Non-finite and negative entries are floored to zero first. If nothing is
/// left the weights become uniform.
pub fn normalize_weights(weights: &mut [f64]) {
    for w in weights.iter_mut() {
        if !w.is_finite() || *w <= 0.0 {
            *w = 0.0;
        }
    }
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter_mut().for_each(|w| *w /= total);
    } else if !weights.is_empty() {
        log::warn!("size distribution has no positive weight, falling back to uniform bins");
        let uniform = 1.0 / weights.len() as f64;
        weights.iter_mut().for_each(|w| *w = uniform);
    }
}

// =================================================================================================
// Builder
// =================================================================================================

/// Discretises `spec` into `max(n_bins, MIN_BINS)` bins
///
/// # Example
///
/// ```
/// use lamm_rs::models::distribution::{build_size_distribution, DistributionSpec};
///
/// let dist = build_size_distribution(&DistributionSpec::lognormal(7.82, 1.5), 100);
/// assert_eq!(dist.len(), 100);
/// let total: f64 = dist.weights().iter().sum();
/// assert!((total - 1.0).abs() < 1e-12);
/// ```
pub fn build_size_distribution(spec: &DistributionSpec, n_bins: usize) -> SizeDistribution {
    let n_bins = n_bins.max(MIN_BINS);
    let (min_nm, max_nm) = spec.bounds();

    let (diameters, mut weights) = match spec {
        DistributionSpec::Lognormal { d50_nm, g_sigma, .. } => {
            let start = min_nm.unwrap_or(0.25 * d50_nm);
            let end = max_nm.unwrap_or(4.0 * d50_nm);
            let diameters = linspace(start, end, n_bins);
            let weights: Vec<f64> = diameters.iter().map(|&d| lognormal_pdf(d, *d50_nm, *g_sigma)).collect();
            (diameters, weights)
        }
        DistributionSpec::BimodalLognormal {
            d50_nm_1,
            g_sigma_1,
            weight_1,
            d50_nm_2,
            g_sigma_2,
            weight_2,
            ..
        } => {
            let start = min_nm.unwrap_or(0.25 * d50_nm_1.min(*d50_nm_2));
            let end = max_nm.unwrap_or(4.0 * d50_nm_1.max(*d50_nm_2));
            let diameters = linspace(start, end, n_bins);
            let weights: Vec<f64> = diameters
                .iter()
                .map(|&d| {
                    weight_1 * lognormal_pdf(d, *d50_nm_1, *g_sigma_1)
                        + weight_2 * lognormal_pdf(d, *d50_nm_2, *g_sigma_2)
                })
                .collect();
            (diameters, weights)
        }
        DistributionSpec::Discrete { entries, width_nm, .. } => {
            let kept = &entries[..entries.len().min(MAX_DISCRETE_ENTRIES)];
            if entries.len() > MAX_DISCRETE_ENTRIES {
                log::warn!(
                    "discrete distribution has {} entries, only the first {MAX_DISCRETE_ENTRIES} are used",
                    entries.len()
                );
            }

            let (lo, hi) = kept.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
                (lo.min(e.diameter_nm), hi.max(e.diameter_nm))
            });
            let (start, end) = if kept.is_empty() {
                (min_nm.unwrap_or(1.0), max_nm.unwrap_or(10.0))
            } else {
                (min_nm.map_or(lo, |m| m.min(lo)), max_nm.map_or(hi, |m| m.max(hi)))
            };

            let default_width = width_nm.unwrap_or(0.02 * (end - start));
            let diameters = linspace(start, end, n_bins);
            let weights: Vec<f64> = diameters
                .iter()
                .map(|&d| {
                    kept.iter()
                        .map(|e| {
                            let sigma = e.width_nm.unwrap_or(default_width) / FWHM_PER_SIGMA;
                            e.weight * gaussian(d, e.diameter_nm, sigma)
                        })
                        .filter(|c| c.is_finite())
                        .sum::<f64>()
                })
                .collect();
            (diameters, weights)
        }
    };

    normalize_weights(&mut weights);

    let diameters: Vec<f64> = diameters
        .into_iter()
        .map(|d| {
            let d = min_nm.map_or(d, |m| d.max(m));
            max_nm.map_or(d, |m| d.min(m))
        })
        .collect();
    let radii: Vec<f64> = diameters.iter().map(|d| d * 1e-9 / 2.0).collect();

    SizeDistribution {
        diameters_nm: DVector::from_vec(diameters),
        radii_m: DVector::from_vec(radii),
        weights: DVector::from_vec(weights),
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sum(v: &[f64]) -> f64 {
        v.iter().sum()
    }

    #[test]
    fn test_bin_count_is_floored() {
        let dist = build_size_distribution(&DistributionSpec::lognormal(10.0, 1.3), 1);
        assert_eq!(dist.len(), MIN_BINS);
    }

    #[test]
    fn test_lognormal_default_span_and_mode() {
        let dist = build_size_distribution(&DistributionSpec::lognormal(20.0, 1.2), 41);
        assert_relative_eq!(dist.diameters_nm()[0], 5.0);
        assert_relative_eq!(dist.diameters_nm()[40], 80.0);
        assert_relative_eq!(sum(dist.weights()), 1.0, epsilon = 1e-12);

        let (mode, _) = dist
            .weights()
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |acc, (i, &w)| if w > acc.1 { (i, w) } else { acc });
        let d_mode = dist.diameters_nm()[mode];
        assert!(d_mode > 5.0 && d_mode < 80.0);
        // mode of a lognormal sits just below its median
        assert!((d_mode - 20.0).abs() < 3.0);
    }

    #[test]
    fn test_radii_are_half_diameter_in_metres() {
        let dist = build_size_distribution(&DistributionSpec::lognormal(10.0, 1.5), 5);
        for (d, r) in dist.diameters_nm().iter().zip(dist.radii_m()) {
            assert_relative_eq!(*r, d * 0.5e-9, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_bimodal_span_and_two_peaks() {
        let spec = DistributionSpec::BimodalLognormal {
            d50_nm_1: 18.0,
            g_sigma_1: 1.1,
            weight_1: 0.6,
            d50_nm_2: 40.0,
            g_sigma_2: 1.1,
            weight_2: 0.4,
            min_diameter_nm: None,
            max_diameter_nm: None,
        };
        let dist = build_size_distribution(&spec, 200);
        assert_relative_eq!(dist.diameters_nm()[0], 4.5);
        assert_relative_eq!(dist.diameters_nm()[199], 160.0, epsilon = 1e-9);
        assert_relative_eq!(sum(dist.weights()), 1.0, epsilon = 1e-12);

        let w = dist.weights();
        let local_maxima = (1..w.len() - 1).filter(|&i| w[i] > w[i - 1] && w[i] > w[i + 1]).count();
        assert_eq!(local_maxima, 2);
    }

    #[test]
    fn test_discrete_peak_dominates_weight() {
        let spec = DistributionSpec::discrete(&[(10.0, 1.0), (30.0, 3.0)]);
        let dist = build_size_distribution(&spec, 101);
        assert_relative_eq!(dist.diameters_nm()[0], 10.0);
        assert_relative_eq!(dist.diameters_nm()[100], 30.0, epsilon = 1e-12);
        // both peaks land exactly on a bin, weights proportional to entry weights
        assert_relative_eq!(dist.weights()[100] / dist.weights()[0], 3.0, max_relative = 1e-6);
    }

    #[test]
    fn test_discrete_single_entry_collapses_to_uniform() {
        let dist = build_size_distribution(&DistributionSpec::discrete(&[(26.0, 1.0)]), 3);
        assert!(dist.diameters_nm().iter().all(|&d| d == 26.0));
        for &w in dist.weights() {
            assert_relative_eq!(w, 1.0 / 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_discrete_without_entries_uses_fallback_span() {
        let dist = build_size_distribution(&DistributionSpec::discrete(&[]), 10);
        assert_relative_eq!(dist.diameters_nm()[0], 1.0);
        assert_relative_eq!(dist.diameters_nm()[9], 10.0);
        assert_relative_eq!(sum(dist.weights()), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_discrete_keeps_first_five_entries() {
        let entries: Vec<(f64, f64)> = (1..=7).map(|i| (10.0 * i as f64, 1.0)).collect();
        let dist = build_size_distribution(&DistributionSpec::discrete(&entries), 61);
        assert_relative_eq!(dist.diameters_nm()[60], 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bounds_clamp_diameters() {
        let spec = DistributionSpec::Lognormal {
            d50_nm: 10.0,
            g_sigma: 1.5,
            min_diameter_nm: Some(5.0),
            max_diameter_nm: Some(20.0),
        };
        let dist = build_size_distribution(&spec, 16);
        assert!(dist.diameters_nm().iter().all(|&d| (5.0..=20.0).contains(&d)));
        assert_relative_eq!(dist.diameters_nm()[0], 5.0);
        assert_relative_eq!(dist.diameters_nm()[15], 20.0);
    }

    #[test]
    fn test_normalize_weights_fallbacks() {
        let mut w = [f64::NAN, -1.0, 0.0];
        normalize_weights(&mut w);
        assert_eq!(w, [1.0 / 3.0; 3]);

        let mut w = [1.0, f64::INFINITY, 3.0];
        normalize_weights(&mut w);
        assert_relative_eq!(w[0], 0.25);
        assert_eq!(w[1], 0.0);
        assert_relative_eq!(w[2], 0.75);
    }

    #[test]
    fn test_linspace_degenerate() {
        assert_eq!(linspace(3.0, 3.0, 4), vec![3.0; 4]);
        assert_eq!(linspace(1.0, 5.0, 1), vec![1.0]);
        assert_eq!(linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_lognormal_pdf_non_positive() {
        assert_eq!(lognormal_pdf(0.0, 10.0, 1.5), 0.0);
        assert_eq!(lognormal_pdf(-1.0, 10.0, 1.5), 0.0);
        assert!(lognormal_pdf(10.0, 10.0, 1.5) > 0.0);
    }

    #[test]
    fn test_spec_deserializes_from_toml() {
        let spec: DistributionSpec = toml::from_str(
            r#"
            type = "discrete"
            entries = [ { diameter_nm = 26.0, weight = 1.0 } ]
            "#,
        )
        .unwrap();
        assert_eq!(spec, DistributionSpec::discrete(&[(26.0, 1.0)]));
    }

    #[test]
    fn test_discrete_entry_width_sets_peak_height() {
        let spec: DistributionSpec = toml::from_str(
            r#"
            type = "discrete"
            entries = [
                { diameter_nm = 10.0, weight = 1.0, width_nm = 0.5 },
                { diameter_nm = 40.0, weight = 1.0, width_nm = 8.0 },
            ]
            "#,
        )
        .unwrap();
        let DistributionSpec::Discrete { entries, .. } = &spec else {
            panic!("expected a discrete distribution");
        };
        assert_eq!(entries[0].width_nm, Some(0.5));
        assert_eq!(entries[1].width_nm, Some(8.0));

        // 31 bins over 10..40 nm put both peaks on a bin
        let dist = build_size_distribution(&spec, 31);
        assert_relative_eq!(dist.diameters_nm()[30], 40.0, epsilon = 1e-12);
        let (narrow, wide) = (dist.weights()[0], dist.weights()[30]);
        assert!(narrow > 4.0 * wide, "narrow {narrow:e} vs wide {wide:e}");
        // equal weights, peak height scales with 1 / width
        assert_relative_eq!(narrow / wide, 16.0, max_relative = 1e-3);
    }

    #[test]
    fn test_discrete_entry_width_overrides_default() {
        let mut spec = DistributionSpec::discrete(&[(10.0, 1.0), (40.0, 1.0)]);
        if let DistributionSpec::Discrete { entries, width_nm, .. } = &mut spec {
            *width_nm = Some(2.0);
            entries[1].width_nm = Some(4.0);
        }
        let dist = build_size_distribution(&spec, 31);
        assert_relative_eq!(dist.weights()[0] / dist.weights()[30], 2.0, max_relative = 1e-3);
    }
}
