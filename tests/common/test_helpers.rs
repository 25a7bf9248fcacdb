//! Helper functions for integration tests

#![allow(dead_code)]

use lamm_rs::models::{
    DistributionSpec,
    GradientShape,
    GradientSpec,
    build_gradient,
    build_size_distribution,
};
use lamm_rs::physics::{MaterialParams, RotorParams};
use lamm_rs::solver::{EngineConfiguration, MultiSpeciesLamm};

/// Compute relative error: |actual - expected| / |expected|
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// Largest pointwise relative difference, each scaled by `max(|a|, |b|, 1e-12)`
pub fn max_relative_difference(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "profiles must have the same length");
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x - y).abs() / x.abs().max(y.abs()).max(1e-12))
        .fold(0.0, f64::max)
}

/// Gaussian band centred a fifth of the way down the tube, width 5% of the span
pub fn gaussian_profile(r_min: f64, r_max: f64) -> impl Fn(f64) -> f64 {
    let center = r_min + 0.2 * (r_max - r_min);
    let sigma = 0.05 * (r_max - r_min);
    move |r| (-(r - center).powi(2) / (2.0 * sigma * sigma)).exp()
}

/// Mass-weighted mean radius of a concentration profile, $\int r \cdot r c \, dr / \int r c \, dr$
pub fn radial_centroid(centers: &[f64], concentration: &[f64]) -> f64 {
    let (mass, moment) = centers
        .iter()
        .zip(concentration)
        .fold((0.0, 0.0), |(m, mr), (&r, &c)| (m + r * c, mr + r * r * c));
    moment / mass
}

/// Bimodal population in a uniform solvent, loaded with [`gaussian_profile`]
///
/// 120 cells over 5.0–6.5 cm, five bins from two lognormal modes
/// (18 nm and 32 nm), core–shell particles at 25 000 rad/s.
pub fn bimodal_engine() -> MultiSpeciesLamm {
    let (r_min, r_max, n) = (0.05, 0.065, 120);

    let gradient = GradientSpec::new(GradientShape::Uniform, r_min, r_max)
        .with_density(1050.0, 1050.0)
        .with_viscosity(0.001, 0.001);
    let distribution = build_size_distribution(
        &DistributionSpec::BimodalLognormal {
            d50_nm_1: 18.0,
            g_sigma_1: 1.3,
            weight_1: 0.6,
            d50_nm_2: 32.0,
            g_sigma_2: 1.5,
            weight_2: 0.4,
            min_diameter_nm: None,
            max_diameter_nm: None,
        },
        5,
    );
    assert!(distribution.weights().iter().any(|&w| w > 0.0));

    let config = EngineConfiguration::from_distribution(
        r_min,
        r_max,
        n,
        RotorParams::new(25000.0, 293.0),
        build_gradient(&gradient, n),
        &distribution,
        MaterialParams::new(2200.0, 1050.0, 2e-9),
    );
    let mut engine = MultiSpeciesLamm::new(config).expect("valid bimodal configuration");
    engine.set_initial_concentrations(gaussian_profile(r_min, r_max));
    engine
}
