//! Common utilities for integration tests

pub mod test_helpers;

#[allow(unused_imports)]
pub use test_helpers::{
    bimodal_engine,
    gaussian_profile,
    max_relative_difference,
    radial_centroid,
    relative_error,
};
