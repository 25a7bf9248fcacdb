//! Sub-stepped time advance and wall-clock driving

use lamm_rs::config::SimulationConfig;
use lamm_rs::output::export::{CsvConfig, CsvMetadata, export_engine_csv};
use lamm_rs::solver::{FrameDriver, TimeScale};

mod common;
use common::{bimodal_engine, max_relative_difference, relative_error};

#[test]
fn test_advance_by_matches_repeated_segments() {
    let mut segmented = bimodal_engine();
    let mut single = bimodal_engine();

    let dt_base = segmented.compute_stable_dt(0.3);
    let segments = 20;
    let total = dt_base * segments as f64;

    for _ in 0..segments {
        segmented.advance_by(dt_base, 5000);
    }
    let result = single.advance_by(total, 5000);
    assert!(relative_error(result.advanced, total) < 1e-6);

    let diff = max_relative_difference(
        segmented.concentrations().total.as_slice(),
        single.concentrations().total.as_slice(),
    );
    assert!(diff < 1e-6, "segmented and single advance differ by {diff:e}");
}

#[test]
fn test_advance_scales_with_time_scale() {
    let mut slow = bimodal_engine();
    let mut fast = bimodal_engine();
    let wall_dt = slow.compute_stable_dt(0.25) * 0.2;

    let mut sim_slow = 0.0;
    let mut sim_fast = 0.0;
    for _ in 0..30 {
        sim_slow += slow.advance_by(wall_dt, 5000).advanced;
        sim_fast += fast.advance_by(wall_dt * 10.0, 5000).advanced;
    }

    assert!(relative_error(sim_fast, 10.0 * sim_slow) < 1e-6);
}

#[test]
fn test_frame_driver_scales_with_time_scale() {
    let mut slow = bimodal_engine();
    let mut fast = bimodal_engine();
    let wall_dt = slow.compute_stable_dt(0.25) * 0.2;

    let mut driver_slow = FrameDriver::new(TimeScale::X1);
    let mut driver_fast = FrameDriver::new(TimeScale::X10);
    for _ in 0..30 {
        let a = driver_slow.advance_frame(&mut slow, wall_dt);
        let b = driver_fast.advance_frame(&mut fast, wall_dt);
        assert!(!a.saturated && !b.saturated);
    }

    assert_eq!(driver_slow.frames(), 30);
    assert!(relative_error(driver_fast.simulated_time(), 10.0 * driver_slow.simulated_time()) < 1e-6);
    assert!(driver_fast.total_steps() > driver_slow.total_steps());
}

#[test]
fn test_saturated_frames_report_partial_progress() {
    let mut engine = bimodal_engine();
    let wall_dt = engine.stable_dt();
    let mut driver = FrameDriver::new(TimeScale::X10000).with_max_steps(50);

    let report = driver.advance_frame(&mut engine, wall_dt);
    assert!(report.saturated);
    assert_eq!(report.steps, 50);
    assert!(relative_error(report.advanced, 50.0 * wall_dt) < 1e-9);
    assert!(report.advanced < report.requested);
}

#[test]
fn test_default_configuration_pipeline() {
    let config = SimulationConfig::from_toml_str(
        r#"
        radial_cells = 60
        n_bins = 8
        time_scale = 100
        "#,
    )
    .unwrap();
    let mut engine = config.build_engine().unwrap();
    engine.set_initial_top_load(2);
    let mass = engine.compute_masses().total;

    let mut driver = config.frame_driver();
    for _ in 0..20 {
        driver.advance_frame(&mut engine, 1.0 / 30.0);
    }
    assert!(driver.simulated_time() > 0.0);
    assert!(relative_error(engine.compute_masses().total, mass) < 1e-9);
    assert!(engine.min_concentration() > -1e-10);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.csv");
    let csv = CsvConfig::default().with_metadata(CsvMetadata::from_engine(&engine, driver.simulated_time()));
    export_engine_csv(&engine, &path, Some(&csv)).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let data_rows = content.lines().filter(|l| !l.starts_with('#')).count();
    assert_eq!(data_rows, 1 + 60);
}
