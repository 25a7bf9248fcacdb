//! Top-loaded density-gradient run
//!
//! Loads the default preset (or a TOML file given as first argument), puts
//! every bin into the top cells of the tube and drives the engine like an
//! interactive front end would, printing where each band sits.
//!
//! ```bash
//! cargo run --example top_load
//! cargo run --example top_load -- my_run.toml profile.csv
//! ```

use std::env;

use lamm_rs::config::SimulationConfig;
use lamm_rs::error::LammError;
use lamm_rs::output::export::{CsvConfig, CsvMetadata, export_engine_csv};

fn main() -> Result<(), LammError> {
    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => SimulationConfig::load_from_file(path)?,
        None => SimulationConfig::default(),
    };

    let mut engine = config.build_engine()?;
    engine.set_initial_top_load(3);
    let mut driver = config.frame_driver();

    println!(
        "{} cells, {} bins, ω = {} rad/s, time scale ×{}",
        engine.n_cells(),
        engine.n_bins(),
        config.rotor.omega,
        config.time_scale.factor()
    );

    let frame = 1.0 / 60.0;
    for second in 1..=10 {
        let mut saturated = 0;
        for _ in 0..60 {
            if driver.advance_frame(&mut engine, frame).saturated {
                saturated += 1;
            }
        }

        let heaviest = engine.n_bins() - 1;
        println!(
            "t = {:>9.1} s | steps {:>7} | mass {:.6} | centroid smallest {:.5} m, largest {:.5} m{}",
            driver.simulated_time(),
            driver.total_steps(),
            engine.compute_masses().total,
            engine.centroid_for_bin(0).unwrap_or(f64::NAN),
            engine.centroid_for_bin(heaviest).unwrap_or(f64::NAN),
            if saturated > 0 { format!(" ({saturated} frames saturated, wall second {second})") } else { String::new() }
        );
    }

    for k in [0, engine.n_bins() / 2, engine.n_bins() - 1] {
        match engine.isopycnic_radius_for_bin(k) {
            Some(r) => println!("bin {k}: isopycnic radius {r:.5} m"),
            None => println!("bin {k}: no isopycnic point inside the tube"),
        }
    }

    if let Some(path) = args.get(2) {
        let csv = CsvConfig::default().with_metadata(CsvMetadata::from_engine(&engine, driver.simulated_time()));
        export_engine_csv(&engine, path, Some(&csv))?;
        println!("profile written to {path}");
    }

    Ok(())
}
