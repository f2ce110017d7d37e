//! CLI inspection entry point.
//!
//! # Responsibility
//! - Verify `planttracker_core` linkage (`planttracker_cli` alone).
//! - With a config path, run startup (legacy import + mirror load) and list
//!   plants with their derived harvest state.

use planttracker_core::{CoreConfig, PlantService, SqlitePlantRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("planttracker_core version={}", planttracker_core::core_version());

    let Some(config_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match list_plants(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn list_plants(config_path: &str) -> Result<(), String> {
    let config = CoreConfig::load(config_path).map_err(|err| err.to_string())?;
    config.init_logging().map_err(|err| err.to_string())?;
    let conn = config.open_database().map_err(|err| err.to_string())?;

    let mut legacy = config.legacy_store();
    let mut service = PlantService::new(SqlitePlantRepository::new(&conn));
    let report = service
        .initialize(&mut legacy)
        .map_err(|err| err.to_string())?;
    println!(
        "migration outcome={:?} migrated={}",
        report.outcome, report.migrated
    );

    for plant in service.sort_by_planting_date(false) {
        let countdown = service
            .days_until_harvest(&plant)
            .map_or_else(|| "-".to_string(), |days| days.to_string());
        println!(
            "{id}\t{name}\t{planted}\t{location}\t{status}\tdays_until_harvest={countdown}\tnext_task={next_task}",
            id = plant.id,
            name = plant.name,
            planted = plant.planted_date,
            location = plant.location.as_deref().unwrap_or("-"),
            status = service.plant_status(&plant),
            next_task = service.next_care_task(&plant).unwrap_or("-"),
        );
    }
    println!("plants={}", service.plants_count());
    Ok(())
}
