//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `neighborly_core` linkage.
//! - Preview targeting rows for a roster JSON file without the Flutter shell.
//!
//! Usage: `neighborly_cli [roster.json] [household_type ...]`

use neighborly_core::{
    normalize_roster, parse_roster_json, FilterCriteria, SessionOptions, TargetingSession,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("neighborly_core ping={}", neighborly_core::ping());
    println!("neighborly_core version={}", neighborly_core::core_version());

    let mut args = std::env::args().skip(1);
    let Some(roster_path) = args.next() else {
        return ExitCode::SUCCESS;
    };
    let household_types: Vec<String> = args.collect();

    match preview(&roster_path, &household_types) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn preview(roster_path: &str, household_types: &[String]) -> Result<(), String> {
    let body = std::fs::read_to_string(roster_path)
        .map_err(|err| format!("cannot read {roster_path}: {err}"))?;
    let records = parse_roster_json(&body).map_err(|err| err.to_string())?;
    let criteria = FilterCriteria::from_parts(household_types, None, None, "all")
        .map_err(|err| err.to_string())?;

    let mut session = TargetingSession::new(SessionOptions {
        criteria,
        ..SessionOptions::default()
    });
    session.load_roster(&normalize_roster(&records));

    let index = session.index();
    println!(
        "households={} matches={} additional={}",
        index.len(),
        index.match_ids().len(),
        index.additional_ids().len()
    );
    for row in session.rows() {
        println!(
            "{} {:<12} {:<32} {}",
            if row.is_match { "*" } else { " " },
            row.id,
            row.display_name,
            row.distance_label.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
