use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use tally_core::service::TallyService;

use super::helpers::parse_date;

pub(crate) fn cmd_track_define(
    svc: &mut TallyService,
    name: &str,
    unit: &str,
    step: f64,
    json: bool,
) -> Result<()> {
    svc.define_tracker(name, unit, step)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "name": name, "unit": unit, "step": step })
        );
    } else {
        println!("Tracking {name} ({step} {unit} per add)");
    }

    Ok(())
}

pub(crate) fn cmd_track_add(
    svc: &mut TallyService,
    name: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let amount = svc.increment_tracker(date, name)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "name": name, "date": date, "amount": amount })
        );
    } else {
        println!("{name}: {amount} today");
    }

    Ok(())
}

pub(crate) fn cmd_track_show(svc: &TallyService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let entries = svc.tracker_entries(date);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No trackers defined. Use `tally track define` to create one.");
        process::exit(2);
    }

    #[derive(Tabled)]
    struct TrackerRow {
        #[tabled(rename = "Tracker")]
        name: String,
        #[tabled(rename = "Today")]
        amount: String,
        #[tabled(rename = "Unit")]
        unit: String,
    }

    let rows: Vec<TrackerRow> = entries
        .iter()
        .map(|e| TrackerRow {
            name: e.name.clone(),
            amount: format!("{}", e.amount),
            unit: e.unit.clone(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_track_rm(svc: &mut TallyService, name: &str, json: bool) -> Result<()> {
    let removed = svc.remove_tracker(name)?;

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else if removed {
        println!("Removed tracker '{name}'");
    } else {
        eprintln!("No tracker named '{name}'");
    }

    Ok(())
}
