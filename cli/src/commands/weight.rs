use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use tally_core::service::TallyService;

use super::helpers::parse_date;

const LBS_PER_KG: f64 = 2.20462;

pub(crate) fn cmd_weight_log(
    svc: &mut TallyService,
    kg: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    svc.log_weight(date, kg)?;

    if json {
        println!("{}", serde_json::json!({ "date": date, "weight_kg": kg }));
    } else {
        let lbs = kg * LBS_PER_KG;
        println!("Logged {kg:.1} kg ({lbs:.1} lbs) for {date}");
    }

    Ok(())
}

pub(crate) fn cmd_weight_history(
    svc: &TallyService,
    days: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut entries = svc.weight_history();
    if let Some(n) = days {
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No weight entries found. Use `tally weight log` to record your weight.");
        process::exit(2);
    }

    #[derive(Tabled)]
    struct WeightRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Weight (kg)")]
        kg: String,
        #[tabled(rename = "Weight (lbs)")]
        lbs: String,
    }

    let rows: Vec<WeightRow> = entries
        .iter()
        .map(|e| WeightRow {
            date: e.date.to_string(),
            kg: format!("{:.1}", e.weight_kg),
            lbs: format!("{:.1}", e.weight_kg * LBS_PER_KG),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
