use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use tally_core::aggregate::one_rep_max;
use tally_core::service::TallyService;

use super::helpers::parse_date;

pub(crate) fn cmd_workout_log(
    svc: &mut TallyService,
    exercise: &str,
    sets: u32,
    reps: u32,
    weight: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let (entry, is_pb) = svc.log_workout(date, exercise, sets, reps, weight)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "entry": entry, "personal_best": is_pb })
        );
    } else {
        let name = &entry.exercise;
        let orm = entry.one_rep_max;
        println!("Logged: {name} {sets}x{reps} @ {weight}kg — est. 1RM {orm:.0}kg");
        if is_pb {
            println!("New personal best!");
        }
    }

    Ok(())
}

pub(crate) fn cmd_workout_show(svc: &TallyService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let (sets, volume) = svc.workout_day(date);

    if json {
        println!(
            "{}",
            serde_json::json!({ "date": date, "sets": sets, "volume": volume })
        );
        return Ok(());
    }

    if sets.is_empty() {
        eprintln!("No workout logged for {date}");
        process::exit(2);
    }

    #[derive(Tabled)]
    struct SetRow {
        #[tabled(rename = "Exercise")]
        exercise: String,
        #[tabled(rename = "Sets")]
        sets: u32,
        #[tabled(rename = "Reps")]
        reps: u32,
        #[tabled(rename = "Weight (kg)")]
        weight: String,
        #[tabled(rename = "Est. 1RM")]
        one_rep_max: String,
    }

    let rows: Vec<SetRow> = sets
        .iter()
        .map(|s| SetRow {
            exercise: s.exercise.clone(),
            sets: s.sets,
            reps: s.reps,
            weight: format!("{:.1}", s.weight_kg),
            one_rep_max: format!("{:.0}", s.one_rep_max),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    println!("Total volume: {volume:.0}kg");

    Ok(())
}

pub(crate) fn cmd_workout_best(svc: &TallyService, exercise: &str, json: bool) -> Result<()> {
    let best = svc.personal_best(exercise);

    if json {
        println!("{}", serde_json::json!({ "exercise": exercise, "best": best }));
    } else if let Some(kg) = best {
        println!("{exercise}: {kg:.1}kg");
    } else {
        eprintln!("No sets logged for '{exercise}' yet");
        process::exit(2);
    }

    Ok(())
}

pub(crate) fn cmd_max(weight: f64, reps: u32, json: bool) -> Result<()> {
    let estimate = one_rep_max(weight, reps)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "weight": weight, "reps": reps, "one_rep_max": estimate })
        );
    } else {
        println!("Estimated 1RM: {estimate:.0}kg");
    }

    Ok(())
}
