use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use tally_core::service::TallyService;

use super::helpers::parse_date;

pub(crate) fn cmd_summary(svc: &TallyService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let summary = svc.daily_summary(date);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.entries.is_empty() {
        let date = &summary.date;
        eprintln!("No entries for {date}");
        process::exit(2);
    }

    let date = &summary.date;
    let mode = if summary.training_day {
        "training day"
    } else {
        "rest day"
    };
    println!("=== {date} ({mode}) ===\n");

    for (i, e) in summary.entries.iter().enumerate() {
        let pos = i + 1;
        let name = &e.name;
        let cal = e.calories;
        let protein = e.protein;
        let carbs = e.carbs;
        let fat = e.fat;
        println!("  [{pos}] {name} — {cal:.0} kcal | P:{protein:.0}g C:{carbs:.0}g F:{fat:.0}g");
    }
    println!();

    let totals = &summary.totals;
    let cal = totals.calories;
    let protein = totals.protein;
    let carbs = totals.carbs;
    let fat = totals.fat;
    println!("  TOTAL: {cal:.0} kcal | P:{protein:.0}g C:{carbs:.0}g F:{fat:.0}g");

    let goal = summary.calorie_goal;
    let remaining = summary.remaining;
    println!("  GOAL: {goal:.0} kcal");
    if remaining < 0.0 {
        let over = -remaining;
        println!("  OVER BUDGET by {over:.0} kcal");
    } else {
        println!("  REMAINING: {remaining:.0} kcal");
    }

    let cal_pct = summary.calories_pct;
    let p_pct = summary.protein_pct;
    let c_pct = summary.carbs_pct;
    let f_pct = summary.fat_pct;
    println!("  PROGRESS: kcal {cal_pct:.0}% | P {p_pct:.0}% | C {c_pct:.0}% | F {f_pct:.0}%");

    Ok(())
}

pub(crate) fn cmd_week(
    svc: &TallyService,
    end: Option<String>,
    days: u32,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct DayRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
    }

    let end = parse_date(end)?;
    let rollup = svc.weekly_rollup(end, days);

    if json {
        println!("{}", serde_json::to_string_pretty(&rollup)?);
        return Ok(());
    }

    if rollup.iter().all(|d| d.totals.calories == 0.0) {
        eprintln!("No entries in the last {days} days");
        process::exit(2);
    }

    let rows: Vec<DayRow> = rollup
        .iter()
        .map(|d| DayRow {
            date: d.date.to_string(),
            calories: format!("{:.0}", d.totals.calories),
            protein: format!("{:.0}g", d.totals.protein),
            carbs: format!("{:.0}g", d.totals.carbs),
            fat: format!("{:.0}g", d.totals.fat),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_frequent(svc: &TallyService, count: usize, json: bool) -> Result<()> {
    let ranked = svc.frequent_foods(count);

    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else if ranked.is_empty() {
        eprintln!("No foods logged yet");
        process::exit(2);
    } else {
        println!("Most logged foods:");
        for (i, name) in ranked.iter().enumerate() {
            let pos = i + 1;
            println!("  {pos}. {name}");
        }
    }

    Ok(())
}
