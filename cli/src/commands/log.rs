use anyhow::{Context, Result};
use std::path::Path;
use std::process;

use tally_core::models::{DedupePolicy, FoodCandidate};
use tally_core::service::TallyService;

use super::helpers::{json_error, parse_date, print_candidate_table, prompt_choice, prompt_confirm};
use crate::classify::VisionClient;
use crate::openfoodfacts::OpenFoodFactsClient;

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_log(
    svc: &mut TallyService,
    name: &str,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let entry = svc.log_food(date, name, calories, protein, carbs, fat)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let name = &entry.name;
        let cal = entry.calories;
        let protein = entry.protein;
        let carbs = entry.carbs;
        let fat = entry.fat;
        println!("Logged: {name} — {cal:.0} kcal | P:{protein:.0}g C:{carbs:.0}g F:{fat:.0}g");
    }

    Ok(())
}

/// Shared confirm-then-log tail for every lookup/classification path. The
/// candidate is only committed after an explicit yes.
fn confirm_and_log(
    svc: &mut TallyService,
    candidate: &FoodCandidate,
    serving_g: f64,
    date: chrono::NaiveDate,
) -> Result<()> {
    let scaled = candidate.to_entry(serving_g)?;
    let name = &scaled.name;
    let cal = scaled.calories;
    if !prompt_confirm(&format!("Log '{name}' ({serving_g:.0}g, {cal:.0} kcal)?"))? {
        eprintln!("Not logged.");
        return Ok(());
    }
    let entry = svc.log_candidate(date, candidate, serving_g)?;
    let name = &entry.name;
    let cal = entry.calories;
    println!("Logged: {name} — {cal:.0} kcal");
    Ok(())
}

pub(crate) async fn cmd_search(
    svc: &mut TallyService,
    off: &OpenFoodFactsClient,
    query: &str,
    serving_g: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let candidates = off.search_async(query).await?;

    if candidates.is_empty() {
        if json {
            println!("{}", json_error(&format!("No food found for '{query}'")));
        } else {
            eprintln!("No food found for '{query}'");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }

    let chosen = if candidates.len() == 1 {
        &candidates[0]
    } else {
        print_candidate_table(&candidates);
        let idx = prompt_choice(candidates.len())?;
        &candidates[idx]
    };

    confirm_and_log(svc, chosen, serving_g, date)
}

pub(crate) async fn cmd_barcode(
    svc: &mut TallyService,
    off: &OpenFoodFactsClient,
    code: &str,
    serving_g: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let candidate = off.lookup_barcode_async(code).await?;

    let Some(candidate) = candidate else {
        if json {
            println!(
                "{}",
                json_error(&format!("No product found for barcode '{code}'"))
            );
        } else {
            eprintln!("No product found for barcode '{code}'. Try manual entry.");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&candidate)?);
        return Ok(());
    }

    confirm_and_log(svc, &candidate, serving_g, date)
}

pub(crate) async fn cmd_photo(
    svc: &mut TallyService,
    endpoint: &str,
    file: &Path,
    serving_g: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let image = std::fs::read(file)
        .with_context(|| format!("Failed to read image: {}", file.display()))?;

    let vision = VisionClient::new(endpoint);
    let estimate = vision.classify_async(&image).await?;

    let Some(candidate) = estimate else {
        if json {
            println!("{}", json_error("Could not identify a meal in the photo"));
        } else {
            eprintln!("Could not identify a meal in the photo. Try manual entry.");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&candidate)?);
        return Ok(());
    }

    // AI guesses get no special trust: same confirmation path as a lookup.
    let name = &candidate.name;
    eprintln!("Best guess: {name} (per 100g: {:.0} kcal)", candidate.calories);
    confirm_and_log(svc, &candidate, serving_g, date)
}

pub(crate) fn cmd_remove(
    svc: &mut TallyService,
    position: usize,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    if position == 0 {
        anyhow::bail!("Position starts at 1 (as shown by `tally summary`)");
    }
    let removed = svc.remove_food(date, position - 1)?;

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else if removed {
        println!("Removed entry {position}");
    } else {
        eprintln!("No entry at position {position} for {date}");
    }

    Ok(())
}

pub(crate) fn cmd_dedupe(
    svc: &mut TallyService,
    date: Option<String>,
    fuzzy: bool,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let policy = if fuzzy {
        DedupePolicy::Fuzzy
    } else {
        DedupePolicy::Strict
    };
    let removed = svc.dedupe(date, policy)?;

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else if removed == 0 {
        println!("No duplicates found");
    } else {
        println!("Removed {removed} duplicate(s)");
    }

    Ok(())
}
