use anyhow::Result;

use tally_core::models::GoalKind;
use tally_core::service::TallyService;

pub(crate) fn cmd_goal_set(
    svc: &mut TallyService,
    kind: &str,
    value: f64,
    json: bool,
) -> Result<()> {
    let kind = GoalKind::parse(kind)?;
    svc.set_goal(kind, value)?;

    if json {
        println!("{}", serde_json::to_string_pretty(svc.goals())?);
    } else {
        let name = kind.as_str();
        println!("Set {name} to {value:.0}");
    }

    Ok(())
}

pub(crate) fn cmd_goal_show(svc: &TallyService, json: bool) -> Result<()> {
    let config = svc.goals();

    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let mode = if config.is_training_day {
        "training day"
    } else {
        "rest day"
    };
    let active = svc.active_calorie_goal();
    let rest = config.rest_calories;
    let train = config.train_calories;
    let protein = config.protein;
    let carbs = config.carbs;
    let fat = config.fat;
    println!("Mode: {mode} (active goal {active:.0} kcal)");
    println!("  Calories: rest {rest:.0} / train {train:.0}");
    println!("  Protein: {protein:.0}g  Carbs: {carbs:.0}g  Fat: {fat:.0}g");

    Ok(())
}

pub(crate) fn cmd_goal_toggle(svc: &mut TallyService, json: bool) -> Result<()> {
    let active = svc.toggle_training_mode()?;
    let training = svc.goals().is_training_day;

    if json {
        println!(
            "{}",
            serde_json::json!({ "is_training_day": training, "active_calorie_goal": active })
        );
    } else if training {
        println!("Training day — goal {active:.0} kcal");
    } else {
        println!("Rest day — goal {active:.0} kcal");
    }

    Ok(())
}
