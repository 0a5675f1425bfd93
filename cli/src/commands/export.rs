use anyhow::{Context, Result};
use std::path::Path;

use tally_core::export::parse_csv;
use tally_core::models::Snapshot;
use tally_core::service::TallyService;

use super::helpers::prompt_confirm;

pub(crate) fn cmd_export(svc: &TallyService, csv: bool, out: Option<&Path>) -> Result<()> {
    let payload = if csv {
        svc.export_csv()?
    } else {
        let snapshot = svc.export_snapshot()?;
        serde_json::to_string_pretty(&snapshot)?
    };

    match out {
        Some(path) => {
            std::fs::write(path, &payload)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Exported to {}", path.display());
        }
        None => println!("{payload}"),
    }

    Ok(())
}

pub(crate) fn cmd_import(
    svc: &mut TallyService,
    file: &Path,
    csv: bool,
    yes: bool,
    json: bool,
) -> Result<()> {
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if csv {
        let import = parse_csv(data.as_bytes())?;
        let day_count = import.days.len();
        let row_count = import.rows_parsed;
        if !yes
            && !prompt_confirm(&format!(
                "Replace the food log for {day_count} day(s) with {row_count} imported row(s)?"
            ))?
        {
            eprintln!("Import cancelled.");
            return Ok(());
        }
        let days = svc.import_csv(import)?;
        if json {
            println!(
                "{}",
                serde_json::json!({ "days_replaced": days, "rows_imported": row_count })
            );
        } else {
            println!("Imported {row_count} row(s) across {days} day(s)");
        }
    } else {
        let snapshot: Snapshot = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse snapshot: {}", file.display()))?;
        let exported_at = snapshot.exported_at.clone();
        if !yes
            && !prompt_confirm(&format!(
                "Replace ALL local data with the snapshot from {exported_at}?"
            ))?
        {
            eprintln!("Import cancelled.");
            return Ok(());
        }
        svc.import_snapshot(snapshot)?;
        if json {
            println!("{}", serde_json::json!({ "imported": true }));
        } else {
            println!("Snapshot imported");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_import_json_roundtrip_via_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let mut svc = TallyService::open_in_memory().unwrap();
        let date = tally_core::dates::parse_date_key("2024-06-15").unwrap();
        svc.log_food(date, "Egg", 70.0, 6.0, 0.6, 5.0).unwrap();
        cmd_export(&svc, false, Some(&path)).unwrap();

        let mut other = TallyService::open_in_memory().unwrap();
        cmd_import(&mut other, &path, false, true, false).unwrap();
        assert_eq!(other.daily_summary(date).entries[0].name, "Egg");
    }

    #[test]
    fn test_export_import_csv_roundtrip_via_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let mut svc = TallyService::open_in_memory().unwrap();
        let date = tally_core::dates::parse_date_key("2024-06-15").unwrap();
        svc.log_food(date, "Egg", 70.0, 6.0, 0.6, 5.0).unwrap();
        cmd_export(&svc, true, Some(&path)).unwrap();

        let mut other = TallyService::open_in_memory().unwrap();
        cmd_import(&mut other, &path, true, true, false).unwrap();
        let entries = other.daily_summary(date).entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Egg");
        assert!((entries[0].calories - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_import_missing_file_errors() {
        let mut svc = TallyService::open_in_memory().unwrap();
        let missing = Path::new("/nonexistent/snapshot.json");
        assert!(cmd_import(&mut svc, missing, false, true, false).is_err());
    }
}
