use std::collections::BTreeMap;
use std::io::Read;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;

use crate::dates::date_key;
use crate::models::FoodEntry;
use crate::store::EntryStore;

pub const CSV_HEADER: [&str; 7] = [
    "date", "category", "name", "calories", "protein", "fat", "carbs",
];

/// Render the whole store as CSV, one row per logged entry. Food rows
/// carry their macros; workout, tracker, and weight rows carry zeros —
/// the JSON snapshot is the full-fidelity format, CSV is a report.
pub fn to_csv(store: &EntryStore) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;

    for (date, entry) in store.all_entries() {
        wtr.write_record([
            date_key(date),
            "food".to_string(),
            entry.name.clone(),
            format_amount(entry.calories),
            format_amount(entry.protein),
            format_amount(entry.fat),
            format_amount(entry.carbs),
        ])?;
    }
    for (date, set) in store.all_sets() {
        wtr.write_record([
            date_key(date),
            "workout".to_string(),
            set.exercise.clone(),
            "0".to_string(),
            "0".to_string(),
            "0".to_string(),
            "0".to_string(),
        ])?;
    }
    for (date, day) in store.tracker_log() {
        for name in day.keys() {
            wtr.write_record([
                date_key(*date),
                "tracker".to_string(),
                name.clone(),
                "0".to_string(),
                "0".to_string(),
                "0".to_string(),
                "0".to_string(),
            ])?;
        }
    }
    for entry in store.weight_history() {
        wtr.write_record([
            date_key(entry.date),
            "weight".to_string(),
            format_amount(entry.weight_kg),
            "0".to_string(),
            "0".to_string(),
            "0".to_string(),
            "0".to_string(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Food rows parsed from a CSV export, grouped by day.
#[derive(Debug, Clone)]
pub struct CsvImport {
    pub days: BTreeMap<NaiveDate, Vec<FoodEntry>>,
    pub rows_parsed: usize,
    pub rows_skipped: usize,
}

/// Parse a CSV export from any reader. Only `food` rows are imported —
/// other categories are counted as skipped. Unparsable numerics default
/// to 0; a bad date fails the import rather than silently dropping data.
pub fn parse_csv<R: Read>(reader: R) -> Result<CsvImport> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

    let col =
        |name: &str| -> Option<usize> { headers.iter().position(|h| h.eq_ignore_ascii_case(name)) };

    for name in ["date", "category", "name"] {
        if col(name).is_none() {
            bail!("Missing required column: {name}");
        }
    }

    let idx_date = col("date").context("Missing 'date' column")?;
    let idx_category = col("category").context("Missing 'category' column")?;
    let idx_name = col("name").context("Missing 'name' column")?;
    let idx_calories = col("calories");
    let idx_protein = col("protein");
    let idx_fat = col("fat");
    let idx_carbs = col("carbs");

    let mut days: BTreeMap<NaiveDate, Vec<FoodEntry>> = BTreeMap::new();
    let mut rows_parsed = 0_usize;
    let mut rows_skipped = 0_usize;

    for (line_num, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV row {}", line_num + 2))?;

        let date_str = record.get(idx_date).unwrap_or("").trim();
        let category = record.get(idx_category).unwrap_or("").trim();
        let name = record.get(idx_name).unwrap_or("").trim();

        if date_str.is_empty() && category.is_empty() && name.is_empty() {
            continue; // blank row
        }
        if !category.eq_ignore_ascii_case("food") || name.is_empty() {
            rows_skipped += 1;
            continue;
        }

        let date = crate::dates::parse_date_key(date_str)
            .with_context(|| format!("CSV row {}", line_num + 2))?;

        let parse_amount = |idx: Option<usize>| -> f64 {
            idx.and_then(|i| record.get(i))
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(0.0)
        };

        let entry = FoodEntry::new(
            name,
            parse_amount(idx_calories),
            parse_amount(idx_protein),
            parse_amount(idx_carbs),
            parse_amount(idx_fat),
        )?;
        days.entry(date).or_default().push(entry);
        rows_parsed += 1;
    }

    Ok(CsvImport {
        days,
        rows_parsed,
        rows_skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TrackerDef, WorkoutSet};
    use crate::persist::SqliteStore;
    use std::sync::Arc;

    fn open_store() -> EntryStore {
        EntryStore::open(Arc::new(SqliteStore::open_in_memory().unwrap()))
    }

    fn date(s: &str) -> NaiveDate {
        crate::dates::parse_date_key(s).unwrap()
    }

    #[test]
    fn test_to_csv_food_rows() {
        let mut store = open_store();
        let d = date("2024-06-15");
        store
            .add_entry(d, FoodEntry::new("Egg", 70.0, 6.0, 0.6, 5.0).unwrap())
            .unwrap();

        let csv = to_csv(&store).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,category,name,calories,protein,fat,carbs"
        );
        assert_eq!(lines.next().unwrap(), "2024-06-15,food,Egg,70,6,5,0.6");
    }

    #[test]
    fn test_to_csv_includes_other_categories() {
        let mut store = open_store();
        let d = date("2024-06-15");
        store
            .add_set(d, WorkoutSet::new("Squat", 3, 5, 100.0).unwrap())
            .unwrap();
        store
            .define_tracker(TrackerDef::new("Water", "glasses", 1.0).unwrap())
            .unwrap();
        store.increment_tracker(d, "Water").unwrap();
        store.log_weight(d, 75.0).unwrap();

        let csv = to_csv(&store).unwrap();
        assert!(csv.contains("2024-06-15,workout,Squat,0,0,0,0"));
        assert!(csv.contains("2024-06-15,tracker,Water,0,0,0,0"));
        assert!(csv.contains("2024-06-15,weight,75,0,0,0,0"));
    }

    #[test]
    fn test_parse_csv_roundtrip() {
        let mut store = open_store();
        let d = date("2024-06-15");
        store
            .add_entry(d, FoodEntry::new("Egg", 70.0, 6.0, 0.6, 5.0).unwrap())
            .unwrap();
        store
            .add_set(d, WorkoutSet::new("Squat", 3, 5, 100.0).unwrap())
            .unwrap();

        let csv = to_csv(&store).unwrap();
        let import = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(import.rows_parsed, 1);
        assert_eq!(import.rows_skipped, 1); // the workout row
        let entries = &import.days[&d];
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Egg");
        assert!((entries[0].calories - 70.0).abs() < f64::EPSILON);
        assert!((entries[0].carbs - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_csv_missing_required_column() {
        let bad = "date,name\n2024-06-15,Egg\n";
        let result = parse_csv(bad.as_bytes());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("category"));
    }

    #[test]
    fn test_parse_csv_unparsable_numbers_default_to_zero() {
        let csv = "date,category,name,calories,protein,fat,carbs\n\
                   2024-06-15,food,Mystery,abc,,5,1\n";
        let import = parse_csv(csv.as_bytes()).unwrap();
        let entry = &import.days[&date("2024-06-15")][0];
        assert_eq!(entry.calories, 0.0);
        assert_eq!(entry.protein, 0.0);
        assert_eq!(entry.fat, 5.0);
        assert_eq!(entry.carbs, 1.0);
    }

    #[test]
    fn test_parse_csv_bad_date_fails() {
        let csv = "date,category,name,calories,protein,fat,carbs\n\
                   15/06/2024,food,Egg,70,6,5,1\n";
        assert!(parse_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_csv_skips_blank_rows() {
        let csv = "date,category,name,calories,protein,fat,carbs\n\
                   ,,,,,,\n\
                   2024-06-15,food,Egg,70,6,5,1\n";
        let import = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(import.rows_parsed, 1);
        assert_eq!(import.rows_skipped, 0);
    }
}
