use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "tally").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("tally.db");

        Ok(Config { db_path, data_dir })
    }

    /// Resolve the meal-photo classifier endpoint: the `--endpoint` flag
    /// wins, then `$TALLY_VISION_URL`.
    pub fn vision_endpoint(&self, flag: Option<String>) -> Result<String> {
        if let Some(url) = flag {
            return Ok(url);
        }
        std::env::var("TALLY_VISION_URL").context(
            "No classifier endpoint configured. Pass --endpoint or set TALLY_VISION_URL",
        )
    }
}
