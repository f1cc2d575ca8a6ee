use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub indicator_file: String,
    pub country_file: String,
    pub series_file: String,
    pub poverty_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: "data".into(),
            indicator_file: "PovStatsData.csv".into(),
            country_file: "PovStatsCountry.csv".into(),
            series_file: "PovStatsSeries.csv".into(),
            poverty_file: "poverty.csv".into(),
        }
    }
}

impl Config {
    /// Config with the default file names inside `data_dir`
    pub fn with_data_dir<P: Into<PathBuf>>(data_dir: P) -> Self {
        Config {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub fn indicator_path(&self) -> PathBuf {
        self.data_dir.join(&self.indicator_file)
    }

    pub fn country_path(&self) -> PathBuf {
        self.data_dir.join(&self.country_file)
    }

    pub fn series_path(&self) -> PathBuf {
        self.data_dir.join(&self.series_file)
    }

    pub fn poverty_path(&self) -> PathBuf {
        self.data_dir.join(&self.poverty_file)
    }
}
