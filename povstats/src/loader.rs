//! Reads the four flat input tables into polars `DataFrame`s and validates their column sets.

use std::collections::HashSet;
use std::path::Path;

use itertools::Itertools;
use log::{debug, info};
use polars::prelude::*;

use crate::config::Config;
use crate::error::{PovStatsError, Result};
use crate::COL;

/// The input tables as loaded from disk, before any reshaping
#[derive(Debug, Clone, PartialEq)]
pub struct RawTables {
    pub indicators: DataFrame,
    pub countries: DataFrame,
    pub series: DataFrame,
    pub poverty: DataFrame,
}

/// Which of the input tables is being read. Decides type inference and the required columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Indicators,
    Countries,
    Series,
    Poverty,
}

impl TableKind {
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            TableKind::Indicators => &[
                COL::COUNTRY_NAME,
                COL::COUNTRY_CODE,
                COL::INDICATOR_NAME,
                COL::INDICATOR_CODE,
            ],
            TableKind::Countries => &[
                COL::COUNTRY_CODE,
                COL::COUNTRY_SHORT_NAME,
                COL::COUNTRY_REGION,
                COL::COUNTRY_INCOME_GROUP,
                COL::COUNTRY_ALPHA2_CODE,
            ],
            TableKind::Series => &[
                COL::SERIES_INDICATOR_NAME,
                COL::SERIES_LONG_DEFINITION,
                COL::SERIES_UNIT_OF_MEASURE,
                COL::SERIES_PERIODICITY,
                COL::SERIES_SOURCE,
                COL::SERIES_LIMITATIONS,
            ],
            TableKind::Poverty => &[
                COL::POVERTY_COUNTRY_NAME,
                COL::POVERTY_YEAR,
                COL::POVERTY_IS_COUNTRY,
            ],
        }
    }

    /// Text-only tables keep blank fields as empty strings so that "known empty" can be told
    /// apart from a missing value.
    fn infer_types(&self) -> bool {
        matches!(self, TableKind::Indicators | TableKind::Poverty)
    }
}

fn read_csv(path: &Path, infer_types: bool) -> PolarsResult<DataFrame> {
    let options = if infer_types {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
    } else {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .map_parse_options(|opts| opts.with_missing_is_null(false))
    };
    options
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

fn check_required_columns(df: &DataFrame, path: &Path, kind: TableKind) -> Result<()> {
    let present: HashSet<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let missing = kind
        .required_columns()
        .iter()
        .filter(|name| !present.contains(**name))
        .collect_vec();
    if !missing.is_empty() {
        return Err(PovStatsError::load(
            path,
            format!(
                "missing required column(s): {}",
                missing.iter().map(|name| format!("'{name}'")).join(", ")
            ),
        ));
    }
    Ok(())
}

fn parse_flag(value: &str) -> Result<Option<bool>> {
    match value.trim().to_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" => Ok(Some(true)),
        "false" | "0" => Ok(Some(false)),
        other => Err(PovStatsError::MalformedInput(format!(
            "'{other}' is not a boolean"
        ))),
    }
}

/// Replace the column `name` with a Boolean column, accepting booleans, 0/1 or true/false text
fn normalise_flag_column(df: &mut DataFrame, name: &str) -> Result<()> {
    let series = df.column(name)?;
    let flags: Vec<Option<bool>> = match series.dtype() {
        DataType::Boolean => series.bool()?.into_iter().collect(),
        DataType::String => series
            .str()?
            .into_iter()
            .map(|value| value.map(parse_flag).transpose().map(Option::flatten))
            .collect::<Result<_>>()?,
        dtype if dtype.is_numeric() => {
            let cast = series.cast(&DataType::Boolean)?;
            let flags = cast.bool()?.into_iter().collect();
            flags
        }
        dtype => {
            return Err(PovStatsError::MalformedInput(format!(
                "column '{name}' has type {dtype} and cannot hold flags"
            )))
        }
    };
    df.with_column(Series::new(name, flags))?;
    Ok(())
}

/// Load a single table and validate it against the columns `kind` requires
pub fn load_table(path: &Path, kind: TableKind) -> Result<DataFrame> {
    info!("Attempting to load dataframe from {}", path.display());
    if !path.is_file() {
        return Err(PovStatsError::load(path, "file not found"));
    }
    let mut df =
        read_csv(path, kind.infer_types()).map_err(|err| PovStatsError::load(path, err))?;
    check_required_columns(&df, path, kind)?;
    if kind == TableKind::Poverty {
        normalise_flag_column(&mut df, COL::POVERTY_IS_COUNTRY)?;
    }
    info!("Loaded {kind:?} table with shape: {:?}", df.shape());
    debug!("Column names in {kind:?} table: {:?}", df.get_column_names());
    Ok(df)
}

/// Load all four input tables named by `config`
pub fn load_all(config: &Config) -> Result<RawTables> {
    Ok(RawTables {
        indicators: load_table(&config.indicator_path(), TableKind::Indicators)?,
        countries: load_table(&config.country_path(), TableKind::Countries)?,
        series: load_table(&config.series_path(), TableKind::Series)?,
        poverty: load_table(&config.poverty_path(), TableKind::Poverty)?,
    })
}
