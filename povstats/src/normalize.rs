//! Wide-to-long conversion of the indicator table: one row per (country, indicator) with one
//! column per year becomes one `Observation` per (country, indicator, year).

use std::collections::BTreeSet;

use log::{debug, info};
use polars::df;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PovStatsError, Result};
use crate::COL;

/// The identifier columns that lead the indicator table, in order
pub const ID_COLUMNS: [&str; 4] = [
    COL::COUNTRY_NAME,
    COL::COUNTRY_CODE,
    COL::INDICATOR_NAME,
    COL::INDICATOR_CODE,
];

/// A single indicator value for a country in a year
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub country_code: String,
    pub country_name: String,
    pub indicator_name: String,
    pub year: i32,
    pub value: f64,
}

fn parse_year(header: &str) -> Option<i32> {
    header.trim().parse().ok()
}

/// Year columns of the indicator table with their parsed years. A trailing column with no
/// values (e.g. from a trailing comma on every line) is dropped.
fn year_columns(df: &DataFrame) -> Result<Vec<(i32, &Series)>> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    for id in ID_COLUMNS {
        if !names.iter().any(|name| name == id) {
            return Err(PovStatsError::MalformedInput(format!(
                "indicator table has no '{id}' column"
            )));
        }
    }
    let candidates: Vec<&String> = names
        .iter()
        .filter(|name| !ID_COLUMNS.contains(&name.as_str()))
        .collect();
    let last = candidates.len().saturating_sub(1);
    let mut columns = Vec::with_capacity(candidates.len());
    for (idx, name) in candidates.into_iter().enumerate() {
        let series = df.column(name)?;
        match parse_year(name) {
            Some(year) => columns.push((year, series)),
            None if idx == last && series.null_count() == series.len() => {
                debug!("Discarding empty trailing column '{name}'");
            }
            None => {
                return Err(PovStatsError::MalformedInput(format!(
                    "column header '{name}' is not a year"
                )))
            }
        }
    }
    Ok(columns)
}

/// Values of a year column as floats. Text cells must parse as numbers.
fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    match series.dtype() {
        DataType::String => series
            .str()?
            .into_iter()
            .map(|cell| match cell.map(str::trim) {
                None | Some("") => Ok(None),
                Some(text) => text.parse::<f64>().map(Some).map_err(|_| {
                    PovStatsError::MalformedInput(format!(
                        "'{text}' in column '{}' is not a number",
                        series.name()
                    ))
                }),
            })
            .collect(),
        dtype if dtype.is_numeric() => {
            let values = series.cast(&DataType::Float64)?;
            let values = values.f64()?.into_iter().collect();
            Ok(values)
        }
        dtype => Err(PovStatsError::MalformedInput(format!(
            "column '{}' has type {dtype}, expected numbers",
            series.name()
        ))),
    }
}

fn identifier_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let series = df.column(name)?.cast(&DataType::String)?;
    series
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.map(str::to_string).ok_or_else(|| {
                PovStatsError::MalformedInput(format!("row {row} has no '{name}'"))
            })
        })
        .collect()
}

/// Melt the indicator table into observations, dropping absent values
pub fn wide_to_long(df: &DataFrame) -> Result<Vec<Observation>> {
    let years = year_columns(df)?;
    let country_names = identifier_column(df, COL::COUNTRY_NAME)?;
    let country_codes = identifier_column(df, COL::COUNTRY_CODE)?;
    let indicator_names = identifier_column(df, COL::INDICATOR_NAME)?;
    let values = years
        .iter()
        .map(|(year, series)| Ok((*year, numeric_values(series)?)))
        .collect::<Result<Vec<_>>>()?;

    let mut observations = vec![];
    for row in 0..df.height() {
        for (year, column) in &values {
            if let Some(value) = column[row].filter(|v| !v.is_nan()) {
                observations.push(Observation {
                    country_code: country_codes[row].clone(),
                    country_name: country_names[row].clone(),
                    indicator_name: indicator_names[row].clone(),
                    year: *year,
                    value,
                });
            }
        }
    }
    info!(
        "Normalised {} indicator rows over {} years into {} observations",
        df.height(),
        values.len(),
        observations.len()
    );
    Ok(observations)
}

/// Long-form frame of observations
pub fn observations_to_df(observations: &[Observation]) -> Result<DataFrame> {
    Ok(df!(
        COL::COUNTRY_NAME => observations.iter().map(|o| o.country_name.as_str()).collect::<Vec<_>>(),
        COL::COUNTRY_CODE => observations.iter().map(|o| o.country_code.as_str()).collect::<Vec<_>>(),
        COL::INDICATOR_NAME => observations.iter().map(|o| o.indicator_name.as_str()).collect::<Vec<_>>(),
        COL::YEAR => observations.iter().map(|o| o.year).collect::<Vec<_>>(),
        COL::VALUE => observations.iter().map(|o| o.value).collect::<Vec<_>>()
    )?)
}

/// Distinct observation years, ascending
pub fn observation_years(observations: &[Observation]) -> Vec<i32> {
    observations
        .iter()
        .map(|o| o.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn test_df() -> DataFrame {
        df!(
            COL::COUNTRY_NAME => &["Testland", "Testland", "World"],
            COL::COUNTRY_CODE => &["TST", "TST", "WLD"],
            COL::INDICATOR_NAME => &["Population, total", "GINI index (World Bank estimate)", "Population, total"],
            COL::INDICATOR_CODE => &["SP.POP.TOTL", "SI.POV.GINI", "SP.POP.TOTL"],
            "2000" => &[Some(5.0), Some(30.5), Some(6000.0)],
            "2001" => &[Some(7.0), None, Some(6100.0)],
            "column_7" => &[None::<f64>, None, None]
        )
        .unwrap()
    }

    #[test]
    fn absent_values_should_be_dropped() -> anyhow::Result<()> {
        let observations = wide_to_long(&test_df())?;
        assert_eq!(observations.len(), 5);
        assert!(!observations
            .iter()
            .any(|o| o.indicator_name.starts_with("GINI") && o.year == 2001));
        Ok(())
    }

    #[test]
    fn triples_should_be_unique() -> anyhow::Result<()> {
        let observations = wide_to_long(&test_df())?;
        let triples: HashSet<(&str, &str, i32)> = observations
            .iter()
            .map(|o| (o.country_code.as_str(), o.indicator_name.as_str(), o.year))
            .collect();
        assert_eq!(triples.len(), observations.len());
        Ok(())
    }

    #[test]
    fn single_country_should_give_one_row_per_year() -> anyhow::Result<()> {
        let df = df!(
            COL::COUNTRY_NAME => &["Testland"],
            COL::COUNTRY_CODE => &["TST"],
            COL::INDICATOR_NAME => &["Population, total"],
            COL::INDICATOR_CODE => &["SP.POP.TOTL"],
            "2000" => &[5i64],
            "2001" => &[7i64]
        )?;
        let observations = wide_to_long(&df)?;
        assert_eq!(
            observations,
            vec![
                Observation {
                    country_code: "TST".into(),
                    country_name: "Testland".into(),
                    indicator_name: "Population, total".into(),
                    year: 2000,
                    value: 5.0,
                },
                Observation {
                    country_code: "TST".into(),
                    country_name: "Testland".into(),
                    indicator_name: "Population, total".into(),
                    year: 2001,
                    value: 7.0,
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn text_cells_should_parse_as_numbers() -> anyhow::Result<()> {
        let df = df!(
            COL::COUNTRY_NAME => &["Testland"],
            COL::COUNTRY_CODE => &["TST"],
            COL::INDICATOR_NAME => &["Population, total"],
            COL::INDICATOR_CODE => &["SP.POP.TOTL"],
            "2000" => &[Some("5.5")],
            "2001" => &[None::<&str>]
        )?;
        let observations = wide_to_long(&df)?;
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].value, 5.5);

        let df = df!(
            COL::COUNTRY_NAME => &["Testland"],
            COL::COUNTRY_CODE => &["TST"],
            COL::INDICATOR_NAME => &["Population, total"],
            COL::INDICATOR_CODE => &["SP.POP.TOTL"],
            "2000" => &["lots"]
        )?;
        assert!(matches!(
            wide_to_long(&df),
            Err(PovStatsError::MalformedInput(_))
        ));
        Ok(())
    }

    #[test]
    fn non_year_header_should_be_malformed() {
        let df = df!(
            COL::COUNTRY_NAME => &["Testland"],
            COL::COUNTRY_CODE => &["TST"],
            COL::INDICATOR_NAME => &["Population, total"],
            COL::INDICATOR_CODE => &["SP.POP.TOTL"],
            "twenty" => &[1.0],
            "2001" => &[2.0]
        )
        .unwrap();
        assert!(matches!(
            wide_to_long(&df),
            Err(PovStatsError::MalformedInput(_))
        ));
    }

    #[test]
    fn trailing_column_with_values_should_be_malformed() {
        let df = df!(
            COL::COUNTRY_NAME => &["Testland"],
            COL::COUNTRY_CODE => &["TST"],
            COL::INDICATOR_NAME => &["Population, total"],
            COL::INDICATOR_CODE => &["SP.POP.TOTL"],
            "2000" => &[1.0],
            "notes" => &[2.0]
        )
        .unwrap();
        assert!(matches!(
            wide_to_long(&df),
            Err(PovStatsError::MalformedInput(_))
        ));
    }

    #[test]
    fn missing_identifier_column_should_be_malformed() {
        let df = df!(
            COL::COUNTRY_NAME => &["Testland"],
            COL::INDICATOR_NAME => &["Population, total"],
            COL::INDICATOR_CODE => &["SP.POP.TOTL"],
            "2000" => &[1.0]
        )
        .unwrap();
        assert!(matches!(
            wide_to_long(&df),
            Err(PovStatsError::MalformedInput(_))
        ));
    }

    #[test]
    fn observations_should_render_long_frame() -> anyhow::Result<()> {
        let observations = wide_to_long(&test_df())?;
        let df = observations_to_df(&observations)?;
        assert_eq!(df.shape(), (5, 5));
        assert_eq!(observation_years(&observations), vec![2000, 2001]);
        Ok(())
    }
}
