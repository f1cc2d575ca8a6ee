//! Long-to-wide pivot of observations: one row per (country, year) with one value per indicator.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::info;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PovStatsError, Result};
use crate::normalize::Observation;
use crate::COL;

const PIVOT_TABLE: &str = "indicator pivot";

/// All indicator values of a country in a year. An indicator without a key is absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WideIndicatorRow {
    pub country_code: String,
    pub country_name: String,
    pub year: i32,
    pub values: BTreeMap<String, f64>,
}

impl WideIndicatorRow {
    pub fn value(&self, indicator: &str) -> Option<f64> {
        self.values.get(indicator).copied()
    }
}

/// The pivoted indicator table. `indicators` is sorted, `rows` are ordered by country name,
/// country code and year.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct IndicatorPivot {
    pub indicators: Vec<String>,
    pub rows: Vec<WideIndicatorRow>,
}

impl IndicatorPivot {
    /// `Country Name`, `Country Code`, `Year`, then one Float64 column per indicator
    pub fn to_df(&self) -> Result<DataFrame> {
        let mut columns = vec![
            Series::new(
                COL::COUNTRY_NAME,
                self.rows
                    .iter()
                    .map(|row| row.country_name.as_str())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                COL::COUNTRY_CODE,
                self.rows
                    .iter()
                    .map(|row| row.country_code.as_str())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                COL::YEAR,
                self.rows.iter().map(|row| row.year).collect::<Vec<i32>>(),
            ),
        ];
        columns.extend(self.indicators.iter().map(|indicator| {
            Series::new(
                indicator,
                self.rows
                    .iter()
                    .map(|row| row.value(indicator))
                    .collect::<Vec<Option<f64>>>(),
            )
        }));
        Ok(DataFrame::new(columns)?)
    }
}

/// Pivot observations into one row per (country code, year). Two observations for the same
/// (country code, indicator, year) are an integrity violation and never resolved by picking one.
pub fn pivot_indicators(observations: &[Observation]) -> Result<IndicatorPivot> {
    let mut index: HashMap<(&str, i32), usize> = HashMap::new();
    let mut rows: Vec<WideIndicatorRow> = vec![];
    let mut indicators: BTreeSet<&str> = BTreeSet::new();

    for observation in observations {
        let idx = *index
            .entry((observation.country_code.as_str(), observation.year))
            .or_insert_with(|| {
                rows.push(WideIndicatorRow {
                    country_code: observation.country_code.clone(),
                    country_name: observation.country_name.clone(),
                    year: observation.year,
                    values: BTreeMap::new(),
                });
                rows.len() - 1
            });
        let row = &mut rows[idx];
        if row.country_name != observation.country_name {
            return Err(PovStatsError::duplicate_key(
                PIVOT_TABLE,
                format!(
                    "({}, {}) is named both '{}' and '{}'",
                    row.country_code, row.year, row.country_name, observation.country_name
                ),
            ));
        }
        if row
            .values
            .insert(observation.indicator_name.clone(), observation.value)
            .is_some()
        {
            return Err(PovStatsError::duplicate_key(
                PIVOT_TABLE,
                format!(
                    "({}, {}, {})",
                    observation.country_code, observation.indicator_name, observation.year
                ),
            ));
        }
        indicators.insert(observation.indicator_name.as_str());
    }

    rows.sort_by(|a, b| {
        a.country_name
            .cmp(&b.country_name)
            .then_with(|| a.country_code.cmp(&b.country_code))
            .then_with(|| a.year.cmp(&b.year))
    });
    info!(
        "Pivoted {} observations into {} rows of {} indicators",
        observations.len(),
        rows.len(),
        indicators.len()
    );
    Ok(IndicatorPivot {
        indicators: indicators.into_iter().map(str::to_string).collect(),
        rows,
    })
}
