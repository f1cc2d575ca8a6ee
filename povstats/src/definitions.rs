//! Indicator definitions from the series table and their markdown rendering.

use std::collections::HashMap;

use log::{debug, info, warn};
use polars::df;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::COL;

pub const NO_INFORMATION: &str = "There is currently no information available on this indicator";
const DEFAULT_UNIT: &str = "count";
const NOT_AVAILABLE: &str = "N/A";

/// Metadata describing one indicator. Blank fields are `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    pub indicator_name: String,
    pub long_definition: Option<String>,
    pub unit_of_measure: Option<String>,
    pub periodicity: Option<String>,
    pub source: Option<String>,
    pub limitations: Option<String>,
}

impl IndicatorDefinition {
    /// Markdown description of the indicator
    pub fn to_markdown(&self) -> String {
        let limitations = self
            .limitations
            .as_deref()
            .map(|text| text.replace("\n\n", " "))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        format!(
            "## {}\n\n{}\n\n**Unit of measure** {}\n\n**Periodicity** {}\n\n**Source** {}\n\n### Limitations and exceptions:\n\n{}\n",
            self.indicator_name,
            self.long_definition.as_deref().unwrap_or_default(),
            self.unit_of_measure.as_deref().unwrap_or(DEFAULT_UNIT),
            self.periodicity.as_deref().unwrap_or(NOT_AVAILABLE),
            self.source.as_deref().unwrap_or_default(),
            limitations
        )
    }
}

/// Indicator definitions keyed by indicator name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndicatorDefinitions {
    definitions: HashMap<String, IndicatorDefinition>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl IndicatorDefinitions {
    /// Build the lookup from the series table. The first row wins for a repeated name.
    pub fn from_df(series: &DataFrame) -> Result<Self> {
        let names = series.column(COL::SERIES_INDICATOR_NAME)?.str()?;
        let long_definitions = series.column(COL::SERIES_LONG_DEFINITION)?.str()?;
        let units = series.column(COL::SERIES_UNIT_OF_MEASURE)?.str()?;
        let periodicities = series.column(COL::SERIES_PERIODICITY)?.str()?;
        let sources = series.column(COL::SERIES_SOURCE)?.str()?;
        let limitations = series.column(COL::SERIES_LIMITATIONS)?.str()?;

        let mut definitions = HashMap::new();
        for idx in 0..series.height() {
            let Some(name) = non_blank(names.get(idx)) else {
                debug!("Skipping series row {idx} without an indicator name");
                continue;
            };
            if definitions.contains_key(&name) {
                debug!("Ignoring repeated definition of '{name}'");
                continue;
            }
            definitions.insert(
                name.clone(),
                IndicatorDefinition {
                    indicator_name: name,
                    long_definition: non_blank(long_definitions.get(idx)),
                    unit_of_measure: non_blank(units.get(idx)),
                    periodicity: non_blank(periodicities.get(idx)),
                    source: non_blank(sources.get(idx)),
                    limitations: non_blank(limitations.get(idx)),
                },
            );
        }
        let definitions = Self { definitions };
        if definitions.is_empty() {
            warn!("The series table holds no indicator definitions");
        } else {
            info!("Loaded {} indicator definitions", definitions.len());
        }
        Ok(definitions)
    }

    /// The definition of an indicator as a single row frame with the series table columns. An
    /// unknown indicator gives a frame without rows.
    pub fn to_df(&self, indicator_name: &str) -> Result<DataFrame> {
        let definition = self.lookup(indicator_name);
        Ok(df!(
            COL::SERIES_INDICATOR_NAME => definition.map(|d| Some(d.indicator_name.as_str())).into_iter().collect::<Vec<_>>(),
            COL::SERIES_LONG_DEFINITION => definition.map(|d| d.long_definition.as_deref()).into_iter().collect::<Vec<_>>(),
            COL::SERIES_UNIT_OF_MEASURE => definition.map(|d| d.unit_of_measure.as_deref()).into_iter().collect::<Vec<_>>(),
            COL::SERIES_PERIODICITY => definition.map(|d| d.periodicity.as_deref()).into_iter().collect::<Vec<_>>(),
            COL::SERIES_SOURCE => definition.map(|d| d.source.as_deref()).into_iter().collect::<Vec<_>>(),
            COL::SERIES_LIMITATIONS => definition.map(|d| d.limitations.as_deref()).into_iter().collect::<Vec<_>>()
        )?)
    }

    pub fn lookup(&self, indicator_name: &str) -> Option<&IndicatorDefinition> {
        self.definitions.get(indicator_name)
    }

    /// Markdown description of an indicator, or the no-information message
    pub fn describe(&self, indicator_name: &str) -> String {
        self.lookup(indicator_name)
            .map(IndicatorDefinition::to_markdown)
            .unwrap_or_else(|| NO_INFORMATION.to_string())
    }

    /// Names of all defined indicators, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
