use log::debug;
use polars::frame::DataFrame;

use crate::config::Config;
use crate::country::CountryRecord;
use crate::definitions::{IndicatorDefinition, IndicatorDefinitions};
use crate::error::Result;
use crate::loader::RawTables;
use crate::normalize::Observation;
use crate::pivot::{IndicatorPivot, WideIndicatorRow};
use crate::value::Row;

// Re-exports
pub use column_names as COL;

// Modules
pub mod column_names;
pub mod config;
pub mod country;
pub mod definitions;
pub mod error;
#[cfg(feature = "formatters")]
pub mod formatters;
pub mod join;
pub mod loader;
pub mod normalize;
pub mod pivot;
pub mod queries;
pub mod value;
pub mod views;

/// Every table built from the input files. Built once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PovStats {
    pub config: Config,
    /// Country table with the `is_country` and `flag` columns
    pub countries: DataFrame,
    pub country_records: Vec<CountryRecord>,
    pub definitions: IndicatorDefinitions,
    pub observations: Vec<Observation>,
    pub pivot: IndicatorPivot,
    /// Indicator pivot left joined with the enriched country table
    pub joined: DataFrame,
    pub income_share: DataFrame,
    pub gini: DataFrame,
    pub poverty_gap: DataFrame,
    /// Secondary per-(country, year) table
    pub poverty: DataFrame,
}

impl PovStats {
    /// Build the tables from the files of the default configuration
    pub fn new() -> Result<Self> {
        Self::new_with_config(&Config::default())
    }

    /// Build the tables from the files named by `config`
    pub fn new_with_config(config: &Config) -> Result<Self> {
        debug!("config: {config:?}");
        let tables = loader::load_all(config)?;
        Self::from_tables(tables, config.clone())
    }

    /// Run the pipeline over already loaded tables
    pub fn from_tables(tables: RawTables, config: Config) -> Result<Self> {
        let countries = country::enrich_countries(&tables.countries)?;
        let country_records = country::country_records(&countries)?;
        let definitions = IndicatorDefinitions::from_df(&tables.series)?;
        let observations = normalize::wide_to_long(&tables.indicators)?;
        let pivot = pivot::pivot_indicators(&observations)?;
        let joined = join::join_countries(&pivot.to_df()?, &countries)?;
        let income_share = views::income_share_view(&joined)?;
        let gini = views::gini_view(&joined)?;
        let poverty_gap = views::poverty_gap_view(&joined)?;
        Ok(Self {
            config,
            countries,
            country_records,
            definitions,
            observations,
            pivot,
            joined,
            income_share,
            gini,
            poverty_gap,
            poverty: tables.poverty,
        })
    }

    pub fn enriched_countries(&self) -> &[CountryRecord] {
        &self.country_records
    }

    /// The joined indicator table
    pub fn wide_indicators(&self) -> &DataFrame {
        &self.joined
    }

    pub fn wide_indicator_rows(&self) -> Result<Vec<Row>> {
        value::rows(&self.joined)
    }

    pub fn pivot_rows(&self) -> &[WideIndicatorRow] {
        &self.pivot.rows
    }

    pub fn income_share_view(&self) -> &DataFrame {
        &self.income_share
    }

    pub fn income_share_rows(&self) -> Result<Vec<Row>> {
        value::rows(&self.income_share)
    }

    pub fn gini_view(&self) -> &DataFrame {
        &self.gini
    }

    pub fn gini_rows(&self) -> Result<Vec<Row>> {
        value::rows(&self.gini)
    }

    pub fn poverty_gap_view(&self) -> &DataFrame {
        &self.poverty_gap
    }

    pub fn poverty_gap_rows(&self) -> Result<Vec<Row>> {
        value::rows(&self.poverty_gap)
    }

    pub fn lookup_indicator_definition(&self, indicator_name: &str) -> Option<&IndicatorDefinition> {
        self.definitions.lookup(indicator_name)
    }

    /// Markdown description of an indicator
    pub fn describe_indicator(&self, indicator_name: &str) -> String {
        self.definitions.describe(indicator_name)
    }
}
