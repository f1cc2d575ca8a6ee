//! Stateless handlers that filter the built tables by a user selection. An empty selection is
//! never an error: handlers return `Ok(None)` and the caller shows its idle state.

use itertools::Itertools;
use log::debug;
use nonempty::NonEmpty;
use polars::lazy::dsl::{col, lit, Expr};
use polars::prelude::*;

use crate::error::{PovStatsError, Result};
use crate::normalize::{self, observations_to_df};
use crate::value::{rows, Row};
use crate::views::PovertyThreshold;
use crate::{PovStats, COL};

/// Columns of the secondary table that identify a row rather than hold an indicator
const POVERTY_ID_COLUMNS: [&str; 4] = [
    COL::POVERTY_COUNTRY_NAME,
    COL::POVERTY_COUNTRY_CODE,
    COL::POVERTY_YEAR,
    COL::POVERTY_IS_COUNTRY,
];

fn non_blank(selection: Option<&str>) -> Option<&str> {
    selection.map(str::trim).filter(|s| !s.is_empty())
}

fn selected_countries(countries: &[String]) -> Option<NonEmpty<String>> {
    NonEmpty::from_slice(
        &countries
            .iter()
            .filter(|c| !c.trim().is_empty())
            .cloned()
            .collect_vec(),
    )
}

fn country_name_in(column: &str, countries: &NonEmpty<String>) -> Expr {
    let names = Series::new("countries", countries.iter().cloned().collect_vec());
    col(column).is_in(lit(names))
}

fn poverty_year() -> Expr {
    col(COL::POVERTY_YEAR).cast(DataType::Int32)
}

fn text_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    Ok(df
        .column(column)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}

fn year_values(df: &DataFrame, column: &str) -> Result<Vec<i32>> {
    let years = df.column(column)?.cast(&DataType::Int32)?;
    let years = years.i32()?.into_iter().flatten().collect();
    Ok(years)
}

/// Check `indicator` is a column of the secondary table
fn poverty_indicator<'a>(stats: &PovStats, indicator: &'a str) -> Result<&'a str> {
    if indicator_names(stats).iter().any(|name| *name == indicator) {
        Ok(indicator)
    } else {
        Err(PovStatsError::MalformedInput(format!(
            "'{indicator}' is not an indicator of the poverty table"
        )))
    }
}

/// Gini index of every country in `year`, lowest first
pub fn gini_for_year(stats: &PovStats, year: Option<i32>) -> Result<Option<DataFrame>> {
    let Some(year) = year else {
        return Ok(None);
    };
    debug!("Gini for year {year}");
    let df = stats
        .gini
        .clone()
        .lazy()
        .filter(col(COL::YEAR).eq(lit(year)))
        .select([col(COL::COUNTRY_NAME), col(COL::YEAR), col(COL::GINI_INDEX)])
        .collect()?
        .sort([COL::GINI_INDEX], SortMultipleOptions::default())?;
    Ok(Some(df))
}

/// Gini index over time for the named countries
pub fn gini_for_countries(stats: &PovStats, countries: &[String]) -> Result<Option<DataFrame>> {
    let Some(countries) = selected_countries(countries) else {
        return Ok(None);
    };
    debug!("Gini for countries {countries:?}");
    let df = stats
        .gini
        .clone()
        .lazy()
        .filter(country_name_in(COL::COUNTRY_NAME, &countries))
        .select([col(COL::COUNTRY_NAME), col(COL::YEAR), col(COL::GINI_INDEX)])
        .collect()?
        .sort([COL::COUNTRY_NAME, COL::YEAR], SortMultipleOptions::default())?;
    Ok(Some(df))
}

/// Income share quintiles of a country by year
pub fn income_share_for_country(
    stats: &PovStats,
    country: Option<&str>,
) -> Result<Option<DataFrame>> {
    let Some(country) = non_blank(country) else {
        return Ok(None);
    };
    debug!("Income share for {country}");
    let df = stats
        .income_share
        .clone()
        .lazy()
        .filter(col(COL::COUNTRY_NAME).eq(lit(country)))
        .collect()?
        .sort([COL::YEAR], SortMultipleOptions::default())?;
    Ok(Some(df))
}

/// Poverty gap of every country in `year` at `threshold`, smallest first, with the population
/// when the indicator table has one. A year without any data gives `None`.
pub fn poverty_gap_for_year(
    stats: &PovStats,
    year: Option<i32>,
    threshold: PovertyThreshold,
) -> Result<Option<DataFrame>> {
    let Some(year) = year else {
        return Ok(None);
    };
    let column = threshold.column();
    debug!("Poverty gap for year {year} at {threshold}");
    let mut selection = vec![col(COL::COUNTRY_NAME), col(COL::YEAR), col(column)];
    if stats.poverty_gap.column(COL::POPULATION_TOTAL).is_ok() {
        selection.push(col(COL::POPULATION_TOTAL));
    }
    let df = stats
        .poverty_gap
        .clone()
        .lazy()
        .filter(col(COL::YEAR).eq(lit(year)))
        .select(selection)
        .collect()?
        .sort([column], SortMultipleOptions::default())?;
    if df.height() == 0 {
        debug!("No poverty gap data for year {year}");
        return Ok(None);
    }
    Ok(Some(df))
}

/// Values of `indicator` for every country in the selected years
pub fn indicator_histogram(
    stats: &PovStats,
    indicator: Option<&str>,
    years: &[i32],
) -> Result<Option<DataFrame>> {
    let (Some(indicator), Some(years)) = (non_blank(indicator), NonEmpty::from_slice(years)) else {
        return Ok(None);
    };
    let indicator = poverty_indicator(stats, indicator)?;
    debug!("Histogram of '{indicator}' over {years:?}");
    let years = Series::new("years", years.into_iter().collect_vec());
    let df = stats
        .poverty
        .clone()
        .lazy()
        .filter(
            poverty_year()
                .is_in(lit(years))
                .and(col(COL::POVERTY_IS_COUNTRY).eq(lit(true))),
        )
        .select([
            col(COL::POVERTY_COUNTRY_NAME),
            col(COL::POVERTY_YEAR),
            col(indicator),
        ])
        .collect()?
        .sort(
            [COL::POVERTY_COUNTRY_NAME, COL::POVERTY_YEAR],
            SortMultipleOptions::default(),
        )?;
    Ok(Some(df))
}

/// Values of `indicator` over time for the selected countries
pub fn country_series(
    stats: &PovStats,
    countries: &[String],
    indicator: Option<&str>,
) -> Result<Option<DataFrame>> {
    let (Some(countries), Some(indicator)) = (selected_countries(countries), non_blank(indicator))
    else {
        return Ok(None);
    };
    let indicator = poverty_indicator(stats, indicator)?;
    debug!("Series of '{indicator}' for {countries:?}");
    let df = stats
        .poverty
        .clone()
        .lazy()
        .filter(
            col(COL::POVERTY_IS_COUNTRY)
                .eq(lit(true))
                .and(country_name_in(COL::POVERTY_COUNTRY_NAME, &countries)),
        )
        .select([
            col(COL::POVERTY_COUNTRY_NAME),
            col(COL::POVERTY_YEAR),
            col(indicator),
        ])
        .collect()?
        .sort(
            [COL::POVERTY_COUNTRY_NAME, COL::POVERTY_YEAR],
            SortMultipleOptions::default(),
        )?;
    Ok(Some(df))
}

/// Long-form observations of the named countries, of a single indicator when one is given
pub fn country_observations(
    stats: &PovStats,
    countries: &[String],
    indicator: Option<&str>,
) -> Result<Option<DataFrame>> {
    let Some(countries) = selected_countries(countries) else {
        return Ok(None);
    };
    let indicator = non_blank(indicator);
    debug!("Observations of {countries:?} for {indicator:?}");
    let selected = stats
        .observations
        .iter()
        .filter(|o| countries.iter().any(|name| *name == o.country_name))
        .filter(|o| indicator.map_or(true, |name| name == o.indicator_name))
        .cloned()
        .collect_vec();
    Ok(Some(observations_to_df(&selected)?))
}

/// The enriched country table row whose short name is `short_name`
pub fn country_profile(stats: &PovStats, short_name: Option<&str>) -> Result<Option<Row>> {
    let Some(short_name) = non_blank(short_name) else {
        return Ok(None);
    };
    let df = stats
        .countries
        .clone()
        .lazy()
        .filter(col(COL::COUNTRY_SHORT_NAME).eq(lit(short_name)))
        .collect()?;
    if df.height() != 1 {
        debug!("{} country rows named '{short_name}'", df.height());
        return Ok(None);
    }
    Ok(rows(&df)?.into_iter().next())
}

/// Years with a Gini value, ascending
pub fn gini_years(stats: &PovStats) -> Result<Vec<i32>> {
    Ok(year_values(&stats.gini, COL::YEAR)?
        .into_iter()
        .sorted()
        .dedup()
        .collect())
}

/// Countries with a Gini value, in table order
pub fn gini_countries(stats: &PovStats) -> Result<Vec<String>> {
    Ok(text_values(&stats.gini, COL::COUNTRY_NAME)?
        .into_iter()
        .unique()
        .collect())
}

/// Countries with a complete set of income share quintiles, in table order
pub fn income_share_countries(stats: &PovStats) -> Result<Vec<String>> {
    Ok(text_values(&stats.income_share, COL::COUNTRY_NAME)?
        .into_iter()
        .unique()
        .collect())
}

/// Years with a complete set of poverty gaps, ascending
pub fn poverty_gap_years(stats: &PovStats) -> Result<Vec<i32>> {
    Ok(year_values(&stats.poverty_gap, COL::YEAR)?
        .into_iter()
        .sorted()
        .dedup()
        .collect())
}

/// Names of the actual countries in the secondary table, sorted
pub fn country_names(stats: &PovStats) -> Result<Vec<String>> {
    let countries = stats
        .poverty
        .clone()
        .lazy()
        .filter(col(COL::POVERTY_IS_COUNTRY).eq(lit(true)))
        .collect()?;
    Ok(text_values(&countries, COL::POVERTY_COUNTRY_NAME)?
        .into_iter()
        .sorted()
        .dedup()
        .collect())
}

/// Numeric indicator columns of the secondary table, in table order
pub fn indicator_names(stats: &PovStats) -> Vec<&str> {
    stats
        .poverty
        .get_columns()
        .iter()
        .filter(|series| series.dtype().is_numeric())
        .map(|series| series.name())
        .filter(|name| !POVERTY_ID_COLUMNS.contains(name))
        .collect()
}

/// Years of the indicator table that hold at least one value, ascending
pub fn observation_years(stats: &PovStats) -> Vec<i32> {
    normalize::observation_years(&stats.observations)
}

/// Names of every country and aggregate with an observation, sorted
pub fn observation_countries(stats: &PovStats) -> Vec<String> {
    stats
        .observations
        .iter()
        .map(|o| o.country_name.clone())
        .sorted()
        .dedup()
        .collect()
}
