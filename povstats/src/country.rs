//! Country metadata enrichment: separating actual countries from aggregate regions and deriving
//! a flag glyph from the 2-letter country code.

use std::collections::HashSet;

use log::{debug, info};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PovStatsError, Result};
use crate::COL;

/// First regional indicator symbol, "REGIONAL INDICATOR SYMBOL LETTER A"
const REGIONAL_INDICATOR_A: u32 = 0x1F1E6;

/// A row of the enriched country metadata table. Blank text fields are `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub country_code: String,
    pub short_name: String,
    pub region: Option<String>,
    pub income_group: Option<String>,
    pub alpha2_code: Option<String>,
    pub is_country: bool,
    pub flag_glyph: String,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Aggregates ("World", "Sub-Saharan Africa", ...) have no region
pub fn is_country(region: Option<&str>) -> bool {
    non_blank(region).is_some()
}

/// Lowercased 2-letter codes of every row that is an actual country
pub fn known_country_codes<'a, I>(rows: I) -> HashSet<String>
where
    I: IntoIterator<Item = (Option<&'a str>, bool)>,
{
    rows.into_iter()
        .filter(|(_, is_country)| *is_country)
        .filter_map(|(code, _)| non_blank(code))
        .map(|code| code.trim().to_lowercase())
        .collect()
}

fn regional_indicator(letter: char) -> Option<char> {
    if !letter.is_ascii_alphabetic() {
        return None;
    }
    let offset = u32::from(letter.to_ascii_uppercase()) - u32::from('A');
    char::from_u32(REGIONAL_INDICATOR_A + offset)
}

/// Flag glyph for a 2-letter code, or an empty string when the code is blank or not a known
/// country code. Matching against `known` is case-insensitive.
pub fn flag_glyph(code: Option<&str>, known: &HashSet<String>) -> String {
    let Some(code) = non_blank(code) else {
        return String::new();
    };
    if !known.contains(&code.to_lowercase()) {
        return String::new();
    }
    let mut letters = code.chars();
    match (
        letters.next().and_then(regional_indicator),
        letters.next().and_then(regional_indicator),
    ) {
        (Some(a), Some(b)) => [a, b].iter().collect(),
        _ => String::new(),
    }
}

/// Add the `is_country` and `flag` columns to the raw country table
pub fn enrich_countries(countries: &DataFrame) -> Result<DataFrame> {
    let codes = countries.column(COL::COUNTRY_CODE)?.str()?;
    let mut seen: HashSet<&str> = HashSet::new();
    for code in codes.into_iter().flatten() {
        if !seen.insert(code) {
            return Err(PovStatsError::duplicate_key("country metadata", code));
        }
    }

    let regions = countries.column(COL::COUNTRY_REGION)?.str()?;
    let is_country_flags: Vec<bool> = regions.into_iter().map(is_country).collect();

    let alpha2_codes: Vec<Option<&str>> = countries
        .column(COL::COUNTRY_ALPHA2_CODE)?
        .str()?
        .into_iter()
        .collect();
    let known = known_country_codes(
        alpha2_codes
            .iter()
            .copied()
            .zip(is_country_flags.iter().copied()),
    );
    debug!("Known country codes: {}", known.len());
    let flags: Vec<String> = alpha2_codes
        .iter()
        .map(|code| flag_glyph(*code, &known))
        .collect();

    let mut enriched = countries.clone();
    enriched.with_column(Series::new(COL::COUNTRY_IS_COUNTRY, is_country_flags))?;
    enriched.with_column(Series::new(COL::COUNTRY_FLAG, flags))?;
    info!(
        "Enriched {} country rows ({} countries)",
        enriched.height(),
        known.len()
    );
    Ok(enriched)
}

/// Typed records of an enriched country table
pub fn country_records(enriched: &DataFrame) -> Result<Vec<CountryRecord>> {
    let text = |name: &str| -> Result<Vec<Option<String>>> {
        Ok(enriched
            .column(name)?
            .str()?
            .into_iter()
            .map(|v| non_blank(v).map(str::to_string))
            .collect())
    };
    let codes = text(COL::COUNTRY_CODE)?;
    let short_names = text(COL::COUNTRY_SHORT_NAME)?;
    let regions = text(COL::COUNTRY_REGION)?;
    let income_groups = text(COL::COUNTRY_INCOME_GROUP)?;
    let alpha2_codes = text(COL::COUNTRY_ALPHA2_CODE)?;
    let is_country_flags = enriched.column(COL::COUNTRY_IS_COUNTRY)?.bool()?;
    let flags = enriched.column(COL::COUNTRY_FLAG)?.str()?;

    Ok(codes
        .into_iter()
        .zip(short_names)
        .zip(regions)
        .zip(income_groups)
        .zip(alpha2_codes)
        .zip(is_country_flags.into_iter().zip(flags))
        .map(
            |(((((code, short_name), region), income_group), alpha2_code), (is_country, flag))| {
                CountryRecord {
                    country_code: code.unwrap_or_default(),
                    short_name: short_name.unwrap_or_default(),
                    region,
                    income_group,
                    alpha2_code,
                    is_country: is_country.unwrap_or(false),
                    flag_glyph: flag.unwrap_or_default().to_string(),
                }
            },
        )
        .collect())
}
