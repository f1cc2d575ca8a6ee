//! Purpose-built projections of the joined indicator table. Each view is recomputable from the
//! joined table alone and owns no data of its own.

use itertools::Itertools;
use log::info;
use nonempty::NonEmpty;
use polars::lazy::dsl::{col, lit, Expr};
use polars::prelude::{DataFrame, IntoLazy};
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::{PovStatsError, Result};
use crate::COL;

const INCOME_SHARE_PATTERN: &str = r"Income share.*?20";
const INCOME_SHARE_PREFIX: &str = "Income share held by ";
const ORDERING_PREFIX_PATTERN: &str = r"^\d+ ";

/// Quintile columns and their labels, prefixed with their order from lowest to highest
const QUINTILE_LABELS: [(&str, &str); 5] = [
    ("Income share held by lowest 20%", "1 first 20% (lowest)"),
    ("Income share held by second 20%", "2 second 20%"),
    ("Income share held by third 20%", "3 third 20%"),
    ("Income share held by fourth 20%", "4 fourth 20%"),
    ("Income share held by highest 20%", "5 fifth 20% (highest)"),
];

/// Daily income thresholds with a poverty gap column
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, Display,
)]
pub enum PovertyThreshold {
    #[default]
    #[strum(serialize = "1.90", serialize = "1.9", to_string = "$1.90")]
    Usd190,
    #[strum(serialize = "3.20", serialize = "3.2", to_string = "$3.20")]
    Usd320,
    #[strum(serialize = "5.50", serialize = "5.5", to_string = "$5.50")]
    Usd550,
}

impl PovertyThreshold {
    pub fn column(&self) -> &'static str {
        match self {
            PovertyThreshold::Usd190 => COL::POVERTY_GAP_190,
            PovertyThreshold::Usd320 => COL::POVERTY_GAP_320,
            PovertyThreshold::Usd550 => COL::POVERTY_GAP_550,
        }
    }
}

/// Same as Python's `str.title`: the first letter of every run of letters is uppercased, the
/// rest lowercased.
pub fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            titled.push(c);
            in_word = false;
        }
    }
    titled
}

fn income_share_label(column: &str, ordering_prefix: &Regex) -> String {
    let ordered = QUINTILE_LABELS
        .iter()
        .find(|(raw, _)| *raw == column)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| {
            column
                .strip_prefix(INCOME_SHARE_PREFIX)
                .unwrap_or(column)
                .to_string()
        });
    title_case(&ordering_prefix.replace(&ordered, ""))
}

/// Combine multiple queries with AND.
fn combine_exprs_with_and1(exprs: NonEmpty<Expr>) -> Expr {
    let mut query: Expr = exprs.head;
    for expr in exprs.tail.into_iter() {
        query = query.and(expr);
    }
    query
}

fn require_columns(df: &DataFrame, columns: &[&str], view: &str) -> Result<()> {
    let names = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect_vec();
    match columns.iter().find(|c| !names.iter().any(|name| name == *c)) {
        Some(missing) => Err(PovStatsError::MalformedInput(format!(
            "the {view} view needs a '{missing}' column"
        ))),
        None => Ok(()),
    }
}

/// Income share by quintile: country name, year and the five quintile shares, for rows where all
/// of them are present. Value columns are relabelled and sorted alphabetically by label.
pub fn income_share_view(joined: &DataFrame) -> Result<DataFrame> {
    let quintile_columns = QUINTILE_LABELS.map(|(column, _)| column);
    require_columns(joined, &quintile_columns, "income share")?;
    // Unwrap: constant patterns are valid regexes
    let share_pattern = Regex::new(INCOME_SHARE_PATTERN).unwrap();
    let ordering_prefix = Regex::new(ORDERING_PREFIX_PATTERN).unwrap();

    let share_columns = joined
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .filter(|name| share_pattern.is_match(name))
        .collect_vec();
    let selection = [COL::COUNTRY_NAME.to_string(), COL::YEAR.to_string()]
        .into_iter()
        .chain(share_columns.iter().cloned())
        .collect_vec();
    let mut view = joined.select(selection)?.drop_nulls::<String>(None)?;

    let mut labels = vec![];
    for column in &share_columns {
        let label = income_share_label(column, &ordering_prefix);
        view.rename(column, &label)?;
        labels.push(label);
    }
    labels.sort();
    let ordered = [COL::COUNTRY_NAME.to_string(), COL::YEAR.to_string()]
        .into_iter()
        .chain(labels)
        .collect_vec();
    let view = view.select(ordered)?;
    info!("Built income share view with shape: {:?}", view.shape());
    Ok(view)
}

/// Joined rows with a Gini index value
pub fn gini_view(joined: &DataFrame) -> Result<DataFrame> {
    require_columns(joined, &[COL::GINI_INDEX], "Gini")?;
    let view = joined
        .clone()
        .lazy()
        .filter(col(COL::GINI_INDEX).is_not_null())
        .collect()?;
    info!("Built Gini view with shape: {:?}", view.shape());
    Ok(view)
}

/// Joined rows of actual countries with a value at every poverty gap threshold
pub fn poverty_gap_view(joined: &DataFrame) -> Result<DataFrame> {
    let gap_columns = PovertyThreshold::iter()
        .map(|threshold| threshold.column())
        .collect_vec();
    require_columns(joined, &[COL::COUNTRY_IS_COUNTRY], "poverty gap")?;
    require_columns(joined, &gap_columns, "poverty gap")?;

    let predicate = combine_exprs_with_and1(NonEmpty {
        head: col(COL::COUNTRY_IS_COUNTRY).eq(lit(true)),
        tail: gap_columns
            .iter()
            .map(|column| col(column).is_not_null())
            .collect(),
    });
    let view = joined.clone().lazy().filter(predicate).collect()?;
    info!("Built poverty gap view with shape: {:?}", view.shape());
    Ok(view)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use polars::df;

    use super::*;

    fn income_share_df() -> DataFrame {
        df!(
            COL::COUNTRY_NAME => &["X", "X", "Y"],
            COL::YEAR => &[2010i32, 2011, 2010],
            "Income share held by highest 20%" => &[Some(47.0), Some(46.0), Some(50.0)],
            "Income share held by lowest 20%" => &[Some(6.0), None, Some(5.0)],
            "Income share held by second 20%" => &[Some(10.0), Some(10.5), Some(9.0)],
            "Income share held by third 20%" => &[Some(15.0), Some(15.5), Some(14.0)],
            "Income share held by fourth 20%" => &[Some(22.0), Some(22.5), Some(22.0)],
            "Income share held by highest 10%" => &[Some(31.0), Some(30.0), None],
            COL::POPULATION_TOTAL => &[Some(1.0), Some(2.0), None]
        )
        .unwrap()
    }

    #[test]
    fn title_case_should_match_python() {
        assert_eq!(title_case("first 20% (lowest)"), "First 20% (Lowest)");
        assert_eq!(title_case("HIGHEST 20%"), "Highest 20%");
        assert_eq!(title_case("3rd place"), "3Rd Place");
    }

    #[test]
    fn income_share_view_should_relabel_quintiles() -> anyhow::Result<()> {
        let view = income_share_view(&income_share_df())?;
        assert_eq!(
            view.get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect_vec(),
            vec![
                COL::COUNTRY_NAME,
                COL::YEAR,
                "Fifth 20% (Highest)",
                "First 20% (Lowest)",
                "Fourth 20%",
                "Second 20%",
                "Third 20%",
            ]
        );
        assert_eq!(view.height(), 2, "Rows with a missing share are dropped");
        let years: Vec<Option<i32>> = view.column(COL::YEAR)?.i32()?.into_iter().collect();
        assert_eq!(years, vec![Some(2010), Some(2010)]);
        let lowest: Vec<Option<f64>> = view
            .column("First 20% (Lowest)")?
            .f64()?
            .into_iter()
            .collect();
        assert_eq!(lowest, vec![Some(6.0), Some(5.0)]);
        Ok(())
    }

    #[test]
    fn income_share_view_should_need_every_quintile() {
        let df = income_share_df()
            .drop("Income share held by third 20%")
            .unwrap();
        assert!(matches!(
            income_share_view(&df),
            Err(PovStatsError::MalformedInput(_))
        ));
    }

    fn joined_df() -> DataFrame {
        df!(
            COL::COUNTRY_NAME => &["A", "B", "C", "World"],
            COL::YEAR => &[2010i32, 2010, 2010, 2010],
            COL::GINI_INDEX => &[Some(30.0), None, Some(40.0), None],
            COL::POVERTY_GAP_190 => &[Some(1.0), Some(1.0), Some(2.0), Some(9.0)],
            COL::POVERTY_GAP_320 => &[Some(3.0), None, Some(4.0), Some(19.0)],
            COL::POVERTY_GAP_550 => &[Some(5.0), Some(5.0), Some(6.0), Some(29.0)],
            COL::COUNTRY_IS_COUNTRY => &[Some(true), Some(true), Some(true), None]
        )
        .unwrap()
    }

    fn names(df: &DataFrame) -> Vec<String> {
        df.column(COL::COUNTRY_NAME)
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn gini_view_should_keep_rows_with_values() -> anyhow::Result<()> {
        let view = gini_view(&joined_df())?;
        assert_eq!(names(&view), vec!["A", "C"]);
        Ok(())
    }

    #[test]
    fn poverty_gap_view_should_need_all_thresholds_and_a_country() -> anyhow::Result<()> {
        let view = poverty_gap_view(&joined_df())?;
        // B misses the $3.20 value; World is an aggregate even though all three are present
        assert_eq!(names(&view), vec!["A", "C"]);
        Ok(())
    }

    #[test]
    fn missing_view_columns_should_be_malformed() {
        let df = df!(COL::COUNTRY_NAME => &["A"], COL::YEAR => &[2010i32]).unwrap();
        assert!(matches!(gini_view(&df), Err(PovStatsError::MalformedInput(_))));
        assert!(matches!(
            income_share_view(&df),
            Err(PovStatsError::MalformedInput(_))
        ));
        assert!(matches!(
            poverty_gap_view(&df),
            Err(PovStatsError::MalformedInput(_))
        ));
    }

    #[test]
    fn thresholds_should_parse() {
        assert_eq!(PovertyThreshold::from_str("1.90").unwrap(), PovertyThreshold::Usd190);
        assert_eq!(PovertyThreshold::from_str("$3.20").unwrap(), PovertyThreshold::Usd320);
        assert_eq!(PovertyThreshold::from_str("5.5").unwrap(), PovertyThreshold::Usd550);
        assert!(PovertyThreshold::from_str("2.15").is_err());
        assert_eq!(PovertyThreshold::Usd550.to_string(), "$5.50");
        assert_eq!(
            PovertyThreshold::iter().map(|t| t.column()).collect_vec(),
            vec![COL::POVERTY_GAP_190, COL::POVERTY_GAP_320, COL::POVERTY_GAP_550]
        );
    }
}
