//! Typed table cells and rows handed to the presentation layer.

use std::fmt::Display;

use polars::prelude::{AnyValue, DataFrame};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single table cell. Column types are validated when the tables are built, so consumers match
/// on the variant instead of re-inferring types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Flag(bool),
    Absent,
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, CellValue::Absent)
    }
}

impl From<AnyValue<'_>> for CellValue {
    fn from(value: AnyValue) -> Self {
        match value {
            AnyValue::Null => CellValue::Absent,
            AnyValue::Boolean(b) => CellValue::Flag(b),
            AnyValue::String(s) => CellValue::Text(s.to_string()),
            AnyValue::StringOwned(s) => CellValue::Text(s.to_string()),
            other => match other.extract::<f64>() {
                Some(n) => CellValue::Number(n),
                None => CellValue::Text(other.to_string()),
            },
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Flag(b) => write!(f, "{b}"),
            CellValue::Absent => Ok(()),
        }
    }
}

/// One table row with its cells in column order.
#[derive(Clone, Debug, PartialEq)]
pub struct Row(pub Vec<(String, CellValue)>);

impl Row {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(CellValue::as_number)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(CellValue::as_text)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }
}

/// Convert every row of `df` into a `Row`
pub fn rows(df: &DataFrame) -> Result<Vec<Row>> {
    let columns = df.get_columns();
    (0..df.height())
        .map(|idx| {
            columns
                .iter()
                .map(|series| Ok((series.name().to_string(), series.get(idx)?.into())))
                .collect::<Result<Vec<_>>>()
                .map(Row)
        })
        .collect()
}
