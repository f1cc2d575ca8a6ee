use log::{debug, info};
use polars::prelude::*;

use crate::error::{PovStatsError, Result};
use crate::COL;

/// Left join the pivoted indicator frame with the enriched country table on country code.
///
/// Rows without a country record (aggregates such as "World") are kept with nulls in every
/// country column. Every pivot row appears exactly once in the output.
pub fn join_countries(pivot: &DataFrame, countries: &DataFrame) -> Result<DataFrame> {
    let joined = pivot
        .clone()
        .lazy()
        .join(
            countries.clone().lazy(),
            [col(COL::COUNTRY_CODE)],
            [col(COL::COUNTRY_CODE)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    if joined.height() != pivot.height() {
        return Err(PovStatsError::duplicate_key(
            "country join",
            format!(
                "{} pivot rows became {} joined rows",
                pivot.height(),
                joined.height()
            ),
        ));
    }
    let joined = joined.sort(
        [COL::COUNTRY_NAME, COL::COUNTRY_CODE, COL::YEAR],
        SortMultipleOptions::default(),
    )?;

    // Debug print the column names so that we know what we can access
    debug!("Column names in joined table: {:?}", joined.get_column_names());
    info!("Joined indicators with countries, shape: {:?}", joined.shape());
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;
    use crate::country::enrich_countries;

    fn pivot_df() -> DataFrame {
        df!(
            COL::COUNTRY_NAME => &["Testland", "Testland", "World"],
            COL::COUNTRY_CODE => &["TST", "TST", "WLD"],
            COL::YEAR => &[2000i32, 2001, 2000],
            COL::POPULATION_TOTAL => &[5.0, 7.0, 6000.0]
        )
        .unwrap()
    }

    fn countries_df() -> DataFrame {
        enrich_countries(
            &df!(
                COL::COUNTRY_CODE => &["TST", "ALP"],
                COL::COUNTRY_SHORT_NAME => &["Testland", "Alphaland"],
                COL::COUNTRY_REGION => &["Test Region", "Test Region"],
                COL::COUNTRY_INCOME_GROUP => &["Low income", "High income"],
                COL::COUNTRY_ALPHA2_CODE => &["TL", "AL"]
            )
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn every_pivot_row_should_be_kept_once() -> anyhow::Result<()> {
        let joined = join_countries(&pivot_df(), &countries_df())?;
        assert_eq!(joined.height(), 3);
        let regions: Vec<Option<&str>> = joined.column(COL::COUNTRY_REGION)?.str()?.into_iter().collect();
        assert_eq!(
            regions,
            vec![Some("Test Region"), Some("Test Region"), None],
            "Aggregates should be kept with no country metadata"
        );
        let is_country: Vec<Option<bool>> = joined
            .column(COL::COUNTRY_IS_COUNTRY)?
            .bool()?
            .into_iter()
            .collect();
        assert_eq!(is_country, vec![Some(true), Some(true), None]);
        let population: Vec<Option<f64>> = joined
            .column(COL::POPULATION_TOTAL)?
            .f64()?
            .into_iter()
            .collect();
        assert_eq!(population, vec![Some(5.0), Some(7.0), Some(6000.0)]);
        Ok(())
    }
}
