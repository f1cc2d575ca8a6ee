//! This module stores the column names of the input tables and of the tables derived from them.
//! Note that the input names must be synchronised with the headers of the World Bank Poverty and
//! Equity Database CSV exports!

// Indicator values table (one column per year follows the identifier columns)
pub const COUNTRY_NAME: &str = "Country Name";
pub const COUNTRY_CODE: &str = "Country Code";
pub const INDICATOR_NAME: &str = "Indicator Name";
pub const INDICATOR_CODE: &str = "Indicator Code";

// Derived long and wide tables
pub const YEAR: &str = "Year";
pub const VALUE: &str = "value";

// Country metadata table
pub const COUNTRY_SHORT_NAME: &str = "Short Name";
pub const COUNTRY_REGION: &str = "Region";
pub const COUNTRY_INCOME_GROUP: &str = "Income Group";
pub const COUNTRY_ALPHA2_CODE: &str = "2-alpha code";
pub const COUNTRY_IS_COUNTRY: &str = "is_country";
pub const COUNTRY_FLAG: &str = "flag";

// Series (indicator definition) table
pub const SERIES_INDICATOR_NAME: &str = "Indicator Name";
pub const SERIES_LONG_DEFINITION: &str = "Long definition";
pub const SERIES_UNIT_OF_MEASURE: &str = "Unit of measure";
pub const SERIES_PERIODICITY: &str = "Periodicity";
pub const SERIES_SOURCE: &str = "Source";
pub const SERIES_LIMITATIONS: &str = "Limitations and exceptions";

// Secondary poverty indicator table
pub const POVERTY_COUNTRY_NAME: &str = "Country Name";
pub const POVERTY_COUNTRY_CODE: &str = "Country Code";
pub const POVERTY_YEAR: &str = "year";
pub const POVERTY_IS_COUNTRY: &str = "is_country";

// Indicators with dedicated views
pub const GINI_INDEX: &str = "GINI index (World Bank estimate)";
pub const POPULATION_TOTAL: &str = "Population, total";
pub const POVERTY_GAP_190: &str = "Poverty gap at $1.90 a day (2011 PPP) (%)";
pub const POVERTY_GAP_320: &str = "Poverty gap at $3.20 a day (2011 PPP) (%)";
pub const POVERTY_GAP_550: &str = "Poverty gap at $5.50 a day (2011 PPP) (%)";
