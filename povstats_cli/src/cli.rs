use std::io::Write;
use std::path::PathBuf;

use clap::{command, Args, Parser, Subcommand};
use enum_dispatch::enum_dispatch;
use itertools::Itertools;
use log::{debug, info};
use polars::prelude::*;
use polars::{frame::DataFrame, series::Series};
use povstats::{
    config::Config,
    definitions::NO_INFORMATION,
    formatters::{CSVFormatter, JSONFormatter, OutputFormatter, OutputGenerator},
    queries,
    value::Row,
    views::PovertyThreshold,
    PovStats, COL,
};
use serde::{Deserialize, Serialize};
use spinners::{Spinner, Spinners};
use strum_macros::{Display, EnumString};

use crate::display::{display_countries, display_df, display_options, display_profile};
use crate::error::PovStatsCliResult;

const DEFAULT_PROGRESS_SPINNER: Spinners = Spinners::Dots;
const COMPLETE_PROGRESS_STRING: &str = "✔";
const RUNNING_TAIL_STRING: &str = "...";
const LOADING_STRING: &str = "Loading poverty statistics";

/// Defines the output formats we are able to produce results in.
#[derive(Clone, Debug, Default, Deserialize, Serialize, EnumString, Display, PartialEq, Eq)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl OutputFormat {
    /// The formatter writing this format, or `None` for terminal tables
    fn formatter(&self) -> Option<OutputFormatter> {
        match self {
            OutputFormat::Table => None,
            OutputFormat::Csv => Some(OutputFormatter::Csv(CSVFormatter)),
            OutputFormat::Json => Some(OutputFormatter::Json(JSONFormatter)),
        }
    }
}

fn write_output(
    writer: &mut impl Write,
    format: &OutputFormat,
    mut data: DataFrame,
) -> PovStatsCliResult<()> {
    match format.formatter() {
        Some(formatter) => formatter.save(writer, &mut data)?,
        None => display_df(writer, &data)?,
    }
    Ok(())
}

/// Report on stderr that a selection matched nothing. Csv and json output still get a frame
/// without rows so that stdout holds one document.
fn write_no_data(
    writer: &mut impl Write,
    format: &OutputFormat,
    message: &str,
    empty: DataFrame,
) -> PovStatsCliResult<()> {
    eprintln!("{message}");
    match format {
        OutputFormat::Table => Ok(()),
        _ => write_output(writer, format, empty),
    }
}

/// A single option list keeps its own column, several are stacked as `option, value` pairs
fn options_to_df(options: Vec<Series>) -> PolarsResult<DataFrame> {
    if options.len() == 1 {
        return DataFrame::new(options);
    }
    let mut headings = vec![];
    let mut values = vec![];
    for option in &options {
        let text = option.cast(&DataType::String)?;
        for value in text.str()?.into_iter().flatten() {
            headings.push(option.name().to_string());
            values.push(value.to_string());
        }
    }
    DataFrame::new(vec![
        Series::new("option", headings),
        Series::new("value", values),
    ])
}

fn write_options(
    writer: &mut impl Write,
    format: &OutputFormat,
    options: Vec<Series>,
) -> PovStatsCliResult<()> {
    match format {
        OutputFormat::Table => {
            for option in &options {
                display_options(writer, option)?;
            }
            Ok(())
        }
        _ => write_output(writer, format, options_to_df(options)?),
    }
}

/// Field/value pairs of a row as a two column frame
fn profile_to_df(profile: Option<&Row>) -> PolarsResult<DataFrame> {
    let (fields, values): (Vec<String>, Vec<String>) = profile
        .into_iter()
        .flat_map(|profile| profile.0.iter())
        .map(|(field, value)| (field.clone(), value.to_string()))
        .unzip();
    DataFrame::new(vec![Series::new("field", fields), Series::new("value", values)])
}

/// Build the tables on a blocking thread, showing a spinner on the terminal
async fn load_povstats(config: Config, quiet: bool) -> PovStatsCliResult<PovStats> {
    let sp = (!quiet).then(|| {
        Spinner::with_timer(
            DEFAULT_PROGRESS_SPINNER,
            LOADING_STRING.to_string() + RUNNING_TAIL_STRING,
        )
    });
    let povstats = tokio::task::spawn_blocking(move || PovStats::new_with_config(&config))
        .await
        .map_err(anyhow::Error::from)??;
    if let Some(mut s) = sp {
        s.stop_with_symbol(COMPLETE_PROGRESS_STRING);
    }
    Ok(povstats)
}

/// Only show a spinner when the output is a terminal table
fn hide_spinner(quiet: bool, format: &OutputFormat) -> bool {
    quiet || *format != OutputFormat::Table
}

/// Trait that defines what to run when a given subcommand is invoked.
#[enum_dispatch]
pub trait RunCommand {
    async fn run(&self, config: Config) -> PovStatsCliResult<()>;
}

/// Writes the results of a command as one document in the selected output format.
trait Report {
    fn report(&self, povstats: &PovStats, writer: &mut impl Write) -> PovStatsCliResult<()>;
}

/// The Countries command lists the countries in the country metadata together with their flag.
#[derive(Args, Debug)]
pub struct CountriesCommand {
    #[arg(long, help = "Also list aggregates such as regions and income groups")]
    all: bool,
    #[arg(from_global)]
    quiet: bool,
    #[arg(from_global)]
    format: OutputFormat,
}

impl Report for CountriesCommand {
    fn report(&self, povstats: &PovStats, writer: &mut impl Write) -> PovStatsCliResult<()> {
        let mut countries = povstats.countries.clone().lazy();
        if !self.all {
            countries = countries.filter(col(COL::COUNTRY_IS_COUNTRY).eq(lit(true)));
        }
        let countries = countries
            .select([
                col(COL::COUNTRY_FLAG),
                col(COL::COUNTRY_CODE),
                col(COL::COUNTRY_SHORT_NAME),
                col(COL::COUNTRY_REGION),
                col(COL::COUNTRY_INCOME_GROUP),
            ])
            .collect()?;
        match self.format {
            OutputFormat::Table => display_countries(writer, countries)?,
            _ => write_output(writer, &self.format, countries)?,
        }
        Ok(())
    }
}

impl RunCommand for CountriesCommand {
    async fn run(&self, config: Config) -> PovStatsCliResult<()> {
        info!("Running `countries` subcommand");
        let povstats = load_povstats(config, hide_spinner(self.quiet, &self.format)).await?;
        self.report(&povstats, &mut std::io::stdout().lock())
    }
}

/// The Indicator command describes an indicator from the series metadata.
#[derive(Args, Debug)]
pub struct IndicatorCommand {
    #[arg(index = 1, help = "Indicator name, e.g. \"Population, total\"")]
    name: Option<String>,
    #[arg(long, help = "List the indicators that have a definition")]
    list: bool,
    #[arg(from_global)]
    quiet: bool,
    #[arg(from_global)]
    format: OutputFormat,
}

impl Report for IndicatorCommand {
    fn report(&self, povstats: &PovStats, writer: &mut impl Write) -> PovStatsCliResult<()> {
        let name = match self.name.as_deref() {
            Some(name) if !self.list => name,
            _ => {
                let names = Series::new(COL::INDICATOR_NAME, povstats.definitions.names());
                return write_options(writer, &self.format, vec![names]);
            }
        };
        if self.format == OutputFormat::Table {
            writeln!(writer, "{}", povstats.describe_indicator(name))?;
            return Ok(());
        }
        let definition = povstats.definitions.to_df(name)?;
        if definition.height() == 0 {
            write_no_data(writer, &self.format, NO_INFORMATION, definition)
        } else {
            write_output(writer, &self.format, definition)
        }
    }
}

impl RunCommand for IndicatorCommand {
    async fn run(&self, config: Config) -> PovStatsCliResult<()> {
        info!("Running `indicator` subcommand");
        let povstats = load_povstats(config, hide_spinner(self.quiet, &self.format)).await?;
        self.report(&povstats, &mut std::io::stdout().lock())
    }
}

/// The Gini command shows the Gini index of all countries in a year or of some countries over
/// time.
#[derive(Args, Debug)]
pub struct GiniCommand {
    #[arg(short, long, help = "Show all countries in this year")]
    year: Option<i32>,
    #[arg(short, long, help = "Show these countries over time", num_args = 0..)]
    country: Vec<String>,
    #[arg(from_global)]
    quiet: bool,
    #[arg(from_global)]
    format: OutputFormat,
}

impl Report for GiniCommand {
    fn report(&self, povstats: &PovStats, writer: &mut impl Write) -> PovStatsCliResult<()> {
        let mut frames = [
            queries::gini_for_year(povstats, self.year)?,
            queries::gini_for_countries(povstats, &self.country)?,
        ]
        .into_iter()
        .flatten();
        // Both selections share the columns of the Gini view, so they stack into one frame
        let Some(mut gini) = frames.next() else {
            return write_options(
                writer,
                &self.format,
                vec![
                    Series::new(COL::YEAR, queries::gini_years(povstats)?),
                    Series::new(COL::COUNTRY_NAME, queries::gini_countries(povstats)?),
                ],
            );
        };
        for other in frames {
            gini.vstack_mut(&other)?;
        }
        write_output(writer, &self.format, gini)
    }
}

impl RunCommand for GiniCommand {
    async fn run(&self, config: Config) -> PovStatsCliResult<()> {
        info!("Running `gini` subcommand");
        debug!("{:#?}", self);
        let povstats = load_povstats(config, hide_spinner(self.quiet, &self.format)).await?;
        self.report(&povstats, &mut std::io::stdout().lock())
    }
}

/// The IncomeShare command shows the income share held by each quintile of a country.
#[derive(Args, Debug)]
pub struct IncomeShareCommand {
    #[arg(index = 1, help = "Country name")]
    country: Option<String>,
    #[arg(from_global)]
    quiet: bool,
    #[arg(from_global)]
    format: OutputFormat,
}

impl Report for IncomeShareCommand {
    fn report(&self, povstats: &PovStats, writer: &mut impl Write) -> PovStatsCliResult<()> {
        match queries::income_share_for_country(povstats, self.country.as_deref())? {
            Some(df) => write_output(writer, &self.format, df),
            None => write_options(
                writer,
                &self.format,
                vec![Series::new(
                    COL::COUNTRY_NAME,
                    queries::income_share_countries(povstats)?,
                )],
            ),
        }
    }
}

impl RunCommand for IncomeShareCommand {
    async fn run(&self, config: Config) -> PovStatsCliResult<()> {
        info!("Running `income-share` subcommand");
        let povstats = load_povstats(config, hide_spinner(self.quiet, &self.format)).await?;
        self.report(&povstats, &mut std::io::stdout().lock())
    }
}

/// The PovertyGap command shows the poverty gap of every country in a year.
#[derive(Args, Debug)]
pub struct PovertyGapCommand {
    #[arg(short, long, help = "Year to show")]
    year: Option<i32>,
    #[arg(
        short,
        long,
        value_name = "1.90|3.20|5.50",
        help = "Daily income threshold in 2011 PPP dollars",
        default_value = "1.90"
    )]
    threshold: PovertyThreshold,
    #[arg(from_global)]
    quiet: bool,
    #[arg(from_global)]
    format: OutputFormat,
}

impl Report for PovertyGapCommand {
    fn report(&self, povstats: &PovStats, writer: &mut impl Write) -> PovStatsCliResult<()> {
        match (
            self.year,
            queries::poverty_gap_for_year(povstats, self.year, self.threshold)?,
        ) {
            (_, Some(df)) => write_output(writer, &self.format, df),
            (Some(year), None) => {
                let empty = povstats
                    .poverty_gap
                    .select([COL::COUNTRY_NAME, COL::YEAR, self.threshold.column()])?
                    .head(Some(0));
                write_no_data(
                    writer,
                    &self.format,
                    &format!("No poverty gap data available for {year}."),
                    empty,
                )
            }
            (None, None) => write_options(
                writer,
                &self.format,
                vec![Series::new(
                    COL::YEAR,
                    queries::poverty_gap_years(povstats)?,
                )],
            ),
        }
    }
}

impl RunCommand for PovertyGapCommand {
    async fn run(&self, config: Config) -> PovStatsCliResult<()> {
        info!("Running `poverty-gap` subcommand");
        let povstats = load_povstats(config, hide_spinner(self.quiet, &self.format)).await?;
        self.report(&povstats, &mut std::io::stdout().lock())
    }
}

/// The Histogram command shows the values of an indicator for every country in some years.
#[derive(Args, Debug)]
pub struct HistogramCommand {
    #[arg(index = 1, help = "Indicator name, e.g. \"Population, total\"")]
    indicator: Option<String>,
    #[arg(
        short,
        long,
        help = "Years to include, comma-separated",
        value_delimiter = ','
    )]
    years: Vec<i32>,
    #[arg(from_global)]
    quiet: bool,
    #[arg(from_global)]
    format: OutputFormat,
}

impl Report for HistogramCommand {
    fn report(&self, povstats: &PovStats, writer: &mut impl Write) -> PovStatsCliResult<()> {
        let indicator = self
            .indicator
            .as_deref()
            .map(str::trim)
            .filter(|indicator| !indicator.is_empty());
        if let Some(df) = queries::indicator_histogram(povstats, indicator, &self.years)? {
            return write_output(writer, &self.format, df);
        }
        let mut options = vec![];
        if indicator.is_none() {
            options.push(Series::new(
                COL::INDICATOR_NAME,
                queries::indicator_names(povstats),
            ));
        }
        if self.years.is_empty() {
            options.push(Series::new(COL::YEAR, queries::observation_years(povstats)));
        }
        write_options(writer, &self.format, options)
    }
}

impl RunCommand for HistogramCommand {
    async fn run(&self, config: Config) -> PovStatsCliResult<()> {
        info!("Running `histogram` subcommand");
        let povstats = load_povstats(config, hide_spinner(self.quiet, &self.format)).await?;
        self.report(&povstats, &mut std::io::stdout().lock())
    }
}

/// The Country command shows the metadata of a country and, optionally, an indicator over time
/// compared with other countries. Csv and json output hold the indicator series when one is
/// selected and the metadata otherwise.
#[derive(Args, Debug)]
pub struct CountryCommand {
    #[arg(index = 1, help = "Short name of the country")]
    name: Option<String>,
    #[arg(short, long, help = "Indicator to show over time")]
    indicator: Option<String>,
    #[arg(short, long, help = "Countries to compare with", num_args = 0..)]
    compare: Vec<String>,
    #[arg(from_global)]
    quiet: bool,
    #[arg(from_global)]
    format: OutputFormat,
}

impl Report for CountryCommand {
    fn report(&self, povstats: &PovStats, writer: &mut impl Write) -> PovStatsCliResult<()> {
        let Some(name) = self.name.as_deref() else {
            return write_options(
                writer,
                &self.format,
                vec![Series::new(
                    COL::COUNTRY_NAME,
                    queries::country_names(povstats)?,
                )],
            );
        };
        let profile = queries::country_profile(povstats, Some(name))?;
        if profile.is_none() {
            eprintln!("No country named '{name}'.");
        }
        let countries = std::iter::once(name.to_string())
            .chain(self.compare.iter().cloned())
            .collect_vec();
        let series = queries::country_series(povstats, &countries, self.indicator.as_deref())?;
        match (&self.format, series) {
            (OutputFormat::Table, series) => {
                if let Some(profile) = &profile {
                    display_profile(writer, profile)?;
                }
                if let Some(df) = series {
                    display_df(writer, &df)?;
                }
                Ok(())
            }
            (_, Some(series)) => write_output(writer, &self.format, series),
            (_, None) => write_output(writer, &self.format, profile_to_df(profile.as_ref())?),
        }
    }
}

impl RunCommand for CountryCommand {
    async fn run(&self, config: Config) -> PovStatsCliResult<()> {
        info!("Running `country` subcommand");
        let povstats = load_povstats(config, hide_spinner(self.quiet, &self.format)).await?;
        self.report(&povstats, &mut std::io::stdout().lock())
    }
}

/// The Observations command lists the indicator values of some countries, one per row.
#[derive(Args, Debug)]
pub struct ObservationsCommand {
    #[arg(index = 1, help = "Country names", num_args = 0..)]
    countries: Vec<String>,
    #[arg(short, long, help = "Only show this indicator")]
    indicator: Option<String>,
    #[arg(from_global)]
    quiet: bool,
    #[arg(from_global)]
    format: OutputFormat,
}

impl Report for ObservationsCommand {
    fn report(&self, povstats: &PovStats, writer: &mut impl Write) -> PovStatsCliResult<()> {
        match queries::country_observations(
            povstats,
            &self.countries,
            self.indicator.as_deref(),
        )? {
            Some(df) => write_output(writer, &self.format, df),
            None => write_options(
                writer,
                &self.format,
                vec![Series::new(
                    COL::COUNTRY_NAME,
                    queries::observation_countries(povstats),
                )],
            ),
        }
    }
}

impl RunCommand for ObservationsCommand {
    async fn run(&self, config: Config) -> PovStatsCliResult<()> {
        info!("Running `observations` subcommand");
        let povstats = load_povstats(config, hide_spinner(self.quiet, &self.format)).await?;
        self.report(&povstats, &mut std::io::stdout().lock())
    }
}

/// The entrypoint for the CLI.
#[derive(Parser, Debug)]
#[command(version, about="Povstats explores the World Bank poverty and equity statistics", long_about = None, name="povstats")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    #[arg(
        short = 'q',
        long = "quiet",
        help = "\
            Do not print progress bar to stdout. Results and logs (when `RUST_LOG`\n\
            is set) will still be printed.",
        global = true
    )]
    quiet: bool,
    #[arg(
        short = 'd',
        long,
        help = "Directory holding the input CSV files, overrides the config file",
        global = true
    )]
    pub data_dir: Option<PathBuf>,
    #[arg(
        short = 'f',
        long,
        value_name = "table|csv|json",
        help = "Output format for the results",
        default_value = "table",
        global = true
    )]
    format: OutputFormat,
}

/// Commands contains the list of subcommands avaliable for use in the CLI.
/// Each command should implmement the RunCommand trait and specify the list
/// of required args for that command.
#[derive(Subcommand, Debug)]
#[enum_dispatch(RunCommand)]
pub enum Commands {
    /// List countries with their flag, region and income group
    Countries(CountriesCommand),
    /// Describe an indicator, or list the indicators with a definition
    Indicator(IndicatorCommand),
    /// Gini index by year or by country
    Gini(GiniCommand),
    /// Income share held by each quintile of a country
    IncomeShare(IncomeShareCommand),
    /// Poverty gap of every country in a year
    PovertyGap(PovertyGapCommand),
    /// Values of an indicator for every country in the selected years
    Histogram(HistogramCommand),
    /// Country metadata and an indicator over time
    Country(CountryCommand),
    /// Indicator values of some countries, one per row
    Observations(ObservationsCommand),
}


#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::Value;

    use super::*;

    fn test_config() -> Config {
        Config::with_data_dir(format!("{}/../test_data", env!("CARGO_MANIFEST_DIR")))
    }

    fn test_povstats() -> PovStats {
        PovStats::new_with_config(&test_config()).unwrap()
    }

    fn report_text(command: &impl Report) -> String {
        let mut buffer: Vec<u8> = vec![];
        command.report(&test_povstats(), &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    /// The report parsed as a single JSON document holding an array of records
    fn report_json(command: &impl Report) -> Vec<serde_json::Map<String, Value>> {
        serde_json::from_str(&report_text(command)).unwrap()
    }

    fn field<'a>(records: &'a [serde_json::Map<String, Value>], key: &str) -> Vec<&'a Value> {
        records.iter().map(|record| &record[key]).collect()
    }

    #[tokio::test]
    async fn test_gini_command() {
        let gini_command = GiniCommand {
            year: Some(2002),
            country: vec!["Testland".into()],
            quiet: true,
            format: OutputFormat::Csv,
        };
        let result = gini_command.run(test_config()).await;
        assert!(result.is_ok(), "{result:?}")
    }

    #[test]
    fn gini_selections_should_share_one_document() {
        let records = report_json(&GiniCommand {
            year: Some(2002),
            country: vec!["Testland".into()],
            quiet: true,
            format: OutputFormat::Json,
        });
        assert_eq!(records.len(), 4);
        assert_eq!(
            records[0].keys().collect_vec(),
            vec![COL::COUNTRY_NAME, COL::YEAR, COL::GINI_INDEX]
        );
        assert_eq!(
            field(&records, COL::COUNTRY_NAME),
            vec!["Testland", "Alphaland", "Testland", "Testland"]
        );
    }

    #[test]
    fn gini_without_selection_should_list_years_and_countries() {
        let records = report_json(&GiniCommand {
            year: None,
            country: vec![],
            quiet: true,
            format: OutputFormat::Json,
        });
        let pairs = records
            .iter()
            .map(|record| (record["option"].as_str(), record["value"].as_str()))
            .collect_vec();
        assert!(pairs.contains(&(Some(COL::YEAR), Some("2001"))));
        assert!(pairs.contains(&(Some(COL::COUNTRY_NAME), Some("Alphaland"))));
        assert_eq!(pairs.len(), 5);
    }

    #[tokio::test]
    async fn test_country_command() {
        let country_command = CountryCommand {
            name: Some("Testland".into()),
            indicator: Some(COL::POPULATION_TOTAL.into()),
            compare: vec!["Alphaland".into()],
            quiet: true,
            format: OutputFormat::Json,
        };
        let result = country_command.run(test_config()).await;
        assert!(result.is_ok(), "{result:?}")
    }

    #[test]
    fn country_json_should_hold_one_document() {
        let series = report_json(&CountryCommand {
            name: Some("Testland".into()),
            indicator: Some(COL::POPULATION_TOTAL.into()),
            compare: vec!["Alphaland".into()],
            quiet: true,
            format: OutputFormat::Json,
        });
        assert_eq!(series.len(), 4);
        assert!(series.iter().all(|record| record.contains_key(COL::POPULATION_TOTAL)));

        let profile = report_json(&CountryCommand {
            name: Some("Testland".into()),
            indicator: None,
            compare: vec![],
            quiet: true,
            format: OutputFormat::Json,
        });
        assert!(profile
            .iter()
            .any(|record| record["field"] == COL::COUNTRY_CODE && record["value"] == "TST"));

        let unknown = report_json(&CountryCommand {
            name: Some("Atlantis".into()),
            indicator: None,
            compare: vec![],
            quiet: true,
            format: OutputFormat::Json,
        });
        assert!(unknown.is_empty());
    }

    #[tokio::test]
    async fn test_poverty_gap_command_without_data() {
        let poverty_gap_command = PovertyGapCommand {
            year: Some(1999),
            threshold: PovertyThreshold::Usd550,
            quiet: true,
            format: OutputFormat::Table,
        };
        let result = poverty_gap_command.run(test_config()).await;
        assert!(result.is_ok(), "{result:?}")
    }

    #[test]
    fn poverty_gap_json_should_stay_parseable() {
        let missing = report_json(&PovertyGapCommand {
            year: Some(1999),
            threshold: PovertyThreshold::Usd190,
            quiet: true,
            format: OutputFormat::Json,
        });
        assert!(missing.is_empty());

        let records = report_json(&PovertyGapCommand {
            year: Some(2001),
            threshold: PovertyThreshold::Usd320,
            quiet: true,
            format: OutputFormat::Json,
        });
        assert_eq!(records.len(), 1);
        assert_eq!(records[0][COL::COUNTRY_NAME], "Alphaland");
        assert_eq!(records[0][COL::POPULATION_TOTAL].as_f64(), Some(110.0));
    }

    #[test]
    fn missing_poverty_gap_csv_should_be_a_header() {
        let output = report_text(&PovertyGapCommand {
            year: Some(1999),
            threshold: PovertyThreshold::Usd190,
            quiet: true,
            format: OutputFormat::Csv,
        });
        assert_eq!(
            output,
            format!(
                "{},{},{}\n",
                COL::COUNTRY_NAME,
                COL::YEAR,
                COL::POVERTY_GAP_190
            )
        );
    }

    #[test]
    fn indicator_should_honour_csv() {
        let output = report_text(&IndicatorCommand {
            name: Some(COL::POPULATION_TOTAL.into()),
            list: false,
            quiet: true,
            format: OutputFormat::Csv,
        });
        assert!(output.starts_with("Indicator Name,Long definition,Unit of measure,"));
        assert!(output.contains("\"Population, total\""));
        assert!(!output.contains("##"));

        let unknown = report_json(&IndicatorCommand {
            name: Some("Not an indicator".into()),
            list: false,
            quiet: true,
            format: OutputFormat::Json,
        });
        assert!(unknown.is_empty());
    }

    #[test]
    fn histogram_without_years_should_list_years() {
        let records = report_json(&HistogramCommand {
            indicator: Some(COL::POPULATION_TOTAL.into()),
            years: vec![],
            quiet: true,
            format: OutputFormat::Json,
        });
        assert_eq!(records[0].keys().collect_vec(), vec![COL::YEAR]);
        let years = field(&records, COL::YEAR)
            .into_iter()
            .map(Value::as_i64)
            .collect_vec();
        assert_eq!(years, vec![Some(2000), Some(2001), Some(2002)]);
    }

    #[test]
    fn histogram_without_indicator_should_list_numeric_indicators() {
        let records = report_json(&HistogramCommand {
            indicator: None,
            years: vec![2000],
            quiet: true,
            format: OutputFormat::Json,
        });
        let indicators = field(&records, COL::INDICATOR_NAME);
        assert_eq!(indicators.len(), 5);
        assert!(indicators.contains(&&Value::from(COL::GINI_INDEX)));
        assert!(!indicators.contains(&&Value::from(COL::COUNTRY_REGION)));
    }

    #[test]
    fn histogram_table_should_show_values() {
        let output = report_text(&HistogramCommand {
            indicator: Some(COL::POPULATION_TOTAL.into()),
            years: vec![2000],
            quiet: true,
            format: OutputFormat::Table,
        });
        assert!(output.contains("Alphaland"));
        assert!(!output.contains("World"));
    }

    #[tokio::test]
    async fn unknown_histogram_indicator_should_fail() {
        let histogram_command = HistogramCommand {
            indicator: Some("Not an indicator".into()),
            years: vec![2000],
            quiet: true,
            format: OutputFormat::Csv,
        };
        let result = histogram_command.run(test_config()).await;
        assert!(result.is_err(), "Unknown indicators should be reported")
    }

    #[test]
    fn observations_should_be_long_form() {
        let records = report_json(&ObservationsCommand {
            countries: vec!["Testland".into()],
            indicator: Some(COL::GINI_INDEX.into()),
            quiet: true,
            format: OutputFormat::Json,
        });
        let observations = records
            .iter()
            .map(|record| (record[COL::YEAR].as_i64(), record[COL::VALUE].as_f64()))
            .collect_vec();
        assert_eq!(
            observations,
            vec![(Some(2000), Some(30.5)), (Some(2002), Some(32.1))]
        );

        let options = report_json(&ObservationsCommand {
            countries: vec![],
            indicator: None,
            quiet: true,
            format: OutputFormat::Json,
        });
        assert_eq!(
            field(&options, COL::COUNTRY_NAME),
            vec!["Alphaland", "Testland", "World"]
        );
    }

    #[tokio::test]
    async fn missing_data_dir_should_fail() {
        let countries_command = CountriesCommand {
            all: true,
            quiet: true,
            format: OutputFormat::Table,
        };
        let result = countries_command
            .run(Config::with_data_dir("does/not/exist"))
            .await;
        assert!(result.is_err(), "Loading should fail without input files")
    }

    #[test]
    fn output_type_should_deserialize_properly() {
        let output_format = OutputFormat::from_str("csv");
        assert_eq!(
            output_format.unwrap(),
            OutputFormat::Csv,
            "csv format should be parsed correctly"
        );
        let output_format = OutputFormat::from_str("JSON");
        assert_eq!(
            output_format.unwrap(),
            OutputFormat::Json,
            "parsing should be case insensitive"
        );
        let output_format = OutputFormat::from_str("geoparquet");
        assert!(output_format.is_err(), "non listed formats should fail");
    }

    #[test]
    fn global_args_should_reach_subcommands() {
        let cli = Cli::parse_from([
            "povstats",
            "--format",
            "json",
            "poverty-gap",
            "--year",
            "2000",
            "--threshold",
            "$3.20",
        ]);
        match cli.command {
            Some(Commands::PovertyGap(command)) => {
                assert_eq!(command.format, OutputFormat::Json);
                assert_eq!(command.year, Some(2000));
                assert_eq!(command.threshold, PovertyThreshold::Usd320);
            }
            other => panic!("Expected the poverty-gap command, got {other:?}"),
        }
    }

    #[test]
    fn cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
