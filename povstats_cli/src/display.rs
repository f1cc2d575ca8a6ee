use std::io::Write;

use comfy_table::{presets::NOTHING, *};
use itertools::izip;

use polars::prelude::{DataFrame, DataType, Series, SortMultipleOptions};
use povstats::{
    value::{rows, Row},
    COL,
};

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_style(comfy_table::TableComponent::BottomBorder, '─')
        .set_style(comfy_table::TableComponent::MiddleHeaderIntersections, '─')
        .set_style(comfy_table::TableComponent::HeaderLines, '─')
        .set_style(comfy_table::TableComponent::BottomBorderIntersections, '─')
        .set_style(comfy_table::TableComponent::TopBorder, '─')
        .set_style(comfy_table::TableComponent::TopBorderIntersections, '─');
    table
}

fn header(names: impl IntoIterator<Item = impl ToString>) -> Vec<Cell> {
    names
        .into_iter()
        .map(|name| Cell::new(name.to_string()).add_attribute(Attribute::Bold))
        .collect()
}

pub fn display_countries(writer: &mut impl Write, countries: DataFrame) -> anyhow::Result<()> {
    let df_to_show = countries.sort([COL::COUNTRY_CODE], SortMultipleOptions::default())?;
    let mut table = base_table();
    table.set_header(header([
        "",
        "Country Code",
        "Short Name",
        "Region",
        "Income Group",
    ]));
    for (flag, code, short_name, region, income_group) in izip!(
        df_to_show.column(COL::COUNTRY_FLAG)?.str()?,
        df_to_show.column(COL::COUNTRY_CODE)?.str()?,
        df_to_show.column(COL::COUNTRY_SHORT_NAME)?.str()?,
        df_to_show.column(COL::COUNTRY_REGION)?.str()?,
        df_to_show.column(COL::COUNTRY_INCOME_GROUP)?.str()?,
    ) {
        table.add_row(vec![
            flag.unwrap_or_default(),
            code.unwrap_or_default(),
            short_name.unwrap_or_default(),
            region.unwrap_or_default(),
            income_group.unwrap_or_default(),
        ]);
    }
    writeln!(writer, "\n{}", table)?;
    Ok(())
}

/// Print any frame with one table column per frame column
pub fn display_df(writer: &mut impl Write, df: &DataFrame) -> anyhow::Result<()> {
    let mut table = base_table();
    table.set_header(header(df.get_column_names()));
    for row in rows(df)? {
        table.add_row(
            row.0
                .iter()
                .map(|(_, value)| value.to_string())
                .collect::<Vec<_>>(),
        );
    }
    let numeric_columns = df
        .get_columns()
        .iter()
        .enumerate()
        .filter(|(_, series)| series.dtype().is_numeric())
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    for idx in numeric_columns {
        if let Some(column) = table.column_mut(idx) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    writeln!(writer, "\n{}", table)?;
    Ok(())
}

/// Print a single row as field/value pairs
pub fn display_profile(writer: &mut impl Write, profile: &Row) -> anyhow::Result<()> {
    let mut table = base_table();
    for (field, value) in profile.0.iter() {
        table.add_row(vec![
            Cell::new(field).add_attribute(Attribute::Bold),
            value.to_string().into(),
        ]);
    }
    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    writeln!(writer, "\n{}", table)?;
    Ok(())
}

/// Print the selectable values of a series under its name
pub fn display_options(writer: &mut impl Write, options: &Series) -> anyhow::Result<()> {
    let mut table = base_table();
    table.set_header(header([options.name()]));
    let options = options.cast(&DataType::String)?;
    for option in options.str()?.into_iter().flatten() {
        table.add_row(vec![option]);
    }
    writeln!(writer, "\n{}", table)?;
    Ok(())
}
