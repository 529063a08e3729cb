use super::{
    AUTOMATIC_RATE_COLUMN, BRAND_COLUMN, DemandColumn, MANUAL_RATE_COLUMN, PRODUCT_COLUMN,
    QUANTITY_COLUMN, TabularError, TabularResult, check_rate, quantity_from_f64,
};
use crate::demand::DemandRow;
use polars::prelude::*;

fn find_column<'a>(df: &'a DataFrame, column: &DemandColumn) -> TabularResult<&'a Column> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let idx = column
        .position(names.iter().map(String::as_str))
        .ok_or(TabularError::MissingColumn(column.name()))?;
    Ok(&df.get_columns()[idx])
}

/// Demand rows from an in-memory table, e.g. one read from a spreadsheet.
/// Numeric columns may be integer, float or numeric text.
pub fn demand_from_dataframe(df: &DataFrame) -> TabularResult<Vec<DemandRow>> {
    let products = find_column(df, &PRODUCT_COLUMN)?.cast(&DataType::String)?;
    let brands = find_column(df, &BRAND_COLUMN)?.cast(&DataType::String)?;
    let quantities = find_column(df, &QUANTITY_COLUMN)?.cast(&DataType::Float64)?;
    let automatic = find_column(df, &AUTOMATIC_RATE_COLUMN)?.cast(&DataType::Float64)?;
    let manual = find_column(df, &MANUAL_RATE_COLUMN)?.cast(&DataType::Float64)?;

    let products = products.str()?;
    let brands = brands.str()?;
    let quantities = quantities.f64()?;
    let automatic = automatic.f64()?;
    let manual = manual.f64()?;

    let required = |value: Option<f64>, row: usize, column: &DemandColumn| {
        value.ok_or(TabularError::MissingValue {
            row,
            column: column.name(),
        })
    };

    let mut rows = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let quantity = required(quantities.get(row), row, &QUANTITY_COLUMN)?;
        let automatic_rate = required(automatic.get(row), row, &AUTOMATIC_RATE_COLUMN)?;
        let manual_rate = required(manual.get(row), row, &MANUAL_RATE_COLUMN)?;
        rows.push(DemandRow {
            product: products.get(row).unwrap_or("").to_string(),
            brand: brands.get(row).unwrap_or("").to_string(),
            quantity: quantity_from_f64(row, quantity)?,
            automatic_rate: check_rate(row, AUTOMATIC_RATE_COLUMN.name(), automatic_rate)?,
            manual_rate: check_rate(row, MANUAL_RATE_COLUMN.name(), manual_rate)?,
        });
    }
    Ok(rows)
}
