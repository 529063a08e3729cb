use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TabularError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("dataframe conversion error: {0}")]
    DataFrame(#[from] PolarsError),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: invalid quantity '{value}'")]
    InvalidQuantity { row: usize, value: String },
    #[error("row {row}: invalid {column} '{value}'")]
    InvalidRate {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: empty value in column '{column}'")]
    MissingValue { row: usize, column: &'static str },
    #[error("spreadsheet read error: {0}")]
    SpreadsheetRead(#[from] calamine::XlsxError),
    #[error("spreadsheet write error: {0}")]
    SpreadsheetWrite(#[from] rust_xlsxwriter::XlsxError),
    #[error("workbook has no worksheets")]
    EmptyWorkbook,
}

pub type TabularResult<T> = Result<T, TabularError>;

/// A demand column and the header spellings accepted for it. The first entry
/// is the canonical name reported in errors.
pub(crate) struct DemandColumn {
    pub(crate) aliases: &'static [&'static str],
}

impl DemandColumn {
    pub(crate) fn name(&self) -> &'static str {
        self.aliases[0]
    }

    pub(crate) fn position<'h, I>(&self, headers: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'h str>,
    {
        headers
            .into_iter()
            .position(|header| {
                let header = header.trim();
                self.aliases
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(header))
            })
    }
}

pub(crate) const PRODUCT_COLUMN: DemandColumn = DemandColumn {
    aliases: &["Descripcion", "Descripción", "Description", "Product"],
};
pub(crate) const BRAND_COLUMN: DemandColumn = DemandColumn {
    aliases: &["Marca", "Brand"],
};
pub(crate) const QUANTITY_COLUMN: DemandColumn = DemandColumn {
    aliases: &["Unit Quantity", "Quantity"],
};
pub(crate) const AUTOMATIC_RATE_COLUMN: DemandColumn = DemandColumn {
    aliases: &[
        "Cajas por hora línea automatica",
        "Cajas por hora linea automatica",
        "Automatic Rate",
    ],
};
pub(crate) const MANUAL_RATE_COLUMN: DemandColumn = DemandColumn {
    aliases: &[
        "Cajas por hora línea manual",
        "Cajas por hora linea manual",
        "Manual Rate",
    ],
};

/// Accepts whole numbers and spreadsheet-style floats ("100.0"); fractions
/// are truncated.
pub(crate) fn parse_quantity(row: usize, input: &str) -> TabularResult<u64> {
    let trimmed = input.trim();
    if let Ok(value) = trimmed.parse::<u64>() {
        return Ok(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) => quantity_from_f64(row, value),
        Err(_) => Err(TabularError::InvalidQuantity {
            row,
            value: input.to_string(),
        }),
    }
}

pub(crate) fn quantity_from_f64(row: usize, value: f64) -> TabularResult<u64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value.trunc() as u64)
    } else {
        Err(TabularError::InvalidQuantity {
            row,
            value: value.to_string(),
        })
    }
}

pub(crate) fn parse_rate(row: usize, column: &'static str, input: &str) -> TabularResult<f64> {
    match input.trim().parse::<f64>() {
        Ok(value) => check_rate(row, column, value),
        Err(_) => Err(TabularError::InvalidRate {
            row,
            column,
            value: input.to_string(),
        }),
    }
}

pub(crate) fn check_rate(row: usize, column: &'static str, value: f64) -> TabularResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(TabularError::InvalidRate {
            row,
            column,
            value: value.to_string(),
        })
    }
}

pub mod file;
pub mod frame;
pub mod xlsx;

pub use file::{
    load_demand_from_csv, load_demand_from_path, load_plan_rows_from_csv,
    load_workbook_from_json, read_demand_csv, save_plan_to_csv, save_workbook_to_csv_dir,
    save_workbook_to_json, write_plan_csv,
};
pub use frame::demand_from_dataframe;
pub use xlsx::{
    XLSX_CONTENT_TYPE, load_demand_from_xlsx, read_demand_xlsx, save_workbook_to_xlsx,
    write_workbook_xlsx,
};
