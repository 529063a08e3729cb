use super::xlsx::load_demand_from_xlsx;
use super::{
    AUTOMATIC_RATE_COLUMN, BRAND_COLUMN, DemandColumn, MANUAL_RATE_COLUMN, PRODUCT_COLUMN,
    QUANTITY_COLUMN, TabularError, TabularResult, parse_quantity, parse_rate,
};
use crate::demand::DemandRow;
use crate::plan::{
    COL_BRAND, COL_DAY, COL_END_TIME, COL_LINE, COL_MODALITY, COL_PRODUCT, COL_QUANTITY,
    COL_START_TIME, PlanRow, PlanWorkbook, SHEET_FILTERED_VIEW, SHEET_FULL_PLAN,
};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub(super) const PLAN_HEADERS: [&str; 8] = [
    COL_LINE,
    COL_DAY,
    COL_PRODUCT,
    COL_BRAND,
    COL_MODALITY,
    COL_START_TIME,
    COL_END_TIME,
    COL_QUANTITY,
];

/// Column positions of the demand fields in one input file.
#[derive(Debug, Clone, Copy)]
pub(super) struct DemandLayout {
    product: usize,
    brand: usize,
    quantity: usize,
    automatic_rate: usize,
    manual_rate: usize,
}

impl DemandLayout {
    pub(super) fn from_headers(headers: &csv::StringRecord) -> TabularResult<Self> {
        let find = |column: &DemandColumn| {
            column
                .position(headers.iter())
                .ok_or(TabularError::MissingColumn(column.name()))
        };
        Ok(Self {
            product: find(&PRODUCT_COLUMN)?,
            brand: find(&BRAND_COLUMN)?,
            quantity: find(&QUANTITY_COLUMN)?,
            automatic_rate: find(&AUTOMATIC_RATE_COLUMN)?,
            manual_rate: find(&MANUAL_RATE_COLUMN)?,
        })
    }

    pub(super) fn parse(&self, row: usize, record: &csv::StringRecord) -> TabularResult<DemandRow> {
        let field = |idx: usize| record.get(idx).unwrap_or("");
        Ok(DemandRow {
            product: field(self.product).to_string(),
            brand: field(self.brand).to_string(),
            quantity: parse_quantity(row, field(self.quantity))?,
            automatic_rate: parse_rate(
                row,
                AUTOMATIC_RATE_COLUMN.name(),
                field(self.automatic_rate),
            )?,
            manual_rate: parse_rate(row, MANUAL_RATE_COLUMN.name(), field(self.manual_rate))?,
        })
    }
}

/// Reads demand rows from CSV text. Headers may use the Spanish or English
/// column names; extra columns are ignored.
pub fn read_demand_csv<R: Read>(reader: R) -> TabularResult<Vec<DemandRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let layout = DemandLayout::from_headers(&headers)?;

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        rows.push(layout.parse(row, &record)?);
    }
    debug!(rows = rows.len(), "demand loaded");
    Ok(rows)
}

pub fn load_demand_from_csv<P: AsRef<Path>>(path: P) -> TabularResult<Vec<DemandRow>> {
    let file = File::open(path)?;
    read_demand_csv(file)
}

/// Picks the reader from the file extension: `.xlsx`/`.xlsm` as a
/// spreadsheet, anything else as CSV.
pub fn load_demand_from_path<P: AsRef<Path>>(path: P) -> TabularResult<Vec<DemandRow>> {
    let path = path.as_ref();
    let is_spreadsheet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xlsm"));
    if is_spreadsheet {
        load_demand_from_xlsx(path)
    } else {
        load_demand_from_csv(path)
    }
}

pub fn write_plan_csv<W: Write>(rows: &[PlanRow], writer: W) -> TabularResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        writer.write_record(PLAN_HEADERS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_plan_to_csv<P: AsRef<Path>>(rows: &[PlanRow], path: P) -> TabularResult<()> {
    let file = File::create(path)?;
    write_plan_csv(rows, file)
}

pub fn load_plan_rows_from_csv<P: AsRef<Path>>(path: P) -> TabularResult<Vec<PlanRow>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut rows = Vec::new();
    for record in reader.deserialize::<PlanRow>() {
        rows.push(record?);
    }
    Ok(rows)
}

pub fn save_workbook_to_json<P: AsRef<Path>>(
    workbook: &PlanWorkbook,
    path: P,
) -> TabularResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, workbook)?;
    Ok(())
}

pub fn load_workbook_from_json<P: AsRef<Path>>(path: P) -> TabularResult<PlanWorkbook> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

/// Writes one CSV per sheet into `dir`, returning the two file paths.
pub fn save_workbook_to_csv_dir<P: AsRef<Path>>(
    workbook: &PlanWorkbook,
    dir: P,
) -> TabularResult<(PathBuf, PathBuf)> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let full_path = dir.join(format!("{SHEET_FULL_PLAN}.csv"));
    let filtered_path = dir.join(format!("{SHEET_FILTERED_VIEW}.csv"));
    save_plan_to_csv(&workbook.full_plan, &full_path)?;
    save_plan_to_csv(&workbook.filtered_view, &filtered_path)?;
    Ok((full_path, filtered_path))
}
