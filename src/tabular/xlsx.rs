use super::file::{DemandLayout, PLAN_HEADERS};
use super::{TabularError, TabularResult};
use crate::demand::DemandRow;
use crate::plan::{PlanRow, PlanWorkbook, SHEET_FILTERED_VIEW, SHEET_FULL_PLAN};
use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::debug;

/// MIME type of an `.xlsx` workbook.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const COLUMN_WIDTHS: [f64; 8] = [6.0, 11.0, 32.0, 16.0, 12.0, 11.0, 11.0, 10.0];

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

/// Demand rows from the first worksheet of an `.xlsx` workbook. The first row
/// holds the headers; blank rows are skipped.
pub fn read_demand_xlsx<RS: Read + Seek>(reader: RS) -> TabularResult<Vec<DemandRow>> {
    let mut workbook: Xlsx<RS> = open_workbook_from_rs(reader)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(TabularError::EmptyWorkbook)??;

    let mut records = range.rows().map(|cells| {
        csv::StringRecord::from(cells.iter().map(cell_text).collect::<Vec<_>>())
    });
    let Some(headers) = records.next() else {
        return Ok(Vec::new());
    };
    let layout = DemandLayout::from_headers(&headers)?;

    let mut rows = Vec::new();
    for record in records.filter(|record| record.iter().any(|field| !field.is_empty())) {
        rows.push(layout.parse(rows.len(), &record)?);
    }
    debug!(rows = rows.len(), "demand loaded from spreadsheet");
    Ok(rows)
}

pub fn load_demand_from_xlsx<P: AsRef<Path>>(path: P) -> TabularResult<Vec<DemandRow>> {
    let file = File::open(path)?;
    read_demand_xlsx(BufReader::new(file))
}

fn build_workbook(plan_workbook: &PlanWorkbook) -> TabularResult<Workbook> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheets = [
        (SHEET_FULL_PLAN, &plan_workbook.full_plan),
        (SHEET_FILTERED_VIEW, &plan_workbook.filtered_view),
    ];

    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        for (col, title) in PLAN_HEADERS.iter().enumerate() {
            sheet.write_with_format(0, col as u16, *title, &header)?;
            sheet.set_column_width(col as u16, COLUMN_WIDTHS[col])?;
        }
        for (idx, row) in rows.iter().enumerate() {
            write_plan_row(sheet, idx as u32 + 1, row)?;
        }
    }
    Ok(workbook)
}

fn write_plan_row(sheet: &mut Worksheet, at: u32, row: &PlanRow) -> TabularResult<()> {
    sheet.write_number(at, 0, f64::from(row.line))?;
    sheet.write_string(at, 1, row.day.as_str())?;
    sheet.write_string(at, 2, row.product.as_str())?;
    sheet.write_string(at, 3, row.brand.as_str())?;
    sheet.write_string(at, 4, row.modality.as_str())?;
    sheet.write_string(at, 5, row.start_time.as_str())?;
    sheet.write_string(at, 6, row.end_time.as_str())?;
    sheet.write_number(at, 7, row.quantity as f64)?;
    Ok(())
}

/// The two plan sheets as `.xlsx` bytes.
pub fn write_workbook_xlsx(plan_workbook: &PlanWorkbook) -> TabularResult<Vec<u8>> {
    Ok(build_workbook(plan_workbook)?.save_to_buffer()?)
}

pub fn save_workbook_to_xlsx<P: AsRef<Path>>(
    plan_workbook: &PlanWorkbook,
    path: P,
) -> TabularResult<()> {
    build_workbook(plan_workbook)?.save(path.as_ref())?;
    Ok(())
}
