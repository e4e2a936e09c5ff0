// 📂 File Boundary - Load exported sheets, write reconciled tables
// CSV is always available; xlsx/xls/ods need the `xlsx` feature
// Outputs default to .xlsx, CSV on request

use crate::table::{Cell, Table};
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing::info;

pub const INTERMEDIATE_OUTPUT_FILE: &str = "payment_status_output.xlsx";
pub const FINAL_OUTPUT_FILE: &str = "final_mapped_output.xlsx";

// ============================================================================
// SOURCE FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

impl SourceFormat {
    pub fn name(&self) -> &str {
        match self {
            SourceFormat::Csv => "CSV",
            SourceFormat::Spreadsheet => "Spreadsheet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
        }
    }

    /// Output file names (intermediate, final) for this format
    pub fn file_names(&self) -> (String, String) {
        match self {
            OutputFormat::Xlsx => (
                INTERMEDIATE_OUTPUT_FILE.to_string(),
                FINAL_OUTPUT_FILE.to_string(),
            ),
            OutputFormat::Csv => (
                Path::new(INTERMEDIATE_OUTPUT_FILE)
                    .with_extension("csv")
                    .display()
                    .to_string(),
                Path::new(FINAL_OUTPUT_FILE)
                    .with_extension("csv")
                    .display()
                    .to_string(),
            ),
        }
    }
}

/// Detect the format from the file extension
pub fn detect_format(file_path: &Path) -> Result<SourceFormat> {
    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(SourceFormat::Csv),
        "xlsx" | "xlsm" | "xls" | "ods" => Ok(SourceFormat::Spreadsheet),
        _ => Err(anyhow!("Unsupported file type: {:?}", file_path)),
    }
}

fn header_name(raw: &str, position: usize) -> String {
    let raw = raw.trim_start_matches('\u{feff}');
    if raw.is_empty() {
        format!("Unnamed: {}", position)
    } else {
        raw.to_string()
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Load the first sheet of a file as a table; the first row is the header
pub fn load_table(file_path: &Path, name: &str) -> Result<Table> {
    let format = detect_format(file_path)?;
    let table = match format {
        SourceFormat::Csv => load_csv(file_path, name)?,
        SourceFormat::Spreadsheet => load_spreadsheet(file_path, name)?,
    };

    info!(
        table = name,
        format = format.name(),
        rows = table.len(),
        columns = table.width(),
        "loaded {}",
        file_path.display()
    );

    Ok(table)
}

pub fn load_csv(file_path: &Path, name: &str) -> Result<Table> {
    let mut rdr = csv::Reader::from_path(file_path)
        .with_context(|| format!("Failed to open CSV file: {:?}", file_path))?;

    let columns = rdr
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .enumerate()
        .map(|(i, h)| header_name(h, i))
        .collect();

    let mut table = Table::new(name, columns);

    for result in rdr.records() {
        let record = result.context("Failed to read CSV record")?;
        let row = record.iter().map(Cell::from_text).collect();
        table.push_row(row)?;
    }

    Ok(table)
}

#[cfg(feature = "xlsx")]
pub fn load_spreadsheet(file_path: &Path, name: &str) -> Result<Table> {
    use calamine::{open_workbook_auto, Data, Reader};

    fn to_cell(data: &Data) -> Cell {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::from_text(s),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            other => Cell::Text(other.to_string()),
        }
    }

    let mut workbook = open_workbook_auto(file_path)
        .with_context(|| format!("Failed to open spreadsheet: {:?}", file_path))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Spreadsheet has no worksheets: {:?}", file_path))?
        .with_context(|| format!("Failed to read first worksheet: {:?}", file_path))?;

    // A range starts at its first non-empty cell. Blank leading rows are
    // skipped like blank CSV lines, blank leading columns are kept.
    let leading = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let pad = |row: &[Data]| -> Vec<Cell> {
        std::iter::repeat(Cell::Empty)
            .take(leading)
            .chain(row.iter().map(to_cell))
            .collect()
    };

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::new(name, Vec::new()));
    };

    let columns = pad(header)
        .iter()
        .enumerate()
        .map(|(i, h)| header_name(&h.to_string(), i))
        .collect();

    let mut table = Table::new(name, columns);
    for row in rows {
        table.push_row(pad(row))?;
    }

    Ok(table)
}

#[cfg(not(feature = "xlsx"))]
pub fn load_spreadsheet(file_path: &Path, _name: &str) -> Result<Table> {
    anyhow::bail!(
        "Spreadsheet support not compiled in ({:?}); rebuild with --features xlsx or export to CSV",
        file_path
    )
}

// ============================================================================
// WRITING
// ============================================================================

/// Write by extension: `.xlsx` or `.csv`
pub fn write_table(table: &Table, file_path: &Path) -> Result<()> {
    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" => write_xlsx(table, file_path),
        "csv" => write_csv(table, file_path),
        _ => Err(anyhow!("Unsupported output type: {:?}", file_path)),
    }
}

/// Header row, no index column
pub fn write_csv(table: &Table, file_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(file_path)
        .with_context(|| format!("Failed to create output file: {:?}", file_path))?;

    wtr.write_record(table.columns())
        .context("Failed to write CSV header")?;

    for row in table.rows() {
        wtr.write_record(row.iter().map(|c| c.to_string()))
            .context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV output")?;

    info!(table = table.name(), rows = table.len(), "wrote {}", file_path.display());
    Ok(())
}

/// Single worksheet, header row, no index column. Blank cells stay unwritten.
#[cfg(feature = "xlsx")]
pub fn write_xlsx(table: &Table, file_path: &Path) -> Result<()> {
    use rust_xlsxwriter::Workbook;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (c, name) in table.columns().iter().enumerate() {
        let col = u16::try_from(c).context("Too many columns for a worksheet")?;
        sheet
            .write_string(0, col, name.as_str())
            .context("Failed to write worksheet header")?;
    }

    for (r, row) in table.rows().iter().enumerate() {
        let line = u32::try_from(r + 1).context("Too many rows for a worksheet")?;
        for (c, cell) in row.iter().enumerate() {
            let col = u16::try_from(c).context("Too many columns for a worksheet")?;
            let written = match cell {
                Cell::Empty => continue,
                Cell::Text(text) => sheet.write_string(line, col, text.as_str()),
                Cell::Number(n) => sheet.write_number(line, col, *n),
                Cell::Bool(b) => sheet.write_boolean(line, col, *b),
            };
            written.with_context(|| format!("Failed to write cell ({}, {})", line, col))?;
        }
    }

    workbook
        .save(file_path)
        .with_context(|| format!("Failed to create output file: {:?}", file_path))?;

    info!(table = table.name(), rows = table.len(), "wrote {}", file_path.display());
    Ok(())
}

#[cfg(not(feature = "xlsx"))]
pub fn write_xlsx(_table: &Table, file_path: &Path) -> Result<()> {
    anyhow::bail!(
        "Spreadsheet support not compiled in ({:?}); rebuild with --features xlsx or write CSV",
        file_path
    )
}

// ============================================================================
// TESTS
// ============================================================================
