use std::path::Path;

use crate::dataset::Cell;
use crate::error::{PennyError, Result};

/// Header plus records, before ids and column types are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<Cell>>,
}

// ---------------------------------------------------------------------------
// Table formats, picked by file extension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableFormat {
    Csv,
    #[cfg(feature = "xlsx")]
    Xlsx,
}

const ALL_FORMATS: &[TableFormat] = &[
    TableFormat::Csv,
    #[cfg(feature = "xlsx")]
    TableFormat::Xlsx,
];

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            #[cfg(feature = "xlsx")]
            Self::Xlsx => "xlsx",
        }
    }

    pub fn for_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        ALL_FORMATS
            .iter()
            .find(|f| f.extension() == ext)
            .copied()
            .ok_or_else(|| PennyError::Other(format!("Unsupported table file: {}", path.display())))
    }

    pub fn read(&self, path: &Path) -> Result<RawTable> {
        match self {
            Self::Csv => read_csv(path),
            #[cfg(feature = "xlsx")]
            Self::Xlsx => read_xlsx(path),
        }
    }

    pub fn write(&self, path: &Path, table: &RawTable) -> Result<()> {
        match self {
            Self::Csv => write_csv(path, table),
            #[cfg(feature = "xlsx")]
            Self::Xlsx => Err(PennyError::Other(format!(
                "Writing .xlsx is not supported: {}",
                path.display()
            ))),
        }
    }
}

/// Statement files in the data directory, in lookup order.
pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    ALL_FORMATS.iter().map(|f| f.extension())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let mut cells: Vec<Cell> = record.iter().map(Cell::text).collect();
        cells.resize(headers.len(), Cell::Empty);
        records.push(cells);
    }
    Ok(RawTable { headers, records })
}

fn write_csv(path: &Path, table: &RawTable) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&table.headers)?;
    for record in &table.records {
        wtr.write_record(record.iter().map(|c| c.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// XLSX (read-only, feature-gated)
// ---------------------------------------------------------------------------

#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_date(serial: f64) -> Option<chrono::NaiveDate> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
}

#[cfg(feature = "xlsx")]
fn read_xlsx(path: &Path) -> Result<RawTable> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| PennyError::Xlsx(format!("Failed to open {}: {e}", path.display())))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(RawTable {
            headers: Vec::new(),
            records: Vec::new(),
        });
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| PennyError::Xlsx(format!("Failed to read sheet {sheet}: {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => Vec::new(),
    };
    let mut records = Vec::new();
    for row in rows {
        let mut cells: Vec<Cell> = row
            .iter()
            .map(|data| match data {
                Data::Empty => Cell::Empty,
                Data::String(s) => Cell::text(s.trim()),
                Data::Float(f) => Cell::Number(*f),
                Data::Int(i) => Cell::Number(*i as f64),
                Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
                    .map(Cell::Date)
                    .unwrap_or(Cell::Empty),
                other => Cell::text(other.to_string()),
            })
            .collect();
        if cells.iter().all(Cell::is_empty) {
            continue;
        }
        cells.resize(headers.len(), Cell::Empty);
        records.push(cells);
    }
    Ok(RawTable { headers, records })
}
