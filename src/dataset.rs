//! In-memory table keyed by a unique `ID` column.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::{PennyError, Result};
use crate::table_format::{RawTable, TableFormat};

pub const ID: &str = "ID";
pub const DATE: &str = "Date";
pub const DESCRIPTION: &str = "Description";
pub const EXTRA: &str = "Extra";
pub const AMOUNT: &str = "Amount";
pub const INFO: &str = "Info";
pub const TYPE: &str = "Type";

/// Date format used by every file penny writes.
pub const STORED_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Number(_) => 1,
            Self::Date(_) => 2,
            Self::Text(_) => 3,
        }
    }

    fn compare(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.format(STORED_DATE_FORMAT)),
        }
    }
}

static EMPTY: Cell = Cell::Empty;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: u64,
    cells: BTreeMap<String, Cell>,
}

impl Row {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            cells: BTreeMap::new(),
        }
    }

    pub fn with(mut self, column: &str, cell: Cell) -> Self {
        self.set(column, cell);
        self
    }

    pub fn cell(&self, column: &str) -> &Cell {
        self.cells.get(column).unwrap_or(&EMPTY)
    }

    /// Empty cells are not stored.
    pub fn set(&mut self, column: &str, cell: Cell) {
        if cell == Cell::Empty {
            self.cells.remove(column);
        } else {
            self.cells.insert(column.to_string(), cell);
        }
    }

    /// Stringified cell; empty cells give `""`.
    pub fn text(&self, column: &str) -> String {
        self.cell(column).to_string()
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        match self.cell(column) {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        match self.cell(column) {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_blank(&self, column: &str) -> bool {
        self.cell(column).is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Read a table; a missing file gives an empty table with `mandatory` columns.
    pub fn read(path: &Path, mandatory: &[&str]) -> Result<Self> {
        let name = file_name(path);
        if !path.exists() {
            tracing::debug!("{} not found, starting empty", path.display());
            return Ok(Self::new(&name, mandatory));
        }
        let raw = TableFormat::for_path(path)?.read(path)?;
        Self::from_raw(&name, raw)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        TableFormat::for_path(path)?.write(path, &self.to_raw())?;
        tracing::debug!("wrote {} ({} rows)", path.display(), self.rows.len());
        Ok(())
    }

    pub fn from_raw(name: &str, raw: RawTable) -> Result<Self> {
        let id_idx = raw.headers.iter().position(|h| h == ID);
        let columns: Vec<String> = raw
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != id_idx)
            .map(|(_, h)| h.clone())
            .collect();
        let mut data = Self {
            name: name.to_string(),
            columns: columns.clone(),
            rows: Vec::with_capacity(raw.records.len()),
        };
        let mut seen = HashSet::new();
        for (n, record) in raw.records.into_iter().enumerate() {
            let id = match id_idx {
                Some(idx) => parse_id(name, record.get(idx).unwrap_or(&EMPTY))?,
                None => n as u64 + 1,
            };
            if !seen.insert(id) {
                return Err(PennyError::BadId {
                    file: name.to_string(),
                    value: format!("{id} (duplicate)"),
                });
            }
            let mut row = Row::new(id);
            for (i, cell) in record.into_iter().enumerate() {
                if Some(i) == id_idx {
                    continue;
                }
                if let Some(header) = raw.headers.get(i) {
                    row.set(header, cell);
                }
            }
            data.rows.push(row);
        }
        Ok(data)
    }

    pub fn to_raw(&self) -> RawTable {
        let mut headers = vec![ID.to_string()];
        headers.extend(self.columns.iter().cloned());
        let records = self
            .rows
            .iter()
            .map(|row| {
                let mut record = vec![Cell::Number(row.id as f64)];
                record.extend(self.columns.iter().map(|c| row.cell(c).clone()));
                record
            })
            .collect();
        RawTable { headers, records }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn ids(&self) -> Vec<u64> {
        self.rows.iter().map(|r| r.id).collect()
    }

    pub fn get(&self, id: u64) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn count_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_blank(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row. Its id must not already be present.
    pub fn push(&mut self, row: Row) -> Result<()> {
        if self.get(row.id).is_some() {
            return Err(PennyError::BadId {
                file: self.name.clone(),
                value: format!("{} (duplicate)", row.id),
            });
        }
        for column in row.cells.keys() {
            if !self.has_column(column) {
                self.columns.push(column.clone());
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Fails naming every absent column at once.
    pub fn validate(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PennyError::MissingColumns {
                file: self.name.clone(),
                columns: missing,
            })
        }
    }

    pub fn ensure_columns(&mut self, columns: &[&str]) {
        for column in columns {
            if !self.has_column(column) {
                self.columns.push(column.to_string());
            }
        }
    }

    /// Keep only `keep` columns, in their current order.
    pub fn retain_columns(&mut self, keep: &[&str]) {
        let drop: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !keep.contains(&c.as_str()))
            .cloned()
            .collect();
        let drop: Vec<&str> = drop.iter().map(String::as_str).collect();
        self.drop_columns(&drop);
    }

    pub fn drop_columns(&mut self, columns: &[&str]) {
        self.columns.retain(|c| !columns.contains(&c.as_str()));
        for row in &mut self.rows {
            row.cells.retain(|c, _| !columns.contains(&c.as_str()));
        }
    }

    /// `new = str(a) + separator + str(b)`, optionally dropping `a` and `b`.
    pub fn merge_columns(
        &mut self,
        a: &str,
        b: &str,
        new: &str,
        separator: &str,
        replace: bool,
    ) -> Result<()> {
        self.validate(&[a, b])?;
        for row in &mut self.rows {
            let merged = format!("{}{separator}{}", row.text(a), row.text(b));
            row.set(new, Cell::text(merged));
        }
        self.ensure_columns(&[new]);
        if replace {
            self.drop_columns(&[a, b]);
        }
        Ok(())
    }

    /// Parse a text column into dates; reports every unparseable row.
    pub fn set_dates(&mut self, column: &str, format: &str) -> Result<()> {
        self.validate(&[column])?;
        let mut bad = Vec::new();
        for row in &mut self.rows {
            let parsed = match row.cell(column) {
                Cell::Empty | Cell::Date(_) => continue,
                Cell::Text(s) => NaiveDate::parse_from_str(s.trim(), format).ok(),
                Cell::Number(_) => None,
            };
            match parsed {
                Some(date) => row.set(column, Cell::Date(date)),
                None => bad.push(row.id),
            }
        }
        if bad.is_empty() {
            Ok(())
        } else {
            Err(PennyError::BadDate {
                column: column.to_string(),
                format: format.to_string(),
                ids: bad,
            })
        }
    }

    /// Convert a column to numbers; blank or unparseable cells fail.
    pub fn set_numeric(&mut self, column: &str) -> Result<()> {
        self.validate(&[column])?;
        let mut bad = Vec::new();
        for row in &mut self.rows {
            let parsed = match row.cell(column) {
                Cell::Number(_) => continue,
                Cell::Text(s) => parse_amount(s),
                Cell::Empty | Cell::Date(_) => None,
            };
            match parsed {
                Some(n) => row.set(column, Cell::Number(n)),
                None => bad.push(row.id),
            }
        }
        if bad.is_empty() {
            Ok(())
        } else {
            Err(PennyError::NonNumeric {
                column: column.to_string(),
                ids: bad,
            })
        }
    }

    pub fn set_values<F>(&mut self, column: &str, mut f: F)
    where
        F: FnMut(&Row) -> Cell,
    {
        self.ensure_columns(&[column]);
        for row in &mut self.rows {
            let cell = f(row);
            row.set(column, cell);
        }
    }

    /// Remove every row in `ids`. Fails without removing anything when
    /// any id is absent.
    pub fn drop_rows(&mut self, ids: &[u64]) -> Result<()> {
        let present: HashSet<u64> = self.rows.iter().map(|r| r.id).collect();
        let missing: Vec<u64> = ids.iter().copied().filter(|id| !present.contains(id)).collect();
        if !missing.is_empty() {
            return Err(PennyError::UnknownRows {
                file: self.name.clone(),
                ids: missing,
            });
        }
        let drop: HashSet<u64> = ids.iter().copied().collect();
        self.rows.retain(|r| !drop.contains(&r.id));
        Ok(())
    }

    pub fn filter<P>(&self, mut predicate: P) -> Dataset
    where
        P: FnMut(&Row) -> bool,
    {
        Dataset {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    pub fn retain<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&Row) -> bool,
    {
        self.rows.retain(|r| predicate(r));
    }

    /// Patch rows of `self` with the non-empty cells of `other`.
    ///
    /// Only ids and columns already in `self` are touched: rows that exist
    /// only in `other` are not added. An empty `self` is replaced wholesale.
    pub fn update(&mut self, other: &Dataset) {
        if self.is_blank() {
            let name = std::mem::take(&mut self.name);
            *self = other.clone();
            self.name = name;
            return;
        }
        for incoming in &other.rows {
            let Some(row) = self.rows.iter_mut().find(|r| r.id == incoming.id) else {
                tracing::debug!("update skips ID {} absent from {}", incoming.id, self.name);
                continue;
            };
            for column in &self.columns {
                let cell = incoming.cell(column);
                if other.has_column(column) && !cell.is_empty() {
                    row.set(column, cell.clone());
                }
            }
        }
    }

    /// Keep the first row for each distinct combination of `subset` values.
    pub fn drop_duplicates(&mut self, subset: &[&str]) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| {
            let key: Vec<String> = subset.iter().map(|c| row.text(c)).collect();
            seen.insert(key)
        });
    }

    /// Stable sort on one column.
    pub fn sort_by(&mut self, column: &str) {
        self.rows
            .sort_by(|a, b| a.cell(column).compare(b.cell(column)));
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn parse_id(file: &str, cell: &Cell) -> Result<u64> {
    let bad = || PennyError::BadId {
        file: file.to_string(),
        value: cell.to_string(),
    };
    match cell {
        Cell::Number(n) if n.fract() == 0.0 && *n >= 0.0 => Ok(*n as u64),
        Cell::Text(s) => s.trim().parse().map_err(|_| bad()),
        _ => Err(bad()),
    }
}

/// Parse a statement amount: `1,234.56`, `$50`, `(500.00)` for negatives.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.trim().parse::<f64>().ok().filter(|n| n.is_finite()).map(|n| -n);
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}
