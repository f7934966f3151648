use std::path::{Path, PathBuf};

use crate::dataset::{Dataset, AMOUNT, DATE, INFO, STORED_DATE_FORMAT, TYPE};
use crate::error::{PennyError, Result};
use crate::settings::Settings;
use crate::table_format::supported_extensions;

pub const RAW_STEM: &str = "raw";
pub const CLASSIFIED: &str = "classified.csv";
pub const UNCLASSIFIED: &str = "unclassified.csv";
pub const EXCLUDED_RETURNS: &str = "excluded_returns.csv";
pub const MAPPINGS: &str = "mappings.json";
pub const CATEGORIES: &str = "categories.json";

/// Columns every statement file written by penny carries.
pub const STATEMENT_COLUMNS: &[&str] = &[DATE, AMOUNT, INFO, TYPE];

/// Durable files under one data directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let dir = PathBuf::from(&settings.data_dir);
        if dir.exists() && !dir.is_dir() {
            return Err(PennyError::Settings(format!(
                "data directory {} is not a directory",
                dir.display()
            )));
        }
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First `raw.<ext>` present, in supported-format order.
    pub fn raw_file(&self) -> Option<PathBuf> {
        supported_extensions()
            .map(|ext| self.dir.join(format!("{RAW_STEM}.{ext}")))
            .find(|p| p.is_file())
    }

    pub fn classified(&self) -> PathBuf {
        self.dir.join(CLASSIFIED)
    }

    pub fn unclassified(&self) -> PathBuf {
        self.dir.join(UNCLASSIFIED)
    }

    pub fn excluded_returns(&self) -> PathBuf {
        self.dir.join(EXCLUDED_RETURNS)
    }

    pub fn mappings(&self) -> PathBuf {
        self.dir.join(MAPPINGS)
    }

    pub fn categories(&self) -> PathBuf {
        self.dir.join(CATEGORIES)
    }

    /// Load a statement file written by a previous import. A missing file
    /// is an empty statement.
    pub fn read_statements(&self, path: &Path) -> Result<Dataset> {
        let mut data = Dataset::read(path, STATEMENT_COLUMNS)?;
        data.validate(&[DATE, AMOUNT, INFO])?;
        data.ensure_columns(&[TYPE]);
        data.set_dates(DATE, STORED_DATE_FORMAT)?;
        data.set_numeric(AMOUNT)?;
        Ok(data)
    }

    /// Remove the outputs of a previous import.
    pub fn remove_outputs(&self) -> Result<()> {
        for path in [self.excluded_returns(), self.unclassified(), self.classified()] {
            delete_file(&path)?;
        }
        Ok(())
    }
}

/// Delete `path`; returns whether anything was removed.
pub fn delete_file(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("deleted {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
