use thiserror::Error;

use crate::categories::TEMPLATE;

#[derive(Error, Debug)]
pub enum PennyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[cfg(feature = "xlsx")]
    #[error("XLSX error: {0}")]
    Xlsx(String),

    #[error("{0}")]
    Categories(String),

    #[error("Invalid keyword '{pattern}' for category '{category}': {source}")]
    BadPattern {
        category: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Mandatory column(s) not found in {file}: {}", .columns.join(", "))]
    MissingColumns { file: String, columns: Vec<String> },

    #[error("\"{column}\" column contains non-numeric values (IDs: {})", join_ids(.ids))]
    NonNumeric { column: String, ids: Vec<u64> },

    #[error("\"{column}\" column has values not matching {format} (IDs: {})", join_ids(.ids))]
    BadDate {
        column: String,
        format: String,
        ids: Vec<u64>,
    },

    #[error("Invalid row ID in {file}: {value}")]
    BadId { file: String, value: String },

    #[error("Cannot drop rows with these IDs, they are not in {file}: {}", join_ids(.ids))]
    UnknownRows { file: String, ids: Vec<u64> },

    #[error("Nested lists not supported: {0}")]
    NestedList(String),

    #[error("Cannot create duplicate categories: {0}")]
    DuplicateCategory(String),

    #[error("Cannot delete non-existent categories: {0}")]
    UnknownCategory(String),

    #[error("Invalid categories entered: {0:?}")]
    InvalidCategories(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl PennyError {
    /// Unusable category definitions, explained with an example of the expected shape.
    pub fn categories(reason: impl std::fmt::Display) -> Self {
        Self::Categories(format!(
            "Category definitions not usable: {reason}\n \
             >> Define each category as a list of keywords.\n    \
             \"BLACKLIST\" is an optional reserved category name: matching\n    \
             transactions are excluded from spending.\n\nFor example...\n{TEMPLATE}"
        ))
    }
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, PennyError>;
