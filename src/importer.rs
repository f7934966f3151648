//! Turns a raw bank statement into the classified and unclassified sets.

use crate::classifier::{Classifier, Keywords};
use crate::dataset::{Dataset, AMOUNT, DATE, DESCRIPTION, EXTRA, INFO, TYPE};
use crate::error::{PennyError, Result};
use crate::matcher::{remove_returns, MatchedPair};
use crate::settings::Settings;
use crate::store::Store;
use crate::summary::{self, Count, TransactionSummary};
use crate::workspace::{Workspace, EXCLUDED_RETURNS};

/// Columns kept from a raw statement. `Extra` is optional.
pub const RAW_COLUMNS: &[&str] = &[DATE, DESCRIPTION, EXTRA, AMOUNT];
pub const MANDATORY_COLUMNS: &[&str] = &[DATE, DESCRIPTION, AMOUNT];

#[derive(Debug)]
pub struct ImportResult {
    pub source: String,
    pub summary: TransactionSummary,
    /// Rows written to the unclassified file, one per distinct `Info`.
    pub to_review: usize,
    pub matched_returns: Vec<MatchedPair>,
    pub audited_returns: usize,
}

impl ImportResult {
    fn empty(source: String) -> Self {
        Self {
            source,
            summary: TransactionSummary::default(),
            to_review: 0,
            matched_returns: Vec::new(),
            audited_returns: 0,
        }
    }
}

/// Import the raw statement, replacing the outputs of any previous import.
///
/// Every validation step runs before old outputs are removed, so a bad
/// statement or keyword dictionary leaves the workspace untouched.
pub fn migrate(ws: &Workspace, settings: &Settings) -> Result<ImportResult> {
    let raw_path = ws.raw_file().ok_or_else(|| {
        PennyError::Other(format!(
            "No raw statement found in {} (expected raw.csv or raw.xlsx)",
            ws.dir().display()
        ))
    })?;
    let source = raw_path.display().to_string();

    let mut data = Dataset::read(&raw_path, MANDATORY_COLUMNS)?;
    if data.is_blank() {
        tracing::warn!("{source} has no transactions");
        return Ok(ImportResult::empty(source));
    }
    data.retain_columns(RAW_COLUMNS);
    data.validate(MANDATORY_COLUMNS)?;
    data.ensure_columns(&[EXTRA]);

    let keywords = Keywords::load(&ws.categories())?;
    let mappings = Store::load(&ws.mappings())?;

    data.set_dates(DATE, &settings.date_format)?;
    data.set_numeric(AMOUNT)?;
    data.merge_columns(DESCRIPTION, EXTRA, INFO, &settings.info_separator, true)?;

    ws.remove_outputs()?;

    let report = remove_returns(&mut data, EXCLUDED_RETURNS)?;
    if !report.excluded.is_blank() {
        report.excluded.write(&ws.excluded_returns())?;
    }

    Classifier::new(&mappings, &keywords).apply(&mut data);
    if !data.is_blank() {
        data.write(&ws.classified())?;
    }

    let mut unclassified = data.filter(|r| r.is_blank(TYPE));
    unclassified.drop_duplicates(&[INFO]);
    unclassified.sort_by(INFO);
    if !unclassified.is_blank() {
        unclassified.write(&ws.unclassified())?;
    }

    let audited_returns = report.unresolved();
    Ok(ImportResult {
        source,
        summary: summary::transactions(&data, Count::Total),
        to_review: unclassified.count_rows(),
        matched_returns: report.pairs,
        audited_returns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::STORED_DATE_FORMAT;

    const CATEGORIES: &str = r#"{
        "BLACKLIST": ["FASTER PAYMENT RECEIVED"],
        "Groceries": ["TESCO", "LIDL"],
        "Entertainment": ["ODEON"]
    }"#;

    fn workspace(raw: &str, categories: Option<&str>) -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        std::fs::write(dir.path().join("raw.csv"), raw).unwrap();
        if let Some(c) = categories {
            std::fs::write(ws.categories(), c).unwrap();
        }
        (dir, ws)
    }

    #[test]
    fn test_migrate_splits_classified_and_unclassified() {
        let (_dir, ws) = workspace(
            "Date,Description,Extra,Amount,Balance\n\
             01/01/2025,TESCO STORES,1234,12.50,100\n\
             02/01/2025,CORNER SHOP,,3.20,96.8\n\
             03/01/2025,CORNER SHOP,,3.20,93.6\n\
             04/01/2025,ODEON,,9.00,84.6\n\
             05/01/2025,FASTER PAYMENT RECEIVED,,-200,284.6\n",
            Some(CATEGORIES),
        );
        let result = migrate(&ws, &Settings::default()).unwrap();
        assert_eq!(
            result.summary,
            TransactionSummary {
                total: 5,
                classified: 3,
                unclassified: 2
            }
        );
        assert_eq!(result.to_review, 1);

        let classified = ws.read_statements(&ws.classified()).unwrap();
        assert!(!classified.has_column("Balance"));
        assert_eq!(classified.get(1).unwrap().text(INFO), "TESCO STORES|1234");
        assert_eq!(classified.get(1).unwrap().text(TYPE), "Groceries");
        assert_eq!(classified.get(5).unwrap().text(TYPE), "BLACKLIST");

        let unclassified = ws.read_statements(&ws.unclassified()).unwrap();
        assert_eq!(unclassified.ids(), vec![2]);
    }

    #[test]
    fn test_migrate_removes_returns_and_writes_audit() {
        let (_dir, ws) = workspace(
            "Date,Description,Amount\n\
             01/02/2025,LIDL,-20\n\
             03/02/2025,LIDL,20\n\
             08/02/2025,LIDL,-20\n\
             09/02/2025,TESCO,7\n",
            Some(CATEGORIES),
        );
        let result = migrate(&ws, &Settings::default()).unwrap();
        assert_eq!(result.matched_returns.len(), 1);
        assert_eq!(result.audited_returns, 1);

        let classified = ws.read_statements(&ws.classified()).unwrap();
        assert_eq!(classified.ids(), vec![1, 4]);
        let audit = std::fs::read_to_string(ws.excluded_returns()).unwrap();
        assert!(audit.starts_with("ID,Date,Amount,Info,Matched ID\n"));
        assert!(audit.contains("3,2025-02-08,-20,LIDL|,2\n"));
        assert!(audit.contains("1,2025-02-01,-20,LIDL|,\n"));
    }

    #[test]
    fn test_migrate_uses_learned_mappings_first() {
        let (_dir, ws) = workspace(
            "Date,Description,Amount\n01/01/2025,TESCO,5\n",
            Some(CATEGORIES),
        );
        std::fs::write(ws.mappings(), r#"{"TESCO|": "Home"}"#).unwrap();
        migrate(&ws, &Settings::default()).unwrap();
        let classified = ws.read_statements(&ws.classified()).unwrap();
        assert_eq!(classified.get(1).unwrap().text(TYPE), "Home");
        assert!(!ws.unclassified().exists());
    }

    #[test]
    fn test_migrate_replaces_old_outputs() {
        let (_dir, ws) = workspace(
            "Date,Description,Amount\n01/01/2025,TESCO,5\n",
            Some(CATEGORIES),
        );
        std::fs::write(ws.unclassified(), "ID,Date,Amount,Info,Type\n9,2024-01-01,1,OLD|,\n").unwrap();
        std::fs::write(ws.excluded_returns(), "stale").unwrap();
        migrate(&ws, &Settings::default()).unwrap();
        assert!(!ws.unclassified().exists());
        assert!(!ws.excluded_returns().exists());
    }

    #[test]
    fn test_missing_categories_aborts_before_writing() {
        let (_dir, ws) = workspace("Date,Description,Amount\n01/01/2025,TESCO,5\n", None);
        std::fs::write(ws.classified(), "keep me").unwrap();
        let err = migrate(&ws, &Settings::default()).unwrap_err();
        assert!(matches!(err, PennyError::Categories(_)));
        assert_eq!(std::fs::read_to_string(ws.classified()).unwrap(), "keep me");
    }

    #[test]
    fn test_missing_columns_are_all_reported() {
        let (_dir, ws) = workspace("When,Description\n01/01/2025,TESCO\n", Some(CATEGORIES));
        match migrate(&ws, &Settings::default()) {
            Err(PennyError::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec!["Date".to_string(), "Amount".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_amount_names_rows() {
        let (_dir, ws) = workspace(
            "Date,Description,Amount\n01/01/2025,TESCO,5\n02/01/2025,LIDL,five\n",
            Some(CATEGORIES),
        );
        assert!(matches!(
            migrate(&ws, &Settings::default()),
            Err(PennyError::NonNumeric { ids, .. }) if ids == vec![2]
        ));
        assert!(!ws.classified().exists());
    }

    #[test]
    fn test_configured_date_format_and_separator() {
        let (_dir, ws) = workspace(
            "Date,Description,Extra,Amount\n2025-03-04,TESCO,EXPRESS,5\n",
            Some(CATEGORIES),
        );
        let settings = Settings {
            date_format: STORED_DATE_FORMAT.to_string(),
            info_separator: " / ".to_string(),
            ..Settings::default()
        };
        migrate(&ws, &settings).unwrap();
        let classified = ws.read_statements(&ws.classified()).unwrap();
        assert_eq!(classified.get(1).unwrap().text(INFO), "TESCO / EXPRESS");
    }

    #[test]
    fn test_missing_raw_file() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        assert!(migrate(&ws, &Settings::default()).is_err());
    }

    #[test]
    fn test_empty_raw_file_is_not_an_error() {
        let (_dir, ws) = workspace("Date,Description,Amount\n", Some(CATEGORIES));
        let result = migrate(&ws, &Settings::default()).unwrap();
        assert_eq!(result.summary.total, 0);
        assert!(!ws.classified().exists());
    }
}
