//! Adding and deleting categories in the keyword dictionary.
//!
//! Deleting a category also forgets every learned mapping that points at it.

use crate::classifier::Keywords;
use crate::error::{PennyError, Result};
use crate::store::{Store, Value};

/// Example `categories.json`, shown whenever the dictionary is unusable.
pub const TEMPLATE: &str = r#"{
    "BLACKLIST": ["PAYING IN", "FASTER PAYMENT RECEIVED"],
    "Eating out": ["KFC", "NANDOS", "JUST-EAT"],
    "Groceries": ["TESCO", "LIDL", "SAINSBURYS"],
    "Travel": ["TFL", "RAIL"]
}"#;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryChange {
    /// Names as stored in the dictionary.
    pub categories: Vec<String>,
    /// Whether categories were already defined before this change, meaning
    /// earlier imports used them and should be re-run.
    pub reprocess: bool,
}

/// Split comma separated names, dropping blanks.
pub fn parse_names(params: &str) -> Result<Vec<String>> {
    let names: Vec<String> = params
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .collect();
    if names.is_empty() {
        return Err(PennyError::InvalidCategories(params.to_string()));
    }
    Ok(names)
}

pub fn add(categories: &mut Store, names: &[String], keywords: &[String]) -> Result<CategoryChange> {
    let reprocess = !categories.is_empty();
    let duplicates: Vec<&str> = names
        .iter()
        .enumerate()
        .filter(|(i, name)| {
            find(categories, name).is_some()
                || names[..*i].iter().any(|n| n.eq_ignore_ascii_case(name))
        })
        .map(|(_, name)| name.as_str())
        .collect();
    if !duplicates.is_empty() {
        return Err(PennyError::DuplicateCategory(duplicates.join(", ")));
    }

    let mut updated = categories.clone();
    for name in names {
        updated.update(name.clone(), Value::from(keywords.to_vec()));
    }
    // Reject patterns that would break the next classification run
    Keywords::from_entries(updated.entries())?;
    *categories = updated;

    tracing::info!("added categories: {}", names.join(", "));
    Ok(CategoryChange {
        categories: names.to_vec(),
        reprocess,
    })
}

/// Remove `names` (case-insensitive) from the dictionary and drop every
/// mapping entry labelled with them.
pub fn delete(categories: &mut Store, mappings: &mut Store, names: &[String]) -> Result<CategoryChange> {
    let reprocess = !categories.is_empty();
    let unknown: Vec<&str> = names
        .iter()
        .filter(|n| find(categories, n).is_none())
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(PennyError::UnknownCategory(unknown.join(", ")));
    }
    let mut existing: Vec<String> = Vec::new();
    for category in names.iter().filter_map(|n| find(categories, n)) {
        if !existing.contains(&category) {
            existing.push(category);
        }
    }

    mappings.transpose()?;
    for category in &existing {
        if mappings.remove(category).is_some() {
            tracing::debug!("forgot mappings labelled {category}");
        }
    }
    mappings.transpose()?;

    for category in &existing {
        categories.remove(category);
    }

    tracing::info!("deleted categories: {}", existing.join(", "));
    Ok(CategoryChange {
        categories: existing,
        reprocess,
    })
}

/// The stored spelling of `name`, matched case-insensitively.
fn find(categories: &Store, name: &str) -> Option<String> {
    categories
        .keys()
        .find(|k| k.eq_ignore_ascii_case(name))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stores(categories: &str, mappings: &str) -> (tempfile::TempDir, Store, Store) {
        let dir = tempfile::tempdir().unwrap();
        let cat_path = dir.path().join("categories.json");
        let map_path = dir.path().join("mappings.json");
        std::fs::write(&cat_path, categories).unwrap();
        std::fs::write(&map_path, mappings).unwrap();
        let c = Store::load(&cat_path).unwrap();
        let m = Store::load(&map_path).unwrap();
        (dir, c, m)
    }

    fn names(s: &str) -> Vec<String> {
        parse_names(s).unwrap()
    }

    #[test]
    fn test_template_is_a_valid_dictionary() {
        let entries = serde_json::from_str(TEMPLATE).unwrap();
        let keywords = Keywords::from_entries(&entries).unwrap();
        assert!(keywords.categories().any(|c| c == "BLACKLIST"));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(names(" Home, ,Gym,"), vec!["Home", "Gym"]);
        assert!(matches!(
            parse_names(" , "),
            Err(PennyError::InvalidCategories(_))
        ));
    }

    #[test]
    fn test_add_to_empty_dictionary() {
        let (_dir, mut categories, _) = stores("", "");
        let change = add(&mut categories, &names("Home,Gym"), &["IKEA".to_string()]).unwrap();
        assert!(!change.reprocess);
        assert_eq!(
            categories.get("Home"),
            Some(&Value::from(vec!["IKEA".to_string()]))
        );
        assert!(categories.get("Gym").is_some());
    }

    #[test]
    fn test_add_rejects_duplicates_case_insensitively() {
        let (_dir, mut categories, _) = stores(r#"{"Groceries": ["TESCO"]}"#, "");
        let err = add(&mut categories, &names("groceries,Home,home"), &[]).unwrap_err();
        assert!(matches!(err, PennyError::DuplicateCategory(ref d) if d == "groceries, home"));
        assert_eq!(categories.len(), 1);
    }

    #[test]
    fn test_add_rejects_bad_keyword_without_mutating() {
        let (_dir, mut categories, _) = stores(r#"{"Groceries": ["TESCO"]}"#, "");
        let err = add(&mut categories, &names("Home"), &["(".to_string()]).unwrap_err();
        assert!(matches!(err, PennyError::BadPattern { .. }));
        assert_eq!(categories.len(), 1);
    }

    #[test]
    fn test_add_flags_reprocess_when_categories_existed() {
        let (_dir, mut categories, _) = stores(r#"{"Groceries": ["TESCO"]}"#, "");
        assert!(add(&mut categories, &names("Home"), &[]).unwrap().reprocess);
    }

    #[test]
    fn test_delete_cascades_through_mappings() {
        let (_dir, mut categories, mut mappings) = stores(
            r#"{"Groceries": ["TESCO"], "Home": ["IKEA"], "Gym": []}"#,
            r#"{"TESCO 1|": "Groceries", "IKEA|": ["Home", "Gym"], "LIDL|": "Groceries"}"#,
        );
        let change = delete(&mut categories, &mut mappings, &names("groceries,HOME")).unwrap();
        assert_eq!(change.categories, vec!["Groceries", "Home"]);
        assert!(change.reprocess);
        assert_eq!(categories.keys().collect::<Vec<_>>(), vec!["Gym"]);
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings.get("IKEA|"), Some(&Value::Text("Gym".into())));
    }

    #[test]
    fn test_delete_keeps_order_of_surviving_labels() {
        let (_dir, mut categories, mut mappings) = stores(
            r#"{"Home": ["IKEA"], "Gym": [], "Travel": ["TFL"]}"#,
            r#"{"IKEA|": ["Home", "Gym"], "TFL|": "Travel"}"#,
        );
        delete(&mut categories, &mut mappings, &names("Travel")).unwrap();
        assert_eq!(
            mappings.get("IKEA|"),
            Some(&Value::from(vec!["Home".to_string(), "Gym".to_string()]))
        );
        assert_eq!(mappings.get("TFL|"), None);
        assert_eq!(categories.keys().collect::<Vec<_>>(), vec!["Home", "Gym"]);
    }

    #[test]
    fn test_delete_names_each_category_once() {
        let (_dir, mut categories, mut mappings) =
            stores(r#"{"Home": [], "Gym": []}"#, r#"{"IKEA|": ["Home", "Gym"]}"#);
        let change = delete(&mut categories, &mut mappings, &names("Home,Gym,home")).unwrap();
        assert_eq!(change.categories, vec!["Home", "Gym"]);
        assert!(mappings.is_empty());
    }

    #[test]
    fn test_delete_reports_every_unknown_name() {
        let (_dir, mut categories, mut mappings) =
            stores(r#"{"Groceries": ["TESCO"]}"#, r#"{"TESCO|": "Groceries"}"#);
        let err = delete(&mut categories, &mut mappings, &names("Nope,Groceries,Other")).unwrap_err();
        assert!(matches!(err, PennyError::UnknownCategory(ref u) if u == "Nope, Other"));
        assert_eq!(categories.len(), 1);
        assert_eq!(mappings.len(), 1);
    }
}
