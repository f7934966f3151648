use crate::classifier::{is_blacklist, Labels};
use crate::dataset::{Dataset, AMOUNT, INFO, TYPE};
use crate::store::{Store, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    Total,
    /// One row per distinct `Info`.
    Unique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionSummary {
    pub total: usize,
    pub classified: usize,
    pub unclassified: usize,
}

pub fn transactions(data: &Dataset, count: Count) -> TransactionSummary {
    let mut data = data.clone();
    if count == Count::Unique {
        data.drop_duplicates(&[INFO]);
    }
    let total = data.count_rows();
    let classified = data.rows().iter().filter(|r| !r.is_blank(TYPE)).count();
    TransactionSummary {
        total,
        classified,
        unclassified: total - classified,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub name: String,
    pub keywords: Vec<String>,
    pub transactions: usize,
    pub amount: f64,
    pub blacklist: bool,
}

/// Per-category totals over `classified`, in dictionary order. A row with
/// several labels counts towards each of them.
pub fn categories(categories: &Store, classified: &Dataset) -> Vec<CategorySummary> {
    let mut out: Vec<CategorySummary> = categories
        .entries()
        .iter()
        .map(|(name, value)| CategorySummary {
            name: name.clone(),
            keywords: value.items().into_iter().filter_map(Value::key_text).collect(),
            transactions: 0,
            amount: 0.0,
            blacklist: is_blacklist(name),
        })
        .collect();

    for row in classified.rows() {
        let Some(labels) = Labels::parse(&row.text(TYPE)) else {
            continue;
        };
        for entry in out.iter_mut().filter(|c| labels.contains(&c.name)) {
            entry.transactions += 1;
            entry.amount += row.number(AMOUNT).unwrap_or(0.0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Cell, Row};

    fn statements() -> Dataset {
        let mut data = Dataset::new("classified.csv", &[AMOUNT, INFO, TYPE]);
        let rows = [
            (1, 10.0, "TESCO|", "Groceries"),
            (2, 5.0, "TESCO|", "Groceries"),
            (3, 40.0, "IKEA|", "Home,Gym"),
            (4, 2.5, "KIOSK|", ""),
            (5, 100.0, "PAYING IN|", "BLACKLIST"),
        ];
        for (id, amount, info, kind) in rows {
            data.push(
                Row::new(id)
                    .with(AMOUNT, Cell::Number(amount))
                    .with(INFO, Cell::text(info))
                    .with(TYPE, Cell::text(kind)),
            )
            .unwrap();
        }
        data
    }

    #[test]
    fn test_transaction_counts() {
        let data = statements();
        assert_eq!(
            transactions(&data, Count::Total),
            TransactionSummary {
                total: 5,
                classified: 4,
                unclassified: 1
            }
        );
        assert_eq!(transactions(&data, Count::Unique).total, 4);
        assert_eq!(data.count_rows(), 5);
    }

    #[test]
    fn test_category_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.json");
        std::fs::write(
            &path,
            r#"{"BLACKLIST": ["PAYING IN"], "Groceries": ["TESCO"], "Gym": [], "Home": "IKEA", "Travel": []}"#,
        )
        .unwrap();
        let store = Store::load(&path).unwrap();
        let summary = categories(&store, &statements());
        let counts: Vec<(&str, usize)> = summary
            .iter()
            .map(|c| (c.name.as_str(), c.transactions))
            .collect();
        assert_eq!(
            counts,
            vec![("BLACKLIST", 1), ("Groceries", 2), ("Gym", 1), ("Home", 1), ("Travel", 0)]
        );
        assert_eq!(summary[1].amount, 15.0);
        assert_eq!(summary[3].keywords, vec!["IKEA".to_string()]);
        assert!(summary[0].blacklist);
    }
}
