//! Keyword rules plus the learned `Info` → category mappings.

use std::fmt;
use std::path::Path;

use regex::{Regex, RegexBuilder};

use crate::dataset::{Cell, Dataset, INFO, TYPE};
use crate::error::{PennyError, Result};
use crate::store::{Map, Store, Value};

/// Reserved category names. A match excludes the transaction from spending
/// and suppresses every other label.
pub const BLACKLIST_NAMES: &[&str] = &["BLACKLIST", "Bad"];

pub fn is_blacklist(category: &str) -> bool {
    BLACKLIST_NAMES.contains(&category)
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// One or more category labels, ordered, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels(Vec<String>);

impl Labels {
    pub fn single(label: &str) -> Self {
        Self(vec![label.to_string()])
    }

    fn collect<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref().trim();
            if !label.is_empty() && !out.iter().any(|l| l == label) {
                out.push(label.to_string());
            }
        }
        if out.is_empty() {
            None
        } else {
            Some(Self(out))
        }
    }

    /// Parse a `Type` cell such as `"Groceries"` or `"Home,Gym"`.
    pub fn parse(text: &str) -> Option<Self> {
        Self::collect(text.split(','))
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        Self::collect(value.items().into_iter().filter_map(Value::key_text))
    }

    pub fn to_value(&self) -> Value {
        match self.0.as_slice() {
            [one] => Value::Text(one.clone()),
            many => Value::from(many.to_vec()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l == label)
    }

    pub fn is_blacklisted(&self) -> bool {
        self.iter().any(is_blacklist)
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

// ---------------------------------------------------------------------------
// Keyword rules
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Rule {
    category: String,
    patterns: Vec<Regex>,
}

impl Rule {
    fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }
}

/// Category → keyword patterns, compiled once per run.
#[derive(Debug, Default)]
pub struct Keywords {
    blacklist: Vec<Rule>,
    rules: Vec<Rule>,
}

impl Keywords {
    /// Load the keyword dictionary. A missing or malformed file is a
    /// configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PennyError::categories(format!("{} not found", path.display())));
        }
        let store = Store::load(path).map_err(|e| match e {
            PennyError::Json { file, source } => {
                PennyError::categories(format!("{file} is not valid JSON ({source})"))
            }
            other => other,
        })?;
        Self::from_entries(store.entries())
    }

    pub fn from_entries(entries: &Map) -> Result<Self> {
        let mut keywords = Self::default();
        for (category, value) in entries {
            let patterns = keyword_list(category, value)?
                .into_iter()
                .map(|pattern| compile(category, pattern))
                .collect::<Result<Vec<_>>>()?;
            let rule = Rule {
                category: category.clone(),
                patterns,
            };
            if is_blacklist(category) {
                keywords.blacklist.push(rule);
            } else {
                keywords.rules.push(rule);
            }
        }
        tracing::debug!(
            "loaded {} categories ({} blacklist)",
            keywords.rules.len(),
            keywords.blacklist.len()
        );
        Ok(keywords)
    }

    /// Categories in dictionary order, blacklist first.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.blacklist
            .iter()
            .chain(self.rules.iter())
            .map(|r| r.category.as_str())
    }

    /// Match the non-empty `fields`, joined by a space, against every rule.
    pub fn classify(&self, fields: &[&str]) -> Option<Labels> {
        let text = fields
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return None;
        }
        if let Some(rule) = self.blacklist.iter().find(|r| r.matches(&text)) {
            return Some(Labels::single(&rule.category));
        }
        Labels::collect(
            self.rules
                .iter()
                .filter(|r| r.matches(&text))
                .map(|r| r.category.as_str()),
        )
    }
}

fn keyword_list<'a>(category: &str, value: &'a Value) -> Result<Vec<&'a str>> {
    let shape_error = || {
        PennyError::categories(format!(
            "category '{category}' must map to a list of keywords, found {value}"
        ))
    };
    match value {
        Value::Text(s) => Ok(vec![s.as_str()]),
        Value::List(items) => items
            .iter()
            .map(|item| item.as_str().ok_or_else(shape_error))
            .collect(),
        _ => Err(shape_error()),
    }
}

fn compile(category: &str, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| PennyError::BadPattern {
            category: category.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Learned mappings win; keyword rules are the fallback.
pub struct Classifier<'a> {
    mappings: &'a Store,
    keywords: &'a Keywords,
}

impl<'a> Classifier<'a> {
    pub fn new(mappings: &'a Store, keywords: &'a Keywords) -> Self {
        Self { mappings, keywords }
    }

    pub fn classify(&self, info: &str) -> Option<Labels> {
        if let Some(labels) = self.mappings.get(info).and_then(Labels::from_value) {
            return Some(labels);
        }
        self.keywords.classify(&[info])
    }

    /// Recompute `Type` for every row from its `Info`. Returns how many rows
    /// ended up with a type.
    pub fn apply(&self, data: &mut Dataset) -> usize {
        let mut classified = 0;
        data.set_values(TYPE, |row| match self.classify(&row.text(INFO)) {
            Some(labels) => {
                classified += 1;
                Cell::Text(labels.to_string())
            }
            None => Cell::Empty,
        });
        tracing::info!("classified {classified}/{} rows", data.count_rows());
        classified
    }
}
