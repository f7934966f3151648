//! Persistent key-value documents backed by JSON files.
//!
//! Both the category mapping store (`Info` → labels) and the keyword
//! dictionary live in a [`Store`]. Mutations stay in memory until
//! [`Store::write`] is called.
//!
//! Entries keep the order they were read in. The keyword dictionary's order
//! decides the order of multi-category labels, so only [`Store::write`]
//! sorts keys.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{PennyError, Result};

pub type Map = IndexMap<String, Value>;

/// A JSON-shaped value. Scalars promote to `List` on repeated `append`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<Value>),
    Map(Map),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// The value as a list of scalars: a scalar becomes a one-element list.
    pub fn items(&self) -> Vec<&Value> {
        match self {
            Self::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    /// Text form used when a scalar becomes a key, e.g. in [`Store::transpose`].
    pub fn key_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Null | Self::List(_) | Self::Map(_) => None,
        }
    }

    /// Append `values`, promoting a scalar to a one-element list first.
    fn extend_list(&mut self, values: impl IntoIterator<Item = Value>) {
        let mut items = match std::mem::replace(self, Self::Null) {
            Self::List(items) => items,
            scalar => vec![scalar],
        };
        items.extend(values);
        *self = Self::List(items);
    }

    /// Copy with every nested map sorted by key.
    fn sorted(&self) -> Self {
        match self {
            Self::List(items) => Self::List(items.iter().map(Self::sorted).collect()),
            Self::Map(map) => Self::Map(sorted_map(map)),
            scalar => scalar.clone(),
        }
    }
}

fn sorted_map(map: &Map) -> Map {
    let mut out: Map = map.iter().map(|(k, v)| (k.clone(), v.sorted())).collect();
    out.sort_keys();
    out
}

/// Insert `value` under `key`, or promote an existing entry to a list.
fn push(map: &mut Map, key: String, value: Value) {
    match map.entry(key) {
        Entry::Occupied(mut e) => e.get_mut().extend_list([value]),
        Entry::Vacant(e) => {
            e.insert(value);
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::List(items.into_iter().map(Value::Text).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Descend `keys` through nested maps. `None` as soon as a level is missing
/// or is not itself a map.
pub fn get_path<'a, K>(root: &'a Map, keys: impl IntoIterator<Item = K>) -> Option<&'a Value>
where
    K: AsRef<str>,
{
    let mut keys = keys.into_iter();
    let first = keys.next()?;
    let mut current = root.get(first.as_ref())?;
    for key in keys {
        current = current.as_map()?.get(key.as_ref())?;
    }
    Some(current)
}

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    entries: Map,
}

impl Store {
    /// Read the document at `path`; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| PennyError::Json {
                file: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} not found, starting empty", path.display());
                Map::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn entries(&self) -> &Map {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Nested lookup; accepts an array, slice or vec of keys.
    pub fn lookup<K: AsRef<str>>(&self, keys: impl IntoIterator<Item = K>) -> Option<&Value> {
        get_path(&self.entries, keys)
    }

    pub fn lookup_or<'a, K: AsRef<str>>(
        &'a self,
        keys: impl IntoIterator<Item = K>,
        default: &'a Value,
    ) -> &'a Value {
        self.lookup(keys).unwrap_or(default)
    }

    pub fn update(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        push(&mut self.entries, key.into(), value.into());
    }

    pub fn extend(&mut self, key: impl Into<String>, values: Vec<Value>) {
        match self.entries.entry(key.into()) {
            Entry::Occupied(mut e) => e.get_mut().extend_list(values),
            Entry::Vacant(e) => {
                e.insert(Value::List(values));
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Swap keys and values: `{A: [a1, a2], B: b1}` becomes
    /// `{a1: A, a2: A, b1: B}`. Keys sharing a value collect into a list.
    /// New keys appear in first-seen order. Nested lists cannot be transposed.
    pub fn transpose(&mut self) -> Result<()> {
        let mut flipped = Map::new();
        for (key, value) in &self.entries {
            for item in value.items() {
                let Some(new_key) = item.key_text() else {
                    return Err(PennyError::NestedList(format!("{key}: {value}")));
                };
                push(&mut flipped, new_key, Value::Text(key.clone()));
            }
        }
        self.entries = flipped;
        Ok(())
    }

    /// Write the document with keys sorted at every level.
    pub fn write(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&sorted_map(&self.entries)).map_err(|source| PennyError::Json {
            file: self.path.display().to_string(),
            source,
        })?;
        std::fs::write(&self.path, format!("{json}\n"))?;
        tracing::debug!("wrote {} ({} keys)", self.path.display(), self.entries.len());
        Ok(())
    }
}
