//! Label key to color table

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Key conventionally reserved for "no label"
pub const UNLABELED_KEY: i64 = 0;

/// Maps integer label keys to names and RGBA colors.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LabelTable {
    entries: HashMap<i64, LabelEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabelEntry {
    pub name: String,
    pub rgba: [u8; 4],
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a label
    pub fn insert(&mut self, key: i64, name: impl Into<String>, rgba: [u8; 4]) {
        self.entries.insert(
            key,
            LabelEntry {
                name: name.into(),
                rgba,
            },
        );
    }

    /// Color for a key; None for keys with no entry
    pub fn lookup_rgba(&self, key: i64) -> Option<[u8; 4]> {
        self.entries.get(&key).map(|e| e.rgba)
    }

    /// Name for a key
    pub fn name(&self, key: i64) -> Option<&str> {
        self.entries.get(&key).map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
