//! Plain-text language model: one `key value score` triple per line.
//!
//! Key tokens are joined with the model's own separator (empty by default) to
//! form the lookup key, so `["gao1", "ke1"]` reads the `gao1ke1` lines.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::RwLock;

use super::{LanguageModel, Unigram};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

pub struct TextModel {
    separator: String,
    entries: RwLock<HashMap<String, Vec<Unigram>>>,
}

impl TextModel {
    pub fn new() -> Self {
        Self {
            separator: String::new(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Parse `key value score` lines. Blank lines and `#` comments are skipped.
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        Self::parse_columns(input, false)
    }

    /// Parse `value key score` lines, i.e. with the first two columns swapped.
    pub fn parse_swapped(input: &str) -> Result<Self, ModelError> {
        Self::parse_columns(input, true)
    }

    pub fn open(path: &Path) -> Result<Self, ModelError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    fn parse_columns(input: &str, swap: bool) -> Result<Self, ModelError> {
        let mut map: HashMap<String, Vec<Unigram>> = HashMap::new();
        for (idx, raw) in input.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                return Err(ModelError::Parse {
                    line: idx + 1,
                    reason: format!("expected 3 columns, found {}", fields.len()),
                });
            }
            let score: f64 = fields[2].parse().map_err(|_| ModelError::Parse {
                line: idx + 1,
                reason: format!("invalid score {:?}", fields[2]),
            })?;
            let (key, value) = if swap {
                (fields[1], fields[0])
            } else {
                (fields[0], fields[1])
            };
            map.entry(key.to_string())
                .or_default()
                .push(Unigram::new(value, score));
        }
        Ok(Self {
            separator: String::new(),
            entries: RwLock::new(map),
        })
    }

    /// Add a value under `key`. Returns `false` if the value is already present.
    pub fn insert(&self, key: &str, value: &str, score: f64) -> bool {
        let mut map = self.entries.write().unwrap();
        let unigrams = map.entry(key.to_string()).or_default();
        if unigrams.iter().any(|u| u.value == value) {
            return false;
        }
        unigrams.push(Unigram::new(value, score));
        true
    }

    /// Remove `value` from `key`. Keys left without values are dropped.
    pub fn trim(&self, key: &str, value: &str) -> bool {
        let mut map = self.entries.write().unwrap();
        let Some(unigrams) = map.get_mut(key) else {
            return false;
        };
        let before = unigrams.len();
        unigrams.retain(|u| u.value != value);
        let removed = unigrams.len() < before;
        if unigrams.is_empty() {
            map.remove(key);
        }
        removed
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn join(&self, key_tokens: &[String]) -> String {
        key_tokens.join(&self.separator)
    }
}

impl Default for TextModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageModel for TextModel {
    fn unigrams_for(&self, key_tokens: &[String]) -> Vec<Unigram> {
        let map = self.entries.read().unwrap();
        map.get(&self.join(key_tokens)).cloned().unwrap_or_default()
    }

    fn has_unigrams(&self, key_tokens: &[String]) -> bool {
        let map = self.entries.read().unwrap();
        map.contains_key(&self.join(key_tokens))
    }
}
