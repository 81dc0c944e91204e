use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::lm::Unigram;
use crate::settings::settings;

static NEUTRAL_UNIGRAM: Unigram = Unigram {
    value: String::new(),
    score: 0.0,
};

/// How a node's selected value was pinned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum OverrideKind {
    /// Natural ranking: the top unigram, scored as itself.
    #[default]
    None,
    /// Report the chosen value but keep the node's best natural score, so the
    /// walk weighs it as if nothing had been overridden.
    PreferredValueNaturalScore,
    /// Report the chosen value with the overriding score, which beats any
    /// overlapping competitor during the walk.
    PreferredValueForcedScore,
}

/// A candidate word covering a run of reading tokens.
///
/// Equality and hashing cover key, span length, unigrams and override kind,
/// but not the selected index: two nodes overridden to different values of
/// the same kind compare equal.
#[derive(Debug, Clone)]
pub struct Node {
    key_tokens: Vec<String>,
    /// `key_tokens` joined with the compositor's separator.
    key: String,
    unigrams: Vec<Unigram>,
    current_index: usize,
    override_kind: OverrideKind,
}

impl Node {
    pub fn new(key_tokens: Vec<String>, separator: &str, unigrams: Vec<Unigram>) -> Self {
        debug_assert!(!key_tokens.is_empty(), "node must span at least one token");
        let key = key_tokens.join(separator);
        Self {
            key_tokens,
            key,
            unigrams,
            current_index: 0,
            override_kind: OverrideKind::None,
        }
    }

    pub fn key_tokens(&self) -> &[String] {
        &self.key_tokens
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of reading tokens covered.
    pub fn span_length(&self) -> usize {
        self.key_tokens.len()
    }

    pub fn unigrams(&self) -> &[Unigram] {
        &self.unigrams
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn override_kind(&self) -> OverrideKind {
        self.override_kind
    }

    pub fn is_overridden(&self) -> bool {
        self.override_kind != OverrideKind::None
    }

    /// The selected unigram, or a zero-score empty one if the node has none.
    pub fn current_unigram(&self) -> &Unigram {
        self.unigrams
            .get(self.current_index)
            .unwrap_or(&NEUTRAL_UNIGRAM)
    }

    pub fn value(&self) -> &str {
        &self.current_unigram().value
    }

    /// Edge weight used by the walk.
    pub fn effective_score(&self) -> f64 {
        if self.unigrams.is_empty() {
            return 0.0;
        }
        match self.override_kind {
            OverrideKind::PreferredValueForcedScore => settings().node.overriding_score,
            OverrideKind::PreferredValueNaturalScore => self.unigrams[0].score,
            OverrideKind::None => self.current_unigram().score,
        }
    }

    /// Select the unigram whose value is `value` and pin it with `kind`.
    ///
    /// Fails without changing anything when `kind` is `None` or no unigram matches.
    pub fn select_override(&mut self, value: &str, kind: OverrideKind) -> bool {
        if kind == OverrideKind::None {
            return false;
        }
        let Some(idx) = self.unigrams.iter().position(|u| u.value == value) else {
            return false;
        };
        self.current_index = idx;
        self.override_kind = kind;
        true
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
        self.override_kind = OverrideKind::None;
    }

    /// Replace the unigram list with fresh model data.
    ///
    /// An override survives only if its value is still offered; otherwise, and
    /// for nodes that were never overridden, the selection falls back to the top.
    pub(crate) fn sync_unigrams(&mut self, unigrams: Vec<Unigram>) {
        debug_assert!(!unigrams.is_empty());
        let selected = self.value().to_string();
        self.unigrams = unigrams;
        if !self.is_overridden() {
            self.reset();
            return;
        }
        match self.unigrams.iter().position(|u| u.value == selected) {
            Some(idx) => self.current_index = idx,
            None => self.reset(),
        }
    }

    pub(crate) fn set_separator(&mut self, separator: &str) {
        self.key = self.key_tokens.join(separator);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.span_length() == other.span_length()
            && self.unigrams == other.unigrams
            && self.override_kind == other.override_kind
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.span_length().hash(state);
        self.unigrams.hash(state);
        self.override_kind.hash(state);
    }
}
