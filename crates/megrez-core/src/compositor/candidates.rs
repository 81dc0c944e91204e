//! Candidate lookup and overrides at a reading position.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, debug_span};

use crate::grid::{Node, OverrideKind};

use super::Compositor;

/// One selectable value together with the key tokens it was found under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Candidate {
    pub key_tokens: Vec<String>,
    pub value: String,
}

/// Which nodes `fetch_candidates` collects relative to the given position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CandidateFilter {
    /// Nodes starting exactly at the position.
    BeginsAt,
    /// Nodes ending exactly at the position (exclusive end).
    EndsAt,
    /// Nodes covering the reading at the position.
    #[default]
    Overlapping,
}

impl CandidateFilter {
    fn accepts(self, position: usize, start: usize, node: &Node) -> bool {
        let end = start + node.span_length();
        match self {
            CandidateFilter::BeginsAt => start == position,
            CandidateFilter::EndsAt => end == position,
            CandidateFilter::Overlapping => start <= position && position < end,
        }
    }
}

impl Compositor {
    /// List candidate values for nodes matching `filter` at `position`.
    ///
    /// Longer nodes come first; within a node, values keep their ranking.
    /// Duplicate (key, value) pairs are listed once. For `Overlapping`, a
    /// position at the end of the sequence refers to the last reading.
    pub fn fetch_candidates(&self, position: usize, filter: CandidateFilter) -> Vec<Candidate> {
        let width = self.grid.width();
        let _span = debug_span!("fetch_candidates", position, ?filter).entered();
        if width == 0 {
            return Vec::new();
        }
        let position = match filter {
            CandidateFilter::Overlapping => position.min(width - 1),
            _ => position,
        };

        let mut anchors: Vec<(usize, &Node)> = self
            .grid
            .nodes()
            .filter(|&(start, node)| filter.accepts(position, start, node))
            .collect();
        anchors.sort_by(|a, b| b.1.span_length().cmp(&a.1.span_length()));

        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for (_, node) in anchors {
            for unigram in node.unigrams() {
                let candidate = Candidate {
                    key_tokens: node.key_tokens().to_vec(),
                    value: unigram.value.clone(),
                };
                if seen.insert(candidate.clone()) {
                    result.push(candidate);
                }
            }
        }
        debug!(count = result.len());
        result
    }

    /// Pin `value` on the node with exactly `key_tokens` covering `position`.
    pub fn override_candidate(&mut self, key_tokens: &[String], value: &str, position: usize) -> bool {
        self.override_candidate_with(
            Some(key_tokens),
            value,
            position,
            OverrideKind::PreferredValueForcedScore,
        )
    }

    /// Pin `value` on the first node covering `position` that offers it,
    /// trying longer nodes first.
    pub fn override_candidate_by_value(&mut self, value: &str, position: usize) -> bool {
        self.override_candidate_with(
            None,
            value,
            position,
            OverrideKind::PreferredValueForcedScore,
        )
    }

    /// General override entry point.
    ///
    /// Only the matched node changes. Competing nodes lose purely because the
    /// walk prefers the overridden node's score.
    pub fn override_candidate_with(
        &mut self,
        key_tokens: Option<&[String]>,
        value: &str,
        position: usize,
        kind: OverrideKind,
    ) -> bool {
        let width = self.grid.width();
        if width == 0 || kind == OverrideKind::None {
            return false;
        }
        let position = position.min(width - 1);

        let mut anchors = self.grid.overlapping(position);
        anchors.sort_by(|a, b| b.1.cmp(&a.1));
        for (start, length) in anchors {
            let Some(node) = self.grid.node_mut(start, length) else {
                continue;
            };
            if key_tokens.is_some_and(|k| node.key_tokens() != k) {
                continue;
            }
            if node.select_override(value, kind) {
                debug!(start, length, value, ?kind, "override");
                return true;
            }
        }
        debug!(position, value, "override target not found");
        false
    }

    /// Reset every overridden node covering `position`.
    ///
    /// A position at the end of the sequence refers to the last reading.
    pub fn reset_overrides_at(&mut self, position: usize) -> bool {
        let width = self.grid.width();
        if width == 0 {
            return false;
        }
        let position = position.min(width - 1);
        let mut reset = false;
        for (start, length) in self.grid.overlapping(position) {
            if let Some(node) = self.grid.node_mut(start, length) {
                if node.is_overridden() {
                    node.reset();
                    reset = true;
                }
            }
        }
        reset
    }
}
