//! Reading-token editing on top of the candidate grid.
//!
//! The compositor keeps the reading sequence and cursor, applies each edit to
//! the grid (expand/shrink plus a rebuild limited to the neighborhood of the
//! cursor), and exposes the walk, candidate lookup and override surface.

mod candidates;
mod dot;
pub(crate) mod testutil;
mod walker;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::{debug, debug_span};

use crate::grid::{Grid, Node, Span};
use crate::lm::{LanguageModel, RankedModel};
use crate::settings::settings;

pub use candidates::{Candidate, CandidateFilter};
pub use walker::WalkResult;

/// Which side of the cursor an edit or jump applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingDirection {
    /// After the cursor (forward delete, jump right).
    Front,
    /// Before the cursor (backspace, jump left).
    Rear,
}

/// Composition state for one input session.
///
/// `Clone` is a full structural copy: the clone owns its own grid, spans and
/// nodes, and only shares the read-only language model.
#[derive(Clone)]
pub struct Compositor {
    lm: RankedModel<Arc<dyn LanguageModel>>,
    readings: Vec<String>,
    cursor: usize,
    separator: String,
    grid: Grid,
}

impl Compositor {
    pub fn new(lm: Arc<dyn LanguageModel>) -> Self {
        Self::with_max_span_length(lm, settings().compositor.max_span_length)
    }

    /// A `max_span_length` of 0 is raised to 1.
    pub fn with_max_span_length(lm: Arc<dyn LanguageModel>, max_span_length: usize) -> Self {
        let max_span_length = max_span_length.max(1);
        Self {
            lm: RankedModel::new(lm),
            readings: Vec::new(),
            cursor: 0,
            separator: settings().compositor.separator.clone(),
            grid: Grid::new(max_span_length),
        }
    }

    pub fn readings(&self) -> &[String] {
        &self.readings
    }

    pub fn length(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor, clamped to `0..=length`.
    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = index.min(self.readings.len());
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Change the key separator, re-joining the keys of existing nodes.
    pub fn set_separator(&mut self, separator: &str) {
        self.separator = separator.to_string();
        for node in self.grid.nodes_mut() {
            node.set_separator(separator);
        }
    }

    pub fn max_span_length(&self) -> usize {
        self.grid.max_span_length()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn spans(&self) -> &[Span] {
        self.grid.spans()
    }

    /// Independent deep copy; see the type-level docs.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn clear(&mut self) {
        self.readings.clear();
        self.cursor = 0;
        self.grid.clear();
    }

    /// Insert `reading` at the cursor and advance past it.
    ///
    /// Rejects empty readings, the separator itself, and readings the model
    /// has no single-token unigrams for. A rejected insert changes nothing.
    pub fn insert_reading(&mut self, reading: &str) -> bool {
        if reading.is_empty() || reading == self.separator {
            debug!(reading, "rejected empty reading");
            return false;
        }
        let leaf = [reading.to_string()];
        if !self.lm.has_unigrams(&leaf) || self.lm.unigrams_for(&leaf).is_empty() {
            debug!(reading, "rejected unknown reading");
            return false;
        }

        self.readings.insert(self.cursor, reading.to_string());
        self.grid.expand_by_one(self.cursor);
        self.update(false);
        self.cursor += 1;
        true
    }

    /// Delete one reading next to the cursor.
    ///
    /// `Rear` removes the reading before the cursor (backspace), `Front` the
    /// one after it. Fails at the matching boundary.
    pub fn delete_reading(&mut self, direction: TypingDirection) -> bool {
        let boundary = match direction {
            TypingDirection::Rear => 0,
            TypingDirection::Front => self.readings.len(),
        };
        if self.cursor == boundary {
            return false;
        }
        if direction == TypingDirection::Rear {
            self.cursor -= 1;
        }
        self.readings.remove(self.cursor);
        self.grid.shrink_by_one(self.cursor);
        self.update(false);
        true
    }

    /// Drop the first `count` readings, as when committing a leading phrase.
    pub fn remove_leading_readings(&mut self, count: usize) -> bool {
        if count > self.readings.len() {
            return false;
        }
        for _ in 0..count {
            self.cursor = self.cursor.saturating_sub(1);
            self.readings.remove(0);
            self.grid.shrink_by_one(0);
            self.update(false);
        }
        true
    }

    /// Move the cursor to the next segment boundary of the current walk.
    pub fn jump_cursor_by_span(&mut self, direction: TypingDirection) -> bool {
        let boundaries = self.walk().segment_boundaries();
        let target = match direction {
            TypingDirection::Front => boundaries.iter().copied().find(|&b| b > self.cursor),
            TypingDirection::Rear => boundaries.iter().rev().copied().find(|&b| b < self.cursor),
        };
        match target {
            Some(position) => {
                self.cursor = position;
                true
            }
            None => false,
        }
    }

    /// Re-query the language model and materialize missing nodes.
    ///
    /// Without `update_existing`, only slots within `max_span_length` of the
    /// cursor are visited and occupied slots are kept as they are. With it,
    /// every slot in the grid is visited and existing nodes are re-synced with
    /// the model's current data; multi-token nodes whose key lost all its
    /// unigrams are dropped. Returns the number of nodes added, changed or
    /// dropped.
    pub fn update(&mut self, update_existing: bool) -> usize {
        let max_span = self.grid.max_span_length();
        let len = self.readings.len();
        let range = if update_existing {
            0..len
        } else {
            self.cursor.saturating_sub(max_span)..(self.cursor + max_span).min(len)
        };
        let _span = debug_span!(
            "update",
            update_existing,
            begin = range.start,
            end = range.end
        )
        .entered();

        let mut changed = 0;
        for start in range.clone() {
            for length in 1..=max_span.min(range.end - start) {
                let key_tokens = &self.readings[start..start + length];
                let occupied = self
                    .grid
                    .node(start, length)
                    .is_some_and(|n| n.key_tokens() == key_tokens);

                if occupied {
                    if !update_existing {
                        continue;
                    }
                    let unigrams = self.lm.unigrams_for(key_tokens);
                    if unigrams.is_empty() {
                        // Single-token nodes keep their last data so every
                        // position stays walkable.
                        if length > 1 {
                            self.grid.remove_node(start, length);
                            changed += 1;
                        }
                        continue;
                    }
                    if let Some(node) = self.grid.node_mut(start, length) {
                        let before = node.clone();
                        node.sync_unigrams(unigrams);
                        if *node != before {
                            changed += 1;
                        }
                    }
                    continue;
                }

                let unigrams = self.lm.unigrams_for(key_tokens);
                if unigrams.is_empty() {
                    if self.grid.remove_node(start, length).is_some() {
                        changed += 1;
                    }
                    continue;
                }
                let node = Node::new(key_tokens.to_vec(), &self.separator, unigrams);
                self.grid.insert_node(start, node);
                changed += 1;
            }
        }

        debug!(changed, width = self.grid.width());
        changed
    }
}
