//! Candidate grid: one span of nodes per reading-token position.
//!
//! Each `Span` is a fixed-capacity slot array addressed by span length, so the
//! frequent expand/shrink/rebuild cycle moves spans around without
//! reallocating their slots.

mod node;

pub use node::{Node, OverrideKind};

/// Nodes of every length anchored at one starting position.
#[derive(Debug, Clone)]
pub struct Span {
    /// slots[len - 1] holds the node covering `len` tokens.
    slots: Vec<Option<Node>>,
    max_length: usize,
}

impl Span {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            max_length: 0,
        }
    }

    pub fn get(&self, length: usize) -> Option<&Node> {
        length
            .checked_sub(1)
            .and_then(|i| self.slots.get(i))
            .and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, length: usize) -> Option<&mut Node> {
        length
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i))
            .and_then(Option::as_mut)
    }

    /// Longest populated length, 0 if the span is empty.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn is_empty(&self) -> bool {
        self.max_length == 0
    }

    /// Nodes in ascending length order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.slots[..self.max_length].iter().flatten()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        let max = self.max_length;
        self.slots[..max].iter_mut().flatten()
    }

    /// Place `node` in the slot for its span length, replacing any occupant.
    pub(crate) fn insert(&mut self, node: Node) {
        let length = node.span_length();
        assert!(
            (1..=self.slots.len()).contains(&length),
            "span length {length} outside 1..={}",
            self.slots.len()
        );
        self.slots[length - 1] = Some(node);
        self.max_length = self.max_length.max(length);
    }

    pub(crate) fn remove(&mut self, length: usize) -> Option<Node> {
        let removed = length
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i))
            .and_then(Option::take);
        if removed.is_some() && length == self.max_length {
            self.recompute_max_length();
        }
        removed
    }

    /// Drop every node covering `length` tokens or more.
    pub(crate) fn drop_nodes_of_or_beyond(&mut self, length: usize) {
        let from = length.saturating_sub(1);
        if from >= self.max_length {
            return;
        }
        for slot in &mut self.slots[from..] {
            *slot = None;
        }
        self.recompute_max_length();
    }

    fn recompute_max_length(&mut self) {
        self.max_length = self
            .slots
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |i| i + 1);
    }
}

/// All spans over the current reading sequence.
///
/// Position `i` holds the span of nodes starting at token `i`. The walk's BOS
/// and EOS are the logical positions 0 and `width()`, not stored spans.
#[derive(Debug, Clone)]
pub struct Grid {
    spans: Vec<Span>,
    max_span_length: usize,
}

impl Grid {
    pub fn new(max_span_length: usize) -> Self {
        assert!(max_span_length > 0, "max_span_length must be positive");
        Self {
            spans: Vec::new(),
            max_span_length,
        }
    }

    pub fn max_span_length(&self) -> usize {
        self.max_span_length
    }

    /// Number of token positions.
    pub fn width(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn span(&self, position: usize) -> Option<&Span> {
        self.spans.get(position)
    }

    pub fn node(&self, start: usize, length: usize) -> Option<&Node> {
        self.spans.get(start).and_then(|s| s.get(length))
    }

    pub(crate) fn node_mut(&mut self, start: usize, length: usize) -> Option<&mut Node> {
        self.spans.get_mut(start).and_then(|s| s.get_mut(length))
    }

    /// Every node with its start position, in position then length order.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &Node)> {
        self.spans
            .iter()
            .enumerate()
            .flat_map(|(start, span)| span.nodes().map(move |n| (start, n)))
    }

    /// `(start, length)` of every node covering token `position`, in position
    /// then length order.
    pub fn overlapping(&self, position: usize) -> Vec<(usize, usize)> {
        let mut result = Vec::new();
        if position >= self.width() {
            return result;
        }
        let begin = position.saturating_sub(self.max_span_length - 1);
        for start in begin..=position {
            for node in self.spans[start].nodes() {
                if start + node.span_length() > position {
                    result.push((start, node.span_length()));
                }
            }
        }
        result
    }

    pub(crate) fn insert_node(&mut self, start: usize, node: Node) {
        debug_assert!(!node.unigrams().is_empty(), "materialized node without unigrams");
        debug_assert!(start + node.span_length() <= self.width());
        self.spans[start].insert(node);
    }

    pub(crate) fn remove_node(&mut self, start: usize, length: usize) -> Option<Node> {
        self.spans.get_mut(start).and_then(|s| s.remove(length))
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.spans.iter_mut().flat_map(|span| span.nodes_mut())
    }

    /// Insert an empty span at `position`, dropping nodes that would straddle it.
    pub(crate) fn expand_by_one(&mut self, position: usize) {
        let position = position.min(self.width());
        self.spans.insert(position, Span::new(self.max_span_length));
        if position == 0 {
            return;
        }
        self.drop_wrecked_nodes(position);
    }

    /// Remove the span at `position`, dropping nodes that covered it.
    pub(crate) fn shrink_by_one(&mut self, position: usize) {
        if position >= self.width() {
            return;
        }
        self.spans.remove(position);
        self.drop_wrecked_nodes(position);
    }

    /// Drop nodes starting before `position` whose range reaches it.
    fn drop_wrecked_nodes(&mut self, position: usize) {
        let begin = position.saturating_sub(self.max_span_length - 1);
        let end = position.min(self.width());
        for start in begin..end {
            self.spans[start].drop_nodes_of_or_beyond(position - start + 1);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.spans.clear();
    }
}
