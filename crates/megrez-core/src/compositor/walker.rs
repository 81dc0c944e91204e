//! Best-path search over the grid.
//!
//! Positions 0..=width form a DAG where each node starting at `p` with span
//! length `q` is an edge `p -> p + q` weighted by its effective score. Edges
//! only move forward, so one sweep in position order with a best-score and
//! back-pointer per position finds the maximum-weight path in O(width * K).

use tracing::{debug, debug_span};

use crate::grid::Node;

use super::Compositor;

/// The segmentation chosen by a walk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkResult {
    pub nodes: Vec<Node>,
    /// Sum of the chosen nodes' effective scores.
    pub total_score: f64,
}

impl WalkResult {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn values(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.value().to_string()).collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.key().to_string()).collect()
    }

    /// Positions where segments begin or end, from 0 through the total length.
    pub fn segment_boundaries(&self) -> Vec<usize> {
        let mut boundaries = Vec::with_capacity(self.nodes.len() + 1);
        let mut pos = 0;
        boundaries.push(pos);
        for node in &self.nodes {
            pos += node.span_length();
            boundaries.push(pos);
        }
        boundaries
    }

    /// The segment containing the reading at `cursor`, with its end position.
    ///
    /// A cursor at or past the end maps to the last segment.
    pub fn find_node(&self, cursor: usize) -> Option<(&Node, usize)> {
        let mut end = 0;
        for node in &self.nodes {
            end += node.span_length();
            if end > cursor {
                return Some((node, end));
            }
        }
        self.nodes.last().map(|n| (n, end))
    }
}

impl Compositor {
    /// Find the highest-scoring segmentation of the whole reading sequence.
    ///
    /// Ties go to whichever edge reached a position first in (start, length)
    /// order, so an unchanged grid always yields the same result. Never
    /// mutates the grid.
    pub fn walk(&self) -> WalkResult {
        let grid = &self.grid;
        let width = grid.width();
        let _span = debug_span!("walk", width).entered();
        if width == 0 {
            return WalkResult::default();
        }

        // best[p]: best accumulated score reaching p.
        // back[p]: (start, length) of the edge that achieved it.
        let mut best: Vec<Option<f64>> = vec![None; width + 1];
        let mut back: Vec<(usize, usize)> = vec![(0, 0); width + 1];
        best[0] = Some(0.0);

        for (start, span) in grid.spans().iter().enumerate() {
            let Some(base) = best[start] else {
                continue;
            };
            for node in span.nodes() {
                let end = start + node.span_length();
                debug_assert!(end <= width, "node runs past the grid");
                let score = base + node.effective_score();
                if best[end].map_or(true, |b| score > b) {
                    best[end] = Some(score);
                    back[end] = (start, node.span_length());
                }
            }
        }

        let Some(total_score) = best[width] else {
            debug!("no path reaches the end of the grid");
            return WalkResult::default();
        };

        let mut nodes = Vec::new();
        let mut pos = width;
        while pos > 0 {
            let (start, length) = back[pos];
            let node = grid
                .node(start, length)
                .expect("back-pointer refers to a materialized node");
            nodes.push(node.clone());
            pos = start;
        }
        nodes.reverse();

        debug!(segments = nodes.len(), total_score);
        WalkResult { nodes, total_score }
    }
}
