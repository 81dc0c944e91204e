//! Grid-based composition engine for phonetic input methods.
//!
//! Reading tokens (syllables) are inserted into a [`Compositor`], which keeps
//! a grid of candidate nodes for every buildable key and walks it to find the
//! highest-scoring segmentation.

pub mod compositor;
pub mod grid;
pub mod lm;
pub mod settings;

pub use compositor::{
    Candidate, CandidateFilter, Compositor, TypingDirection, WalkResult,
};
pub use grid::{Grid, Node, OverrideKind, Span};
pub use lm::{LanguageModel, RankedModel, TextModel, Unigram};
