//! Language-model capability consumed by the compositor.
//!
//! A model maps an ordered run of reading tokens to scored candidate values
//! (`Unigram`s). The compositor only ever queries it; any storage, loading or
//! training lives behind the trait.

mod text;

pub use text::{ModelError, TextModel};

use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// A scored candidate value for one key.
///
/// Scores are log-probability-like: higher is better, usually negative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Unigram {
    pub value: String,
    pub score: f64,
}

impl Unigram {
    pub fn new(value: impl Into<String>, score: f64) -> Self {
        Self {
            value: value.into(),
            score,
        }
    }
}

// Scores compare bitwise so that equality agrees with `Hash` (and NaN equals itself).
impl PartialEq for Unigram {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.score.to_bits() == other.score.to_bits()
    }
}

impl Eq for Unigram {}

impl Hash for Unigram {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.score.to_bits().hash(state);
    }
}

pub trait LanguageModel: Send + Sync {
    /// Unigrams for the key formed by `key_tokens`, best first. Empty if unknown.
    fn unigrams_for(&self, key_tokens: &[String]) -> Vec<Unigram>;

    fn has_unigrams(&self, key_tokens: &[String]) -> bool {
        !self.unigrams_for(key_tokens).is_empty()
    }
}

impl<T: LanguageModel + ?Sized> LanguageModel for Arc<T> {
    fn unigrams_for(&self, key_tokens: &[String]) -> Vec<Unigram> {
        (**self).unigrams_for(key_tokens)
    }

    fn has_unigrams(&self, key_tokens: &[String]) -> bool {
        (**self).has_unigrams(key_tokens)
    }
}

/// Lets a caller keep write access to a model the compositor is reading from.
impl<T: LanguageModel> LanguageModel for RwLock<T> {
    fn unigrams_for(&self, key_tokens: &[String]) -> Vec<Unigram> {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .unigrams_for(key_tokens)
    }

    fn has_unigrams(&self, key_tokens: &[String]) -> bool {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .has_unigrams(key_tokens)
    }
}

/// Adapter that returns the wrapped model's unigrams sorted by descending score.
///
/// The sort is stable, so values with equal scores keep the model's order.
#[derive(Clone)]
pub struct RankedModel<L> {
    inner: L,
}

impl<L: LanguageModel> RankedModel<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L: LanguageModel> LanguageModel for RankedModel<L> {
    fn unigrams_for(&self, key_tokens: &[String]) -> Vec<Unigram> {
        let mut unigrams = self.inner.unigrams_for(key_tokens);
        unigrams.sort_by(|a, b| b.score.total_cmp(&a.score));
        unigrams
    }

    fn has_unigrams(&self, key_tokens: &[String]) -> bool {
        self.inner.has_unigrams(key_tokens)
    }
}
