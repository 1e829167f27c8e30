//! No-repeat rotation over a fixed list of strings.
//!
//! Items are drawn from a shuffled bag. When the bag runs out it is refilled
//! with a fresh permutation, and if that permutation would start with the item
//! just shown, the first two entries are swapped. Every item therefore appears
//! once per bag and the same item is never returned twice in a row across a bag
//! boundary (unless the source has only one item).

use std::collections::{HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffle-bag rotator.
#[derive(Debug, Clone)]
pub struct NoRepeatRotator {
    source: Vec<String>,
    pool: VecDeque<String>,
    last_shown: Option<String>,
    rng: StdRng,
}

impl NoRepeatRotator {
    /// Rotate over `items`. Empty strings and duplicates are dropped; the
    /// first occurrence of each item is kept.
    #[must_use]
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_rng(items, StdRng::from_entropy())
    }

    /// Like [`Self::new`] with a caller-supplied generator.
    #[must_use]
    pub fn with_rng<I, S>(items: I, rng: StdRng) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let source = items
            .into_iter()
            .map(Into::into)
            .filter(|item: &String| !item.is_empty() && seen.insert(item.clone()))
            .collect();

        Self {
            source,
            pool: VecDeque::new(),
            last_shown: None,
            rng,
        }
    }

    /// Next item, or `""` if there is nothing to rotate over.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> &str {
        if self.source.is_empty() {
            return "";
        }
        if self.pool.is_empty() {
            self.refill();
        }

        // refill() leaves the pool non-empty for a non-empty source
        self.last_shown = self.pool.pop_front();
        self.last_shown.as_deref().unwrap_or("")
    }

    fn refill(&mut self) {
        let mut bag = self.source.clone();
        bag.shuffle(&mut self.rng);

        if bag.len() >= 2 && self.last_shown.as_ref() == bag.first() {
            bag.swap(0, 1);
        }
        self.pool = bag.into();
    }

    /// Forget the current bag and the last item shown.
    pub fn reset(&mut self) {
        self.pool.clear();
        self.last_shown = None;
    }

    /// Distinct items in rotation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Whether there is nothing to rotate over.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Items left before the bag is refilled.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pool.len()
    }
}
