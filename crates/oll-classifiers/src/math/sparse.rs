use std::collections::HashMap;
use std::iter::FromIterator;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// Anything that may be used as a feature key when building a [`SparseVector`].
///
/// Only keys that represent a non-negative integer in `u32` range are accepted;
/// everything else is rejected with [`ClassifierError::UnsupportedFeature`]
/// rather than being rounded or truncated.
pub trait FeatureKey {
    fn to_index(&self) -> Result<u32>;
}

macro_rules! integer_feature_key {
    ($($t:ty),*) => {
        $(
            impl FeatureKey for $t {
                fn to_index(&self) -> Result<u32> {
                    u32::try_from(*self)
                        .map_err(|_| ClassifierError::UnsupportedFeature(self.to_string()))
                }
            }
        )*
    };
}

integer_feature_key!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl FeatureKey for f64 {
    fn to_index(&self) -> Result<u32> {
        let value = *self;
        if value.is_finite() && value.fract() == 0.0 && value >= 0.0 && value <= u32::MAX as f64 {
            Ok(value as u32)
        } else {
            Err(ClassifierError::UnsupportedFeature(value.to_string()))
        }
    }
}

impl FeatureKey for f32 {
    fn to_index(&self) -> Result<u32> {
        f64::from(*self).to_index()
    }
}

impl FeatureKey for str {
    fn to_index(&self) -> Result<u32> {
        self.trim()
            .parse::<u32>()
            .map_err(|_| ClassifierError::UnsupportedFeature(format!("{:?}", self)))
    }
}

impl FeatureKey for String {
    fn to_index(&self) -> Result<u32> {
        self.as_str().to_index()
    }
}

impl<K: FeatureKey + ?Sized> FeatureKey for &K {
    fn to_index(&self) -> Result<u32> {
        (**self).to_index()
    }
}

/// A single example's features: unique `(index, value)` pairs kept in
/// ascending index order.
///
/// The ordering makes every reduction over an example (dot products, norms)
/// run in the same order no matter how the caller assembled the features, so
/// identical inputs always produce bit-identical scores.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary keys, failing on the first key that is not a
    /// valid index. Later duplicates overwrite earlier ones.
    pub fn try_from_pairs<K, I>(pairs: I) -> Result<Self>
    where
        K: FeatureKey,
        I: IntoIterator<Item = (K, f32)>,
    {
        let mut entries = Vec::new();
        for (key, value) in pairs {
            entries.push((key.to_index()?, value));
        }
        Ok(Self::from_unsorted(entries))
    }

    /// Build from raw `(index, value)` pairs in any order.
    pub fn from_unsorted(mut entries: Vec<(u32, f32)>) -> Self {
        // stable sort keeps insertion order among duplicates, so the last one survives below
        entries.sort_by_key(|&(index, _)| index);
        let mut deduped: Vec<(u32, f32)> = Vec::with_capacity(entries.len());
        for (index, value) in entries {
            match deduped.last_mut() {
                Some(last) if last.0 == index => last.1 = value,
                _ => deduped.push((index, value)),
            }
        }
        Self { entries: deduped }
    }

    /// Set the value of one feature, keeping the index order.
    pub fn insert(&mut self, index: u32, value: f32) {
        match self.entries.binary_search_by_key(&index, |&(i, _)| i) {
            Ok(pos) => self.entries[pos].1 = value,
            Err(pos) => self.entries.insert(pos, (index, value)),
        }
    }

    pub fn get(&self, index: u32) -> Option<f32> {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .ok()
            .map(|pos| self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn as_slice(&self) -> &[(u32, f32)] {
        &self.entries
    }

    /// Merge-join dot product over the two sorted entry lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a_val) = self.entries[i];
            let (b_idx, b_val) = other.entries[j];
            if a_idx == b_idx {
                sum += a_val * b_val;
                i += 1;
                j += 1;
            } else if a_idx < b_idx {
                i += 1;
            } else {
                j += 1;
            }
        }
        sum
    }

    pub fn squared_norm(&self) -> f32 {
        self.entries.iter().map(|&(_, v)| v * v).sum()
    }

    pub fn norm(&self) -> f32 {
        self.squared_norm().sqrt()
    }
}

impl FromIterator<(u32, f32)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (u32, f32)>>(iter: I) -> Self {
        SparseVector::from_unsorted(iter.into_iter().collect())
    }
}

impl From<Vec<(u32, f32)>> for SparseVector {
    fn from(value: Vec<(u32, f32)>) -> Self {
        SparseVector::from_unsorted(value)
    }
}

impl<K: FeatureKey> TryFrom<HashMap<K, f32>> for SparseVector {
    type Error = ClassifierError;

    fn try_from(value: HashMap<K, f32>) -> Result<Self> {
        SparseVector::try_from_pairs(value)
    }
}

/// Model-side weights: a lazily growing index-keyed map.
///
/// Missing indices read as zero. Reductions over all weights walk the
/// entries in ascending index order, never in hash order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredWeights", into = "StoredWeights")]
pub struct WeightVector {
    values: HashMap<u32, f32>,
}

/// On-disk form of a [`WeightVector`]: entries in ascending index order.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredWeights {
    entries: Vec<(u32, f32)>,
}

impl From<StoredWeights> for WeightVector {
    fn from(stored: StoredWeights) -> Self {
        WeightVector {
            values: stored.entries.into_iter().collect(),
        }
    }
}

impl From<WeightVector> for StoredWeights {
    fn from(weights: WeightVector) -> Self {
        StoredWeights {
            entries: weights.sorted_entries(),
        }
    }
}

impl WeightVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: u32) -> f32 {
        self.values.get(&index).copied().unwrap_or(0.0)
    }

    /// Number of indices that have been touched by an update.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `w · x`, accumulated in the index order of `x`.
    pub fn dot(&self, x: &SparseVector) -> f32 {
        x.iter()
            .filter_map(|(index, value)| self.values.get(&index).map(|w| w * value))
            .sum()
    }

    /// `w[i] += alpha * x[i]` for every feature of `x`.
    pub fn scaled_add(&mut self, alpha: f32, x: &SparseVector) {
        for (index, value) in x.iter() {
            self.add_at(index, alpha * value);
        }
    }

    /// `w[index] += delta`, creating the entry at zero first.
    pub fn add_at(&mut self, index: u32, delta: f32) {
        *self.values.entry(index).or_insert(0.0) += delta;
    }

    /// Multiply every weight by `factor`.
    pub fn scale(&mut self, factor: f32) {
        for value in self.values.values_mut() {
            *value *= factor;
        }
    }

    /// Exact `|w|^2`, summed in ascending index order.
    pub fn squared_norm(&self) -> f32 {
        self.sorted_entries().iter().map(|&(_, v)| v * v).sum()
    }

    pub fn sorted_entries(&self) -> Vec<(u32, f32)> {
        let mut entries: Vec<(u32, f32)> = self.values.iter().map(|(&i, &v)| (i, v)).collect();
        entries.sort_unstable_by_key(|&(index, _)| index);
        entries
    }
}
