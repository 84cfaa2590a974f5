//! Training-time categorical vocabularies.
//!
//! Each id-list column gets its own vocabulary: the sorted distinct values
//! observed during training, indexed `0..k`. Anything not in the vocabulary
//! encodes to `k`, a single shared unknown bucket per column.

use std::collections::BTreeSet;
use std::fmt;

use arrow::array::{Array, RecordBatch};
use ordered_float::OrderedFloat;

use crate::columns::{category_values, column};
use crate::error::{PreprocError, Result};

/// A single raw category value. A column only ever produces one variant,
/// so ordering within a column is the natural order of that kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoryValue {
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryValue::Int(v) => write!(f, "{v}"),
            CategoryValue::Float(v) => write!(f, "{}", v.0),
            CategoryValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for CategoryValue {
    fn from(v: i64) -> Self {
        CategoryValue::Int(v)
    }
}

impl From<f64> for CategoryValue {
    fn from(v: f64) -> Self {
        CategoryValue::Float(OrderedFloat(v))
    }
}

impl From<&str> for CategoryValue {
    fn from(v: &str) -> Self {
        CategoryValue::Str(v.to_string())
    }
}

impl From<String> for CategoryValue {
    fn from(v: String) -> Self {
        CategoryValue::Str(v)
    }
}

/// Vocabulary for one id-list column.
///
/// Stored as a sorted, deduplicated list; a value's index is its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnVocabulary {
    categories: Vec<CategoryValue>,
}

impl ColumnVocabulary {
    /// Build from observed values. Nulls never enter the vocabulary.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<CategoryValue>>,
    {
        let distinct: BTreeSet<CategoryValue> = values.into_iter().flatten().collect();
        Self {
            categories: distinct.into_iter().collect(),
        }
    }

    /// Number of trained categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// The shared index for values not seen during training.
    pub fn unknown_index(&self) -> i64 {
        self.categories.len() as i64
    }

    /// Number of distinct encoded indices, including the unknown bucket.
    pub fn cardinality(&self) -> usize {
        self.categories.len() + 1
    }

    pub fn index_of(&self, value: &CategoryValue) -> Option<i64> {
        self.categories.binary_search(value).ok().map(|i| i as i64)
    }

    pub fn encode(&self, value: Option<&CategoryValue>) -> i64 {
        value
            .and_then(|v| self.index_of(v))
            .unwrap_or_else(|| self.unknown_index())
    }

    /// Trained categories in index order.
    pub fn categories(&self) -> &[CategoryValue] {
        &self.categories
    }
}

/// Vocabularies for every id-list column, in id-list name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    columns: Vec<(String, ColumnVocabulary)>,
}

impl Vocabulary {
    /// Build a fresh vocabulary for the named columns of `features`.
    pub fn build(features: &RecordBatch, names: &[String]) -> Result<Self> {
        let selected = names
            .iter()
            .map(|name| Ok((name.as_str(), column(features, name)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::from_columns(selected)
    }

    /// Build from already-selected `(name, column)` pairs.
    pub fn from_columns<'a, I>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a dyn Array)>,
    {
        let columns = columns
            .into_iter()
            .map(|(name, array)| {
                let values = category_values(array)?;
                Ok((name.to_string(), ColumnVocabulary::from_values(values)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    pub fn get(&self, name: &str) -> Option<&ColumnVocabulary> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Like [`Vocabulary::get`], failing with [`PreprocError::MissingVocabulary`].
    pub fn column(&self, name: &str) -> Result<&ColumnVocabulary> {
        self.get(name)
            .ok_or_else(|| PreprocError::MissingVocabulary(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnVocabulary)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
