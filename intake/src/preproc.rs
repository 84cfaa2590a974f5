//! The feature preprocessor.
//!
//! Splits a raw batch into the four feature groups, fits (training mode) or
//! applies (evaluation mode) the id-list vocabulary, and emits row-aligned
//! `ndarray` matrices.

use arrow::array::{Array, ArrayRef};
use ndarray::{Array1, Array2, ArrayView1};
use tracing::{debug, info};

use crate::batch::InputBatch;
use crate::columns::{category_values, column, embedding_values, numeric_values};
use crate::error::{PreprocError, Result};
use crate::schema::FeatureSchema;
use crate::vocab::Vocabulary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Rebuild the vocabulary from every batch transformed.
    #[default]
    Train,
    /// Encode against the stored vocabulary; never modify it.
    Eval,
}

/// Output of [`InputPreproc::transform`]. Every array has one row per input example.
#[derive(Debug, Clone)]
pub struct PreprocessedBatch {
    pub float_features: Array2<f64>,
    pub id_list_features: Array2<i64>,
    pub id_score_list_features: Array2<f64>,
    pub embedding_features: Array2<f64>,
    /// Names of the `id_list_features` columns, in column order.
    pub id_list_names: Vec<String>,
    pub labels: ArrayRef,
}

impl PreprocessedBatch {
    pub fn num_rows(&self) -> usize {
        self.labels.len()
    }

    /// Labels cast to `f64`, nulls as `NaN`.
    pub fn labels_f64(&self) -> Result<Array1<f64>> {
        match numeric_values("label", self.labels.as_ref()) {
            Ok(values) => Ok(Array1::from(values)),
            Err(PreprocError::UnsupportedType { data_type, .. }) => {
                Err(PreprocError::UnsupportedLabelType(data_type))
            }
            Err(e) => Err(e),
        }
    }
}

/// Named columns for each feature group, selected from one batch.
struct GroupColumns<'a> {
    float: Vec<(&'a str, &'a dyn Array)>,
    id_list: Vec<(&'a str, &'a dyn Array)>,
    id_score_list: Vec<(&'a str, &'a dyn Array)>,
    embedding: Vec<(&'a str, &'a dyn Array)>,
}

fn select<'a>(batch: &'a InputBatch, names: &'a [String]) -> Result<Vec<(&'a str, &'a dyn Array)>> {
    names
        .iter()
        .map(|name| Ok((name.as_str(), column(batch.features(), name)?)))
        .collect()
}

fn dense_matrix(num_rows: usize, columns: &[(&str, &dyn Array)]) -> Result<Array2<f64>> {
    let mut out = Array2::<f64>::zeros((num_rows, columns.len()));
    for (c, (name, array)) in columns.iter().enumerate() {
        let values = numeric_values(name, *array)?;
        out.column_mut(c).assign(&ArrayView1::from(values.as_slice()));
    }
    Ok(out)
}

fn embedding_matrix(num_rows: usize, columns: &[(&str, &dyn Array)]) -> Result<Array2<f64>> {
    let flattened = columns
        .iter()
        .map(|(name, array)| embedding_values(name, *array))
        .collect::<Result<Vec<_>>>()?;
    let total_width: usize = flattened.iter().map(|(w, _)| w).sum();

    let mut out = Array2::<f64>::zeros((num_rows, total_width));
    let mut offset = 0;
    for (width, values) in &flattened {
        for row in 0..num_rows {
            for j in 0..*width {
                out[[row, offset + j]] = values[row * width + j];
            }
        }
        offset += width;
    }
    Ok(out)
}

/// Turns raw batches into model-ready arrays.
///
/// The preprocessor owns the id-list vocabulary. A training-mode transform
/// replaces it wholesale with one fitted on that batch alone; evaluation-mode
/// transforms only read it.
#[derive(Debug, Clone)]
pub struct InputPreproc<S> {
    schema: S,
    mode: Mode,
    vocabulary: Option<Vocabulary>,
}

impl<S: FeatureSchema> InputPreproc<S> {
    pub fn new(schema: S, mode: Mode) -> Self {
        Self {
            schema,
            mode,
            vocabulary: None,
        }
    }

    /// An evaluation-mode preprocessor around a vocabulary fitted elsewhere.
    pub fn with_vocabulary(schema: S, vocabulary: Vocabulary) -> Self {
        Self {
            schema,
            mode: Mode::Eval,
            vocabulary: Some(vocabulary),
        }
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref()
    }

    pub fn transform(&mut self, batch: &InputBatch) -> Result<PreprocessedBatch> {
        let num_rows = batch.num_rows();
        let groups = GroupColumns {
            float: select(batch, self.schema.float_feature_names())?,
            id_list: select(batch, self.schema.id_list_feature_names())?,
            id_score_list: select(batch, self.schema.id_score_list_feature_names())?,
            embedding: select(batch, self.schema.embedding_feature_names())?,
        };

        // A training-mode fit is only stored once every group has been built.
        let fitted = match self.mode {
            Mode::Train => Some(Vocabulary::from_columns(groups.id_list.iter().copied())?),
            Mode::Eval => None,
        };

        let float_features = dense_matrix(num_rows, &groups.float)?;
        let id_list_features = encode_id_lists(
            num_rows,
            &groups.id_list,
            fitted.as_ref().or(self.vocabulary.as_ref()),
        )?;
        let id_score_list_features = dense_matrix(num_rows, &groups.id_score_list)?;
        let embedding_features = embedding_matrix(num_rows, &groups.embedding)?;

        debug!(
            "Transformed {} rows ({:?}): float={} id_list={} id_score_list={} embedding={}",
            num_rows,
            self.mode,
            float_features.ncols(),
            id_list_features.ncols(),
            id_score_list_features.ncols(),
            embedding_features.ncols()
        );

        if let Some(vocabulary) = fitted {
            for (name, vocab) in vocabulary.iter() {
                info!("Vocabulary for '{}': {} categories", name, vocab.len());
            }
            self.vocabulary = Some(vocabulary);
        }

        Ok(PreprocessedBatch {
            float_features,
            id_list_features,
            id_score_list_features,
            embedding_features,
            id_list_names: self.schema.id_list_feature_names().to_vec(),
            labels: batch.labels().clone(),
        })
    }
}

fn encode_id_lists(
    num_rows: usize,
    columns: &[(&str, &dyn Array)],
    vocabulary: Option<&Vocabulary>,
) -> Result<Array2<i64>> {
    let mut out = Array2::<i64>::zeros((num_rows, columns.len()));
    let Some(&(first, _)) = columns.first() else {
        return Ok(out);
    };
    let vocabulary = vocabulary.ok_or_else(|| PreprocError::MissingVocabulary(first.to_string()))?;

    for (c, (name, array)) in columns.iter().enumerate() {
        let vocab = vocabulary.column(name)?;
        let unknown = vocab.unknown_index();
        let mut num_unknown = 0usize;
        for (row, value) in category_values(*array)?.iter().enumerate() {
            let idx = vocab.encode(value.as_ref());
            if idx == unknown {
                num_unknown += 1;
            }
            out[[row, c]] = idx;
        }
        if num_unknown > 0 {
            debug!("'{}': {} of {} values in the unknown bucket", name, num_unknown, num_rows);
        }
    }
    Ok(out)
}
