//! Dense classifier inputs from preprocessed batches.
//!
//! Layout of one dense row, left to right:
//!
//! | float features | id-score-list | embedding | one-hot id-list (optional) |
//!
//! With one-hot enabled, each id-list column contributes `cardinality` slots
//! (trained categories plus the trailing unknown bucket).

use arrow::datatypes::Schema;
use burn::prelude::*;
use burn::tensor::TensorData;
use intake::{
    ColumnVocabulary, FeatureSchema, PreprocError, PreprocessedBatch, Vocabulary, embedding_width,
};
use ndarray::{Array2, s};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("one-hot encoding needs a fitted vocabulary")]
    MissingVocabulary,

    #[error("index {index} in id-list column '{column}' exceeds cardinality {cardinality}")]
    IndexOutOfRange {
        column: String,
        index: i64,
        cardinality: usize,
    },

    #[error("batch produces no dense features")]
    EmptyInput,

    #[error(transparent)]
    Preproc(#[from] PreprocError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureAssembler {
    pub one_hot_id_lists: bool,
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self {
            one_hot_id_lists: true,
        }
    }
}

impl FeatureAssembler {
    /// Float, id-score-list and embedding columns only.
    pub fn dense_only() -> Self {
        Self {
            one_hot_id_lists: false,
        }
    }

    /// Width of the dense row [`FeatureAssembler::assemble`] will produce for
    /// batches described by `schema`.
    ///
    /// Embedding widths are read from `fields` (the raw table's arrow schema),
    /// so a fixed-size list embedding counts its full length.
    pub fn input_dim<S: FeatureSchema>(
        &self,
        schema: &S,
        vocabulary: Option<&Vocabulary>,
        fields: &Schema,
    ) -> Result<usize, FeatureError> {
        let mut width =
            schema.float_feature_names().len() + schema.id_score_list_feature_names().len();
        for name in schema.embedding_feature_names() {
            let field = fields
                .field_with_name(name)
                .map_err(|_| PreprocError::MissingColumn(name.clone()))?;
            width += embedding_width(name, field.data_type())?;
        }
        if self.one_hot_id_lists {
            width += one_hot_columns(schema.id_list_feature_names(), vocabulary)?
                .iter()
                .map(|(_, v)| v.cardinality())
                .sum::<usize>();
        }
        Ok(width)
    }

    pub fn assemble(
        &self,
        batch: &PreprocessedBatch,
        vocabulary: Option<&Vocabulary>,
    ) -> Result<Array2<f32>, FeatureError> {
        let one_hot = if self.one_hot_id_lists {
            one_hot_columns(&batch.id_list_names, vocabulary)?
        } else {
            Vec::new()
        };
        let width = batch.float_features.ncols()
            + batch.id_score_list_features.ncols()
            + batch.embedding_features.ncols()
            + one_hot.iter().map(|(_, v)| v.cardinality()).sum::<usize>();
        if width == 0 {
            return Err(FeatureError::EmptyInput);
        }

        let num_rows = batch.num_rows();
        let mut out = Array2::<f32>::zeros((num_rows, width));
        let mut offset = 0;
        for block in [
            &batch.float_features,
            &batch.id_score_list_features,
            &batch.embedding_features,
        ] {
            let w = block.ncols();
            out.slice_mut(s![.., offset..offset + w])
                .assign(&block.mapv(|v| v as f32));
            offset += w;
        }

        for (c, (name, vocab)) in one_hot.iter().enumerate() {
            let cardinality = vocab.cardinality();
            for (row, &index) in batch.id_list_features.column(c).iter().enumerate() {
                if index < 0 || index as usize >= cardinality {
                    return Err(FeatureError::IndexOutOfRange {
                        column: name.to_string(),
                        index,
                        cardinality,
                    });
                }
                out[[row, offset + index as usize]] = 1.0;
            }
            offset += cardinality;
        }
        Ok(out)
    }
}

/// Vocabulary entries for the named id-list columns, looked up by name.
fn one_hot_columns<'a>(
    names: &'a [String],
    vocabulary: Option<&'a Vocabulary>,
) -> Result<Vec<(&'a str, &'a ColumnVocabulary)>, FeatureError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let vocabulary = vocabulary.ok_or(FeatureError::MissingVocabulary)?;
    names
        .iter()
        .map(|name| Ok((name.as_str(), vocabulary.column(name)?)))
        .collect()
}

/// Copy a row-major `ndarray` matrix into a backend tensor.
pub fn float_tensor<B: Backend>(array: &Array2<f32>, device: &B::Device) -> Tensor<B, 2> {
    let (rows, cols) = array.dim();
    let data = TensorData::new(array.iter().copied().collect::<Vec<f32>>(), [rows, cols]);
    Tensor::from_data(data, device)
}

pub fn int_tensor<B: Backend>(array: &Array2<i64>, device: &B::Device) -> Tensor<B, 2, Int> {
    let (rows, cols) = array.dim();
    let data = TensorData::new(array.iter().copied().collect::<Vec<i64>>(), [rows, cols]);
    Tensor::from_data(data, device)
}

/// A preprocessed batch moved onto a device.
#[derive(Debug, Clone)]
pub struct FeatureTensors<B: Backend> {
    /// [B, input_dim]
    pub dense: Tensor<B, 2>,
    /// [B, num_id_list_columns]; `None` when the schema has no id-list columns.
    pub id_list: Option<Tensor<B, 2, Int>>,
    /// [B, 1]
    pub labels: Tensor<B, 2>,
}

impl<B: Backend> FeatureTensors<B> {
    pub fn from_batch(
        batch: &PreprocessedBatch,
        assembler: &FeatureAssembler,
        vocabulary: Option<&Vocabulary>,
        device: &B::Device,
    ) -> Result<Self, FeatureError> {
        let dense = float_tensor(&assembler.assemble(batch, vocabulary)?, device);
        let id_list = (batch.id_list_features.ncols() > 0)
            .then(|| int_tensor(&batch.id_list_features, device));

        let labels = batch.labels_f64()?;
        let labels = Array2::from_shape_fn((labels.len(), 1), |(row, _)| labels[row] as f32);
        let labels = float_tensor(&labels, device);

        Ok(Self {
            dense,
            id_list,
            labels,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.dense.dims()[1]
    }

    pub fn num_rows(&self) -> usize {
        self.dense.dims()[0]
    }
}
