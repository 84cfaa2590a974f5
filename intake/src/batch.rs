use arrow::array::{Array, ArrayRef, RecordBatch};

use crate::error::{PreprocError, Result};

/// One batch of raw examples: a features table and a row-aligned label column.
#[derive(Debug, Clone)]
pub struct InputBatch {
    features: RecordBatch,
    labels: ArrayRef,
}

impl InputBatch {
    pub fn try_new(features: RecordBatch, labels: ArrayRef) -> Result<Self> {
        if features.num_rows() != labels.len() {
            return Err(PreprocError::RowCountMismatch {
                features: features.num_rows(),
                labels: labels.len(),
            });
        }
        Ok(Self { features, labels })
    }

    pub fn features(&self) -> &RecordBatch {
        &self.features
    }

    pub fn labels(&self) -> &ArrayRef {
        &self.labels
    }

    pub fn num_rows(&self) -> usize {
        self.features.num_rows()
    }
}
