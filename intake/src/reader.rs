//! Loading raw batches from parquet.
//!
//! A parquet file holds the features and the label side by side. The reader
//! concatenates all row groups into one batch, splits the label column off,
//! and drops columns that no feature group names.

use std::fs::File;
use std::path::Path;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{info, warn};

use crate::batch::InputBatch;
use crate::error::{PreprocError, Result};
use crate::schema::{FeatureGroups, FeatureSchema};

#[derive(Debug, Clone)]
pub struct DataReader {
    groups: FeatureGroups,
}

impl DataReader {
    pub fn new(groups: FeatureGroups) -> Result<Self> {
        groups.validate()?;
        Ok(Self { groups })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        Ok(Self {
            groups: FeatureGroups::from_json_file(path)?,
        })
    }

    pub fn groups(&self) -> &FeatureGroups {
        &self.groups
    }

    pub fn read_parquet(&self, path: &Path) -> Result<InputBatch> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema().clone();
        let reader = builder.build()?;

        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        let batch = concat_batches(&schema, &batches)?;
        info!(
            "Read {} rows x {} columns from {}",
            batch.num_rows(),
            batch.num_columns(),
            path.display()
        );
        self.split(&batch)
    }

    /// Split a combined table into feature columns and the label column.
    pub fn split(&self, batch: &RecordBatch) -> Result<InputBatch> {
        let labels = batch
            .column_by_name(&self.groups.label)
            .cloned()
            .ok_or_else(|| PreprocError::MissingColumn(self.groups.label.clone()))?;

        let schema = batch.schema();
        let mut keep = Vec::new();
        for (i, field) in schema.fields().iter().enumerate() {
            let name = field.name();
            if name == &self.groups.label {
                continue;
            }
            if self.groups.all_feature_names().any(|f| f == name.as_str()) {
                keep.push(i);
            } else {
                warn!("Column '{}' is not in any feature group, dropping it", name);
            }
        }
        let features = batch.project(&keep)?;
        InputBatch::try_new(features, labels)
    }
}

impl FeatureSchema for DataReader {
    fn float_feature_names(&self) -> &[String] {
        self.groups.float_feature_names()
    }
    fn id_list_feature_names(&self) -> &[String] {
        self.groups.id_list_feature_names()
    }
    fn id_score_list_feature_names(&self) -> &[String] {
        self.groups.id_score_list_feature_names()
    }
    fn embedding_feature_names(&self) -> &[String] {
        self.groups.embedding_feature_names()
    }
}
