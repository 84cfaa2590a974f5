use arrow::datatypes::DataType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocError {
    #[error("column '{0}' not found in features table")]
    MissingColumn(String),

    #[error("no vocabulary for id-list column '{0}'; run a training-mode transform first")]
    MissingVocabulary(String),

    #[error("column '{column}' has unsupported type {data_type} for this feature group")]
    UnsupportedType { column: String, data_type: DataType },

    #[error("label column has unsupported type {0}")]
    UnsupportedLabelType(DataType),

    #[error("features have {features} rows but labels have {labels}")]
    RowCountMismatch { features: usize, labels: usize },

    #[error("column '{0}' is listed in more than one feature group")]
    OverlappingFeatureGroups(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("failed to parse feature description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PreprocError>;
