//! Feature intake: turns tabular batches into numeric arrays for modeling.
//!
//! Columns are split into four groups (float, id-list, id-score-list,
//! embedding) by a [`schema::FeatureSchema`]; id-list columns are encoded
//! against a vocabulary fitted in training mode.

pub mod batch;
pub mod columns;
pub mod error;
pub mod preproc;
pub mod reader;
pub mod schema;
pub mod vocab;

pub use batch::InputBatch;
pub use columns::embedding_width;
pub use error::{PreprocError, Result};
pub use preproc::{InputPreproc, Mode, PreprocessedBatch};
pub use reader::DataReader;
pub use schema::{FeatureGroups, FeatureSchema};
pub use vocab::{CategoryValue, ColumnVocabulary, Vocabulary};
