//! Feature group descriptions.
//!
//! A feature description names which raw columns belong to each of the four
//! feature groups the preprocessor understands. The groups are disjoint and
//! their order is significant: output array columns follow the order of the
//! name lists, not the order of the columns in the input table.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PreprocError, Result};

/// Supplies the four ordered name lists that drive column selection.
pub trait FeatureSchema {
    /// Continuous features, passed through as `f64`.
    fn float_feature_names(&self) -> &[String];

    /// Categorical features, encoded against a trained vocabulary.
    fn id_list_feature_names(&self) -> &[String];

    /// Weighted categorical features; only the weight is encoded, cast to `f64`.
    fn id_score_list_feature_names(&self) -> &[String];

    /// Pre-embedded features, passed through as `f64`.
    fn embedding_feature_names(&self) -> &[String];
}

impl<T: FeatureSchema + ?Sized> FeatureSchema for &T {
    fn float_feature_names(&self) -> &[String] {
        (**self).float_feature_names()
    }
    fn id_list_feature_names(&self) -> &[String] {
        (**self).id_list_feature_names()
    }
    fn id_score_list_feature_names(&self) -> &[String] {
        (**self).id_score_list_feature_names()
    }
    fn embedding_feature_names(&self) -> &[String] {
        (**self).embedding_feature_names()
    }
}

impl<T: FeatureSchema + ?Sized> FeatureSchema for Arc<T> {
    fn float_feature_names(&self) -> &[String] {
        (**self).float_feature_names()
    }
    fn id_list_feature_names(&self) -> &[String] {
        (**self).id_list_feature_names()
    }
    fn id_score_list_feature_names(&self) -> &[String] {
        (**self).id_score_list_feature_names()
    }
    fn embedding_feature_names(&self) -> &[String] {
        (**self).embedding_feature_names()
    }
}

/// The on-disk feature description: four group name lists plus the label column.
///
/// ```json
/// {
///   "label": "clicked",
///   "float_features": ["age"],
///   "id_list_features": ["country"],
///   "id_score_list_features": ["topic_weight"],
///   "embedding_features": ["user_vec"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureGroups {
    pub label: String,
    #[serde(default)]
    pub float_features: Vec<String>,
    #[serde(default)]
    pub id_list_features: Vec<String>,
    #[serde(default)]
    pub id_score_list_features: Vec<String>,
    #[serde(default)]
    pub embedding_features: Vec<String>,
}

impl FeatureGroups {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_float_features<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.float_features = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id_list_features<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.id_list_features = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id_score_list_features<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.id_score_list_features = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_embedding_features<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.embedding_features = names.into_iter().map(Into::into).collect();
        self
    }

    /// Parse and validate a JSON feature description.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let groups: Self = serde_json::from_str(json)?;
        groups.validate()?;
        Ok(groups)
    }

    /// Load and validate a JSON feature description from disk.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let groups: Self = serde_json::from_reader(reader)?;
        groups.validate()?;
        Ok(groups)
    }

    /// Every feature column across all four groups, in group order.
    pub fn all_feature_names(&self) -> impl Iterator<Item = &str> {
        self.float_features
            .iter()
            .chain(&self.id_list_features)
            .chain(&self.id_score_list_features)
            .chain(&self.embedding_features)
            .map(String::as_str)
    }

    /// Checks that no column is claimed twice, counting the label as a group of its own.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(self.label.as_str());
        for name in self.all_feature_names() {
            if !seen.insert(name) {
                return Err(PreprocError::OverlappingFeatureGroups(name.to_string()));
            }
        }
        Ok(())
    }
}

impl FeatureSchema for FeatureGroups {
    fn float_feature_names(&self) -> &[String] {
        &self.float_features
    }
    fn id_list_feature_names(&self) -> &[String] {
        &self.id_list_features
    }
    fn id_score_list_feature_names(&self) -> &[String] {
        &self.id_score_list_features
    }
    fn embedding_feature_names(&self) -> &[String] {
        &self.embedding_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_defaults_missing_groups() {
        let groups = FeatureGroups::from_json_str(
            r#"{"label": "clicked", "float_features": ["age", "income"], "id_list_features": ["country"]}"#,
        )
        .expect("valid description");
        assert_eq!(groups.label, "clicked");
        assert_eq!(groups.float_feature_names(), ["age", "income"]);
        assert_eq!(groups.id_list_feature_names(), ["country"]);
        assert!(groups.id_score_list_feature_names().is_empty());
        assert!(groups.embedding_feature_names().is_empty());
    }

    #[test]
    fn test_overlapping_groups_rejected() {
        let err = FeatureGroups::from_json_str(
            r#"{"label": "y", "float_features": ["a"], "id_score_list_features": ["a"]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PreprocError::OverlappingFeatureGroups(ref c) if c == "a"));
    }

    #[test]
    fn test_label_cannot_be_a_feature() {
        let groups = FeatureGroups::new("y").with_float_features(["x", "y"]);
        assert!(matches!(
            groups.validate(),
            Err(PreprocError::OverlappingFeatureGroups(ref c)) if c == "y"
        ));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("features.json");
        std::fs::write(
            &path,
            r#"{"label": "y", "embedding_features": ["vec"], "id_list_features": ["cat"]}"#,
        )
        .expect("write");
        let groups = FeatureGroups::from_json_file(&path).expect("load");
        assert_eq!(groups.all_feature_names().collect::<Vec<_>>(), ["cat", "vec"]);
    }

    #[test]
    fn test_schema_through_arc() {
        let groups = Arc::new(FeatureGroups::new("y").with_id_list_features(["a", "b"]));
        fn names<S: FeatureSchema>(s: &S) -> Vec<String> {
            s.id_list_feature_names().to_vec()
        }
        assert_eq!(names(&groups), ["a", "b"]);
    }
}
