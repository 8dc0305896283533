//! Index manifest
//!
//! Small JSON document describing a saved index. A save removes any previous
//! manifest first and writes the new one last, so its presence marks a
//! complete write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current on-disk layout version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub vector_dimension: usize,
    pub record_count: usize,
    pub embedding_model_id: String,
    pub created_at: DateTime<Utc>,
}

impl IndexManifest {
    pub fn new(vector_dimension: usize, record_count: usize, embedding_model_id: &str) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            vector_dimension,
            record_count,
            embedding_model_id: embedding_model_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_shape() {
        let manifest = IndexManifest::new(384, 12, "hashing-fnv1a-384");

        let value = serde_json::to_value(&manifest).unwrap();

        assert_eq!(value["format_version"], 1);
        assert_eq!(value["vector_dimension"], 384);
        assert_eq!(value["record_count"], 12);
        assert_eq!(value["embedding_model_id"], "hashing-fnv1a-384");
        assert!(value["created_at"].is_string());
    }
}
