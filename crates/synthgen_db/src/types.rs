//! Record types returned by the metadata store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One generate request and its aggregate outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationBatch {
    pub id: i64,
    /// Number of files the caller asked for
    pub requested_count: i64,
    /// Number of files finalized; `None` until the batch finishes
    pub created_count: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// `finished_at - started_at`, only for finished batches
    pub duration_millis: Option<i64>,
}

impl GenerationBatch {
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

/// A file living under a storage location, either generated by a batch or
/// discovered on disk by reconciliation (`batch_id` is then `None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub id: i64,
    pub batch_id: Option<i64>,
    /// Absolute directory the file lives in
    pub storage_path: String,
    pub file_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// On-disk size; only meaningful once `finished_at` is set
    pub file_size_bytes: u64,
}

impl GeneratedFile {
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Extension of `file_name`, lowercased, if it has one.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_serializes_camel_case() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let file = GeneratedFile {
            id: 7,
            batch_id: None,
            storage_path: "/data/generated".to_string(),
            file_name: "manual-1.json".to_string(),
            started_at: ts,
            finished_at: Some(ts),
            file_size_bytes: 18,
        };

        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["fileSizeBytes"], 18);
        assert!(json["batchId"].is_null());
        assert_eq!(json["startedAt"], "2025-01-02T03:04:05Z");
        assert_eq!(file.extension().as_deref(), Some("json"));
    }

    #[test]
    fn test_unfinished_batch() {
        let batch = GenerationBatch {
            id: 1,
            requested_count: 3,
            created_count: None,
            started_at: Utc::now(),
            finished_at: None,
            duration_millis: None,
        };
        assert!(!batch.is_finished());
    }
}
