//! End-to-end tests for synthgen
//!
//! Drive the service the way an outer surface would: generate, list, reconcile
//! files dropped in by hand, and wipe everything.

use chrono::{TimeZone, Utc};
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use synthgen::{ErrorKind, SeedCatalog, SynthError, SynthService, SynthgenDb};
use tempfile::TempDir;

/// Temp storage and store for one service
struct TestEnv {
    _temp: TempDir,
    pub storage_root: PathBuf,
    pub db_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let storage_root = temp.path().join("uploads").join("generated");
        let db_path = temp.path().join("synthgen.sqlite3");
        Self {
            _temp: temp,
            storage_root,
            db_path,
        }
    }

    async fn service(&self, seed: Option<u64>) -> SynthService {
        let db = SynthgenDb::open(&self.db_path).await.unwrap();
        SynthService::new(db, SeedCatalog::bundled(), &self.storage_root, seed)
    }

    fn write_file(&self, name: &str, content: &str) -> PathBuf {
        fs::create_dir_all(&self.storage_root).expect("Failed to create storage root");
        let path = self.storage_root.join(name);
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    fn disk_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.storage_root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn count_ext(names: impl IntoIterator<Item = String>, ext: &str) -> usize {
    names
        .into_iter()
        .filter(|n| Path::new(n).extension().and_then(|e| e.to_str()) == Some(ext))
        .count()
}

// ============================================================================
// Generate
// ============================================================================

#[tokio::test]
async fn test_generate_six_files() {
    let env = TestEnv::new();
    let service = env.service(Some(1)).await;

    let files = service.generate(6).await.unwrap();
    assert_eq!(files.len(), 6);

    let batches = service.list_batches(50).await.unwrap();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.requested_count, 6);
    assert_eq!(batch.created_count, Some(6));
    assert!(batch.finished_at.is_some());
    assert!(batch.duration_millis.unwrap() >= 0);

    let names = env.disk_names();
    assert_eq!(names.len(), 6);
    assert_eq!(count_ext(names.clone(), "xml"), 3);
    assert_eq!(count_ext(names, "json"), 3);

    let expected_root = env.storage_root.to_string_lossy().into_owned();
    for file in &files {
        assert_eq!(file.batch_id, Some(batch.id));
        assert_eq!(file.storage_path, expected_root);
        let on_disk = fs::metadata(env.storage_root.join(&file.file_name)).unwrap();
        assert_eq!(file.file_size_bytes, on_disk.len());
        assert!(file.file_size_bytes > 0);
        assert!(file.finished_at.unwrap() >= file.started_at);
    }
    assert_eq!(files[0].started_at, batch.started_at);
    assert_eq!(files[5].finished_at, batch.finished_at);

    // Returned records match what the store holds.
    let mut stored = service.list_files(200).await.unwrap();
    stored.sort_by_key(|f| f.id);
    assert_eq!(stored, files);
}

#[tokio::test]
async fn test_generate_rejects_bad_counts_without_side_effects() {
    let env = TestEnv::new();
    let service = env.service(None).await;

    for count in [0, -1, 1_001] {
        let err = service.generate(count).await.unwrap_err();
        assert!(matches!(err, SynthError::InvalidArgument(_)), "count {count}");
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    assert!(!env.storage_root.exists());
    assert_eq!(service.db().batch_count().await.unwrap(), 0);
    assert_eq!(service.db().file_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_generate_accepts_bounds() {
    let env = TestEnv::new();
    let service = env.service(Some(3)).await;

    let one = service.generate(1).await.unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].extension().as_deref(), Some("json"));

    let many = service.generate(1_000).await.unwrap();
    assert_eq!(many.len(), 1_000);
    let names = many.into_iter().map(|f| f.file_name);
    assert_eq!(count_ext(names, "xml"), 500);
    assert_eq!(env.disk_names().len(), 1_001);
}

#[tokio::test]
async fn test_seeded_services_pick_same_kinds() {
    let first = TestEnv::new();
    let second = TestEnv::new();

    let a = first.service(Some(99)).await.generate(10).await.unwrap();
    let b = second.service(Some(99)).await.generate(10).await.unwrap();

    let kinds = |files: &[synthgen::GeneratedFile]| {
        files.iter().map(|f| f.extension()).collect::<Vec<_>>()
    };
    assert_eq!(kinds(&a), kinds(&b));
    let sizes = |files: &[synthgen::GeneratedFile]| {
        files.iter().map(|f| f.file_size_bytes).collect::<Vec<_>>()
    };
    assert_eq!(sizes(&a), sizes(&b));
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_limits_are_validated() {
    let env = TestEnv::new();
    let service = env.service(None).await;

    assert!(service.list_files(0).await.unwrap_err().is_client_error());
    assert!(service.list_files(5_001).await.unwrap_err().is_client_error());
    assert!(service.list_batches(1_001).await.unwrap_err().is_client_error());
    assert!(service
        .reconcile_and_list_files(-3)
        .await
        .unwrap_err()
        .is_client_error());

    assert!(service.list_files(5_000).await.unwrap().is_empty());
    assert!(service.list_batches(1_000).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_files_respects_limit_and_order() {
    let env = TestEnv::new();
    let service = env.service(Some(5)).await;
    service.generate(4).await.unwrap();
    service.generate(4).await.unwrap();

    let latest = service.list_files(3).await.unwrap();
    assert_eq!(latest.len(), 3);
    for pair in latest.windows(2) {
        assert!(
            (pair[0].started_at, pair[0].id) > (pair[1].started_at, pair[1].id),
            "newest first"
        );
    }

    let batches = service.list_batches(1).await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].id, 2);
}

// ============================================================================
// Reconcile
// ============================================================================

#[tokio::test]
async fn test_sync_backfills_manual_file() {
    let env = TestEnv::new();
    let service = env.service(None).await;

    let path = env.write_file("manual-1.json", "{\"hello\":\"world\"}\n");
    let mtime = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(mtime.timestamp(), 0)).unwrap();

    let files = service.reconcile_and_list_files(200).await.unwrap();
    assert_eq!(files.len(), 1);
    let file = &files[0];
    assert_eq!(file.file_name, "manual-1.json");
    assert_eq!(file.batch_id, None);
    assert_eq!(file.file_size_bytes, 18);
    assert_eq!(file.started_at, mtime);
    assert_eq!(file.finished_at, Some(mtime));
}

#[tokio::test]
async fn test_sync_is_idempotent_and_skips_generated() {
    let env = TestEnv::new();
    let service = env.service(Some(8)).await;
    service.generate(3).await.unwrap();
    env.write_file("dropped.xml", "<a/>");

    let stats = service.reconcile().await.unwrap();
    assert_eq!(stats.scanned, 4);
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.skipped, 3);

    let again = service.reconcile().await.unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(service.db().file_count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_sync_without_storage_root() {
    let env = TestEnv::new();
    let service = env.service(None).await;

    let files = service.reconcile_and_list_files(10).await.unwrap();
    assert!(files.is_empty());
    assert!(!env.storage_root.exists());
}

// ============================================================================
// Clean
// ============================================================================

#[tokio::test]
async fn test_clean_all_wipes_disk_and_store() {
    let env = TestEnv::new();
    let service = env.service(Some(2)).await;
    service.generate(3).await.unwrap();
    env.write_file("manual.json", "{}");

    let result = service.clean_all().await.unwrap();
    assert_eq!(result.deleted_metadata_rows, 3);
    assert_eq!(result.deleted_disk_files, 4);

    assert!(env.storage_root.is_dir());
    assert!(env.disk_names().is_empty());
    assert_eq!(service.db().file_count().await.unwrap(), 0);
    assert_eq!(service.db().batch_count().await.unwrap(), 0);
    assert!(service.list_batches(50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clean_all_on_fresh_deployment() {
    let env = TestEnv::new();
    let service = env.service(None).await;

    let result = service.clean_all().await.unwrap();
    assert_eq!(result.deleted_metadata_rows, 0);
    assert_eq!(result.deleted_disk_files, 0);
    assert!(env.storage_root.is_dir());

    // Generation still works after a wipe.
    assert_eq!(service.generate(2).await.unwrap().len(), 2);
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_service_from_config() {
    let temp = TempDir::new().unwrap();
    let mut config = synthgen::SynthgenConfig::default();
    config.storage.location = temp.path().join("base");
    config.database.path = temp.path().join("db").join("synthgen.sqlite3");
    config.rng_seed = Some(11);

    let service = SynthService::from_config(&config).await.unwrap();
    assert_eq!(service.storage_root(), temp.path().join("base").join("generated"));

    service.generate(2).await.unwrap();
    assert!(config.database.path.exists());
    assert_eq!(fs::read_dir(service.storage_root()).unwrap().count(), 2);
}
