//! Bucket upload integration tests.
//!
//! These tests require S3-compatible credentials in the environment.
//! Run with: `cargo test -p reelhook-storage --test bucket_tests -- --ignored`

use reelhook_storage::{UploadConfig, UploadResolver};

/// Upload bytes through the default registry and get a URL back.
#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_bytes_resolve_to_url() {
    dotenvy::dotenv().ok();

    let config = UploadConfig::from_env();
    assert!(config.bucket_client.is_some(), "S3 credentials not configured");
    assert!(config.bucket.is_some(), "UPLOAD_BUCKET not configured");

    let resolver = UploadResolver::from_config(&config);
    let url = resolver
        .resolve(None, Some(b"reelhook integration test"), "integration.txt")
        .await;

    println!("Resolved URL: {}", url);
    assert!(url.starts_with("http"));
}

/// Upload a file through the default registry.
#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_file_resolves_to_url() {
    use std::io::Write;
    use tempfile::NamedTempFile;

    dotenvy::dotenv().ok();

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file
        .write_all(b"reelhook integration test")
        .expect("Failed to write to temp file");

    let config = UploadConfig::from_env();
    let resolver = UploadResolver::from_config(&config);
    let url = resolver
        .resolve(Some(temp_file.path()), None, "integration.txt")
        .await;

    println!("Resolved URL: {}", url);
    assert!(!url.is_empty());
}
