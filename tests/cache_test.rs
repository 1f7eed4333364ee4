//! キャッシュ機能テスト
//!
//! 信号キャッシュの保存・読み込み・破棄を検証

use well_bom::analyzer::cache::{CacheEntry, CacheFile};
use well_bom::analyzer::compute_hash;
use well_bom::engine::SchemeSignals;
use tempfile::tempdir;

fn entry(file_name: &str, ocr_text: &str) -> CacheEntry {
    CacheEntry {
        file_name: file_name.to_string(),
        file_size: 1024,
        processed_images: 7,
        signals: SchemeSignals {
            ocr_text: ocr_text.to_string(),
            ..Default::default()
        },
    }
}

/// 空のキャッシュファイル
#[test]
fn test_cache_file_empty() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache = CacheFile::load(dir.path());

    assert_eq!(cache.len(), 0);
    assert!(cache.is_empty());
}

/// キャッシュの保存と読み込み
#[test]
fn test_cache_save_and_load() {
    let dir = tempdir().expect("Failed to create temp dir");

    let mut cache = CacheFile::load(dir.path());
    cache.insert("abc123".to_string(), entry("well.png", "колодец\nлюк 700"));
    cache.save(dir.path()).expect("キャッシュ保存失敗");

    // 再読み込み
    let loaded = CacheFile::load(dir.path());
    assert_eq!(loaded.len(), 1);

    let cached = loaded.get("abc123").expect("キャッシュが見つからない");
    assert_eq!(cached.file_name, "well.png");
    assert_eq!(cached.processed_images, 7);
    assert_eq!(cached.signals.ocr_text, "колодец\nлюк 700");
    assert!(loaded.get("missing").is_none());
}

/// 同じハッシュは上書き
#[test]
fn test_cache_insert_overwrites() {
    let mut cache = CacheFile::default();
    cache.insert("h".to_string(), entry("a.png", "first"));
    cache.insert("h".to_string(), entry("a.png", "second"));

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("h").unwrap().signals.ocr_text, "second");
}

/// バージョン不一致は空として扱う
#[test]
fn test_cache_version_mismatch() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(
        CacheFile::cache_path(dir.path()),
        r#"{"version": 99, "entries": {}}"#,
    )
    .unwrap();

    assert!(CacheFile::load(dir.path()).is_empty());
}

/// 壊れたキャッシュファイルは空として扱う
#[test]
fn test_cache_corrupt_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(CacheFile::cache_path(dir.path()), "{ not json").unwrap();

    assert!(CacheFile::load(dir.path()).is_empty());
}

/// キャッシュ削除
#[test]
fn test_cache_clear() {
    let dir = tempdir().expect("Failed to create temp dir");
    assert!(!CacheFile::clear(dir.path()).unwrap());

    let mut cache = CacheFile::default();
    cache.insert("h".to_string(), entry("a.png", ""));
    cache.save(dir.path()).unwrap();
    assert!(CacheFile::cache_path(dir.path()).exists());

    assert!(CacheFile::clear(dir.path()).unwrap());
    assert!(!CacheFile::cache_path(dir.path()).exists());
}

/// ハッシュは決定的でSHA-256の16進表現
#[test]
fn test_compute_hash() {
    assert_eq!(
        compute_hash(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(compute_hash(b"scheme"), compute_hash(b"scheme"));
    assert_ne!(compute_hash(b"scheme-1"), compute_hash(b"scheme-2"));
}
