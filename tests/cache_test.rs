//! 欠席連絡解析キャッシュのテスト

use fellow_attendance::analyzer::ExcuseCache;
use fellow_attendance_common::{ExcuseAnalysis, Suggestion};
use tempfile::tempdir;

fn analysis(reason: &str) -> ExcuseAnalysis {
    ExcuseAnalysis {
        reason: reason.into(),
        suggestion: Suggestion::Approve,
        explanation: "ok".into(),
    }
}

/// キャッシュファイルが無い場合は空
#[test]
fn test_load_missing_cache() {
    let dir = tempdir().unwrap();
    let cache = ExcuseCache::load(dir.path());
    assert!(cache.is_empty());
}

/// 保存して読み込み
#[test]
fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let key = ExcuseCache::key("bo@x.com", "I am sick");

    let mut cache = ExcuseCache::default();
    cache.insert(key.clone(), "Bo Kim <bo@x.com>".into(), analysis("sick"));
    cache.save(dir.path()).unwrap();

    let loaded = ExcuseCache::load(dir.path());
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.get(&key).unwrap().reason, "sick");
}

/// キーは送信者と本文の両方に依存する
#[test]
fn test_key_depends_on_sender_and_body() {
    let a = ExcuseCache::key("bo@x.com", "I am sick");
    assert_eq!(a, ExcuseCache::key(" BO@x.com ", "I am sick"));
    assert_ne!(a, ExcuseCache::key("ann@x.com", "I am sick"));
    assert_ne!(a, ExcuseCache::key("bo@x.com", "I am late"));
    assert_eq!(a.len(), 64);
}

/// 同じキーは上書き
#[test]
fn test_overwrite_entry() {
    let mut cache = ExcuseCache::default();
    let key = ExcuseCache::key("bo@x.com", "body");
    cache.insert(key.clone(), "bo".into(), analysis("first"));
    cache.insert(key.clone(), "bo".into(), analysis("second"));

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(&key).unwrap().reason, "second");
}

/// 破損したファイルは空のキャッシュとして扱う
#[test]
fn test_corrupted_cache_file() {
    let dir = tempdir().unwrap();
    std::fs::write(ExcuseCache::cache_path(dir.path()), "{ not json").unwrap();

    let cache = ExcuseCache::load(dir.path());
    assert!(cache.is_empty());
}

/// バージョン違いは破棄
#[test]
fn test_version_mismatch() {
    let dir = tempdir().unwrap();
    std::fs::write(
        ExcuseCache::cache_path(dir.path()),
        r#"{"version": 99, "entries": {"k": {"sender": "s", "analysis": {"reason": "r", "suggestion": "approve", "explanation": ""}}}}"#,
    )
    .unwrap();

    let cache = ExcuseCache::load(dir.path());
    assert!(cache.is_empty());
}

#[test]
fn test_clear() {
    let dir = tempdir().unwrap();
    assert!(!ExcuseCache::clear(dir.path()).unwrap());

    ExcuseCache::default().save(dir.path()).unwrap();
    assert!(ExcuseCache::cache_path(dir.path()).exists());
    assert!(ExcuseCache::clear(dir.path()).unwrap());
    assert!(!ExcuseCache::cache_path(dir.path()).exists());
}
