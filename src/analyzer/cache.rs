//! 欠席連絡解析キャッシュモジュール
//!
//! 差出人アドレスと本文のSHA-256をキーにして解析結果をキャッシュし、
//! 同じメールをLLMに再送しないようにする。

use crate::error::Result;
use fellow_attendance_common::ExcuseAnalysis;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = ".excuse-cache.json";

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcuseCache {
    /// バージョン（互換性チェック用）
    version: u32,
    /// メールハッシュ → 解析結果のマップ
    entries: HashMap<String, CacheEntry>,
}

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// 差出人（表示用）
    pub sender: String,
    /// 解析結果
    pub analysis: ExcuseAnalysis,
}

impl ExcuseCache {
    const CURRENT_VERSION: u32 = 1;

    pub fn cache_path(folder: &Path) -> PathBuf {
        folder.join(CACHE_FILE_NAME)
    }

    /// キャッシュファイルを読み込み（存在しない・破損時は空）
    pub fn load(folder: &Path) -> Self {
        let cache_path = Self::cache_path(folder);
        if !cache_path.exists() {
            return Self::default();
        }

        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        let reader = BufReader::new(file);
        match serde_json::from_reader::<_, ExcuseCache>(reader) {
            Ok(cache) => {
                // バージョンチェック
                if cache.version != Self::CURRENT_VERSION {
                    log::warn!("excuse cache version mismatch, starting fresh");
                    return Self::default();
                }
                cache
            }
            Err(e) => {
                log::warn!("ignoring corrupted {}: {}", cache_path.display(), e);
                Self::default()
            }
        }
    }

    /// キャッシュファイルを保存
    pub fn save(&self, folder: &Path) -> Result<()> {
        let file = File::create(Self::cache_path(folder))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// キャッシュファイルを削除（削除したら true）
    pub fn clear(folder: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(folder);
        if !cache_path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(cache_path)?;
        Ok(true)
    }

    /// メールのキャッシュキー
    pub fn key(sender_email: &str, body: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(sender_email.trim().to_lowercase().as_bytes());
        hasher.update(b"\n");
        hasher.update(body.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// キャッシュをルックアップ
    pub fn get(&self, key: &str) -> Option<&ExcuseAnalysis> {
        self.entries.get(key).map(|e| &e.analysis)
    }

    /// キャッシュに追加
    pub fn insert(&mut self, key: String, sender: String, analysis: ExcuseAnalysis) {
        self.entries.insert(key, CacheEntry { sender, analysis });
    }

    /// キャッシュ件数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ExcuseCache {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}
