//! メール取得
//!
//! 出欠判定のコアは取得済みの送信者リストだけを扱う。ここでは受信箱から
//! 日付ごとの送信者を集める。`MailTransport` を差し替えればテストでは
//! 固定の応答を使える。

pub mod auth;
pub mod gmail;
pub mod message;

pub use auth::GmailAuth;
pub use gmail::GmailClient;

use crate::error::Result;
use chrono::NaiveDate;
use fellow_attendance_common::{NoPhotoMessage, ObservedSender};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// 受信箱へのアクセス
///
/// 返す送信者リストは (email, 表示名) で重複除去済み、受信順。
#[allow(async_fn_in_trait)]
pub trait MailTransport {
    async fn fetch_senders_with_photo(&self, date: NaiveDate) -> Result<Vec<ObservedSender>>;

    async fn fetch_senders_without_photo(&self, date: NaiveDate) -> Result<Vec<ObservedSender>>;

    async fn fetch_no_photo_messages(&self, date: NaiveDate) -> Result<Vec<NoPhotoMessage>>;

    async fn fetch_message_body(&self, message_id: &str) -> Result<String>;
}

/// 日付ごとの取得結果
#[derive(Debug, Clone, Default)]
pub struct MailSnapshot {
    pub photo_senders: BTreeMap<NaiveDate, Vec<ObservedSender>>,
    pub no_photo_senders: BTreeMap<NaiveDate, Vec<ObservedSender>>,
}

impl MailSnapshot {
    pub fn has_no_photo_senders(&self) -> bool {
        self.no_photo_senders.values().any(|s| !s.is_empty())
    }
}

pub fn fetch_progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// 日付ごとに写真付き・写真なしの送信者を順番に取得
pub async fn collect_senders<T: MailTransport>(
    transport: &T,
    dates: &[NaiveDate],
    progress: &ProgressBar,
) -> Result<MailSnapshot> {
    let mut snapshot = MailSnapshot::default();

    for date in dates {
        progress.set_message(date.to_string());
        let with_photo = transport.fetch_senders_with_photo(*date).await?;
        let without_photo = transport.fetch_senders_without_photo(*date).await?;
        log::debug!(
            "{}: {} photo senders, {} without photo",
            date,
            with_photo.len(),
            without_photo.len()
        );
        snapshot.photo_senders.insert(*date, with_photo);
        snapshot.no_photo_senders.insert(*date, without_photo);
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(snapshot)
}
