//! Gmail REST API クライアント
//!
//! 日付ごとに、写真付きメールと写真なしメールの差出人を取得する

use super::message::{dedup_senders, extract_body, parse_from_header, MessagePart};
use super::MailTransport;
use crate::error::{AttendanceError, Result};
use chrono::{Duration, NaiveDate};
use fellow_attendance_common::{NoPhotoMessage, ObservedSender};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com";

/// 画像添付付きメールの検索条件（拡張子で判定）
pub const ATTACHMENT_QUERY: &str =
    "has:attachment (filename:jpg OR filename:jpeg OR filename:png OR filename:heic OR filename:gif)";

const API_NOT_ENABLED: &str = "Gmail API is not enabled for your Google Cloud project.\n\
Enable it here: https://console.cloud.google.com/apis/library/gmail.googleapis.com\n\
Select the same project that has your OAuth client, click Enable, wait a minute, then run again.";

/// Gmail の after:/before: 形式（before は排他的なので翌日）
fn date_window(date: NaiveDate) -> String {
    let next = date + Duration::days(1);
    format!(
        "after:{} before:{}",
        date.format("%Y/%m/%d"),
        next.format("%Y/%m/%d")
    )
}

/// 指定日に受信した画像添付メールの検索クエリ
pub fn photo_query(date: NaiveDate) -> String {
    format!("{} {}", ATTACHMENT_QUERY, date_window(date))
}

/// 指定日に受信箱宛てに届いた全メールの検索クエリ
pub fn inbox_query(inbox: &str, date: NaiveDate) -> String {
    format!("to:{} {}", inbox, date_window(date))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    payload: MessagePart,
}

pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    inbox: String,
}

impl GmailClient {
    pub fn new(http: reqwest::Client, access_token: String, inbox: String) -> Self {
        Self {
            http,
            base_url: GMAIL_API_BASE.to_string(),
            access_token,
            inbox,
        }
    }

    /// テスト用にAPIのベースURLを差し替える
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/gmail/v1/users/me/messages", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::FORBIDDEN && body.contains("accessNotConfigured") {
                return Err(AttendanceError::Mail(API_NOT_ENABLED.to_string()));
            }
            return Err(AttendanceError::Mail(format!(
                "Gmail API returned {}: {}",
                status,
                body.trim()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AttendanceError::Mail(format!("unexpected Gmail response: {}", e)))
    }

    /// 検索クエリに一致するメッセージID（全ページ）
    pub async fn list_message_ids(&self, q: &str) -> Result<Vec<String>> {
        let url = self.messages_url();
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: ListResponse = {
                let mut query = vec![("q", q)];
                if let Some(token) = page_token.as_deref() {
                    query.push(("pageToken", token));
                }
                self.get_json(&url, &query).await?
            };
            ids.extend(page.messages.into_iter().map(|m| m.id));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("query '{}' -> {} messages", q, ids.len());
        Ok(ids)
    }

    /// 差出人 (email, 表示名)
    pub async fn get_sender(&self, message_id: &str) -> Result<ObservedSender> {
        let url = format!("{}/{}", self.messages_url(), message_id);
        let message: MessageResponse = self
            .get_json(&url, &[("format", "metadata"), ("metadataHeaders", "From")])
            .await?;
        Ok(parse_from_header(message.payload.header("From").unwrap_or_default()))
    }

    /// 本文テキスト（見つからなければ空文字）
    pub async fn get_message_body(&self, message_id: &str) -> Result<String> {
        let url = format!("{}/{}", self.messages_url(), message_id);
        let message: MessageResponse = self.get_json(&url, &[("format", "full")]).await?;
        Ok(extract_body(&message.payload))
    }

    /// 写真なしメールのID（受信箱宛て全件 − 写真付き、受信順）
    async fn no_photo_ids(&self, date: NaiveDate) -> Result<Vec<String>> {
        let with_photo: HashSet<String> = self
            .list_message_ids(&photo_query(date))
            .await?
            .into_iter()
            .collect();
        let all = self.list_message_ids(&inbox_query(&self.inbox, date)).await?;
        Ok(all.into_iter().filter(|id| !with_photo.contains(id)).collect())
    }

    async fn senders_for(&self, ids: &[String]) -> Result<Vec<ObservedSender>> {
        let mut senders = Vec::with_capacity(ids.len());
        for id in ids {
            senders.push(self.get_sender(id).await?);
        }
        Ok(dedup_senders(senders))
    }
}

impl MailTransport for GmailClient {
    async fn fetch_senders_with_photo(&self, date: NaiveDate) -> Result<Vec<ObservedSender>> {
        let ids = self.list_message_ids(&photo_query(date)).await?;
        self.senders_for(&ids).await
    }

    async fn fetch_senders_without_photo(&self, date: NaiveDate) -> Result<Vec<ObservedSender>> {
        let ids = self.no_photo_ids(date).await?;
        self.senders_for(&ids).await
    }

    async fn fetch_no_photo_messages(&self, date: NaiveDate) -> Result<Vec<NoPhotoMessage>> {
        let ids = self.no_photo_ids(date).await?;
        let mut messages = Vec::with_capacity(ids.len());
        for id in ids {
            let sender = self.get_sender(&id).await?;
            messages.push(NoPhotoMessage {
                message_id: id,
                sender,
            });
        }
        Ok(messages)
    }

    async fn fetch_message_body(&self, message_id: &str) -> Result<String> {
        self.get_message_body(message_id).await
    }
}
