//! Gmailメッセージの解析
//!
//! - From ヘッダーから (メールアドレス, 表示名) を取り出す
//! - payload から本文テキストを取り出す（text/plain 優先、なければ HTML をタグ除去）

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use fellow_attendance_common::ObservedSender;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagePart {
    pub mime_type: String,
    pub headers: Vec<Header>,
    pub body: Option<PartBody>,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartBody {
    pub data: Option<String>,
}

impl MessagePart {
    /// ヘッダー値（大文字小文字を区別しない）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    fn decoded_body(&self) -> Option<String> {
        self.body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
            .and_then(decode_body_data)
    }

    fn find_part(&self, mime_type: &str) -> Option<&MessagePart> {
        for part in &self.parts {
            if part.mime_type.eq_ignore_ascii_case(mime_type) && part.decoded_body().is_some() {
                return Some(part);
            }
            if let Some(found) = part.find_part(mime_type) {
                return Some(found);
            }
        }
        None
    }
}

/// "Display Name <email@example.com>" または "email@example.com" を分解
pub fn parse_from_header(from: &str) -> ObservedSender {
    let from = from.trim();
    if let (Some(lt), Some(gt)) = (from.find('<'), from.rfind('>')) {
        if lt < gt {
            let name = from[..lt].trim().trim_matches('"').trim();
            let email = from[lt + 1..gt].trim();
            return ObservedSender::new(email, name);
        }
    }
    if from.contains('@') {
        ObservedSender::new(from, "")
    } else {
        ObservedSender::new("", from)
    }
}

/// Gmail の base64url（パディング有無どちらも可）をデコード
pub fn decode_body_data(data: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(data.trim().trim_end_matches('=')).ok()?;
    Some(String::from_utf8_lossy(&bytes).trim().to_string())
}

/// HTMLタグを除去して空白を正規化
pub fn strip_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, " ");
    let text = text.replace("&nbsp;", " ").replace("&amp;", "&");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 本文テキストを取り出す（見つからなければ空文字）
pub fn extract_body(payload: &MessagePart) -> String {
    if let Some(text) = payload.decoded_body() {
        if payload.mime_type.eq_ignore_ascii_case("text/html") {
            return strip_html(&text);
        }
        return text;
    }
    if let Some(text) = payload.find_part("text/plain").and_then(MessagePart::decoded_body) {
        return text;
    }
    if let Some(html) = payload.find_part("text/html").and_then(MessagePart::decoded_body) {
        return strip_html(&html);
    }
    String::new()
}

/// (email, 表示名) の重複を除去（最初の出現順を保持）
pub fn dedup_senders(senders: Vec<ObservedSender>) -> Vec<ObservedSender> {
    let mut seen = HashSet::new();
    senders
        .into_iter()
        .filter(|s| seen.insert((s.email.clone(), s.display_name.clone())))
        .collect()
}
