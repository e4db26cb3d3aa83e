//! 出欠チェックの型定義
//!
//! CLIと各モジュールで共有される型:
//! - ExpectedEntry: スケジュール展開の出力（出席が期待されるセッション）
//! - ObservedSender: メール送信者（写真付きメールの差出人）
//! - AttendanceRecord: 最終出力（フェロー×セッションごとの出欠）
//! - ExcuseAnalysis: 欠席連絡メールのLLM解析結果

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 出席が期待されるセッション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedEntry {
    pub date: NaiveDate,
    /// 曜日名（小文字、例: "tuesday"）
    pub day_name: String,
    /// その日のセッション番号（0始まり）
    pub session_index: usize,
    pub time_slot: String,
    pub fellows: Vec<String>,
}

/// メール送信者
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedSender {
    /// 小文字化済みメールアドレス（空の場合あり）
    pub email: String,
    /// 受信したままの表示名（空の場合あり）
    pub display_name: String,
}

impl ObservedSender {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_lowercase(),
            display_name: display_name.into(),
        }
    }

    /// "Name <email>" 形式の表示用文字列
    pub fn label(&self) -> String {
        if self.display_name.is_empty() {
            self.email.clone()
        } else {
            format!("{} <{}>", self.display_name, self.email)
        }
    }
}

/// 出欠ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, AttendanceStatus::Present)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// フェロー×セッションごとの出欠
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub day_name: String,
    pub session_index: usize,
    pub time_slot: String,
    pub fellow: String,
    pub status: AttendanceStatus,
    /// 出席時のみ、照合できた送信者のメールアドレス
    pub matched_email: Option<String>,
}

impl AttendanceRecord {
    /// 表示用のセッション番号（1始まり）
    pub fn session_number(&self) -> usize {
        self.session_index + 1
    }
}

/// 承認/却下の提案
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suggestion {
    Approve,
    #[default]
    Reject,
}

impl Suggestion {
    /// 不明な値は却下扱い
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "approve" => Suggestion::Approve,
            _ => Suggestion::Reject,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Suggestion::Approve => "approve",
            Suggestion::Reject => "reject",
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 欠席連絡メールの解析結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcuseAnalysis {
    pub reason: String,
    pub suggestion: Suggestion,
    pub explanation: String,
}

impl ExcuseAnalysis {
    /// APIキー未設定時の固定結果
    pub fn cannot_analyze() -> Self {
        Self {
            reason: "(Gemini API key not set; set GEMINI_API_KEY or run `fellow-attendance config --set-api-key KEY` to enable)".into(),
            suggestion: Suggestion::Reject,
            explanation: "Cannot analyze without API key.".into(),
        }
    }

    /// LLM応答がJSONとして解釈できなかった場合
    pub fn parse_failure(detail: &str) -> Self {
        Self {
            reason: "(parse error)".into(),
            suggestion: Suggestion::Reject,
            explanation: format!("LLM response was not valid JSON: {}", detail),
        }
    }

    /// 呼び出し失敗時（メッセージは200文字まで）
    pub fn service_failure(message: &str) -> Self {
        Self {
            reason: "(error)".into(),
            suggestion: Suggestion::Reject,
            explanation: message.chars().take(200).collect(),
        }
    }
}

/// 写真が添付されていないメール（欠席連絡の候補）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoPhotoMessage {
    pub message_id: String,
    pub sender: ObservedSender,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observed_sender_lowercases_email() {
        let sender = ObservedSender::new("  ALee@X.com ", "Ann Lee");
        assert_eq!(sender.email, "alee@x.com");
        assert_eq!(sender.display_name, "Ann Lee");
        assert_eq!(sender.label(), "Ann Lee <alee@x.com>");
    }

    #[test]
    fn test_label_without_display_name() {
        let sender = ObservedSender::new("bo@x.com", "");
        assert_eq!(sender.label(), "bo@x.com");
    }

    #[test]
    fn test_suggestion_parse_lenient() {
        assert_eq!(Suggestion::parse_lenient("APPROVE"), Suggestion::Approve);
        assert_eq!(Suggestion::parse_lenient("reject"), Suggestion::Reject);
        assert_eq!(Suggestion::parse_lenient("maybe"), Suggestion::Reject);
        assert_eq!(Suggestion::parse_lenient(""), Suggestion::Reject);
    }

    #[test]
    fn test_service_failure_truncates() {
        let long = "x".repeat(500);
        let analysis = ExcuseAnalysis::service_failure(&long);
        assert_eq!(analysis.reason, "(error)");
        assert_eq!(analysis.explanation.chars().count(), 200);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&AttendanceStatus::Present).unwrap();
        assert_eq!(json, "\"present\"");
    }
}
