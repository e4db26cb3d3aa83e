//! プロンプト生成モジュール
//!
//! 欠席連絡メール（写真なしメール）の解析プロンプト:
//! - EXCUSE_SYSTEM_PROMPT: 判定基準
//! - build_excuse_prompt: メール1通分のプロンプト

/// 判定基準（全プロバイダ共通）
pub const EXCUSE_SYSTEM_PROMPT: &str = r#"You are helping a math center coordinator evaluate emails from students/fellows who may be explaining an absence from a required session.

For each email sent to the math center (no attendance photo attached), you must:
1. Extract the reason the person gives for being absent (or state "No reason given" if unclear).
2. Suggest whether to APPROVE or REJECT the excuse based on the email content and the reason.
3. Give a brief explanation for your suggestion (one sentence).

Guidelines:
- Approve if the email clearly states a legitimate excuse (illness, family emergency, conflict, etc.) and appears to be from a student/fellow.
- Reject if the email is spam, unrelated, or does not clearly explain an absence.
- If the reason is vague or missing, lean toward reject unless the tone clearly indicates an excuse request.
- Respond only with valid JSON in this exact format, no other text:
{"reason": "...", "suggestion": "approve" or "reject", "explanation": "..."}"#;

/// メール1通分の解析プロンプト
///
/// # Arguments
/// * `email_body` - メール本文（プレーンテキスト）
/// * `sender_email` - 差出人アドレス（空なら "unknown"）
/// * `sender_name` - 差出人表示名（空ならアドレスで代用）
pub fn build_excuse_prompt(email_body: &str, sender_email: &str, sender_name: &str) -> String {
    let who = [sender_name, sender_email]
        .into_iter()
        .find(|s| !s.trim().is_empty())
        .unwrap_or("Unknown");
    let address = if sender_email.trim().is_empty() {
        "unknown"
    } else {
        sender_email
    };
    let body = if email_body.trim().is_empty() {
        "(empty)"
    } else {
        email_body
    };

    format!(
        r#"{EXCUSE_SYSTEM_PROMPT}

---

Sender: {who}
Email address: {address}

Email body:
---
{body}
---

Respond with JSON only: {{"reason": "...", "suggestion": "approve" or "reject", "explanation": "..."}}"#
    )
}
