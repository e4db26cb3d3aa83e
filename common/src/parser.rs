//! LLMレスポンスパーサー
//!
//! 欠席連絡メール解析の応答からJSONオブジェクトを抽出し、
//! ExcuseAnalysis に変換する

use crate::error::{Error, Result};
use crate::types::{ExcuseAnalysis, Suggestion};
use serde::Deserialize;

/// レスポンスからJSONオブジェクト部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック（言語指定なしの ``` も可）
/// 2. 最初の `{` から最後の `}` まで
/// 3. エラー
///
/// # Examples
/// ```
/// use fellow_attendance_common::extract_json;
///
/// let response = "Sure:\n```json\n{\"reason\": \"sick\"}\n```";
/// assert_eq!(extract_json(response).unwrap(), "{\"reason\": \"sick\"}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    let mut body = response.trim();

    if let Some(fence) = body.find("```") {
        let after = &body[fence + 3..];
        // 言語指定（json等）の行を飛ばす
        let after = match after.find('\n') {
            Some(nl) if !after[..nl].contains('{') => &after[nl + 1..],
            _ => after,
        };
        body = match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        };
    }

    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(body[start..=end].trim()),
        _ => Err(Error::Parse("JSON object not found in response".into())),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawExcuse {
    reason: Option<String>,
    suggestion: Option<String>,
    explanation: Option<String>,
}

/// 欠席連絡解析レスポンスをパース
///
/// - reason が空なら "(none)"
/// - suggestion は approve / reject 以外なら reject
pub fn parse_excuse_response(response: &str) -> Result<ExcuseAnalysis> {
    let json_str = extract_json(response)?;
    let raw: RawExcuse = serde_json::from_str(json_str)
        .map_err(|e| Error::Parse(format!("excuse JSON parse error: {}", e)))?;

    let reason = raw
        .reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| "(none)".to_string());
    let suggestion = raw
        .suggestion
        .as_deref()
        .map(Suggestion::parse_lenient)
        .unwrap_or_default();

    Ok(ExcuseAnalysis {
        reason,
        suggestion,
        explanation: raw.explanation.unwrap_or_default(),
    })
}
