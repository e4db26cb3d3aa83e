//! Gemini 分類器のテスト
//!
//! generateContent を mockito で模擬し、応答の解釈と失敗時の扱いを検証

use fellow_attendance::analyzer::{analyze_excuse, ExcuseClassifier, GeminiClassifier};
use fellow_attendance::error::AttendanceError;
use fellow_attendance_common::Suggestion;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

const PATH: &str = "/v1beta/models/test-model:generateContent";

fn classifier(server: &ServerGuard) -> GeminiClassifier {
    GeminiClassifier::new(reqwest::Client::new(), "k-123".into(), "test-model".into())
        .with_base_url(server.url())
}

fn gemini_body(text: &str) -> String {
    json!({
        "candidates": [ { "content": { "parts": [ { "text": text } ], "role": "model" } } ]
    })
    .to_string()
}

#[tokio::test]
async fn test_classify_parses_fenced_json() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "k-123".into()))
        .match_body(Matcher::Regex("Bo Kim".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body(
            "```json\n{\"reason\": \"Doctor appointment\", \"suggestion\": \"Approve\", \"explanation\": \"Medical.\"}\n```",
        ))
        .expect(1)
        .create_async()
        .await;

    let analysis = classifier(&server)
        .classify("I have a doctor appointment.", "bo@x.com", "Bo Kim")
        .await
        .unwrap();

    assert_eq!(analysis.reason, "Doctor appointment");
    assert_eq!(analysis.suggestion, Suggestion::Approve);
    assert_eq!(analysis.explanation, "Medical.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unknown_suggestion_is_reject() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(gemini_body(r#"{"reason": "forgot", "suggestion": "maybe"}"#))
        .create_async()
        .await;

    let analysis = classifier(&server).classify("forgot", "a@x.com", "A").await.unwrap();
    assert_eq!(analysis.suggestion, Suggestion::Reject);
    assert_eq!(analysis.explanation, "");
}

#[tokio::test]
async fn test_non_json_reply_is_parse_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(gemini_body("I cannot tell."))
        .create_async()
        .await;

    let gemini = classifier(&server);
    let err = gemini.classify("?", "a@x.com", "A").await.unwrap_err();
    assert!(matches!(err, AttendanceError::ApiParse(_)));

    let analysis = analyze_excuse(&gemini, "?", "a@x.com", "A").await;
    assert_eq!(analysis.reason, "(parse error)");
    assert_eq!(analysis.suggestion, Suggestion::Reject);
}

#[tokio::test]
async fn test_http_error_becomes_error_analysis() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal")
        .create_async()
        .await;

    let analysis = analyze_excuse(&classifier(&server), "body", "a@x.com", "A").await;
    assert_eq!(analysis.reason, "(error)");
    assert!(analysis.explanation.contains("500"));
    assert!(analysis.explanation.chars().count() <= 200);
}

#[tokio::test]
async fn test_empty_candidates_is_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"candidates": []}"#)
        .create_async()
        .await;

    let err = classifier(&server).classify("b", "a@x.com", "A").await.unwrap_err();
    assert!(matches!(err, AttendanceError::ApiCall(_)));
}
