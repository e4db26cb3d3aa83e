//! Gemini API連携
//!
//! generateContent にプロンプトを送り、応答テキストのJSONを ExcuseAnalysis にする

use super::ExcuseClassifier;
use crate::error::{AttendanceError, Result};
use fellow_attendance_common::{build_excuse_prompt, parse_excuse_response, ExcuseAnalysis};
use log::debug;
use serde::{Deserialize, Serialize};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

pub struct GeminiClassifier {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClassifier {
    pub fn new(http: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            http,
            api_key,
            model,
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// テスト用にAPIのベースURLを差し替える
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttendanceError::ApiCall(format!(
                "Gemini API error {}: {}",
                status,
                body.trim()
            )));
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AttendanceError::ApiCall(format!("unexpected Gemini response: {}", e)))?;

        payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AttendanceError::ApiCall("Empty response".into()))
    }
}

impl ExcuseClassifier for GeminiClassifier {
    async fn classify(
        &self,
        email_body: &str,
        sender_email: &str,
        sender_name: &str,
    ) -> Result<ExcuseAnalysis> {
        let prompt = build_excuse_prompt(email_body, sender_email, sender_name);
        let text = self.generate(prompt).await?;
        debug!("gemini response: {}", text.chars().take(300).collect::<String>());
        parse_excuse_response(&text).map_err(|e| AttendanceError::ApiParse(e.to_string()))
    }
}
