//! 欠席連絡メールの解析
//!
//! 写真なしメールをLLMに渡し、承認/却下の提案を得る。解析は補助情報なので
//! `analyze_excuse` は失敗せず、必ず何らかの `ExcuseAnalysis` を返す。

pub mod cache;
mod claude_cli;
mod gemini;

pub use cache::ExcuseCache;
pub use claude_cli::ClaudeCliClassifier;
pub use gemini::{GeminiClassifier, GEMINI_API_BASE};

use crate::ai_provider::AiProvider;
use crate::config::Config;
use crate::error::{AttendanceError, Result};
use crate::mail::MailTransport;
use chrono::NaiveDate;
use fellow_attendance_common::{ExcuseAnalysis, NoPhotoMessage};
use log::{debug, warn};

/// 欠席連絡メールの分類器
#[allow(async_fn_in_trait)]
pub trait ExcuseClassifier {
    async fn classify(
        &self,
        email_body: &str,
        sender_email: &str,
        sender_name: &str,
    ) -> Result<ExcuseAnalysis>;

    /// 実際にLLMへ問い合わせられるか
    fn is_available(&self) -> bool {
        true
    }
}

/// 設定から選ばれた分類器
pub enum Classifier {
    Gemini(GeminiClassifier),
    Claude(ClaudeCliClassifier),
    /// APIキー未設定
    Unavailable,
}

impl Classifier {
    pub fn from_config(
        provider: AiProvider,
        config: &Config,
        http: reqwest::Client,
        verbose: bool,
    ) -> Self {
        match provider {
            AiProvider::Claude => Classifier::Claude(ClaudeCliClassifier::new(verbose)),
            AiProvider::Gemini => match config.get_api_key() {
                Ok(key) => {
                    Classifier::Gemini(GeminiClassifier::new(http, key, config.model.clone()))
                }
                Err(e) => {
                    warn!("{}", e);
                    Classifier::Unavailable
                }
            },
        }
    }
}

impl ExcuseClassifier for Classifier {
    async fn classify(
        &self,
        email_body: &str,
        sender_email: &str,
        sender_name: &str,
    ) -> Result<ExcuseAnalysis> {
        match self {
            Classifier::Gemini(c) => c.classify(email_body, sender_email, sender_name).await,
            Classifier::Claude(c) => c.classify(email_body, sender_email, sender_name).await,
            Classifier::Unavailable => Ok(ExcuseAnalysis::cannot_analyze()),
        }
    }

    fn is_available(&self) -> bool {
        !matches!(self, Classifier::Unavailable)
    }
}

/// 分類エラーを表示用の解析結果に変換
fn fallback_analysis(err: &AttendanceError) -> ExcuseAnalysis {
    match err {
        AttendanceError::MissingApiKey => ExcuseAnalysis::cannot_analyze(),
        AttendanceError::ApiParse(detail) => ExcuseAnalysis::parse_failure(detail),
        other => ExcuseAnalysis::service_failure(&other.to_string()),
    }
}

/// 分類を実行し、失敗時は表示用の解析結果を `Err` で返す
async fn classify_or_fallback<C: ExcuseClassifier>(
    classifier: &C,
    email_body: &str,
    sender_email: &str,
    sender_name: &str,
) -> std::result::Result<ExcuseAnalysis, ExcuseAnalysis> {
    classifier
        .classify(email_body, sender_email, sender_name)
        .await
        .map_err(|e| {
            warn!("excuse analysis failed for {}: {}", sender_email, e);
            fallback_analysis(&e)
        })
}

/// 1通を解析（失敗しない）
pub async fn analyze_excuse<C: ExcuseClassifier>(
    classifier: &C,
    email_body: &str,
    sender_email: &str,
    sender_name: &str,
) -> ExcuseAnalysis {
    classify_or_fallback(classifier, email_body, sender_email, sender_name)
        .await
        .unwrap_or_else(|fallback| fallback)
}

/// 写真なしメール1通とその解析結果
#[derive(Debug, Clone)]
pub struct ExcuseReport {
    pub date: NaiveDate,
    pub message: NoPhotoMessage,
    pub analysis: ExcuseAnalysis,
}

/// 各日付の写真なしメールを取得して解析
///
/// メール取得の失敗はそのまま返す。キャッシュには成功した解析だけを入れる。
pub async fn analyze_excuses<T: MailTransport, C: ExcuseClassifier>(
    transport: &T,
    classifier: &C,
    dates: &[NaiveDate],
    mut cache: Option<&mut ExcuseCache>,
) -> Result<Vec<ExcuseReport>> {
    let mut reports = Vec::new();

    for date in dates {
        for message in transport.fetch_no_photo_messages(*date).await? {
            let analysis = if !classifier.is_available() {
                ExcuseAnalysis::cannot_analyze()
            } else {
                let body = transport.fetch_message_body(&message.message_id).await?;
                let key = ExcuseCache::key(&message.sender.email, &body);

                match cache.as_deref().and_then(|c| c.get(&key)).cloned() {
                    Some(hit) => {
                        debug!("cache hit for {}", message.message_id);
                        hit
                    }
                    None => match classify_or_fallback(
                        classifier,
                        &body,
                        &message.sender.email,
                        &message.sender.display_name,
                    )
                    .await
                    {
                        Ok(analysis) => {
                            if let Some(c) = cache.as_deref_mut() {
                                c.insert(key, message.sender.label(), analysis.clone());
                            }
                            analysis
                        }
                        Err(fallback) => fallback,
                    },
                }
            };

            reports.push(ExcuseReport {
                date: *date,
                message,
                analysis,
            });
        }
    }

    Ok(reports)
}
