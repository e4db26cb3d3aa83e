use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Gemini API key not set. Set GEMINI_API_KEY or run `fellow-attendance config --set-api-key YOUR_KEY`")]
    MissingApiKey,

    #[error("Gmail error: {0}")]
    Mail(String),

    #[error("Authorization error: {0}")]
    Auth(String),

    #[error("API call error: {0}")]
    ApiCall(String),

    #[error("Failed to parse API response: {0}")]
    ApiParse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export error: {0}")]
    Export(String),

    #[error("CLI execution error: {0}")]
    CliExecution(String),

    #[error(transparent)]
    Common(#[from] fellow_attendance_common::Error),
}

impl AttendanceError {
    /// 外部サービス（Gmail・OAuth・LLM）起因のエラーか
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            AttendanceError::Mail(_)
                | AttendanceError::Auth(_)
                | AttendanceError::ApiCall(_)
                | AttendanceError::ApiParse(_)
                | AttendanceError::Http(_)
                | AttendanceError::CliExecution(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;
