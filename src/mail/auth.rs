//! Gmail OAuth（インストール型アプリ）
//!
//! - credentials.json: Google Cloud Console からダウンロードしたクライアント情報
//! - token.json: 取得済みトークン（期限切れならリフレッシュトークンで更新）
//! - 初回はブラウザで認可し、127.0.0.1 のループバックでコードを受け取る

use crate::error::{AttendanceError, Result};
use chrono::Utc;
use log::{debug, info};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";
pub const TOKEN_FILE_NAME: &str = "token.json";

/// 期限のこの秒数前から期限切れとみなす
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".into()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".into()
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// token.json の内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// UNIX秒。不明なら0（期限切れ扱い）
    #[serde(default)]
    pub expires_at: i64,
}

impl StoredToken {
    pub fn is_expired(&self, now: i64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    fn into_stored(self, previous_refresh: Option<String>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: Utc::now().timestamp() + self.expires_in.unwrap_or(3600),
        }
    }
}

fn missing_credentials_message(path: &Path, config_dir: &Path) -> String {
    format!(
        "Gmail credentials not found at:\n  {}\n\n\
         To fix this:\n  \
         1. Go to https://console.cloud.google.com/\n  \
         2. Create or select a project and enable the 'Gmail API'\n  \
         3. APIs & Services -> Credentials -> Create Credentials -> OAuth client ID\n  \
         4. Application type: Desktop app -> Create\n  \
         5. Download the JSON and save it as '{}' in:\n     {}\n  \
         6. Run again; a browser sign-in link will be printed",
        path.display(),
        CREDENTIALS_FILE_NAME,
        config_dir.display()
    )
}

pub struct GmailAuth {
    http: reqwest::Client,
    secrets: ClientSecrets,
    token_path: PathBuf,
}

impl GmailAuth {
    /// 設定ディレクトリの credentials.json を読み込み
    pub fn load(config_dir: &Path, http: reqwest::Client) -> Result<Self> {
        let path = config_dir.join(CREDENTIALS_FILE_NAME);
        if !path.exists() {
            return Err(AttendanceError::Auth(missing_credentials_message(&path, config_dir)));
        }
        let content = std::fs::read_to_string(&path)?;
        let file: CredentialsFile = serde_json::from_str(&content)?;
        let secrets = file.installed.or(file.web).ok_or_else(|| {
            AttendanceError::Auth(format!(
                "{} has neither an 'installed' nor a 'web' client section",
                path.display()
            ))
        })?;

        Ok(Self::new(http, secrets, config_dir.join(TOKEN_FILE_NAME)))
    }

    pub fn new(http: reqwest::Client, secrets: ClientSecrets, token_path: PathBuf) -> Self {
        Self {
            http,
            secrets,
            token_path,
        }
    }

    /// 有効なアクセストークンを取得（必要ならリフレッシュ・初回認可）
    pub async fn access_token(&self) -> Result<String> {
        let stored = self.load_token()?;

        if let Some(token) = stored {
            if !token.is_expired(Utc::now().timestamp()) {
                debug!("using cached Gmail token");
                return Ok(token.access_token);
            }
            if let Some(refresh) = token.refresh_token {
                info!("refreshing Gmail access token");
                let refreshed = self.refresh(&refresh).await?;
                self.save_token(&refreshed)?;
                return Ok(refreshed.access_token);
            }
        }

        let token = self.authorize_interactive().await?;
        self.save_token(&token)?;
        Ok(token.access_token)
    }

    fn load_token(&self) -> Result<Option<StoredToken>> {
        if !self.token_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.token_path)?;
        match serde_json::from_str(&content) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                log::warn!("ignoring unreadable {}: {}", self.token_path.display(), e);
                Ok(None)
            }
        }
    }

    fn save_token(&self, token: &StoredToken) -> Result<()> {
        let content = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.token_path, content)?;
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<StoredToken> {
        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let response = self.request_token(&params).await?;
        Ok(response.into_stored(Some(refresh_token.to_string())))
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<StoredToken> {
        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];
        let response = self.request_token(&params).await?;
        Ok(response.into_stored(None))
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.secrets.token_uri)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttendanceError::Auth(format!(
                "token endpoint returned {}: {}",
                status,
                body.trim()
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AttendanceError::Auth(format!("invalid token response: {}", e)))
    }

    /// ブラウザで開く認可URL
    pub fn authorization_url(&self, redirect_uri: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", GMAIL_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AttendanceError::Auth(format!("invalid auth_uri: {}", e)))?;
        Ok(url.to_string())
    }

    async fn authorize_interactive(&self) -> Result<StoredToken> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let redirect_uri = format!("http://127.0.0.1:{}", listener.local_addr()?.port());
        let url = self.authorization_url(&redirect_uri)?;

        println!("Open this URL in a browser and sign in to the attendance inbox:\n\n  {}\n", url);
        println!("Waiting for authorization...");

        let (mut stream, _) = listener.accept().await?;
        let mut buf = vec![0u8; 8192];
        let n = stream.read(&mut buf).await?;
        let request = String::from_utf8_lossy(&buf[..n]);
        let request_line = request.lines().next().unwrap_or_default();
        let code = parse_redirect_code(request_line);

        let page = match &code {
            Ok(_) => "Authorization complete. You may close this window.",
            Err(_) => "Authorization failed. Return to the terminal for details.",
        };
        let reply = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            page.len(),
            page
        );
        stream.write_all(reply.as_bytes()).await?;
        stream.shutdown().await?;

        self.exchange_code(&code?, &redirect_uri).await
    }
}

/// "GET /?code=...&scope=... HTTP/1.1" から認可コードを取り出す
pub fn parse_redirect_code(request_line: &str) -> Result<String> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| AttendanceError::Auth("malformed redirect request".into()))?;
    let url = Url::parse(&format!("http://127.0.0.1{}", target))
        .map_err(|e| AttendanceError::Auth(format!("malformed redirect: {}", e)))?;

    let mut code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => {
                return Err(AttendanceError::Auth(format!(
                    "authorization denied: {}",
                    value
                )))
            }
            _ => {}
        }
    }
    code.ok_or_else(|| AttendanceError::Auth("redirect did not include a code".into()))
}
