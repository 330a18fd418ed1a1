//! Configuration management

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Token the webhook verification handshake must present
    pub verify_token: Option<String>,

    /// WhatsApp Cloud API bearer token
    pub access_token: Option<String>,

    /// WhatsApp sender phone number id
    pub phone_number_id: Option<String>,

    /// Graph API version used for sends and media lookups
    pub graph_api_version: String,

    /// DeepSeek API key (every AI call is reported as unclear without it)
    pub deepseek_api_key: Option<String>,

    /// Chat completions endpoint
    pub deepseek_api_url: String,

    /// Chat completions model
    pub deepseek_model: String,

    /// SQLite database path for user records
    pub db_path: PathBuf,

    /// Directory received images are archived into
    pub images_dir: PathBuf,

    /// Tesseract binary
    pub tesseract_cmd: PathBuf,

    /// Webhook listen address
    pub bind_addr: SocketAddr,

    /// Timeout for every outbound HTTP call
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("SECURITYBOT_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()
            .context("SECURITYBOT_BIND is not a valid socket address")?;

        let http_timeout_secs = std::env::var("SECURITYBOT_HTTP_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(45);

        Ok(Self {
            verify_token: non_empty_var("VERIFY_TOKEN"),
            access_token: non_empty_var("ACCESS_TOKEN"),
            phone_number_id: non_empty_var("PHONE_NUMBER_ID"),
            graph_api_version: std::env::var("GRAPH_API_VERSION")
                .unwrap_or_else(|_| "v18.0".to_string()),
            deepseek_api_key: non_empty_var("DEEPSEEK_API_KEY"),
            deepseek_api_url: std::env::var("DEEPSEEK_API_URL")
                .unwrap_or_else(|_| DEFAULT_DEEPSEEK_API_URL.to_string()),
            deepseek_model: std::env::var("DEEPSEEK_MODEL")
                .unwrap_or_else(|_| "deepseek-chat".to_string()),
            db_path: std::env::var("SECURITYBOT_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("usuarios_bot.db")),
            images_dir: std::env::var("SECURITYBOT_IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("imagenes_recibidas")),
            tesseract_cmd: std::env::var("TESSERACT_CMD_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("tesseract")),
            bind_addr,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }

    /// Names of the variables the bot cannot do useful work without
    pub fn missing_critical(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.verify_token.is_none() {
            missing.push("VERIFY_TOKEN");
        }
        if self.access_token.is_none() {
            missing.push("ACCESS_TOKEN");
        }
        if self.phone_number_id.is_none() {
            missing.push("PHONE_NUMBER_ID");
        }
        if self.deepseek_api_key.is_none() {
            missing.push("DEEPSEEK_API_KEY");
        }
        missing
    }

    /// Log missing critical variables; the server still starts
    pub fn warn_missing(&self) {
        let missing = self.missing_critical();
        if !missing.is_empty() {
            warn!("Critical environment variables not set: {}", missing.join(", "));
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
