use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::registry::DirectoryReply;
use crate::selection::SelectionEntry;

// ── Wire types ────────────────────────────────────────────────────────────────

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    pub selected_items: Vec<SelectionEntry>,
}

/// Decoded `POST /api/chat` reply. Exactly one of the two arms is meaningful
/// per response; an `error` field wins over `response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Answer(String),
    /// Transport succeeded but the server reported a failure
    AppError(String),
}

#[derive(Debug, Deserialize)]
struct RawChatReply {
    response: Option<String>,
    error: Option<String>,
}

impl ChatReply {
    pub fn from_json(raw: &str) -> Result<Self, ClientError> {
        let parsed: RawChatReply =
            serde_json::from_str(raw).map_err(|e| ClientError::Decode(e.to_string()))?;
        match (parsed.error, parsed.response) {
            (Some(e), _) if !e.is_empty() => Ok(ChatReply::AppError(e)),
            (_, Some(text)) => Ok(ChatReply::Answer(text)),
            _ => Err(ClientError::Decode(
                "reply carries neither `response` nor `error`".to_string(),
            )),
        }
    }
}

/// Body of `GET /api/cache/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheStatus {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub cache_size: u64,
    #[serde(default)]
    pub cache_max: u64,
    #[serde(default)]
    pub cache_usage_percent: f64,
    #[serde(default)]
    pub cached_files: Vec<String>,
    pub error: Option<String>,
}

/// Body of `POST /api/cache/clear`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheClearReply {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Transport-level failure: the request never produced a usable JSON body.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed reply: {0}")]
    Decode(String),
}

// ── Backend seam ──────────────────────────────────────────────────────────────

/// The one network call the chat state machine depends on.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatReply, ClientError>;
}

// ── Client ────────────────────────────────────────────────────────────────────

pub struct Client {
    http: reqwest::Client,
    pub endpoint: String,
    cookie: Option<String>,
}

impl Client {
    pub fn new(endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            cookie: None,
        }
    }

    /// Forward a browser session cookie (`session=...`) with every request.
    pub fn set_cookie(&mut self, cookie: String) {
        self.cookie = Some(cookie);
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .request(method, self.url(path))
            .header("Content-Type", "application/json");
        if let Some(cookie) = &self.cookie {
            req = req.header("Cookie", cookie.as_str());
        }
        req
    }

    /// Send and return the body text of a 2xx response.
    async fn body_text(&self, req: reqwest::RequestBuilder) -> Result<String, ClientError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "request rejected");
            return Err(ClientError::Status { status: status.as_u16(), body });
        }
        Ok(resp.text().await?)
    }

    async fn json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let text = self.body_text(req).await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn directory(&self) -> Result<DirectoryReply, ClientError> {
        debug!("GET /api/directory");
        self.json(self.request(reqwest::Method::GET, "/api/directory")).await
    }

    pub async fn cache_status(&self) -> Result<CacheStatus, ClientError> {
        debug!("GET /api/cache/status");
        self.json(self.request(reqwest::Method::GET, "/api/cache/status")).await
    }

    pub async fn clear_cache(&self) -> Result<CacheClearReply, ClientError> {
        debug!("POST /api/cache/clear");
        self.json(self.request(reqwest::Method::POST, "/api/cache/clear")).await
    }
}

#[async_trait]
impl ChatBackend for Client {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        debug!(
            question_len = request.question.len(),
            selected = request.selected_items.len(),
            "POST /api/chat"
        );
        let req = self.request(reqwest::Method::POST, "/api/chat").json(request);
        let text = self.body_text(req).await?;
        ChatReply::from_json(&text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
