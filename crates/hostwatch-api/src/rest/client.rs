// Registry REST client
//
// Wraps `reqwest::Client` with registry URL construction and error-body
// handling. Endpoint methods live in `machines.rs` as inherent methods to
// keep this module focused on transport mechanics.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Error body convention: `{ "message": "..." }`. The upstream service
/// answers with FastAPI's `{ "detail": ... }`, which may be a string or a
/// list of validation errors.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "detail")]
    message: Option<serde_json::Value>,
}

/// HTTP client for the machine registry.
///
/// All methods return decoded payloads; non-2xx responses become
/// [`Error::Api`] with the status code preserved.
#[derive(Debug, Clone)]
pub struct MachinesClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl MachinesClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the registry root (e.g. `http://localhost:8000`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: Some(transport.timeout),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: None,
        }
    }

    /// The registry base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{path}`, preserving any path prefix on the base.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}/api/{}", path.trim_start_matches('/'));
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.send(self.http.get(url)).await?;
        decode(resp).await
    }

    /// Send a PUT request with JSON body and decode the response.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl serde::Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("PUT {}", url);

        let resp = self.send(self.http.put(url).json(body)).await?;
        decode(resp).await
    }

    /// Send a DELETE request, discarding any success body.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {}", url);

        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    /// Send the request and turn non-2xx responses into [`Error::Api`].
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        let resp = builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            message: error_message(status, &body),
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        match self.timeout {
            Some(timeout) if err.is_timeout() => Error::Timeout {
                timeout_secs: timeout.as_secs(),
            },
            _ => Error::Transport(err),
        }
    }
}

/// Decode a JSON body, keeping the raw text around on failure.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}

/// Pick the user-facing message for a failed response.
///
/// Preference: structured `message`/`detail`, then the raw body text,
/// then the status line.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(ErrorBody { message: Some(msg) }) = serde_json::from_str::<ErrorBody>(body) {
        return match msg {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_owned()
    }
}
