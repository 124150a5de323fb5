//! QR generation gateway
//!
//! Wraps the external QR image API. One outbound GET per call, no retries;
//! anything other than a 200 image response is a [`GatewayError`].

use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{CONTENT_TYPE, HeaderMap},
};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::ImagePayload;

pub const DEFAULT_ENDPOINT: &str = "https://getqrcode.p.rapidapi.com/api/getQR";
pub const DEFAULT_API_HOST: &str = "getqrcode.p.rapidapi.com";

/// Reasons a generation attempt failed
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("QR service returned HTTP {0}")]
    Status(u16),

    #[error("QR service returned non-image content type {0:?}")]
    ContentType(String),

    #[error("QR service returned an empty image")]
    EmptyBody,

    #[error("QR image exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("QR service did not answer in time")]
    Timeout,

    #[error("QR service request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("QR generation aborted: {0}")]
    Aborted(String),
}

impl GatewayError {
    /// Message shown to the user on the submission form
    pub fn user_message(&self) -> &'static str {
        match self {
            GatewayError::Status(_) | GatewayError::ContentType(_) | GatewayError::EmptyBody => {
                "Unexpected response format or status code"
            }
            _ => "An error occurred while generating the QR code",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Transport(err)
        }
    }
}

/// Turns a URL into an encoded QR image
#[async_trait]
pub trait QrGateway: Send + Sync {
    async fn generate(&self, source_url: &str) -> Result<ImagePayload, GatewayError>;
}

/// Gateway configuration
#[derive(Clone)]
pub struct GatewayConfig {
    /// Endpoint receiving `GET ?forQR=<url>`
    pub endpoint: String,
    /// Service credential sent as `x-rapidapi-key`
    pub api_key: String,
    /// Value of the `x-rapidapi-host` header
    pub api_host: String,
    /// Overall deadline for one generation
    pub timeout: Duration,
    /// Deadline for establishing the connection
    pub connect_timeout: Duration,
    /// Largest image accepted from the service
    pub max_image_bytes: usize,
}

impl GatewayConfig {
    /// Create a new GatewayConfig from environment variables
    ///
    /// # Environment Variables
    /// - `QR_API_KEY`: Service credential (required)
    /// - `QR_API_URL`: Endpoint (default: the public getQR endpoint)
    /// - `QR_API_HOST`: Host header value (default: "getqrcode.p.rapidapi.com")
    /// - `QR_API_TIMEOUT_SECS`: Overall deadline in seconds (default: 10)
    /// - `QR_API_MAX_IMAGE_BYTES`: Largest accepted image (default: 1 MiB)
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("QR_API_KEY")
            .map_err(|_| anyhow::anyhow!("QR_API_KEY environment variable not set"))?;

        let endpoint =
            std::env::var("QR_API_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let api_host =
            std::env::var("QR_API_HOST").unwrap_or_else(|_| DEFAULT_API_HOST.to_string());

        let timeout_secs = std::env::var("QR_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .unwrap_or(10);

        let max_image_bytes = std::env::var("QR_API_MAX_IMAGE_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1024 * 1024);

        Ok(GatewayConfig {
            endpoint,
            api_key,
            api_host,
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(5),
            max_image_bytes,
        })
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_host", &self.api_host)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_image_bytes", &self.max_image_bytes)
            .finish()
    }
}

/// Gateway backed by the remote HTTP API
#[derive(Clone)]
pub struct HttpQrGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpQrGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(GatewayError::Transport)?;

        Ok(Self { client, config })
    }
}

/// Media type essence of the response, lower-cased, without parameters
fn content_type_essence(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

#[async_trait]
impl QrGateway for HttpQrGateway {
    async fn generate(&self, source_url: &str) -> Result<ImagePayload, GatewayError> {
        let mut response = self
            .client
            .get(&self.config.endpoint)
            .query(&[("forQR", source_url)])
            .header("x-rapidapi-key", &self.config.api_key)
            .header("x-rapidapi-host", &self.config.api_host)
            .send()
            .await?;

        let status = response.status();
        debug!("QR service responded with status {}", status);
        if status != StatusCode::OK {
            warn!("QR service rejected request with status {}", status);
            return Err(GatewayError::Status(status.as_u16()));
        }

        let mime = content_type_essence(response.headers());
        if !mime.starts_with("image/") {
            return Err(GatewayError::ContentType(mime));
        }

        let limit = self.config.max_image_bytes;
        if response
            .content_length()
            .is_some_and(|len| len > limit as u64)
        {
            return Err(GatewayError::TooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(GatewayError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        if body.is_empty() {
            return Err(GatewayError::EmptyBody);
        }

        Ok(ImagePayload::encode(&mime, &body))
    }
}
