//! Gravatar HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use tracing::{debug, info, instrument};

use crate::config::GravatarConfig;
use crate::errors::FetchError;

/// Answer from an avatar source for one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarResponse {
    /// The image bytes, exactly as served.
    Found(Vec<u8>),
    /// No image is registered for the fingerprint.
    NotFound,
}

/// Something that can look up an avatar by fingerprint.
#[async_trait]
pub trait AvatarSource: Send + Sync {
    /// The address requested for `fingerprint`, for diagnostics.
    fn url_for(&self, fingerprint: &str) -> String;

    async fn fetch(&self, fingerprint: &str) -> Result<AvatarResponse, FetchError>;
}

/// Asynchronous client for the Gravatar image service.
///
/// Requests ask the service to answer 404 rather than a placeholder when
/// no image exists. 2xx maps to [`AvatarResponse::Found`], 404 to
/// [`AvatarResponse::NotFound`], any other status to
/// [`FetchError::UnexpectedStatus`].
#[derive(Debug, Clone)]
pub struct GravatarClient {
    http: reqwest::Client,
    base_url: String,
    size: u32,
    rating: String,
}

impl GravatarClient {
    pub fn new(config: &GravatarConfig) -> Result<Self, FetchError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("image/png"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("gitavatar/", env!("CARGO_PKG_VERSION"))),
        );
        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;
        info!(base_url = %base_url, size = config.size, "created GravatarClient");
        Ok(Self {
            http,
            base_url,
            size: config.size,
            rating: config.rating.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

#[async_trait]
impl AvatarSource for GravatarClient {
    fn url_for(&self, fingerprint: &str) -> String {
        format!(
            "{}/{}.png?default=404&size={}&rating={}",
            self.base_url, fingerprint, self.size, self.rating
        )
    }

    #[instrument(skip(self))]
    async fn fetch(&self, fingerprint: &str) -> Result<AvatarResponse, FetchError> {
        let url = self.url_for(fingerprint);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        debug!(status = status.as_u16(), "gravatar responded");

        if status == StatusCode::NOT_FOUND {
            return Ok(AvatarResponse::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        let body = resp.bytes().await?;
        debug!(bytes = body.len(), "read avatar body");
        Ok(AvatarResponse::Found(body.to_vec()))
    }
}
