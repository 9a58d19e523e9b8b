use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::UserProfile;

/// Errors from the user directory lookup.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserClientError {
    #[error("user not found: {0}")]
    NotFound(String),
    #[error("failed to call user service: {0}")]
    Transport(String),
    #[error("failed to parse user service response: {0}")]
    Decode(String),
    #[error("invalid user service configuration: {0}")]
    Setup(String),
}

/// Lookup-by-id against the user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// One lookup, no retries. Not-found is reported distinctly from transport failures.
    async fn validate_user(&self, user_id: &str) -> Result<UserProfile, UserClientError>;
}

/// [`UserDirectory`] over HTTP: `GET {base}/api/users/{id}`.
#[derive(Clone)]
pub struct HttpUserClient {
    client: Client,
    base_url: Url,
}

impl HttpUserClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UserClientError> {
        let base_url = Url::parse(base_url).map_err(|e| UserClientError::Setup(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(UserClientError::Setup(format!("{} cannot be a base URL", base_url)));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UserClientError::Setup(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn user_url(&self, user_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "users", user_id]);
        }
        url
    }
}

#[async_trait]
impl UserDirectory for HttpUserClient {
    #[instrument(skip(self))]
    async fn validate_user(&self, user_id: &str) -> Result<UserProfile, UserClientError> {
        if user_id.is_empty() {
            return Err(UserClientError::NotFound(String::new()));
        }
        let url = self.user_url(user_id);
        debug!(%url, "Sending request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UserClientError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(UserClientError::NotFound(user_id.to_string())),
            StatusCode::OK => response
                .json::<UserProfile>()
                .await
                .map_err(|e| UserClientError::Decode(e.to_string())),
            status => {
                warn!(status = status.as_u16(), "User service returned unexpected status");
                Err(UserClientError::Transport(format!(
                    "user service returned status code {}",
                    status.as_u16()
                )))
            }
        }
    }
}
