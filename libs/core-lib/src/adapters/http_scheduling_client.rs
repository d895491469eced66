use crate::{
    CoreError, SchedulingApi,
    domain::scheduling::{RequestSubmission, TokenValidation},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info, warn};

/// `SchedulingApi` adapter talking JSON over HTTP to the scheduling service.
#[derive(Debug, Clone)]
pub struct HttpSchedulingClient {
    client: Client,
    base_url: Url,
}

impl HttpSchedulingClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CoreError::Configuration(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl SchedulingApi for HttpSchedulingClient {
    async fn validate_token(&self, token: &str) -> Option<TokenValidation> {
        let url = self
            .endpoint(&["solicitacao-token", "validar", token])
            .ok()?;
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Token validation request failed: {}", e);
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            debug!("Token validation returned {}", response.status());
            return None;
        }

        match response.json::<TokenValidation>().await {
            Ok(validation) => Some(validation),
            Err(e) => {
                warn!("Unreadable token validation body: {}", e);
                None
            }
        }
    }

    async fn consume_token(&self, token: &str) -> bool {
        let Ok(url) = self.endpoint(&["solicitacao-token", "utilizar", token]) else {
            return false;
        };
        match self.client.put(url).send().await {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                warn!("Token consumption returned {}", response.status());
                false
            }
            Err(e) => {
                warn!("Token consumption request failed: {}", e);
                false
            }
        }
    }

    async fn submit_request(&self, submission: &RequestSubmission) -> Result<(), CoreError> {
        let url = self.endpoint(&["solicitacoes", "criar"])?;
        let response = self
            .client
            .post(url)
            .json(submission)
            .send()
            .await
            .map_err(|e| CoreError::Remote(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::OK {
            info!("Request mirrored to scheduling service");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(CoreError::Remote(format!("status {status}: {body}")))
    }
}
