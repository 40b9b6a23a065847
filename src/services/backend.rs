use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::models::{role::Role, sticker::Sticker, vehicle::VerifiedScan};

/// Shown whenever the backend could not be reached or answered with
/// something unreadable.
pub const GENERIC_NETWORK_ERROR: &str =
    "Unable to reach the verification service. Check your connection and try again.";

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Backend returned status {status}")]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Backend API error: {0}")]
    ApiError(String),

    #[error("Not found")]
    NotFound { message: Option<String> },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// The one line shown to the agent. Backend-authored messages pass
    /// through; transport failures collapse to [`GENERIC_NETWORK_ERROR`].
    pub fn user_message(&self) -> String {
        match self {
            BackendError::ApiError(msg) => msg.clone(),
            BackendError::Status {
                message: Some(msg), ..
            } => msg.clone(),
            BackendError::NotFound { message: Some(msg) } => msg.clone(),
            BackendError::NotFound { message: None } => "No record found for this code".to_string(),
            BackendError::HttpError(_)
            | BackendError::InvalidUrl(_)
            | BackendError::Status { message: None, .. }
            | BackendError::InvalidResponse(_) => GENERIC_NETWORK_ERROR.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
    }
}

/// Response envelope shared by every backend endpoint
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
struct VerifyScanRequest<'a> {
    barcode: &'a str,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttachStickerRequest<'a> {
    vehicle_id: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub token: String,
    pub user: AgentProfile,
}

/// Client for the levy backend REST API
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
    service_token: Option<Secret<String>>,
}

impl BackendClient {
    pub fn new(
        base_url: &str,
        service_token: Option<Secret<String>>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url)?;

        Ok(Self {
            client,
            base_url,
            service_token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidResponse("Backend URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Agent calls carry the agent's session token; anything else falls back
    /// to the configured service token.
    fn authorize(&self, request: RequestBuilder, agent_token: Option<&str>) -> RequestBuilder {
        match agent_token {
            Some(token) => request.bearer_auth(token),
            None => match &self.service_token {
                Some(token) => request.bearer_auth(token.expose_secret()),
                None => request,
            },
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                .ok()
                .and_then(ApiEnvelope::into_message);

            if status == StatusCode::NOT_FOUND {
                return Err(BackendError::NotFound { message });
            }

            tracing::error!(status = %status, body = %body, "Backend request failed");
            return Err(BackendError::Status { status, message });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse backend response");
            BackendError::InvalidResponse(e.to_string())
        })?;

        if !envelope.success {
            let message = envelope
                .into_message()
                .unwrap_or_else(|| "The request was rejected".to_string());
            return Err(BackendError::ApiError(message));
        }

        envelope
            .data
            .ok_or_else(|| BackendError::InvalidResponse("Response has no data".to_string()))
    }

    /// Sends a scanned code and the agent's position to the compliance
    /// endpoint. The verdict is whatever the backend decides.
    #[tracing::instrument(skip(self, agent_token))]
    pub async fn verify_scan(
        &self,
        agent_token: Option<&str>,
        barcode: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<VerifiedScan, BackendError> {
        let url = self.endpoint(&["vehicles", "verify-scan"])?;
        let request = self.client.post(url).json(&VerifyScanRequest {
            barcode,
            latitude,
            longitude,
        });

        self.send(self.authorize(request, agent_token)).await
    }

    /// Public lookup by code. An unknown code is `Ok(None)`.
    #[tracing::instrument(skip(self, agent_token))]
    pub async fn lookup_sticker(
        &self,
        agent_token: Option<&str>,
        code: &str,
    ) -> Result<Option<Sticker>, BackendError> {
        let url = self.endpoint(&["barcodes", code])?;
        let request = self.authorize(self.client.get(url), agent_token);

        match self.send(request).await {
            Ok(sticker) => Ok(Some(sticker)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self, agent_token))]
    pub async fn attach_sticker(
        &self,
        agent_token: &str,
        code: &str,
        vehicle_id: &str,
    ) -> Result<Sticker, BackendError> {
        let url = self.endpoint(&["barcodes", code, "attach"])?;
        let request = self
            .client
            .post(url)
            .json(&AttachStickerRequest { vehicle_id });

        self.send(self.authorize(request, Some(agent_token))).await
    }

    #[tracing::instrument(skip(self, agent_token))]
    pub async fn restore_sticker(&self, agent_token: &str, code: &str) -> Result<Sticker, BackendError> {
        let url = self.endpoint(&["barcodes", code, "restore"])?;
        let request = self.client.post(url);

        self.send(self.authorize(request, Some(agent_token))).await
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginData, BackendError> {
        let url = self.endpoint(&["auth", "login"])?;
        let request = self.client.post(url).json(&LoginRequest { email, password });

        self.send(request).await
    }

    /// Reachability check; any non-5xx answer counts as up.
    pub async fn check_health(&self) -> Result<(), BackendError> {
        let url = self.endpoint(&["health"])?;
        let response = self
            .authorize(self.client.get(url), None)
            .timeout(Duration::from_secs(3))
            .send()
            .await?;

        if response.status().is_server_error() {
            return Err(BackendError::Status {
                status: response.status(),
                message: None,
            });
        }

        Ok(())
    }
}
