#![doc = "Transfer platform client: bridges the core `Authenticator` and `JobService` traits to the platform's HTTP API."]
//
//! # Platform client
//!
//! [`PlatformClient`] implements both [`Authenticator`] and [`JobService`] over reqwest.
//!
//! - Construct it with [`PlatformClient::new_from_env`]; credentials come from
//!   `PLATFORM_ACCESS_TOKEN`, or from `PLATFORM_CLIENT_ID` + `PLATFORM_CLIENT_SECRET`.
//! - A pre-issued access token is used as the `Authorization` value as-is and skips the
//!   token endpoint entirely.
//! - Endpoints: `POST /oauth/token`, `POST /v1/jobs/`, `POST /v1/jobs/{jobId}/deliveries`.

use async_trait::async_trait;
use manual_job_core::contract::{Authenticator, BearerToken, JobService};
use manual_job_core::error::ServiceError;
use manual_job_core::job::{CreatedJob, DeliveryRequest, NewJob};
use serde::{Deserialize, Serialize};
use std::env;

use crate::http::{endpoint_url, send_json};

const AUTHENTICATION_ENDPOINT: [&str; 2] = ["oauth", "token"];

#[derive(Clone)]
pub enum PlatformCredentials {
    /// Complete `Authorization` header value, e.g. `Bearer eyJ...`.
    AccessToken(String),
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
}

impl std::fmt::Debug for PlatformCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformCredentials::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            PlatformCredentials::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// `"<token_type> <access_token>"`; both fields must be present.
pub fn bearer_from_response(response: TokenResponse) -> Result<BearerToken, ServiceError> {
    match (response.token_type, response.access_token) {
        (Some(kind), Some(token)) if !kind.is_empty() && !token.is_empty() => {
            Ok(BearerToken::new(format!("{kind} {token}")))
        }
        _ => Err(ServiceError::InvalidResponse(
            "token response is missing token_type or access_token".into(),
        )),
    }
}

pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    credentials: PlatformCredentials,
}

impl PlatformClient {
    pub fn new(base_url: impl Into<String>, credentials: PlatformCredentials) -> Self {
        PlatformClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            credentials,
        }
    }

    pub fn new_from_env(
        base_url: impl Into<String>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();
        let base_url = base_url.into();
        if let Ok(token) = env::var("PLATFORM_ACCESS_TOKEN") {
            if !token.is_empty() {
                tracing::info!(base_url = %base_url, "Initialized PlatformClient with pre-issued access token");
                return Ok(Self::new(base_url, PlatformCredentials::AccessToken(token)));
            }
        }
        match (env::var("PLATFORM_CLIENT_ID"), env::var("PLATFORM_CLIENT_SECRET")) {
            (Ok(client_id), Ok(client_secret)) => {
                tracing::info!(
                    base_url = %base_url,
                    client_id = %client_id,
                    "Initialized PlatformClient from environment"
                );
                Ok(Self::new(
                    base_url,
                    PlatformCredentials::ClientCredentials {
                        client_id,
                        client_secret,
                    },
                ))
            }
            (Err(e), _) => {
                tracing::error!(error = ?e, "PLATFORM_CLIENT_ID missing in environment");
                Err(format!("PLATFORM_CLIENT_ID: {e}").into())
            }
            (_, Err(e)) => {
                tracing::error!(error = ?e, "PLATFORM_CLIENT_SECRET missing in environment");
                Err(format!("PLATFORM_CLIENT_SECRET: {e}").into())
            }
        }
    }

    pub fn credentials(&self) -> &PlatformCredentials {
        &self.credentials
    }
}

#[async_trait]
impl Authenticator for PlatformClient {
    async fn create_token(&self) -> Result<BearerToken, ServiceError> {
        let (client_id, client_secret) = match &self.credentials {
            PlatformCredentials::AccessToken(token) => {
                tracing::info!("Using pre-issued access token");
                return Ok(BearerToken::new(token.clone()));
            }
            PlatformCredentials::ClientCredentials {
                client_id,
                client_secret,
            } => (client_id, client_secret),
        };

        let url = endpoint_url(&self.base_url, &AUTHENTICATION_ENDPOINT)?;
        tracing::info!(url = %url, client_id = %client_id, "Requesting access token");
        let response: TokenResponse = send_json(self.http.post(url).json(&TokenRequest {
            client_id,
            client_secret,
            grant_type: "client_credentials",
        }))
        .await?;
        let token = bearer_from_response(response)?;
        tracing::info!("Access token issued");
        Ok(token)
    }
}

#[async_trait]
impl JobService for PlatformClient {
    async fn create_job(
        &self,
        token: &BearerToken,
        job: &NewJob,
    ) -> Result<CreatedJob, ServiceError> {
        let url = endpoint_url(&self.base_url, &["v1", "jobs", ""])?;
        tracing::info!(url = %url, name = %job.name, "Creating job");
        let created: CreatedJob = send_json(
            self.http
                .post(url)
                .header(reqwest::header::AUTHORIZATION, token.as_str())
                .json(job),
        )
        .await?;
        tracing::info!(job_id = ?created.job_id, "Job creation response received");
        Ok(created)
    }

    async fn submit_delivery(
        &self,
        token: &BearerToken,
        job_id: &str,
        request: &DeliveryRequest,
    ) -> Result<serde_json::Value, ServiceError> {
        let url = endpoint_url(&self.base_url, &["v1", "jobs", job_id, "deliveries"])?;
        tracing::info!(url = %url, objects = request.objects.len(), "Submitting delivery");
        send_json(
            self.http
                .post(url)
                .header(reqwest::header::AUTHORIZATION, token.as_str())
                .json(request),
        )
        .await
    }
}
