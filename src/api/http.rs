//! REST client for the mailroom backend.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::backend::Backend;
use super::types::{Mailbox, PackageIntake, PackagePickup, SignatureCapture};
use crate::config::ApiConfig;
use crate::error::MailroomError;

const PACKAGES_PATH: &str = "packages";
const PICKUP_PATH: &str = "packages/pickup";
const SIGNATURES_PATH: &str = "signatures";
const MAILBOXES_PATH: &str = "mailboxes";

/// `Backend` implementation speaking JSON over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Build a client from API settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, MailroomError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| MailroomError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<(), MailroomError> {
        debug!(path, "POST");
        let response = self.request(Method::POST, path).json(body).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn create_package(&self, intake: &PackageIntake) -> Result<(), MailroomError> {
        self.post(PACKAGES_PATH, intake).await
    }

    async fn process_pickup(&self, pickup: &PackagePickup) -> Result<(), MailroomError> {
        self.post(PICKUP_PATH, pickup).await
    }

    async fn capture_signature(&self, signature: &SignatureCapture) -> Result<(), MailroomError> {
        self.post(SIGNATURES_PATH, signature).await
    }

    async fn fetch_mailboxes(&self) -> Result<Vec<Mailbox>, MailroomError> {
        debug!(path = MAILBOXES_PATH, "GET");
        let response = self.request(Method::GET, MAILBOXES_PATH).send().await?;
        let body = check_status(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn check_status(response: Response) -> Result<Response, MailroomError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(MailroomError::Backend {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Pull a readable message out of an error response body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["detail", "error", "message"] {
            if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}
