use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::LeadSubmission;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Identifier the lead backend assigns. Some backends return integers,
/// others strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeadId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadId::Number(n) => write!(f, "{n}"),
            LeadId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub lead_id: Option<LeadId>,
    pub booking_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LeadResponse {
    #[serde(default)]
    id: Option<LeadId>,
    #[serde(default, rename = "bookingUrl")]
    booking_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("lead request failed: {0}")]
    Network(String),
    #[error("lead endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// One delivery attempt of a submission. Retries are the caller's concern.
#[async_trait]
pub trait LeadTransport: Send + Sync {
    async fn deliver(&self, submission: &LeadSubmission) -> Result<DeliveryReceipt, DeliveryError>;
}

/// POSTs the submission as JSON to a lead endpoint.
pub struct HttpLeadTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLeadTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LeadTransport for HttpLeadTransport {
    async fn deliver(&self, submission: &LeadSubmission) -> Result<DeliveryReceipt, DeliveryError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(IDEMPOTENCY_HEADER, submission.id().to_string())
            .json(submission)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body: body.chars().take(1024).collect(),
            });
        }

        // A 2xx with an empty or unexpected body still counts as delivered.
        let parsed: LeadResponse = if body.trim().is_empty() {
            LeadResponse::default()
        } else {
            serde_json::from_str(&body).unwrap_or_else(|e| {
                tracing::debug!("Unparseable lead response from {}: {e}", self.endpoint);
                LeadResponse::default()
            })
        };

        Ok(DeliveryReceipt {
            lead_id: parsed.id,
            booking_url: parsed.booking_url.filter(|u| !u.is_empty()),
        })
    }
}
