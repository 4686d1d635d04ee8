use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::encoder::ExportPayload;
use crate::workflows::risk::error::TransportError;

pub const DEFAULT_REJECTION_MESSAGE: &str = "Failed to export data to Google Drive";

/// Body returned by an export sink on a success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkAcknowledgement {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SinkAcknowledgement {
    pub fn accepted() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
        }
    }
}

/// Outbound destination for encoded exports. One call per export, no retry.
#[async_trait]
pub trait ExportSink: Debug + Send + Sync {
    async fn deliver(&self, payload: &ExportPayload) -> Result<(), TransportError>;
}

/// Sink POSTing the payload as JSON to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpExportSink {
    client: Client,
    endpoint: String,
}

impl HttpExportSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExportSink for HttpExportSink {
    async fn deliver(&self, payload: &ExportPayload) -> Result<(), TransportError> {
        debug!(endpoint = %self.endpoint, filename = %payload.filename, "posting export");

        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|err| TransportError::Fault(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    warn!(%status, error = %err, "could not read export error body");
                    String::new()
                }
            };
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let acknowledgement: SinkAcknowledgement = response
            .json()
            .await
            .map_err(|err| TransportError::Fault(err.to_string()))?;

        if acknowledgement.success {
            Ok(())
        } else {
            Err(TransportError::Rejected(
                acknowledgement
                    .error
                    .filter(|reason| !reason.is_empty())
                    .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string()),
            ))
        }
    }
}
