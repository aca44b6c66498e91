use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressList {
    pub addresses: Vec<String>,
}

/// Collector's reply to `/add_addresses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReceipt {
    pub status: String,
    pub message: String,
}

/// Ships extracted address lists to a collector service.
pub struct SyncClient {
    client: reqwest::Client,
    endpoint: String,
}

impl SyncClient {
    pub fn new(base_url: &str) -> Self {
        SyncClient {
            client: reqwest::Client::new(),
            endpoint: format!("{}/add_addresses", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn push(&self, addresses: &[String]) -> Result<SyncReceipt> {
        let body = AddressList {
            addresses: addresses.to_vec(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    warn!(url = %self.endpoint, "Collector unreachable");
                    Error::CollectorUnreachable {
                        url: self.endpoint.clone(),
                    }
                } else {
                    Error::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::CollectorStatus { status });
        }

        let receipt: SyncReceipt = response.json().await?;
        info!(count = addresses.len(), message = %receipt.message, "Synced addresses");
        Ok(receipt)
    }
}
