//! Read-only practitioner directory client.
//!
//! Supplies the data the Service step renders: the practitioner's
//! profile and their priced service tiers. The engine never writes to
//! the directory.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::wizard::ServiceChoice;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// One bookable service a practitioner offers, with its flat price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTier {
    pub name: String,
    pub price: f64,
}

impl ServiceTier {
    /// The wizard's service choice is a copy of the tier at selection
    /// time, so a later price change never alters an in-flight booking.
    pub fn to_choice(&self) -> ServiceChoice {
        ServiceChoice {
            name: self.name.clone(),
            price: self.price,
        }
    }
}

/// A practitioner as the directory presents them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PractitionerProfile {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub service_tiers: Vec<ServiceTier>,
}

/// Errors from directory lookups.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("No practitioner with id {0}")]
    NotFound(String),
}

// ═══════════════════════════════════════════════════════════
// Client
// ═══════════════════════════════════════════════════════════

/// REST client for the practitioner directory.
pub struct DirectoryClient {
    base_url: String,
    client: reqwest::Client,
}

impl DirectoryClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Fetch one practitioner's profile with their service tiers.
    pub async fn practitioner_profile(
        &self,
        practitioner_id: &str,
    ) -> Result<PractitionerProfile, DirectoryError> {
        debug!("GET practitioner profile {}", practitioner_id);
        let url = format!("{}/practitioners/{}", self.base_url, practitioner_id);
        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound(practitioner_id.to_string()));
        }
        Ok(response.error_for_status()?.json().await?)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
