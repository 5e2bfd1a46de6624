// crates/flow-regtest-api/src/provision.rs
// ============================================================================
// Module: Test-User Provisioning
// Description: Fetches third-party test-user access tokens.
// Purpose: Give each virtual user its own provider-issued access token.
// Dependencies: serde_json, thiserror, url, flow-regtest-config
// ============================================================================

//! ## Overview
//! The provider lists pre-created test users for an application at
//! `{graph_url}/{app_id}/accounts/test-users`, authenticated with the app
//! token `{app_id}|{app_secret}`. Virtual user `n` takes entry `n` of that
//! list, so distinct virtual users never share a provider identity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use flow_regtest_config::FacebookConfig;
use flow_regtest_core::ApiResponse;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::client::FlowClient;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Provisioning failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    /// No application credentials were configured.
    #[error("third-party application credentials are not configured")]
    NotConfigured,
    /// The listing URL could not be built.
    #[error("invalid test-user url: {0}")]
    Url(String),
    /// The provider did not respond.
    #[error("test-user listing failed: {0}")]
    Transport(String),
    /// The provider answered with a non-success status.
    #[error("test-user listing returned status {0}")]
    Status(u16),
    /// The listing body did not have the expected shape.
    #[error("test-user listing malformed: {0}")]
    Malformed(String),
    /// Fewer test users exist than virtual users need.
    #[error("test user {index} requested but only {available} exist")]
    NotEnoughUsers {
        /// Requested index.
        index: usize,
        /// Listed users.
        available: usize,
    },
}

// ============================================================================
// SECTION: Provisioner
// ============================================================================

/// Lists provider test users for one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUserProvisioner {
    /// Provider API root.
    graph_url: String,
    /// Application id.
    app_id: String,
    /// Application secret.
    app_secret: String,
}

impl TestUserProvisioner {
    /// Creates a provisioner from validated configuration.
    #[must_use]
    pub fn from_config(config: &FacebookConfig) -> Self {
        Self {
            graph_url: config.graph_url.clone(),
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
        }
    }

    /// Returns the test-user listing URL including the app token.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Url`] when the graph URL is not absolute.
    pub fn listing_url(&self) -> Result<Url, ProvisionError> {
        let base = self.graph_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/{}/accounts/test-users", self.app_id))
            .map_err(|err| ProvisionError::Url(err.to_string()))?;
        url.query_pairs_mut()
            .append_pair("access_token", &format!("{}|{}", self.app_id, self.app_secret));
        Ok(url)
    }

    /// Fetches the access token of test user `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] when the listing fails or has no entry at
    /// `index`.
    pub async fn access_token(
        &self,
        client: &FlowClient,
        index: usize,
    ) -> Result<String, ProvisionError> {
        let response = client
            .get_url(self.listing_url()?)
            .await
            .map_err(|err| ProvisionError::Transport(err.to_string()))?;
        token_at(&response, index)
    }
}

/// Extracts `data[index].access_token` from a listing response.
///
/// # Errors
///
/// Returns [`ProvisionError`] for non-200 statuses, malformed bodies, or a
/// short listing.
pub fn token_at(response: &ApiResponse, index: usize) -> Result<String, ProvisionError> {
    if response.status() != 200 {
        return Err(ProvisionError::Status(response.status()));
    }
    let body = response.json().map_err(|err| ProvisionError::Malformed(err.to_string()))?;
    let users = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ProvisionError::Malformed("missing `data` array".to_string()))?;
    let user = users.get(index).ok_or(ProvisionError::NotEnoughUsers {
        index,
        available: users.len(),
    })?;
    user.get("access_token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ProvisionError::Malformed(format!("entry {index} has no access_token")))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
