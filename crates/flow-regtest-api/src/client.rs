// crates/flow-regtest-api/src/client.rs
// ============================================================================
// Module: Flow HTTP Client
// Description: Buffered REST, multipart, and GraphQL calls against the API.
// Purpose: Turn every request into a fully buffered exchange for checks.
// Dependencies: reqwest, serde_json, url, flow-regtest-core
// ============================================================================

//! ## Overview
//! [`FlowClient`] wraps one `reqwest` client with the configured timeout. Each
//! call awaits the complete response and returns an [`Exchange`]: a buffered
//! [`ApiResponse`] whatever the status, or a [`TransportError`] when no
//! response arrived. Non-2xx statuses are data, never errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use flow_regtest_config::ApiConfig;
use flow_regtest_core::ApiResponse;
use flow_regtest_core::Exchange;
use flow_regtest_core::TransportError;
use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use serde_json::Value;
use serde_json::json;
use url::Url;

// ============================================================================
// SECTION: Client
// ============================================================================

/// HTTP client bound to one Flow deployment.
#[derive(Debug, Clone)]
pub struct FlowClient {
    /// Underlying HTTP client.
    http: Client,
    /// REST base URL without trailing slash.
    base_url: String,
    /// GraphQL endpoint.
    graphql_url: String,
}

impl FlowClient {
    /// Builds a client with a whole-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] when the client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        graphql_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("flow-regtest/0.1")
            .build()
            .map_err(|err| TransportError::Request(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            graphql_url: graphql_url.into(),
        })
    }

    /// Builds a client from validated API configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] when the client cannot be built.
    pub fn from_config(api: &ApiConfig) -> Result<Self, TransportError> {
        Self::new(&api.base_url, &api.graphql_url, Duration::from_secs(api.timeout_sec))
    }

    /// Returns the absolute URL for an API path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Issues `GET {base}{path}` without credentials.
    pub async fn get(&self, path: &str) -> Exchange {
        send(self.http.get(self.endpoint(path))).await
    }

    /// Issues `GET` against an absolute URL outside the API.
    pub async fn get_url(&self, url: Url) -> Exchange {
        send(self.http.get(url.as_str())).await
    }

    /// Posts a JSON body, optionally with a bearer token.
    pub async fn post_json(&self, path: &str, body: &Value, bearer: Option<&str>) -> Exchange {
        let request = with_bearer(self.http.post(self.endpoint(path)).json(body), bearer);
        send(request).await
    }

    /// Posts one file as a multipart form field.
    pub async fn post_file(
        &self,
        path: &str,
        field: &'static str,
        file_name: &str,
        bytes: Vec<u8>,
        bearer: Option<&str>,
    ) -> Exchange {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part(field, part);
        let request = with_bearer(self.http.post(self.endpoint(path)).multipart(form), bearer);
        send(request).await
    }

    /// Posts a GraphQL operation with bearer credentials.
    pub async fn graphql(&self, query: &str, variables: Value, bearer: &str) -> Exchange {
        let body = json!({
            "query": query,
            "variables": variables,
        });
        let request = self.http.post(&self.graphql_url).bearer_auth(bearer).json(&body);
        send(request).await
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Sends a request and buffers the full response.
async fn send(request: RequestBuilder) -> Exchange {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status().as_u16();
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response.bytes().await.map_err(|err| TransportError::Body(err.to_string()))?;
    Ok(ApiResponse::new(status, headers, body.to_vec()))
}

/// Attaches `Authorization: Bearer` when a token is given.
fn with_bearer(request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
    match bearer {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

/// Classifies a send failure.
fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}
