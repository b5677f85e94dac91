//! HTTP client for reading stack outputs from a Watson server
//!
//! This is the consumer side of the registry: infrastructure code running
//! as one stack reads another stack's outputs and identifies itself with
//! the caller header so the read is recorded as a usage edge.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::api::handlers::CALLER_HEADER;
use crate::domain::{OutputMap, StackPath};
use crate::errors::{Result, WatsonError};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Server address, optionally prefixed with `http://` or `https://`
    pub address: String,

    /// Scheme used when the address carries none
    pub scheme: String,

    /// Full path of the stack this client reads on behalf of
    pub stack: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            scheme: "https".to_string(),
            stack: None,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Read `WATSON_ADDRESS`, `WATSON_SCHEME` and `WATSON_STACK`.
    ///
    /// The lowercase-prefixed `watson_*` spellings are accepted as well.
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var(format!("WATSON_{}", name))
                .or_else(|_| std::env::var(format!("watson_{}", name)))
                .ok()
                .filter(|s| !s.is_empty())
        };

        let defaults = Self::default();
        Self {
            address: var("ADDRESS").unwrap_or(defaults.address),
            scheme: var("SCHEME").unwrap_or(defaults.scheme),
            stack: var("STACK"),
            timeout: defaults.timeout,
        }
    }

    /// Base URL of the server, with a scheme embedded in the address winning
    pub fn base_url(&self) -> Result<String> {
        let (scheme, host) = match self.address.split_once("://") {
            Some((scheme, host)) => (scheme, host),
            None => (self.scheme.as_str(), self.address.as_str()),
        };

        if scheme != "http" && scheme != "https" {
            return Err(WatsonError::config(format!("unknown protocol scheme: {}", scheme)));
        }
        if host.is_empty() {
            return Err(WatsonError::config(
                "Watson server address is not set (use WATSON_ADDRESS or --address)",
            ));
        }

        Ok(format!("{}://{}", scheme, host.trim_end_matches('/')))
    }
}

/// Read-only client for a Watson server
#[derive(Debug, Clone)]
pub struct WatsonClient {
    client: Client,
    base_url: String,
}

impl WatsonClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.base_url()?;

        let mut headers = HeaderMap::new();
        if let Some(stack) = &config.stack {
            let value = HeaderValue::from_str(stack).map_err(|e| {
                WatsonError::config_with_source(
                    format!("'{}' cannot be sent as the caller stack", stack),
                    Box::new(e),
                )
            })?;
            headers.insert(CALLER_HEADER, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .default_headers(headers)
            .build()
            .map_err(|e| WatsonError::config_with_source("Failed to build HTTP client", Box::new(e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch every output of `stack` (`project/stack`).
    ///
    /// An unknown stack yields `None`.
    pub async fn get_outputs(&self, stack: &str) -> Result<Option<OutputMap>> {
        let path = validate_stack_name(stack)?;
        let url = format!("{}/v1/projects/{}/outputs/", self.base_url, path);
        debug!(url = %url, "GET outputs");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WatsonError::http(format!("Failed to reach {}: {}", self.base_url, e), 502))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Ok(None),
            status => {
                return Err(WatsonError::http(
                    format!("unexpected status code: {}", status.as_u16()),
                    status.as_u16(),
                ))
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| WatsonError::http(format!("Failed to read response body: {}", e), 502))?;

        serde_json::from_str(&body).map(Some).map_err(|e| WatsonError::Serialization {
            source: e,
            context: format!("Outputs of '{}' are not a valid outputs document", path),
        })
    }
}

/// A stack name must contain exactly one `/`
fn validate_stack_name(stack: &str) -> Result<StackPath> {
    if stack.matches('/').count() != 1 {
        return Err(WatsonError::validation_field(
            format!("{:?} is not a valid stack name", stack),
            "stack",
        ));
    }
    StackPath::parse(stack)
}
