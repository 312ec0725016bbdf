//! HTTP transport
//!
//! The dispatcher talks to the network through `HttpTransport` so request
//! building and response shaping can be exercised without a server.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::error::{PowerlinkError, Result};
use crate::request::{HttpMethod, OutgoingRequest};

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request and return the decoded JSON body
    async fn send(&self, request: &OutgoingRequest) -> Result<Value>;
}

/// Transport backed by `reqwest`. No timeout is set; the client default
/// applies.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &OutgoingRequest) -> Result<Value> {
        debug!(method = %request.method, url = %request.url, "Powerlink request");

        let mut builder = self.client.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(PowerlinkError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            PowerlinkError::MalformedResponse(format!("response body is not JSON: {}", e))
        })
    }
}
