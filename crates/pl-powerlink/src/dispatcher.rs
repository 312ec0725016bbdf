//! Action dispatcher: one `ActionRequest` in, one HTTP call out
//!
//! No retries and no local recovery. A failure is logged with the action
//! name and handed back to the caller untouched.

use pl_workflows::AuthInjection;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::action::{Action, ActionRequest};
use crate::credentials::CredentialProvider;
use crate::error::{PowerlinkError, Result};
use crate::request::{endpoints, ActionCall, OutgoingRequest, TOKEN_HEADER};
use crate::transport::{HttpTransport, ReqwestTransport};

pub struct ActionDispatcher {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl ActionDispatcher {
    /// Dispatcher for the public Powerlink API
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: endpoints::BASE_URL.to_string(),
            transport,
        }
    }

    /// Point at another API root (staging, mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the authenticated request for `request` without sending it
    pub fn build_request(
        &self,
        request: &ActionRequest,
        credentials: &dyn CredentialProvider,
    ) -> Result<OutgoingRequest> {
        let credential = credentials.get();
        let outgoing = ActionCall::from_request(request)
            .build(&self.base_url)?
            .authenticate(&AuthInjection::Header(TOKEN_HEADER.to_string()), &credential);
        Ok(outgoing)
    }

    /// Send the request for `request` and shape the response
    pub async fn dispatch(
        &self,
        request: &ActionRequest,
        credentials: &dyn CredentialProvider,
    ) -> Result<Value> {
        debug!(hide_columns = request.hide_columns, "Powerlink dispatch options");

        match self.send(request, credentials).await {
            Ok(value) => Ok(value),
            Err(e) => {
                error!(
                    action = %request.action,
                    error = %e,
                    "Error making {} request to Powerlink API: {}",
                    request.action,
                    e
                );
                Err(e)
            }
        }
    }

    async fn send(
        &self,
        request: &ActionRequest,
        credentials: &dyn CredentialProvider,
    ) -> Result<Value> {
        let outgoing = self.build_request(request, credentials)?;
        info!(
            action = %request.action,
            method = %outgoing.method,
            url = %outgoing.url,
            "Sending Powerlink request"
        );

        let response = self.transport.send(&outgoing).await?;
        shape_response(request, response)
    }
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Query with hidden columns returns only `data.Data`; everything else
/// passes the body through.
pub fn shape_response(request: &ActionRequest, response: Value) -> Result<Value> {
    if request.action != Action::Query || !request.hide_columns {
        return Ok(response);
    }

    match response.get("data") {
        Some(Value::Object(data)) => Ok(data.get("Data").cloned().unwrap_or(Value::Null)),
        _ => Err(PowerlinkError::MalformedResponse(
            "query response has no 'data' object".to_string(),
        )),
    }
}
