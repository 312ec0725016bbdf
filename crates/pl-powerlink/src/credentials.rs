//! Powerlink API credential
//!
//! One secret field, `apiKey`. The descriptor advertises generic
//! authentication as the `api_key` query parameter; the dispatcher sends
//! the key as the `tokenid` header.

use pl_workflows::context::CredentialData;
use pl_workflows::{AuthInjection, CredentialDescriptor, CredentialProperty};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Credential type name the node asks the context for
pub const CREDENTIAL_NAME: &str = "powerlinkApi";

/// Property holding the key in the decrypted credential data
pub const API_KEY_PROPERTY: &str = "apiKey";

/// Query parameter used by generic authentication
pub const API_KEY_QUERY_PARAM: &str = "api_key";

/// The API key, read-only for the lifetime of an invocation
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub api_key: String,
}

impl Credential {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Read the key from decrypted credential data. A missing key becomes
    /// an empty string; the remote API rejects it.
    pub fn from_data(data: &CredentialData) -> Self {
        let api_key = match data.get(API_KEY_PROPERTY) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self { api_key }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"***")
            .finish()
    }
}

/// Read-only access to the API key
pub trait CredentialProvider: Send + Sync {
    fn get(&self) -> Credential;
}

impl CredentialProvider for Credential {
    fn get(&self) -> Credential {
        self.clone()
    }
}

/// Descriptor for the `powerlinkApi` credential type
pub fn powerlink_api() -> CredentialDescriptor {
    CredentialDescriptor {
        name: CREDENTIAL_NAME.to_string(),
        display_name: "Powerlink API".to_string(),
        documentation_url: Some(
            "https://docs.n8n.io/integrations/creating-nodes/build/declarative-style-node/"
                .to_string(),
        ),
        properties: vec![CredentialProperty {
            name: API_KEY_PROPERTY.to_string(),
            display_name: "API Key".to_string(),
            data_type: "string".to_string(),
            password: true,
            default_value: Value::String(String::new()),
        }],
        authenticate: Some((
            API_KEY_PROPERTY.to_string(),
            AuthInjection::QueryParam(API_KEY_QUERY_PARAM.to_string()),
        )),
    }
}
