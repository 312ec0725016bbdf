//! Credential descriptors
//!
//! A descriptor declares which fields a credential type has and how its
//! secret is attached to outgoing requests. Storage and decryption are the
//! runtime's business; nodes only see the decrypted data in the context.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a secret is placed on an outgoing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "in", content = "name", rename_all = "snake_case")]
pub enum AuthInjection {
    /// Query string parameter
    QueryParam(String),
    /// Request header
    Header(String),
}

impl AuthInjection {
    /// Attach `secret` to the matching list, replacing any previous value
    pub fn apply(
        &self,
        secret: &str,
        headers: &mut Vec<(String, String)>,
        query: &mut Vec<(String, String)>,
    ) {
        let (target, name) = match self {
            AuthInjection::QueryParam(name) => (query, name),
            AuthInjection::Header(name) => (headers, name),
        };
        target.retain(|(k, _)| k != name);
        target.push((name.clone(), secret.to_string()));
    }
}

/// A single field of a credential type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialProperty {
    pub name: String,
    pub display_name: String,
    pub data_type: String,
    /// Rendered masked by the runtime
    pub password: bool,
    pub default_value: Value,
}

/// Declarative description of a credential type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialDescriptor {
    /// Type name used to look the credential up in the context
    pub name: String,
    pub display_name: String,
    pub documentation_url: Option<String>,
    pub properties: Vec<CredentialProperty>,
    /// Generic authentication: which property goes where
    pub authenticate: Option<(String, AuthInjection)>,
}

impl CredentialDescriptor {
    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&CredentialProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}
