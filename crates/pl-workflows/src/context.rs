//! Workflow Context - Execution context handed to a node
//!
//! Carries run identity and the decrypted credential data the runtime
//! makes available to the node for this execution.

use pl_core::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Decrypted credential data, keyed by property name
pub type CredentialData = Map<String, Value>;

/// Workflow execution context
pub struct WorkflowContext {
    /// Workflow ID
    pub workflow_id: String,
    /// Execution ID (unique per run)
    pub execution_id: String,
    /// Credentials keyed by credential type name
    credentials: RwLock<HashMap<String, CredentialData>>,
}

impl WorkflowContext {
    /// Create a new workflow context
    pub fn new(workflow_id: &str) -> Self {
        Self {
            workflow_id: workflow_id.to_string(),
            execution_id: uuid::Uuid::new_v4().to_string(),
            credentials: RwLock::new(HashMap::new()),
        }
    }

    /// Attach credential data at construction time
    pub fn with_credentials(mut self, name: &str, data: CredentialData) -> Self {
        self.credentials.get_mut().insert(name.to_string(), data);
        self
    }

    /// Store credential data for a credential type
    pub async fn set_credentials(&self, name: &str, data: CredentialData) {
        let mut creds = self.credentials.write().await;
        creds.insert(name.to_string(), data);
    }

    /// Get the decrypted credential data for a credential type
    pub async fn get_credentials(&self, name: &str) -> Result<CredentialData> {
        let creds = self.credentials.read().await;
        creds
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("credentials '{}'", name)))
    }
}

impl Default for WorkflowContext {
    fn default() -> Self {
        Self::new("default")
    }
}
