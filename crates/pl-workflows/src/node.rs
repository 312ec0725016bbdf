//! Workflow Node - an integration step as seen by the runtime
//!
//! Each node:
//! - Declares its parameters as input ports (with defaults and display conditions)
//! - Executes once per invocation against a `WorkflowContext`
//! - Produces output records on named output ports

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::context::WorkflowContext;

/// State of a workflow node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Node is idle, waiting to be executed
    #[default]
    Idle,
    /// Node is currently executing
    Running,
    /// Node completed successfully
    Completed,
    /// Node failed
    Failed,
}

/// One item handed back to the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub json: Value,
}

impl OutputRecord {
    pub fn new(json: Value) -> Self {
        Self { json }
    }
}

/// Result of node execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    /// Whether execution succeeded
    pub success: bool,
    /// Output data keyed by port name
    pub outputs: HashMap<String, Value>,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl NodeResult {
    /// Create a successful result
    pub fn success(outputs: HashMap<String, Value>) -> Self {
        Self {
            success: true,
            outputs,
            duration_ms: 0,
        }
    }

    /// Create a successful result carrying records on a single port
    pub fn from_records(port: &str, records: Vec<OutputRecord>) -> Self {
        let mut outputs = HashMap::new();
        outputs.insert(port.to_string(), json!(records));
        Self::success(outputs)
    }

    /// Set duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Records emitted on `port`, if any
    pub fn records(&self, port: &str) -> Vec<OutputRecord> {
        self.outputs
            .get(port)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}

/// A selectable value of an `options` port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOption {
    pub name: String,
    pub value: String,
}

/// A port on a workflow node (input parameter or output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePort {
    /// Port identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Data type ("string", "number", "boolean", "options", "collection")
    pub data_type: String,
    /// Whether this port is required
    pub required: bool,
    /// Description
    pub description: Option<String>,
    /// Default value if not provided
    pub default_value: Option<Value>,
    /// Choices for `options` ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<NodeOption>,
    /// Selector values for which the port is shown; empty means always
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub show_for: Vec<String>,
}

impl NodePort {
    fn new(id: &str, name: &str, data_type: &str, required: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            data_type: data_type.to_string(),
            required,
            description: None,
            default_value: None,
            options: Vec::new(),
            show_for: Vec::new(),
        }
    }

    /// Create a new required port
    pub fn required(id: &str, name: &str, data_type: &str) -> Self {
        Self::new(id, name, data_type, true)
    }

    /// Create a new optional port
    pub fn optional(id: &str, name: &str, data_type: &str) -> Self {
        Self::new(id, name, data_type, false)
    }

    /// Add description
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Add default value
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Add selectable options as (display name, value) pairs
    pub fn with_options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(name, value)| NodeOption {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect();
        self
    }

    /// Only show this port when the selector has one of `values`
    pub fn show_for(mut self, values: &[&str]) -> Self {
        self.show_for = values.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Whether the port is displayed for the given selector value
    pub fn is_visible_for(&self, value: &str) -> bool {
        self.show_for.is_empty() || self.show_for.iter().any(|v| v == value)
    }

    fn json_schema(&self) -> Value {
        let mut schema = Map::new();
        let ty = match self.data_type.as_str() {
            "number" => "number",
            "boolean" => "boolean",
            "collection" => "object",
            _ => "string",
        };
        schema.insert("type".into(), json!(ty));
        if let Some(desc) = &self.description {
            schema.insert("description".into(), json!(desc));
        }
        if let Some(default) = &self.default_value {
            schema.insert("default".into(), default.clone());
        }
        if !self.options.is_empty() {
            let values: Vec<&str> = self.options.iter().map(|o| o.value.as_str()).collect();
            schema.insert("enum".into(), json!(values));
        }
        Value::Object(schema)
    }
}

/// Trait for workflow nodes
#[async_trait]
pub trait WorkflowNode: Send + Sync {
    /// Get the node's unique identifier
    fn id(&self) -> &str;

    /// Get the node's display name
    fn name(&self) -> &str;

    /// Get the node type
    fn node_type(&self) -> &str;

    /// Get input ports
    fn inputs(&self) -> Vec<NodePort>;

    /// Get output ports
    fn outputs(&self) -> Vec<NodePort>;

    /// Get current state
    fn state(&self) -> NodeState;

    /// Set state
    fn set_state(&mut self, state: NodeState);

    /// Execute the node with given inputs
    async fn execute(
        &mut self,
        ctx: &WorkflowContext,
        inputs: HashMap<String, Value>,
    ) -> Result<NodeResult>;

    /// Validate inputs before execution
    fn validate_inputs(&self, inputs: &HashMap<String, Value>) -> Result<()> {
        for port in self.inputs() {
            if port.required && !inputs.contains_key(&port.id) && port.default_value.is_none() {
                return Err(anyhow::anyhow!(
                    "Required input '{}' not provided for node '{}'",
                    port.id,
                    self.id()
                ));
            }
        }
        Ok(())
    }

    /// Get configuration schema (JSON Schema)
    fn config_schema(&self) -> Value {
        let ports = self.inputs();
        let properties: Map<String, Value> = ports
            .iter()
            .map(|p| (p.id.clone(), p.json_schema()))
            .collect();
        let required: Vec<&str> = ports
            .iter()
            .filter(|p| p.required)
            .map(|p| p.id.as_str())
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoNode {
        state: NodeState,
    }

    #[async_trait]
    impl WorkflowNode for EchoNode {
        fn id(&self) -> &str {
            "echo"
        }

        fn name(&self) -> &str {
            "Echo"
        }

        fn node_type(&self) -> &str {
            "echo"
        }

        fn inputs(&self) -> Vec<NodePort> {
            vec![
                NodePort::required("mode", "Mode", "options")
                    .with_options(&[("Loud", "loud"), ("Quiet", "quiet")])
                    .with_default(json!("quiet")),
                NodePort::required("text", "Text", "string"),
                NodePort::optional("times", "Times", "number").show_for(&["loud"]),
            ]
        }

        fn outputs(&self) -> Vec<NodePort> {
            vec![NodePort::required("main", "Main", "collection")]
        }

        fn state(&self) -> NodeState {
            self.state
        }

        fn set_state(&mut self, state: NodeState) {
            self.state = state;
        }

        async fn execute(
            &mut self,
            _ctx: &WorkflowContext,
            inputs: HashMap<String, Value>,
        ) -> Result<NodeResult> {
            let text = inputs.get("text").cloned().unwrap_or(Value::Null);
            Ok(NodeResult::from_records("main", vec![OutputRecord::new(text)]))
        }
    }

    #[test]
    fn test_validate_inputs_requires_ports_without_default() {
        let node = EchoNode { state: NodeState::Idle };
        let mut inputs = HashMap::new();
        let err = node.validate_inputs(&inputs).unwrap_err();
        assert!(err.to_string().contains("'text'"));

        inputs.insert("text".to_string(), json!("hi"));
        assert!(node.validate_inputs(&inputs).is_ok());
    }

    #[test]
    fn test_port_visibility() {
        let node = EchoNode { state: NodeState::Idle };
        let times = node.inputs().into_iter().find(|p| p.id == "times").unwrap();
        assert!(times.is_visible_for("loud"));
        assert!(!times.is_visible_for("quiet"));

        let text = node.inputs().into_iter().find(|p| p.id == "text").unwrap();
        assert!(text.is_visible_for("anything"));
    }

    #[test]
    fn test_config_schema_from_ports() {
        let node = EchoNode { state: NodeState::Idle };
        let schema = node.config_schema();
        assert_eq!(schema["properties"]["mode"]["enum"], json!(["loud", "quiet"]));
        assert_eq!(schema["properties"]["mode"]["default"], json!("quiet"));
        assert_eq!(schema["properties"]["times"]["type"], json!("number"));
        assert_eq!(schema["required"], json!(["mode", "text"]));
    }

    #[tokio::test]
    async fn test_records_round_trip_through_result() {
        let mut node = EchoNode { state: NodeState::Idle };
        let ctx = WorkflowContext::new("test");
        let mut inputs = HashMap::new();
        inputs.insert("text".to_string(), json!({"a": 1}));

        let result = node.execute(&ctx, inputs).await.unwrap();
        assert!(result.success);
        assert_eq!(result.records("main"), vec![OutputRecord::new(json!({"a": 1}))]);
        assert!(result.records("other").is_empty());
    }
}
