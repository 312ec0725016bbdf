//! Powerlink Node - the dispatcher as a workflow node
//!
//! Reads the node parameters, fetches the `powerlinkApi` credential from
//! the context and emits the shaped response as a single record on `main`.

use anyhow::Result;
use async_trait::async_trait;
use pl_workflows::{NodePort, NodeResult, NodeState, OutputRecord, WorkflowContext, WorkflowNode};
use serde_json::Value;
use std::collections::HashMap;
use tracing::error;

use crate::action::ActionRequest;
use crate::credentials::{Credential, CREDENTIAL_NAME};
use crate::description::{self, MAIN_OUTPUT};
use crate::dispatcher::ActionDispatcher;
use crate::error::PowerlinkError;

pub struct PowerlinkNode {
    id: String,
    name: String,
    state: NodeState,
    dispatcher: ActionDispatcher,
}

impl PowerlinkNode {
    pub fn new(id: &str) -> Self {
        Self::with_dispatcher(id, ActionDispatcher::new())
    }

    pub fn with_dispatcher(id: &str, dispatcher: ActionDispatcher) -> Self {
        Self {
            id: id.to_string(),
            name: description::DISPLAY_NAME.to_string(),
            state: NodeState::Idle,
            dispatcher,
        }
    }

    async fn run(
        &self,
        ctx: &WorkflowContext,
        inputs: &HashMap<String, Value>,
    ) -> std::result::Result<Value, PowerlinkError> {
        let request = ActionRequest::from_parameters(inputs)?;
        let data = ctx
            .get_credentials(CREDENTIAL_NAME)
            .await
            .map_err(|e| PowerlinkError::MissingCredential(e.to_string()))?;
        let credential = Credential::from_data(&data);

        self.dispatcher.dispatch(&request, &credential).await
    }
}

#[async_trait]
impl WorkflowNode for PowerlinkNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn node_type(&self) -> &str {
        description::NODE_NAME
    }

    fn inputs(&self) -> Vec<NodePort> {
        description::node_properties()
    }

    fn outputs(&self) -> Vec<NodePort> {
        vec![NodePort::required(MAIN_OUTPUT, "Main", "collection")
            .with_description("The API response as a single record")]
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn set_state(&mut self, state: NodeState) {
        self.state = state;
    }

    async fn execute(
        &mut self,
        ctx: &WorkflowContext,
        inputs: HashMap<String, Value>,
    ) -> Result<NodeResult> {
        let start = std::time::Instant::now();
        self.validate_inputs(&inputs)?;
        self.set_state(NodeState::Running);

        match self.run(ctx, &inputs).await {
            Ok(value) => {
                self.set_state(NodeState::Completed);
                Ok(
                    NodeResult::from_records(MAIN_OUTPUT, vec![OutputRecord::new(value)])
                        .with_duration(start.elapsed().as_millis() as u64),
                )
            }
            Err(e) => {
                self.set_state(NodeState::Failed);
                if !e.is_remote() {
                    error!(node_id = %self.id, execution_id = %ctx.execution_id, error = %e, "Powerlink node failed");
                }
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::OutgoingRequest;
    use crate::transport::HttpTransport;
    use serde_json::{json, Map};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<OutgoingRequest>>,
    }

    #[async_trait]
    impl HttpTransport for Recorder {
        async fn send(&self, request: &OutgoingRequest) -> crate::Result<Value> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(json!({"data": {"Data": [{"name": "Bob"}]}}))
        }
    }

    fn context(api_key: &str) -> WorkflowContext {
        let mut data = Map::new();
        data.insert("apiKey".to_string(), json!(api_key));
        WorkflowContext::new("wf").with_credentials(CREDENTIAL_NAME, data)
    }

    fn inputs(value: Value) -> HashMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_execute_emits_one_record() {
        let transport = Arc::new(Recorder::default());
        let mut node =
            PowerlinkNode::with_dispatcher("pl", ActionDispatcher::with_transport(transport.clone()));

        let result = node
            .execute(&context("k"), inputs(json!({"action": "query", "objectType": 1})))
            .await
            .unwrap();

        assert_eq!(node.state(), NodeState::Completed);
        assert_eq!(
            result.records(MAIN_OUTPUT),
            vec![OutputRecord::new(json!([{"name": "Bob"}]))]
        );
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header("tokenid"), Some("k"));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_sending() {
        let transport = Arc::new(Recorder::default());
        let mut node =
            PowerlinkNode::with_dispatcher("pl", ActionDispatcher::with_transport(transport.clone()));

        let err = node
            .execute(&WorkflowContext::new("wf"), HashMap::new())
            .await
            .unwrap_err();

        assert_eq!(node.state(), NodeState::Failed);
        assert!(matches!(
            err.downcast_ref::<PowerlinkError>(),
            Some(PowerlinkError::MissingCredential(_))
        ));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_action_fails_before_sending() {
        let transport = Arc::new(Recorder::default());
        let mut node =
            PowerlinkNode::with_dispatcher("pl", ActionDispatcher::with_transport(transport.clone()));

        let err = node
            .execute(&context("k"), inputs(json!({"action": "archive"})))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Unknown action"));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_node_metadata() {
        let node = PowerlinkNode::new("pl");
        assert_eq!(node.node_type(), "powerlink");
        assert_eq!(node.name(), "Powerlink");
        assert_eq!(node.inputs().len(), 12);
        assert_eq!(node.outputs()[0].id, "main");
        assert_eq!(
            node.config_schema()["properties"]["action"]["default"],
            json!("query")
        );
    }
}
