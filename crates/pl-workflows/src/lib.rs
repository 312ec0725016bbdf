//! pl-workflows: the contract between a workflow runtime and its nodes
//!
//! Features:
//! - `WorkflowNode` trait executed once per invocation
//! - Parameter ports with defaults, options and display conditions
//! - Execution context carrying decrypted credentials
//! - Declarative credential descriptors

pub mod context;
pub mod credentials;
pub mod node;

pub use context::WorkflowContext;
pub use credentials::{AuthInjection, CredentialDescriptor, CredentialProperty};
pub use node::{NodeOption, NodePort, NodeResult, NodeState, OutputRecord, WorkflowNode};
