//! pl-powerlink: Powerlink CRM integration node
//!
//! Maps one of six actions (query, add/update/delete record, add comment,
//! add task) onto a single REST call against the Powerlink API and shapes
//! the response for the workflow runtime.
//!
//! # Modules
//!
//! - `action`: Action names and the per-invocation `ActionRequest`
//! - `credentials`: API key credential and its descriptor
//! - `description`: Node parameter table (defaults, visibility per action)
//! - `request`: Pure request builders, one per action
//! - `transport`: HTTP transport trait and the reqwest implementation
//! - `dispatcher`: Build, send, shape
//! - `node`: `WorkflowNode` implementation

pub mod action;
pub mod credentials;
pub mod description;
pub mod dispatcher;
pub mod error;
pub mod node;
pub mod request;
pub mod transport;

pub use action::{Action, ActionRequest, FieldValue};
pub use credentials::{Credential, CredentialProvider};
pub use dispatcher::ActionDispatcher;
pub use error::{PowerlinkError, Result};
pub use node::PowerlinkNode;
pub use request::{ActionCall, HttpMethod, OutgoingRequest};
pub use transport::{HttpTransport, ReqwestTransport};
