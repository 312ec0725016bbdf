//! Actions and the per-invocation request built from node parameters

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::description::{defaults, params};
use crate::error::{PowerlinkError, Result};

/// The six supported operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Query,
    AddRecord,
    AddTask,
    AddComment,
    DeleteRecord,
    UpdateRecord,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::AddComment,
        Action::AddRecord,
        Action::AddTask,
        Action::DeleteRecord,
        Action::Query,
        Action::UpdateRecord,
    ];

    /// Parameter value used by the runtime
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Query => "query",
            Action::AddRecord => "addRecord",
            Action::AddTask => "addTask",
            Action::AddComment => "addComment",
            Action::DeleteRecord => "deleteRecord",
            Action::UpdateRecord => "updateRecord",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Action::Query => "Query",
            Action::AddRecord => "Add Record",
            Action::AddTask => "Add Task",
            Action::AddComment => "Add Comment",
            Action::DeleteRecord => "Delete Record",
            Action::UpdateRecord => "Update Record",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = PowerlinkError;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| PowerlinkError::invalid_parameter(format!("Unknown action: {}", s)))
    }
}

/// One entry of the query parameters collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    #[serde(default)]
    pub field_id: String,
    #[serde(default)]
    pub field_value: String,
}

impl FieldValue {
    pub fn new(field_id: impl Into<String>, field_value: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            field_value: field_value.into(),
        }
    }
}

/// Parameters of one invocation. Which fields matter depends on `action`;
/// absent optional fields fall back to the node description defaults when
/// the request is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub action: Action,
    pub object_type: i64,
    pub object_id: Option<String>,
    pub page_size: Option<i64>,
    pub page_number: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub fields: Option<String>,
    pub message: Option<String>,
    pub owner_id: Option<String>,
    pub query_params: Vec<FieldValue>,
    pub hide_columns: bool,
}

impl ActionRequest {
    pub fn new(action: Action, object_type: i64) -> Self {
        Self {
            action,
            object_type,
            object_id: None,
            page_size: None,
            page_number: None,
            sort_by: None,
            sort_type: None,
            fields: None,
            message: None,
            owner_id: None,
            query_params: Vec::new(),
            hide_columns: defaults::HIDE_COLUMNS,
        }
    }

    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_owner_id(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_paging(mut self, page_size: i64, page_number: i64) -> Self {
        self.page_size = Some(page_size);
        self.page_number = Some(page_number);
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, sort_type: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_type = Some(sort_type.into());
        self
    }

    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn with_param(mut self, field_id: impl Into<String>, field_value: impl Into<String>) -> Self {
        self.query_params.push(FieldValue::new(field_id, field_value));
        self
    }

    pub fn with_hide_columns(mut self, hide: bool) -> Self {
        self.hide_columns = hide;
        self
    }

    /// Build a request from the runtime's parameter set.
    ///
    /// Only malformed values are rejected (wrong JSON type, unknown
    /// action). Missing required fields are left to the remote API.
    pub fn from_parameters(parameters: &HashMap<String, Value>) -> Result<Self> {
        let action = match parameters.get(params::ACTION) {
            None | Some(Value::Null) => defaults::ACTION,
            Some(Value::String(s)) => s.parse()?,
            Some(other) => {
                return Err(PowerlinkError::invalid_parameter(format!(
                    "'{}' must be a string, got {}",
                    params::ACTION,
                    other
                )))
            }
        };

        let object_type =
            get_integer(parameters, params::OBJECT_TYPE)?.unwrap_or(defaults::OBJECT_TYPE);

        Ok(Self {
            action,
            object_type,
            object_id: get_string(parameters, params::OBJECT_ID)?,
            page_size: get_integer(parameters, params::PAGE_SIZE)?,
            page_number: get_integer(parameters, params::PAGE_NUMBER)?,
            sort_by: get_string(parameters, params::SORT_BY)?,
            sort_type: get_string(parameters, params::SORT_TYPE)?,
            fields: get_string(parameters, params::FIELDS)?,
            message: get_string(parameters, params::MESSAGE)?,
            owner_id: get_string(parameters, params::OWNER_ID)?,
            query_params: get_field_values(parameters)?,
            hide_columns: get_bool(parameters, params::HIDE_COLUMNS)?
                .unwrap_or(defaults::HIDE_COLUMNS),
        })
    }
}

fn get_integer(parameters: &HashMap<String, Value>, name: &str) -> Result<Option<i64>> {
    match parameters.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Some)
            .ok_or_else(|| {
                PowerlinkError::invalid_parameter(format!("'{}' must be an integer, got {}", name, n))
            }),
        Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| {
            PowerlinkError::invalid_parameter(format!("'{}' must be an integer, got '{}'", name, s))
        }),
        Some(other) => Err(PowerlinkError::invalid_parameter(format!(
            "'{}' must be an integer, got {}",
            name, other
        ))),
    }
}

fn get_string(parameters: &HashMap<String, Value>, name: &str) -> Result<Option<String>> {
    match parameters.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(value).map(Some).ok_or_else(|| {
            PowerlinkError::invalid_parameter(format!("'{}' must be a string, got {}", name, value))
        }),
    }
}

fn get_bool(parameters: &HashMap<String, Value>, name: &str) -> Result<Option<bool>> {
    match parameters.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(PowerlinkError::invalid_parameter(format!(
            "'{}' must be a boolean, got {}",
            name, other
        ))),
    }
}

/// Expressions may resolve to numbers or booleans where text is expected
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `fieldsUi.fieldValues`, in the order the user entered them
fn get_field_values(parameters: &HashMap<String, Value>) -> Result<Vec<FieldValue>> {
    let entries = match parameters
        .get(params::FIELDS_UI)
        .and_then(|ui| ui.get(params::FIELD_VALUES))
    {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(PowerlinkError::invalid_parameter(format!(
                "'{}.{}' must be a list, got {}",
                params::FIELDS_UI,
                params::FIELD_VALUES,
                other
            )))
        }
    };

    entries
        .iter()
        .map(|entry| {
            let text = |key: &str| -> Result<String> {
                match entry.get(key) {
                    None | Some(Value::Null) => Ok(String::new()),
                    Some(v) => scalar_to_string(v).ok_or_else(|| {
                        PowerlinkError::invalid_parameter(format!(
                            "'{}' must be a string, got {}",
                            key, v
                        ))
                    }),
                }
            };
            Ok(FieldValue {
                field_id: text("fieldId")?,
                field_value: text("fieldValue")?,
            })
        })
        .collect()
}
