//! Node description: the parameter table the runtime renders
//!
//! Visibility of each parameter is keyed on the selected action. The table
//! is data; `fields_for` reads it to answer which parameters an action
//! requires and which it merely accepts.

use pl_workflows::NodePort;
use serde::Serialize;
use serde_json::{json, Value};

use crate::action::Action;

pub const NODE_NAME: &str = "powerlink";
pub const DISPLAY_NAME: &str = "Powerlink";
pub const NODE_VERSION: u32 = 1;
pub const SUBTITLE: &str = "0.1.11";
pub const DESCRIPTION: &str = "Get data from Powerlink API";

/// Output port carrying the result records
pub const MAIN_OUTPUT: &str = "main";

/// Parameter names as the runtime sends them
pub mod params {
    pub const ACTION: &str = "action";
    pub const OBJECT_TYPE: &str = "objectType";
    pub const OBJECT_ID: &str = "objectId";
    pub const PAGE_SIZE: &str = "pageSize";
    pub const PAGE_NUMBER: &str = "pageNumber";
    pub const SORT_BY: &str = "sortBy";
    pub const SORT_TYPE: &str = "sortType";
    pub const FIELDS: &str = "fields";
    pub const MESSAGE: &str = "message";
    pub const OWNER_ID: &str = "ownerid";
    pub const FIELDS_UI: &str = "fieldsUi";
    pub const FIELD_VALUES: &str = "fieldValues";
    pub const HIDE_COLUMNS: &str = "toggleHideColumns";
}

/// Defaults applied when a parameter is absent
pub mod defaults {
    use crate::action::Action;

    pub const ACTION: Action = Action::Query;
    pub const OBJECT_TYPE: i64 = 1;
    pub const OBJECT_ID: &str = "";
    pub const PAGE_SIZE: i64 = 500;
    pub const PAGE_NUMBER: i64 = 1;
    pub const SORT_BY: &str = "";
    pub const SORT_TYPE: &str = "ASC";
    pub const FIELDS: &str = "*";
    pub const MESSAGE: &str = "";
    pub const OWNER_ID: &str = "";
    pub const HIDE_COLUMNS: bool = true;
}

const ALL_ACTIONS: &[&str] = &[
    "addTask",
    "addComment",
    "addRecord",
    "deleteRecord",
    "updateRecord",
    "query",
];

/// The node's parameters in display order
pub fn node_properties() -> Vec<NodePort> {
    let action_options: Vec<(&str, &str)> = Action::ALL
        .iter()
        .map(|a| (a.display_name(), a.as_str()))
        .collect();

    vec![
        NodePort::required(params::ACTION, "Action", "options")
            .with_options(&action_options)
            .with_default(json!(defaults::ACTION.as_str())),
        NodePort::required(params::OBJECT_TYPE, "Object Type", "number")
            .with_default(json!(defaults::OBJECT_TYPE))
            .show_for(ALL_ACTIONS)
            .with_description("Enter the integer value for Object Type"),
        NodePort::required(params::OBJECT_ID, "Object ID", "string")
            .with_default(json!(defaults::OBJECT_ID))
            .show_for(&["addTask", "addComment", "deleteRecord", "updateRecord"])
            .with_description("Enter the ID of the record"),
        NodePort::required(params::PAGE_SIZE, "Page Size", "number")
            .with_default(json!(defaults::PAGE_SIZE))
            .show_for(&["query"])
            .with_description("Enter the integer value for Page Size"),
        NodePort::required(params::PAGE_NUMBER, "Page Number", "number")
            .with_default(json!(defaults::PAGE_NUMBER))
            .show_for(&["query"])
            .with_description("Enter the integer value for Page Number"),
        NodePort::optional(params::SORT_BY, "Sort By", "string")
            .with_default(json!(defaults::SORT_BY))
            .show_for(&["query"])
            .with_description("Enter the field to sort by"),
        NodePort::optional(params::SORT_TYPE, "Sort Type", "string")
            .with_default(json!(defaults::SORT_TYPE))
            .show_for(&["query"])
            .with_description("Enter the sort type (e.g., ASC or DESC)"),
        NodePort::required(params::FIELDS, "Fields", "string")
            .with_default(json!(defaults::FIELDS))
            .show_for(&["query"])
            .with_description(
                "Enter the fields to retrieve (comma-separated). Use * for all fields.",
            ),
        NodePort::required(params::MESSAGE, "Message", "string")
            .with_default(json!(defaults::MESSAGE))
            .show_for(&["addTask", "addComment"])
            .with_description("Enter a comment to be added to the record"),
        NodePort::required(params::OWNER_ID, "Owner ID", "string")
            .with_default(json!(defaults::OWNER_ID))
            .show_for(&["addTask"])
            .with_description("The ID of the powerlink user agent, to act as the task reporter"),
        NodePort::optional(params::FIELDS_UI, "Query Parameters", "collection")
            .with_default(json!({}))
            .show_for(&["query", "addRecord", "updateRecord"])
            .with_description(
                "Field must be defined in the collection, otherwise it will be ignored. \
                 If field defined in the collection is not set here, it will be set to null.",
            ),
        NodePort::optional(params::HIDE_COLUMNS, "Options", "boolean")
            .with_default(json!(defaults::HIDE_COLUMNS))
            .show_for(&["query"])
            .with_description("Whether Should return only the data without columns"),
    ]
}

/// Parameters an action uses, split by whether they are required
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionFields {
    pub required: Vec<String>,
    pub optional: Vec<String>,
}

/// Look up the parameters shown for `action`
pub fn fields_for(action: Action) -> ActionFields {
    let mut fields = ActionFields {
        required: Vec::new(),
        optional: Vec::new(),
    };
    for port in node_properties() {
        if port.id == params::ACTION || !port.is_visible_for(action.as_str()) {
            continue;
        }
        if port.required {
            fields.required.push(port.id);
        } else {
            fields.optional.push(port.id);
        }
    }
    fields
}

/// Full node description as JSON, for runtimes that load it declaratively
pub fn describe() -> Value {
    let per_action: serde_json::Map<String, Value> = Action::ALL
        .iter()
        .map(|a| (a.as_str().to_string(), json!(fields_for(*a))))
        .collect();

    json!({
        "name": NODE_NAME,
        "displayName": DISPLAY_NAME,
        "version": NODE_VERSION,
        "subtitle": SUBTITLE,
        "description": DESCRIPTION,
        "credentials": [{"name": crate::credentials::CREDENTIAL_NAME, "required": true}],
        "credentialTypes": [crate::credentials::powerlink_api()],
        "properties": node_properties(),
        "actions": per_action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fields_for_query() {
        let fields = fields_for(Action::Query);
        assert_eq!(
            fields.required,
            names(&["objectType", "pageSize", "pageNumber", "fields"])
        );
        assert_eq!(
            fields.optional,
            names(&["sortBy", "sortType", "fieldsUi", "toggleHideColumns"])
        );
    }

    #[test]
    fn test_fields_for_record_actions() {
        assert_eq!(fields_for(Action::AddRecord).required, names(&["objectType"]));
        assert_eq!(fields_for(Action::AddRecord).optional, names(&["fieldsUi"]));
        assert_eq!(
            fields_for(Action::UpdateRecord).required,
            names(&["objectType", "objectId"])
        );
        assert_eq!(
            fields_for(Action::DeleteRecord),
            ActionFields {
                required: names(&["objectType", "objectId"]),
                optional: Vec::new(),
            }
        );
    }

    #[test]
    fn test_fields_for_comment_and_task() {
        assert_eq!(
            fields_for(Action::AddComment).required,
            names(&["objectType", "objectId", "message"])
        );
        assert_eq!(
            fields_for(Action::AddTask).required,
            names(&["objectType", "objectId", "message", "ownerid"])
        );
        assert!(fields_for(Action::AddTask).optional.is_empty());
    }

    #[test]
    fn test_every_required_parameter_has_a_default() {
        for port in node_properties() {
            assert!(port.default_value.is_some(), "{} has no default", port.id);
        }
    }

    #[test]
    fn test_describe() {
        let desc = describe();
        assert_eq!(desc["name"], "powerlink");
        assert_eq!(desc["credentials"][0]["name"], "powerlinkApi");
        assert_eq!(desc["properties"][0]["options"].as_array().unwrap().len(), 6);
        assert_eq!(desc["actions"]["addComment"]["required"][2], "message");
    }
}
