//! Command line flags -> node parameter set

use pl_core::{Error, Result};
use pl_powerlink::description::params;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Flags as parsed by clap; every field is optional so a params file can
/// supply the rest
#[derive(Debug, Default, Clone)]
pub struct ParamFlags {
    pub action: Option<String>,
    pub object_type: Option<i64>,
    pub object_id: Option<String>,
    pub page_size: Option<i64>,
    pub page_number: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub fields: Option<String>,
    pub message: Option<String>,
    pub owner_id: Option<String>,
    pub field: Vec<String>,
    pub hide_columns: Option<bool>,
}

/// Read a JSON object of parameters from disk
pub fn load_params_file(path: &Path) -> Result<HashMap<String, Value>> {
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(Error::invalid_argument(format!(
            "{} must contain a JSON object, got {}",
            path.display(),
            other
        ))),
    }
}

/// Split `KEY=VALUE`; the value may itself contain '='
fn parse_field(raw: &str) -> Result<Value> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| Error::invalid_argument(format!("--field expects KEY=VALUE, got '{}'", raw)))?;
    Ok(json!({"fieldId": id, "fieldValue": value}))
}

/// Overlay `flags` on `base`. Flags win; `--field` entries are appended
/// after any file-provided ones.
pub fn build_parameters(
    mut base: HashMap<String, Value>,
    flags: &ParamFlags,
) -> Result<HashMap<String, Value>> {
    let mut set = |name: &str, value: Option<Value>| {
        if let Some(value) = value {
            base.insert(name.to_string(), value);
        }
    };

    set(params::ACTION, flags.action.clone().map(Value::from));
    set(params::OBJECT_TYPE, flags.object_type.map(Value::from));
    set(params::OBJECT_ID, flags.object_id.clone().map(Value::from));
    set(params::PAGE_SIZE, flags.page_size.map(Value::from));
    set(params::PAGE_NUMBER, flags.page_number.map(Value::from));
    set(params::SORT_BY, flags.sort_by.clone().map(Value::from));
    set(params::SORT_TYPE, flags.sort_type.clone().map(Value::from));
    set(params::FIELDS, flags.fields.clone().map(Value::from));
    set(params::MESSAGE, flags.message.clone().map(Value::from));
    set(params::OWNER_ID, flags.owner_id.clone().map(Value::from));
    set(params::HIDE_COLUMNS, flags.hide_columns.map(Value::from));

    if !flags.field.is_empty() {
        let mut entries: Vec<Value> = base
            .get(params::FIELDS_UI)
            .and_then(|ui| ui.get(params::FIELD_VALUES))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for raw in &flags.field {
            entries.push(parse_field(raw)?);
        }
        let mut ui = Map::new();
        ui.insert(params::FIELD_VALUES.to_string(), Value::Array(entries));
        base.insert(params::FIELDS_UI.to_string(), Value::Object(ui));
    }

    Ok(base)
}
