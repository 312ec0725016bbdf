//! Request builders
//!
//! ## API Endpoints
//!
//! | Action | Method | URL |
//! |--------|--------|-----|
//! | Query | POST | `{base}/query` |
//! | Add Record | POST | `{base}/record/{objectType}` |
//! | Update Record | PUT | `{base}/record/{objectType}/{objectId}` |
//! | Delete Record | DELETE | `{base}/record/{objectType}/{objectId}` |
//! | Add Comment | POST | `{base}/record/{objectType}/{objectId}/Note` |
//! | Add Task | POST | `{base}/v2/record/10` |
//!
//! ## Authentication
//! - Header: `tokenid: {apiKey}`
//!
//! Building is pure apart from the Add Task timestamp; nothing here does I/O.

use chrono::{DateTime, SecondsFormat, Utc};
use pl_workflows::AuthInjection;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::action::{Action, ActionRequest, FieldValue};
use crate::credentials::Credential;
use crate::description::defaults;
use crate::error::Result;

/// Powerlink API endpoints
pub mod endpoints {
    /// Base API URL
    pub const BASE_URL: &str = "https://api.powerlink.co.il/api";

    /// Full URL: {BASE_URL}/query
    pub const QUERY: &str = "/query";

    /// Full URL: {BASE_URL}/record/{objectType}[/{objectId}]
    pub const RECORD: &str = "/record";

    /// Tasks are records of object type 10 on the v2 API
    pub const TASK: &str = "/v2/record/10";

    /// Suffix for record notes
    pub const NOTE: &str = "Note";
}

/// Header carrying the API key on every request
pub const TOKEN_HEADER: &str = "tokenid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built HTTP call, ready for a transport
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl OutgoingRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach the API key the way `injection` says
    pub fn authenticate(mut self, injection: &AuthInjection, credential: &Credential) -> Self {
        injection.apply(&credential.api_key, &mut self.headers, &mut self.query);
        self
    }

    /// First header value with the given name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct QueryPayload<'a> {
    objecttype: i64,
    page_size: i64,
    page_number: i64,
    fields: &'a str,
    sort_by: &'a str,
    sort_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct NotePayload {
    notetext: String,
    notetype: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct TaskPayload<'a> {
    ownerid: &'a str,
    scheduledend: String,
    subject: &'a str,
    objectid: &'a str,
    objecttypecode: i64,
}

/// One action with everything it needs to build its request
#[derive(Debug, Clone, PartialEq)]
pub enum ActionCall {
    Query {
        object_type: i64,
        page_size: i64,
        page_number: i64,
        sort_by: String,
        sort_type: String,
        fields: String,
        filters: Vec<FieldValue>,
    },
    AddRecord {
        object_type: i64,
        record: Map<String, Value>,
    },
    UpdateRecord {
        object_type: i64,
        object_id: String,
        record: Map<String, Value>,
    },
    DeleteRecord {
        object_type: i64,
        object_id: String,
    },
    AddComment {
        object_type: i64,
        object_id: String,
        message: String,
    },
    AddTask {
        owner_id: String,
        object_type: i64,
        object_id: String,
        message: String,
        scheduled_end: DateTime<Utc>,
    },
}

impl ActionCall {
    /// Resolve defaults for `request`. Add Task is stamped with the
    /// current time.
    pub fn from_request(request: &ActionRequest) -> Self {
        Self::from_request_at(request, Utc::now())
    }

    /// Same as `from_request` with an explicit Add Task timestamp
    pub fn from_request_at(request: &ActionRequest, now: DateTime<Utc>) -> Self {
        let object_type = request.object_type;
        let object_id = || {
            request
                .object_id
                .clone()
                .unwrap_or_else(|| defaults::OBJECT_ID.to_string())
        };
        let message = || {
            request
                .message
                .clone()
                .unwrap_or_else(|| defaults::MESSAGE.to_string())
        };

        match request.action {
            Action::Query => ActionCall::Query {
                object_type,
                page_size: request.page_size.unwrap_or(defaults::PAGE_SIZE),
                page_number: request.page_number.unwrap_or(defaults::PAGE_NUMBER),
                sort_by: request
                    .sort_by
                    .clone()
                    .unwrap_or_else(|| defaults::SORT_BY.to_string()),
                sort_type: request
                    .sort_type
                    .clone()
                    .unwrap_or_else(|| defaults::SORT_TYPE.to_string()),
                fields: request
                    .fields
                    .clone()
                    .unwrap_or_else(|| defaults::FIELDS.to_string()),
                filters: request.query_params.clone(),
            },
            Action::AddRecord => ActionCall::AddRecord {
                object_type,
                record: record_body(&request.query_params),
            },
            Action::UpdateRecord => ActionCall::UpdateRecord {
                object_type,
                object_id: object_id(),
                record: record_body(&request.query_params),
            },
            Action::DeleteRecord => ActionCall::DeleteRecord {
                object_type,
                object_id: object_id(),
            },
            Action::AddComment => ActionCall::AddComment {
                object_type,
                object_id: object_id(),
                message: message(),
            },
            Action::AddTask => ActionCall::AddTask {
                owner_id: request
                    .owner_id
                    .clone()
                    .unwrap_or_else(|| defaults::OWNER_ID.to_string()),
                object_type,
                object_id: object_id(),
                message: message(),
                scheduled_end: now,
            },
        }
    }

    pub fn action(&self) -> Action {
        match self {
            ActionCall::Query { .. } => Action::Query,
            ActionCall::AddRecord { .. } => Action::AddRecord,
            ActionCall::UpdateRecord { .. } => Action::UpdateRecord,
            ActionCall::DeleteRecord { .. } => Action::DeleteRecord,
            ActionCall::AddComment { .. } => Action::AddComment,
            ActionCall::AddTask { .. } => Action::AddTask,
        }
    }

    /// Build the unauthenticated request against `base_url`
    pub fn build(&self, base_url: &str) -> Result<OutgoingRequest> {
        let base = base_url.trim_end_matches('/');
        let record_url = |object_type: i64| format!("{}{}/{}", base, endpoints::RECORD, object_type);

        let request = match self {
            ActionCall::Query {
                object_type,
                page_size,
                page_number,
                sort_by,
                sort_type,
                fields,
                filters,
            } => {
                let payload = QueryPayload {
                    objecttype: *object_type,
                    page_size: *page_size,
                    page_number: *page_number,
                    fields,
                    sort_by,
                    sort_type,
                    query: query_filter(filters),
                };
                OutgoingRequest::new(HttpMethod::Post, format!("{}{}", base, endpoints::QUERY))
                    .with_body(serde_json::to_value(payload)?)
            }
            ActionCall::AddRecord {
                object_type,
                record,
            } => OutgoingRequest::new(HttpMethod::Post, record_url(*object_type))
                .with_body(Value::Object(record.clone())),
            ActionCall::UpdateRecord {
                object_type,
                object_id,
                record,
            } => OutgoingRequest::new(
                HttpMethod::Put,
                format!("{}/{}", record_url(*object_type), object_id),
            )
            .with_body(Value::Object(record.clone())),
            ActionCall::DeleteRecord {
                object_type,
                object_id,
            } => OutgoingRequest::new(
                HttpMethod::Delete,
                format!("{}/{}", record_url(*object_type), object_id),
            ),
            ActionCall::AddComment {
                object_type,
                object_id,
                message,
            } => {
                let payload = NotePayload {
                    notetext: format!("<span>{}</span>", message),
                    notetype: "note",
                };
                OutgoingRequest::new(
                    HttpMethod::Post,
                    format!(
                        "{}/{}/{}",
                        record_url(*object_type),
                        object_id,
                        endpoints::NOTE
                    ),
                )
                .with_body(serde_json::to_value(payload)?)
            }
            ActionCall::AddTask {
                owner_id,
                object_type,
                object_id,
                message,
                scheduled_end,
            } => {
                let payload = TaskPayload {
                    ownerid: owner_id,
                    scheduledend: scheduled_end.to_rfc3339_opts(SecondsFormat::Millis, true),
                    subject: message,
                    objectid: object_id,
                    objecttypecode: *object_type,
                };
                OutgoingRequest::new(HttpMethod::Post, format!("{}{}", base, endpoints::TASK))
                    .with_body(serde_json::to_value(payload)?)
            }
        };

        Ok(request)
    }
}

/// `(f1 = v1) AND (f2 = v2)`. Values go in verbatim, without quoting or
/// escaping. None when there are no filters.
pub fn query_filter(filters: &[FieldValue]) -> Option<String> {
    if filters.is_empty() {
        return None;
    }
    let clauses: Vec<String> = filters
        .iter()
        .map(|f| format!("({} = {})", f.field_id, f.field_value))
        .collect();
    Some(clauses.join(" AND "))
}

/// fieldId -> fieldValue; a repeated fieldId keeps its last value
pub fn record_body(params: &[FieldValue]) -> Map<String, Value> {
    let mut record = Map::new();
    for param in params {
        record.insert(param.field_id.clone(), Value::String(param.field_value.clone()));
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = endpoints::BASE_URL;

    fn build(request: &ActionRequest) -> OutgoingRequest {
        ActionCall::from_request(request).build(BASE).unwrap()
    }

    #[test]
    fn test_query_request() {
        let request = ActionRequest::new(Action::Query, 1)
            .with_paging(50, 2)
            .with_sort("name", "DESC")
            .with_fields("name,age")
            .with_param("name", "Bob")
            .with_param("age", "5");
        let out = build(&request);

        assert_eq!(out.method, HttpMethod::Post);
        assert_eq!(out.url, "https://api.powerlink.co.il/api/query");
        assert_eq!(
            out.body,
            Some(json!({
                "objecttype": 1,
                "page_size": 50,
                "page_number": 2,
                "fields": "name,age",
                "sort_by": "name",
                "sort_type": "DESC",
                "query": "(name = Bob) AND (age = 5)"
            }))
        );
    }

    #[test]
    fn test_query_without_filters_omits_query_key() {
        let out = build(&ActionRequest::new(Action::Query, 7));
        let body = out.body.unwrap();
        assert!(body.get("query").is_none());
        assert_eq!(body["page_size"], json!(500));
        assert_eq!(body["page_number"], json!(1));
        assert_eq!(body["fields"], json!("*"));
        assert_eq!(body["sort_by"], json!(""));
        assert_eq!(body["sort_type"], json!("ASC"));
    }

    #[test]
    fn test_query_values_are_not_escaped() {
        let filter = query_filter(&[FieldValue::new("name", "x) OR (1 = 1")]).unwrap();
        assert_eq!(filter, "(name = x) OR (1 = 1)");
    }

    #[test]
    fn test_add_record_last_write_wins() {
        let request = ActionRequest::new(Action::AddRecord, 1)
            .with_param("f1", "v1")
            .with_param("f1", "v2")
            .with_param("f2", "x");
        let out = build(&request);

        assert_eq!(out.method, HttpMethod::Post);
        assert_eq!(out.url, "https://api.powerlink.co.il/api/record/1");
        assert_eq!(out.body, Some(json!({"f1": "v2", "f2": "x"})));
    }

    #[test]
    fn test_add_record_without_params_sends_empty_object() {
        let out = build(&ActionRequest::new(Action::AddRecord, 3));
        assert_eq!(out.body, Some(json!({})));
    }

    #[test]
    fn test_update_record() {
        let request = ActionRequest::new(Action::UpdateRecord, 2)
            .with_object_id("abc")
            .with_param("f1", "v1")
            .with_param("f1", "v2");
        let out = build(&request);

        assert_eq!(out.method, HttpMethod::Put);
        assert_eq!(out.url, "https://api.powerlink.co.il/api/record/2/abc");
        assert_eq!(out.body, Some(json!({"f1": "v2"})));
    }

    #[test]
    fn test_delete_record_has_no_body() {
        let out = build(&ActionRequest::new(Action::DeleteRecord, 2).with_object_id("abc"));
        assert_eq!(out.method, HttpMethod::Delete);
        assert_eq!(out.url, "https://api.powerlink.co.il/api/record/2/abc");
        assert!(out.body.is_none());
    }

    #[test]
    fn test_missing_object_id_defaults_to_empty() {
        let out = build(&ActionRequest::new(Action::DeleteRecord, 2));
        assert_eq!(out.url, "https://api.powerlink.co.il/api/record/2/");
    }

    #[test]
    fn test_add_comment() {
        let request = ActionRequest::new(Action::AddComment, 1)
            .with_object_id("r1")
            .with_message("hi");
        let out = build(&request);

        assert_eq!(out.method, HttpMethod::Post);
        assert_eq!(out.url, "https://api.powerlink.co.il/api/record/1/r1/Note");
        assert_eq!(
            out.body,
            Some(json!({"notetext": "<span>hi</span>", "notetype": "note"}))
        );
    }

    #[test]
    fn test_add_task_uses_fixed_endpoint_and_clock() {
        let request = ActionRequest::new(Action::AddTask, 1)
            .with_object_id("r1")
            .with_owner_id("u1")
            .with_message("call back");
        let now = DateTime::parse_from_rfc3339("2024-05-01T10:20:30.456Z")
            .unwrap()
            .with_timezone(&Utc);
        let out = ActionCall::from_request_at(&request, now).build(BASE).unwrap();

        assert_eq!(out.method, HttpMethod::Post);
        assert_eq!(out.url, "https://api.powerlink.co.il/api/v2/record/10");
        assert_eq!(
            out.body,
            Some(json!({
                "ownerid": "u1",
                "scheduledend": "2024-05-01T10:20:30.456Z",
                "subject": "call back",
                "objectid": "r1",
                "objecttypecode": 1
            }))
        );
    }

    #[test]
    fn test_add_task_scheduled_end_is_now() {
        let before = Utc::now();
        let out = build(&ActionRequest::new(Action::AddTask, 1));
        let after = Utc::now();

        let stamp = out.body.unwrap()["scheduledend"].as_str().unwrap().to_string();
        let stamp = DateTime::parse_from_rfc3339(&stamp).unwrap().with_timezone(&Utc);
        // millisecond precision on the wire
        assert!(stamp >= before - chrono::Duration::milliseconds(1));
        assert!(stamp <= after);
    }

    #[test]
    fn test_call_action_round_trip() {
        for action in Action::ALL {
            let call = ActionCall::from_request(&ActionRequest::new(action, 1));
            assert_eq!(call.action(), action);
        }
    }

    #[test]
    fn test_authenticate_header() {
        let out = OutgoingRequest::new(HttpMethod::Delete, "http://x")
            .authenticate(&AuthInjection::Header(TOKEN_HEADER.into()), &Credential::new("k"));
        assert_eq!(out.header("TokenId"), Some("k"));
        assert!(out.query.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let out = ActionCall::from_request(&ActionRequest::new(Action::Query, 1))
            .build("http://localhost:1234/api/")
            .unwrap();
        assert_eq!(out.url, "http://localhost:1234/api/query");
    }
}
