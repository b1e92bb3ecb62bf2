use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Locale codes accepted by the system-service backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Vi,
    La,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Vi => "vi",
            Locale::La => "la",
        }
    }

    /// Parses a 2-letter code. Unknown or empty input falls back to `En`.
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "vi" => Locale::Vi,
            "la" => Locale::La,
            _ => Locale::En,
        }
    }
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed response envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Error descriptor carried inside a backend response.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ErrorInfo {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub code: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub type_error: String,
    #[serde(default)]
    pub execute_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FoEntry {
    #[serde(default)]
    pub input: Value,
}

/// Inner payload of a workflow execution response. The backend is loose
/// about key names (`errors` vs legacy `error`), so both are modeled here
/// and collapsed by [`ResponseEnvelope::normalize`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DataResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub fo: Option<Vec<FoEntry>>,
    #[serde(default)]
    pub errors: Option<Vec<ErrorInfo>>,
    #[serde(default)]
    pub error: Option<Vec<ErrorInfo>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Payload {
    #[serde(default)]
    pub dataresponse: DataResponse,
}

/// Uniform envelope returned by every system-service call.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub payload: Option<Payload>,
    #[serde(default)]
    pub status: u16,
}

/// Canonical, single-shape view of a response: one array key, one error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedResponse {
    pub items: Vec<Value>,
    pub data: Option<Value>,
    pub error_info: Option<ErrorInfo>,
}

impl ResponseEnvelope {
    pub fn from_json_str(raw: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(raw)?)
    }

    fn dataresponse(&self) -> Option<&DataResponse> {
        self.payload.as_ref().map(|p| &p.dataresponse)
    }

    /// Errors regardless of which key the backend used.
    pub fn errors(&self) -> &[ErrorInfo] {
        match self.dataresponse() {
            Some(dr) => dr
                .errors
                .as_deref()
                .or(dr.error.as_deref())
                .unwrap_or(&[]),
            None => &[],
        }
    }

    /// A response is usable only with HTTP 200 and an empty error list.
    pub fn is_valid(&self) -> bool {
        self.status == 200 && self.errors().is_empty()
    }

    /// Collapses the duck-typed payload into one canonical shape. The result
    /// array is read from `data.result` first, then `data.items`; nothing
    /// downstream has to know about the dual keys.
    pub fn normalize(&self) -> NormalizedResponse {
        let error_info = self.errors().first().cloned();
        if let Some(err) = &error_info {
            debug!(
                "response carries error {} (execute_id {})",
                err.code, err.execute_id
            );
        }

        let data = self.dataresponse().and_then(|dr| dr.data.clone());
        let items = data
            .as_ref()
            .and_then(|d| d.get("result").or_else(|| d.get("items")))
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        NormalizedResponse {
            items,
            data,
            error_info,
        }
    }
}

/// Paginated result envelope returned by search calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageData<T> {
    pub items: Vec<T>,
    pub page_index: u32,
    pub page_size: u32,
}

impl PageData<Value> {
    pub fn from_normalized(normalized: &NormalizedResponse, page_index: u32, page_size: u32) -> Self {
        PageData {
            items: normalized.items.clone(),
            page_index,
            page_size,
        }
    }

    /// The backend rides the total row count on the first item.
    pub fn total_count(&self) -> Option<i64> {
        self.items.first().and_then(|item| item.get("total_count")).and_then(Value::as_i64)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkflowInput {
    pub commandname: String,
    pub issearch: bool,
    pub pageindex: u32,
    pub pagesize: u32,
    pub parameters: Map<String, Value>,
}

/// Generic "run dynamic workflow" request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunWorkflowRequest {
    pub sessiontoken: String,
    pub workflowid: String,
    pub input: WorkflowInput,
}

impl RunWorkflowRequest {
    pub fn new(
        sessiontoken: &str,
        workflowid: &str,
        commandname: &str,
        parameters: Map<String, Value>,
    ) -> Self {
        RunWorkflowRequest {
            sessiontoken: sessiontoken.to_string(),
            workflowid: workflowid.to_string(),
            input: WorkflowInput {
                commandname: commandname.to_string(),
                issearch: false,
                pageindex: 1,
                pagesize: 10,
                parameters,
            },
        }
    }

    pub fn search(mut self, pageindex: u32, pagesize: u32) -> Self {
        self.input.issearch = true;
        self.input.pageindex = pageindex;
        self.input.pagesize = pagesize;
        self
    }
}

/// Generic "view one record" request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ViewRecordRequest {
    pub sessiontoken: String,
    pub workflowid: String,
    pub commandname: String,
    pub issearch: bool,
    pub parameters: ViewRecordParameters,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ViewRecordParameters {
    pub id: String,
}

impl ViewRecordRequest {
    pub fn new(sessiontoken: &str, workflowid: &str, commandname: &str, id: &str) -> Self {
        ViewRecordRequest {
            sessiontoken: sessiontoken.to_string(),
            workflowid: workflowid.to_string(),
            commandname: commandname.to_string(),
            issearch: false,
            parameters: ViewRecordParameters { id: id.to_string() },
        }
    }
}
