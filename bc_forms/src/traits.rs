use std::collections::HashMap;

use anyhow::Result;
use log::warn;
use serde_json::{Map, Value};

use bc_workflow_api::{Locale, ResponseEnvelope, RunWorkflowRequest, ViewRecordRequest};

use crate::control::Control;
use crate::schema::{FormDesignDetail, Input, RuleStrong};

/// Context passed to renderers.
pub struct RenderContext<'a> {
    /// Live form-state values, keyed by field key.
    pub form_values: &'a Map<String, Value>,
    /// Server-supplied view data for the current record, keyed by field code.
    pub view_data: &'a Map<String, Value>,
    pub rules: &'a [RuleStrong],
    pub locale: Locale,
    /// UI strings, e.g. the synthetic null-option label.
    pub dictionary: &'a HashMap<String, String>,
    pub record_id: Option<&'a str>,
    pub session_token: &'a str,
    pub client: Option<&'a dyn WorkflowClient>,
    /// Preview contexts render action controls disabled.
    pub preview: bool,
}

impl RenderContext<'_> {
    /// Current value with the strict precedence: live form state at the
    /// field key, else server view data at the field code. Renderers apply
    /// their own type-specific default when both miss.
    pub fn resolve_value(&self, input: &Input) -> Option<&Value> {
        self.form_values
            .get(input.field_key())
            .or_else(|| self.view_data.get(&input.default.code))
    }

    pub fn dict(&self, key: &str, fallback: &str) -> String {
        self.dictionary
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

pub trait InputRenderer: Send + Sync {
    /// Input type tags this renderer claims (e.g. `["cTextInput"]`).
    fn handled_input_types(&self) -> Vec<String>;

    /// Produce the control for one input. Renderers never mutate shared
    /// state; edits flow back through the engine.
    fn render(&self, input: &Input, ctx: &RenderContext) -> Result<Control>;
}

/// The excluded backend collaborator, as seen from the engine.
pub trait WorkflowClient: Send + Sync {
    fn run_workflow(&self, request: &RunWorkflowRequest) -> Result<ResponseEnvelope>;
    fn view_record(&self, request: &ViewRecordRequest) -> Result<ResponseEnvelope>;
}

/// Loads one record's view data through the workflow bound in the form
/// info. Backend failures come back as `None` so the affected section can
/// render its own error panel while sibling sections continue.
pub fn fetch_record(
    client: &dyn WorkflowClient,
    design: &FormDesignDetail,
    session_token: &str,
    record_id: &str,
) -> Option<Map<String, Value>> {
    let workflow_id = design.info.data.as_deref()?;
    let request = ViewRecordRequest::new(session_token, workflow_id, &design.form_id, record_id);
    let envelope = match client.view_record(&request) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!("view workflow {workflow_id} call failed: {err}");
            return None;
        }
    };
    if !envelope.is_valid() {
        if let Some(err) = envelope.normalize().error_info {
            warn!(
                "view workflow {workflow_id} failed: {} (execute_id {})",
                err.info, err.execute_id
            );
        }
        return None;
    }
    let normalized = envelope.normalize();
    normalized
        .items
        .first()
        .cloned()
        .or(normalized.data)
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
}

/// Runs a dynamic workflow invocation and returns its normalized rows.
/// Invalid envelopes and transport failures degrade to an empty list.
pub fn run_dynamic_rows(client: &dyn WorkflowClient, request: &RunWorkflowRequest) -> Vec<Value> {
    match client.run_workflow(request) {
        Ok(envelope) if envelope.is_valid() => envelope.normalize().items,
        Ok(envelope) => {
            if let Some(err) = envelope.normalize().error_info {
                warn!(
                    "workflow {} returned error {} (execute_id {})",
                    request.workflowid, err.code, err.execute_id
                );
            } else {
                warn!("workflow {} returned an invalid envelope", request.workflowid);
            }
            Vec::new()
        }
        Err(err) => {
            warn!("workflow {} call failed: {err}", request.workflowid);
            Vec::new()
        }
    }
}
