use anyhow::Result;
use log::warn;
use serde_json::{Map, Value};

use bc_forms::control::{Control, SelectOption};
use bc_forms::masterdata::resolve_parameters;
use bc_forms::schema::Input;
use bc_forms::traits::{run_dynamic_rows, InputRenderer, RenderContext, WorkflowClient};

use bc_workflow_api::RunWorkflowRequest;

/// Key under which every option row is stamped with its zero-based index.
pub const KEY_JSELECT: &str = "key_jselect";

/// Value of the synthetic null option prepended when `isHasDataNull` is set.
pub const SELECT_NULL: &str = "select_null";

/// Shared code-dictionary workflow used by `cdlist` lookups.
const CDLIST_WORKFLOW: &str = "cdlist";

pub struct SelectRenderer;

impl InputRenderer for SelectRenderer {
    fn handled_input_types(&self) -> Vec<String> {
        vec!["jSelect".to_string()]
    }

    fn render(&self, input: &Input, ctx: &RenderContext) -> Result<Control> {
        let mut rows = gather_rows(input, ctx);
        stamp_rows(&mut rows);

        let mut options = Vec::with_capacity(rows.len() + 1);
        if input.has_null_option() {
            options.push(SelectOption {
                value: SELECT_NULL.to_string(),
                label: ctx.dict("all", "All"),
            });
        }
        for row in &rows {
            options.push(SelectOption {
                value: row_text(row, &["codeid", "value", "id"]),
                label: row_text(row, &["caption", "name"]),
            });
        }

        let selected = ctx
            .resolve_value(input)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        Ok(Control::Select {
            options,
            rows,
            selected,
        })
    }
}

/// Static `json_data` rows merged ahead of the dynamic query.
fn gather_rows(input: &Input, ctx: &RenderContext) -> Vec<Value> {
    let mut rows = input.config.json_data.clone().unwrap_or_default();
    if let Some(client) = ctx.client {
        match input.config.data_mode.as_deref() {
            Some("cdlist") => rows.extend(cdlist_rows(input, ctx, client)),
            Some(_) if input.masterdata.is_some() => rows.extend(dynamic_rows(input, ctx, client)),
            _ => {}
        }
    }
    rows
}

fn cdlist_rows(input: &Input, ctx: &RenderContext, client: &dyn WorkflowClient) -> Vec<Value> {
    let Some(cdlist) = &input.cdlist else {
        warn!(
            "field {} uses cdlist mode without a cdlist block",
            input.field_key()
        );
        return Vec::new();
    };
    let mut parameters = Map::new();
    parameters.insert("cdgrp".to_string(), Value::String(cdlist.cdgrp.clone()));
    parameters.insert("cdname".to_string(), Value::String(cdlist.cdname.clone()));
    parameters.insert(
        "language".to_string(),
        Value::String(ctx.locale.as_str().to_string()),
    );
    let request = RunWorkflowRequest::new(
        ctx.session_token,
        CDLIST_WORKFLOW,
        CDLIST_WORKFLOW,
        parameters,
    );
    run_dynamic_rows(client, &request)
}

/// Generic dynamic source: the input's master-data template, with
/// placeholders resolved against the live record and locale, names the
/// workflow to run.
fn dynamic_rows(input: &Input, ctx: &RenderContext, client: &dyn WorkflowClient) -> Vec<Value> {
    let Some(template) = &input.masterdata else {
        return Vec::new();
    };
    let resolved = match resolve_parameters(template, ctx.record_id.unwrap_or(""), ctx.locale) {
        Ok(resolved) => resolved,
        Err(err) => {
            warn!("master data for field {} unusable: {err}", input.field_key());
            return Vec::new();
        }
    };
    let workflow_id = resolved
        .get("workflowid")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if workflow_id.is_empty() {
        warn!("master data for field {} names no workflow", input.field_key());
        return Vec::new();
    }
    let commandname = resolved
        .get("commandname")
        .and_then(Value::as_str)
        .unwrap_or(&workflow_id)
        .to_string();
    let parameters = resolved
        .get("parameters")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let request = RunWorkflowRequest::new(ctx.session_token, &workflow_id, &commandname, parameters);
    run_dynamic_rows(client, &request)
}

fn stamp_rows(rows: &mut [Value]) {
    for (index, row) in rows.iter_mut().enumerate() {
        if let Value::Object(map) = row {
            map.insert(KEY_JSELECT.to_string(), Value::from(index as u64));
        }
    }
}

fn row_text(row: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| row.get(key))
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}
