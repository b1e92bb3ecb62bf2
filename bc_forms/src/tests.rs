use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use serde_json::{json, Map, Value};

use bc_workflow_api::{Locale, ResponseEnvelope, RunWorkflowRequest, ViewRecordRequest};

use crate::control::Control;
use crate::masterdata::resolve_parameters;
use crate::registry::RendererRegistry;
use crate::render::{apply_change, parse_grid_class, FormEngine};
use crate::schema::{
    DesignPayload, FormDesignDetail, FormInfo, Input, InputDefault, RuleConfig, RuleStrong,
};
use crate::search::{run_search, FormSearchStore};
use crate::traits::{fetch_record, InputRenderer, RenderContext, WorkflowClient};
use crate::transcode::{decode_field, encode_field, DataFormat};
use crate::FormError;

fn text_input(code: &str) -> Input {
    Input {
        inputtype: "cTextInput".to_string(),
        default: InputDefault {
            code: code.to_string(),
            name: code.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn empty_ctx<'a>(
    form_values: &'a Map<String, Value>,
    view_data: &'a Map<String, Value>,
    rules: &'a [RuleStrong],
    dictionary: &'a HashMap<String, String>,
) -> RenderContext<'a> {
    RenderContext {
        form_values,
        view_data,
        rules,
        locale: Locale::En,
        dictionary,
        record_id: None,
        session_token: "tok",
        client: None,
        preview: true,
    }
}

/// Echoes the resolved current value, for precedence tests.
struct EchoRenderer;

impl InputRenderer for EchoRenderer {
    fn handled_input_types(&self) -> Vec<String> {
        vec!["cTextInput".to_string()]
    }

    fn render(&self, input: &Input, ctx: &RenderContext) -> Result<Control> {
        let value = ctx
            .resolve_value(input)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Control::Text {
            value,
            password: input.password(),
        })
    }
}

struct RecordingClient {
    response: ResponseEnvelope,
    requests: Mutex<Vec<RunWorkflowRequest>>,
}

impl RecordingClient {
    fn new(raw: &str) -> Self {
        RecordingClient {
            response: ResponseEnvelope::from_json_str(raw).unwrap(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl WorkflowClient for RecordingClient {
    fn run_workflow(&self, request: &RunWorkflowRequest) -> Result<ResponseEnvelope> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }

    fn view_record(&self, _request: &ViewRecordRequest) -> Result<ResponseEnvelope> {
        Ok(self.response.clone())
    }
}

#[test]
fn design_parses_from_json() {
    let raw = r#"{
        "form_id": "acct_mgmt",
        "info": {"data": "wf-load", "lang": {"title": {"en": "Accounts", "vi": "Tài khoản"}}},
        "list_layout": [{
            "codeHidden": null,
            "list_view": [{
                "code": "main",
                "name": "Main",
                "isTab": "false",
                "isBox": "true",
                "lang": {"title": {"en": "Account details"}},
                "list_input": [{
                    "inputtype": "cTextInput",
                    "default": {"code": "acctno", "name": "Account No", "class": "col-span-6"},
                    "config": {"structable_read": "account.acctno"}
                }]
            }]
        }]
    }"#;
    let design = FormDesignDetail::from_json_str(raw).unwrap();
    assert_eq!(design.form_id, "acct_mgmt");
    assert_eq!(design.info.data.as_deref(), Some("wf-load"));
    let input = &design.list_layout[0].list_view[0].list_input[0];
    assert_eq!(input.field_key(), "acctno");
    assert!(design.list_layout[0].list_view[0].boxed());
}

#[test]
fn design_parses_from_yaml() {
    let raw = r#"
form_id: acct_mgmt
list_layout:
  - list_view:
      - code: main
        name: Main
        isTab: "true"
        list_input:
          - inputtype: jSelect
            default:
              code: branch
"#;
    let design = FormDesignDetail::from_yaml_str(raw).unwrap();
    assert!(design.list_layout[0].list_view[0].tabbed());
    assert_eq!(
        design.list_layout[0].list_view[0].list_input[0].inputtype,
        "jSelect"
    );
}

#[test]
fn field_key_falls_back_to_code() {
    let mut input = text_input("branch");
    assert_eq!(input.field_key(), "branch");
    input.config.structable_read = Some("branchtable.branchcode".to_string());
    assert_eq!(input.field_key(), "branchcode");
}

#[test]
fn design_payload_fails_fast_on_missing_halves() {
    let missing_design = DesignPayload {
        form_design_detail: None,
        master_data: Some(json!({})),
    };
    assert!(matches!(
        missing_design.into_parts(),
        Err(FormError::MissingFormDesign)
    ));

    let missing_master = DesignPayload {
        form_design_detail: Some(FormDesignDetail::default()),
        master_data: None,
    };
    assert!(matches!(
        missing_master.into_parts(),
        Err(FormError::MissingMasterData)
    ));
}

#[test]
fn resolve_parameters_substitutes_id_at_any_depth() {
    let masterdata = json!({
        "branch": {
            "parameters": {"recordid": "@id", "branchcode": "001"},
            "nested": [{"lookup": {"parameters": {"owner": "@ID "}}}]
        }
    });
    let resolved = resolve_parameters(&masterdata, "123", Locale::Vi).unwrap();
    assert_eq!(resolved["branch"]["parameters"]["recordid"], "123");
    assert_eq!(resolved["branch"]["parameters"]["branchcode"], "001");
    assert_eq!(resolved["branch"]["parameters"]["language"], "vi");
    assert_eq!(
        resolved["branch"]["nested"][0]["lookup"]["parameters"]["owner"],
        "123"
    );
    assert_eq!(
        resolved["branch"]["nested"][0]["lookup"]["parameters"]["language"],
        "vi"
    );
}

#[test]
fn resolve_parameters_handles_legacy_fields_keys() {
    let masterdata = json!({
        "a": {"fields": {"recordid": "@id"}},
        "b": {"Fields": {"recordid": "@id"}}
    });
    let resolved = resolve_parameters(&masterdata, "77", Locale::En).unwrap();
    assert_eq!(resolved["a"]["fields"]["recordid"], "77");
    assert_eq!(resolved["a"]["fields"]["language"], "en");
    assert_eq!(resolved["b"]["Fields"]["recordid"], "77");
}

#[test]
fn resolve_parameters_never_mutates_input() {
    let masterdata = json!({"parameters": {"recordid": "@id"}});
    let snapshot = masterdata.clone();
    let _ = resolve_parameters(&masterdata, "123", Locale::La).unwrap();
    assert_eq!(masterdata, snapshot);
}

#[test]
fn resolve_parameters_rejects_null_masterdata() {
    assert!(matches!(
        resolve_parameters(&Value::Null, "123", Locale::En),
        Err(FormError::MissingMasterData)
    ));
}

#[test]
fn resolve_parameters_is_deterministic() {
    let masterdata = json!({"x": {"parameters": {"recordid": "@id"}}, "y": {"parameters": {}}});
    let first = resolve_parameters(&masterdata, "9", Locale::En).unwrap();
    let second = resolve_parameters(&masterdata, "9", Locale::En).unwrap();
    assert_eq!(first, second);
}

#[test]
fn json_field_round_trips() {
    let value = json!({"limits": {"daily": "500", "monthly": "10000"}, "flags": ["a", "b"]});
    let encoded = encode_field(&value, DataFormat::Json);
    assert_eq!(decode_field(&encoded, DataFormat::Json), value);
}

#[test]
fn malformed_json_field_becomes_empty_object() {
    assert_eq!(
        decode_field("{not json", DataFormat::Json),
        json!({})
    );
    assert_eq!(decode_field("", DataFormat::Json), json!({}));
}

#[test]
fn xml_field_round_trips() {
    let value = json!({"branch": {"code": ["001", "002"], "name": "HQ"}});
    let encoded = encode_field(&value, DataFormat::Xml);
    assert_eq!(decode_field(&encoded, DataFormat::Xml), value);
}

#[test]
fn malformed_xml_field_becomes_empty_object() {
    assert_eq!(
        decode_field("<open><broken>", DataFormat::Xml),
        json!({})
    );
}

#[test]
fn grid_class_parses_column_span() {
    assert_eq!(parse_grid_class(Some("col-span-6")).span, 6);
    assert_eq!(parse_grid_class(Some("mb-2 col-span-3 px-1")).span, 3);
    assert_eq!(parse_grid_class(Some("col-span-20")).span, 12);
    assert_eq!(parse_grid_class(Some("plain")).span, 12);
    assert_eq!(parse_grid_class(None).span, 12);
}

#[test]
fn apply_change_routes_edit_to_field_key() {
    let mut values = Map::new();
    let mut input = text_input("acctno");
    input.config.structable_read = Some("account.acctno".to_string());
    apply_change(&mut values, &input, json!("4711"));
    assert_eq!(values["acctno"], "4711");
}

#[test]
fn apply_change_reencodes_structured_fields() {
    let mut values = Map::new();
    let mut input = text_input("limits");
    input.config.get_data_format = Some("json".to_string());
    apply_change(&mut values, &input, json!({"daily": "500"}));
    assert_eq!(values["limits"], json!(r#"{"daily":"500"}"#));
}

#[test]
fn form_state_takes_precedence_over_view_data() {
    let mut registry = RendererRegistry::new();
    registry.register(std::sync::Arc::new(EchoRenderer));
    let engine = FormEngine::new(&registry);

    let mut form_values = Map::new();
    form_values.insert("acctno".to_string(), json!("edited"));
    let mut view_data = Map::new();
    view_data.insert("acctno".to_string(), json!("stored"));
    let dictionary = HashMap::new();
    let ctx = empty_ctx(&form_values, &view_data, &[], &dictionary);

    let rendered = engine
        .render_input(&text_input("acctno"), &ctx)
        .unwrap()
        .unwrap();
    assert_eq!(
        rendered.control,
        Control::Text {
            value: "edited".to_string(),
            password: false
        }
    );

    let empty_values = Map::new();
    let ctx = empty_ctx(&empty_values, &view_data, &[], &dictionary);
    let rendered = engine
        .render_input(&text_input("acctno"), &ctx)
        .unwrap()
        .unwrap();
    assert_eq!(
        rendered.control,
        Control::Text {
            value: "stored".to_string(),
            password: false
        }
    );
}

#[test]
fn unknown_input_type_renders_unsupported_placeholder() {
    let registry = RendererRegistry::new();
    let engine = FormEngine::new(&registry);
    let form_values = Map::new();
    let view_data = Map::new();
    let dictionary = HashMap::new();
    let ctx = empty_ctx(&form_values, &view_data, &[], &dictionary);

    let mut input = text_input("acctno");
    input.inputtype = "cHologram".to_string();
    let rendered = engine.render_input(&input, &ctx).unwrap().unwrap();
    assert_eq!(
        rendered.control,
        Control::Unsupported {
            inputtype: "cHologram".to_string()
        }
    );
}

#[test]
fn hidden_and_suppressed_fields_render_nothing() {
    let mut registry = RendererRegistry::new();
    registry.register(std::sync::Arc::new(EchoRenderer));
    let engine = FormEngine::new(&registry);
    let form_values = Map::new();
    let view_data = Map::new();
    let dictionary = HashMap::new();

    let rules = vec![RuleStrong {
        code: "visibility".to_string(),
        config: RuleConfig {
            component_result: "acctno".to_string(),
            component_event: "on_change".to_string(),
            visible: "false".to_string(),
        },
    }];
    let ctx = empty_ctx(&form_values, &view_data, &rules, &dictionary);
    assert!(engine
        .render_input(&text_input("acctno"), &ctx)
        .unwrap()
        .is_none());

    // Empty, non-defaultable field is suppressed outright.
    let ctx = empty_ctx(&form_values, &view_data, &[], &dictionary);
    let mut input = text_input("note");
    input.config.data_default = Some(false);
    assert!(engine.render_input(&input, &ctx).unwrap().is_none());

    // With a backing value it renders again.
    let mut view_data = Map::new();
    view_data.insert("note".to_string(), json!("present"));
    let ctx = empty_ctx(&form_values, &view_data, &[], &dictionary);
    assert!(engine.render_input(&input, &ctx).unwrap().is_some());
}

#[test]
fn search_state_is_isolated_per_form() {
    let mut store = FormSearchStore::new();
    store.init_form("A");
    store.init_form("B");

    store.set_advanced_search(
        "A",
        HashMap::from([("branchcode".to_string(), "001".to_string())]),
    );
    assert!(store.state("B").unwrap().advancedsearch.is_empty());

    store.clear_form("A");
    assert!(store.state("A").is_none());
    assert!(store.state("B").is_some());
}

#[test]
fn init_form_is_idempotent() {
    let mut store = FormSearchStore::new();
    store.init_form("A");
    store.set_search_text("A", "alpha");
    store.init_form("A");
    assert_eq!(store.state("A").unwrap().searchtext, "alpha");
}

#[test]
fn advanced_search_blur_policy() {
    let mut store = FormSearchStore::new();
    let mut input = text_input("branchcode");
    input.config.is_search = Some(true);

    store.update_advanced_search_field("A", &input, "  001  ");
    assert_eq!(
        store.state("A").unwrap().advancedsearch.get("branchcode"),
        Some(&"001".to_string())
    );

    store.update_advanced_search_field("A", &input, "   ");
    assert!(store.state("A").unwrap().advancedsearch.is_empty());

    // Fields not flagged for search never participate.
    let plain = text_input("note");
    store.update_advanced_search_field("A", &plain, "x");
    assert!(store.state("A").unwrap().advancedsearch.is_empty());
}

#[test]
fn stale_search_responses_are_discarded() {
    let mut store = FormSearchStore::new();
    let first = store.begin_fetch("A");
    let second = store.begin_fetch("A");

    let old_page = bc_workflow_api::PageData {
        items: vec![json!({"id": "old"})],
        page_index: 1,
        page_size: 10,
    };
    assert!(!store.apply_search_result("A", first, Some(old_page)));
    assert!(store.state("A").unwrap().is_fetching);
    assert!(store.state("A").unwrap().datasearch.is_none());

    let new_page = bc_workflow_api::PageData {
        items: vec![json!({"id": "new"})],
        page_index: 1,
        page_size: 10,
    };
    assert!(store.apply_search_result("A", second, Some(new_page)));
    assert!(!store.state("A").unwrap().is_fetching);
    assert_eq!(
        store.state("A").unwrap().datasearch.as_ref().unwrap().items[0]["id"],
        "new"
    );
}

#[test]
fn run_search_merges_filters_and_pagination() {
    let client = RecordingClient::new(
        r#"{"payload":{"dataresponse":{"data":{"result":[{"id":"1","total_count":1}]}}},"status":200}"#,
    );
    let mut store = FormSearchStore::new();
    store.set_search_text("acct_mgmt", "smith");
    store.set_advanced_search(
        "acct_mgmt",
        HashMap::from([("branchcode".to_string(), "001".to_string())]),
    );

    let page = run_search(&mut store, &client, "tok", "wf-search", "acct_list", "acct_mgmt", 2, 25)
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_count(), Some(1));
    assert!(!store.state("acct_mgmt").unwrap().is_fetching);

    let requests = client.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].input.issearch);
    assert_eq!(requests[0].input.pageindex, 2);
    assert_eq!(requests[0].input.pagesize, 25);
    assert_eq!(requests[0].input.parameters["branchcode"], "001");
    assert_eq!(requests[0].input.parameters["searchtext"], "smith");
}

#[test]
fn fetch_record_returns_first_row_of_valid_response() {
    let client = RecordingClient::new(
        r#"{"payload":{"dataresponse":{"data":{"result":[{"acctno":"4711","name":"Smith"}]}}},"status":200}"#,
    );
    let design = FormDesignDetail {
        form_id: "acct_mgmt".to_string(),
        info: FormInfo {
            data: Some("wf-load".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let record = fetch_record(&client, &design, "tok", "4711").unwrap();
    assert_eq!(record["acctno"], "4711");
}

#[test]
fn fetch_record_failure_is_a_sentinel_not_a_panic() {
    let client = RecordingClient::new(
        r#"{"payload":{"dataresponse":{"errors":[{"code":"SYS001","execute_id":"ex-1"}]}},"status":200}"#,
    );
    let design = FormDesignDetail {
        form_id: "acct_mgmt".to_string(),
        info: FormInfo {
            data: Some("wf-load".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(fetch_record(&client, &design, "tok", "4711").is_none());

    // No workflow bound on the form info: nothing to load.
    let unbound = FormDesignDetail {
        form_id: "acct_mgmt".to_string(),
        ..Default::default()
    };
    assert!(fetch_record(&client, &unbound, "tok", "4711").is_none());
}

#[test]
fn run_search_surfaces_backend_failure_as_none() {
    let client = RecordingClient::new(
        r#"{"payload":{"dataresponse":{"errors":[{"code":"SYS001","execute_id":"ex-1"}]}},"status":200}"#,
    );
    let mut store = FormSearchStore::new();
    let page = run_search(&mut store, &client, "tok", "wf-search", "acct_list", "acct_mgmt", 1, 10);
    assert!(page.is_none());
    assert!(!store.state("acct_mgmt").unwrap().is_fetching);
}
