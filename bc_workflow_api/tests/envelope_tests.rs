use bc_workflow_api::{Locale, PageData, ResponseEnvelope, RunWorkflowRequest, ViewRecordRequest};
use serde_json::json;

#[test]
fn valid_envelope_requires_200_and_no_errors() {
    let envelope = ResponseEnvelope::from_json_str(
        r#"{"payload":{"dataresponse":{"data":{"items":[]}}},"status":200}"#,
    )
    .unwrap();
    assert!(envelope.is_valid());

    let failed = ResponseEnvelope::from_json_str(
        r#"{"payload":{"dataresponse":{"errors":[{"code":"SYS001","execute_id":"ex-1"}]}},"status":200}"#,
    )
    .unwrap();
    assert!(!failed.is_valid());
    assert_eq!(failed.errors()[0].code, "SYS001");

    let http_failed =
        ResponseEnvelope::from_json_str(r#"{"payload":{"dataresponse":{}},"status":500}"#).unwrap();
    assert!(!http_failed.is_valid());
}

#[test]
fn normalize_prefers_result_over_items() {
    let envelope = ResponseEnvelope::from_json_str(
        r#"{"payload":{"dataresponse":{"data":{"result":[{"id":"r1"}],"items":[{"id":"i1"}]}}},"status":200}"#,
    )
    .unwrap();
    let normalized = envelope.normalize();
    assert_eq!(normalized.items.len(), 1);
    assert_eq!(normalized.items[0]["id"], "r1");
}

#[test]
fn normalize_falls_back_to_items_key() {
    let envelope = ResponseEnvelope::from_json_str(
        r#"{"payload":{"dataresponse":{"data":{"items":[{"id":"i1"},{"id":"i2"}]}}},"status":200}"#,
    )
    .unwrap();
    assert_eq!(envelope.normalize().items.len(), 2);
}

#[test]
fn normalize_collapses_legacy_error_key() {
    let envelope = ResponseEnvelope::from_json_str(
        r#"{"payload":{"dataresponse":{"error":[{"code":"WF404","info":"no such workflow","execute_id":"ex-9"}]}},"status":200}"#,
    )
    .unwrap();
    let normalized = envelope.normalize();
    let err = normalized.error_info.unwrap();
    assert_eq!(err.code, "WF404");
    assert_eq!(err.execute_id, "ex-9");
}

#[test]
fn page_data_total_count_rides_on_first_item() {
    let envelope = ResponseEnvelope::from_json_str(
        r#"{"payload":{"dataresponse":{"data":{"result":[{"id":"1","total_count":42},{"id":"2"}]}}},"status":200}"#,
    )
    .unwrap();
    let page = PageData::from_normalized(&envelope.normalize(), 1, 10);
    assert_eq!(page.total_count(), Some(42));
    assert_eq!(page.page_index, 1);

    let empty = PageData::from_normalized(&Default::default(), 1, 10);
    assert_eq!(empty.total_count(), None);
}

#[test]
fn run_workflow_request_serializes_wire_names() {
    let mut parameters = serde_json::Map::new();
    parameters.insert("branchcode".to_string(), json!("001"));
    let request = RunWorkflowRequest::new("tok", "wf-1", "acct_list", parameters).search(2, 25);

    let wire = serde_json::to_value(&request).unwrap();
    assert_eq!(wire["sessiontoken"], "tok");
    assert_eq!(wire["workflowid"], "wf-1");
    assert_eq!(wire["input"]["commandname"], "acct_list");
    assert_eq!(wire["input"]["issearch"], true);
    assert_eq!(wire["input"]["pageindex"], 2);
    assert_eq!(wire["input"]["pagesize"], 25);
    assert_eq!(wire["input"]["parameters"]["branchcode"], "001");
}

#[test]
fn view_record_request_is_never_a_search() {
    let request = ViewRecordRequest::new("tok", "wf-2", "acct_view", "4711");
    let wire = serde_json::to_value(&request).unwrap();
    assert_eq!(wire["issearch"], false);
    assert_eq!(wire["parameters"]["id"], "4711");
}

#[test]
fn unknown_locale_defaults_to_en() {
    assert_eq!(Locale::parse("vi"), Locale::Vi);
    assert_eq!(Locale::parse("la"), Locale::La);
    assert_eq!(Locale::parse("de"), Locale::En);
    assert_eq!(Locale::parse(""), Locale::En);
    assert_eq!(Locale::En.as_str(), "en");
}
