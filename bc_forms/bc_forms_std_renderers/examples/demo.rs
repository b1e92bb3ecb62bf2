use std::collections::HashMap;

use serde_json::{json, Map};

use bc_forms::registry::RendererRegistry;
use bc_forms::render::FormEngine;
use bc_forms::schema::FormDesignDetail;
use bc_forms::traits::RenderContext;
use bc_forms_std_renderers::register_standard_renderers;
use bc_workflow_api::Locale;

fn main() -> anyhow::Result<()> {
    let design = FormDesignDetail::from_json_str(
        r#"{
        "form_id": "acct_demo",
        "info": {"lang": {"title": {"en": "Account maintenance"}}},
        "list_layout": [{
            "list_view": [
                {
                    "code": "general",
                    "name": "General",
                    "isTab": "false",
                    "isBox": "true",
                    "lang": {"title": {"en": "General"}},
                    "list_input": [
                        {
                            "inputtype": "cTextInput",
                            "default": {"code": "acctno", "name": "Account No", "class": "col-span-6"},
                            "config": {"structable_read": "account.acctno"},
                            "lang": {"title": {"en": "Account No"}}
                        },
                        {
                            "inputtype": "cDate",
                            "default": {"code": "opendate", "name": "Open Date", "class": "col-span-6"},
                            "config": {},
                            "lang": {"title": {"en": "Open Date"}}
                        }
                    ]
                },
                {
                    "code": "limits",
                    "name": "Limits",
                    "isTab": "true",
                    "list_input": [
                        {
                            "inputtype": "cTextArea",
                            "default": {"code": "limits", "name": "Limits"},
                            "config": {"get_data_format": "json"}
                        }
                    ]
                }
            ]
        }]
    }"#,
    )?;

    let mut registry = RendererRegistry::new();
    register_standard_renderers(&mut registry);
    let engine = FormEngine::new(&registry);

    let form_values = Map::new();
    let mut view_data = Map::new();
    view_data.insert("acctno".to_string(), json!("4711"));
    view_data.insert("opendate".to_string(), json!("2024-03-01"));
    view_data.insert("limits".to_string(), json!(r#"{"daily":"500"}"#));
    let dictionary = HashMap::new();

    let ctx = RenderContext {
        form_values: &form_values,
        view_data: &view_data,
        rules: &design.list_rule,
        locale: Locale::En,
        dictionary: &dictionary,
        record_id: None,
        session_token: "demo",
        client: None,
        preview: true,
    };

    let rendered = engine.render_form(&design, &ctx, 0)?;
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}
