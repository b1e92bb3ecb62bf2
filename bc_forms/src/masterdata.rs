use serde_json::Value;

use bc_workflow_api::Locale;

use crate::error::FormError;

/// Parameter-block keys recognized in master-data trees. `fields`/`Fields`
/// are legacy spellings still emitted by older workflow definitions.
const PARAMETER_KEYS: [&str; 3] = ["parameters", "fields", "Fields"];

/// Walks a nested master-data tree, replaces `@id`-style placeholders with
/// the live record id, and injects the active locale into every parameter
/// block. The input is never mutated; callers get a fresh tree ready for
/// despatch.
///
/// A `Null` master-data value is a contract violation, not a recoverable
/// error.
pub fn resolve_parameters(
    masterdata: &Value,
    id: &str,
    locale: Locale,
) -> Result<Value, FormError> {
    if masterdata.is_null() {
        return Err(FormError::MissingMasterData);
    }
    let mut resolved = masterdata.clone();
    visit(&mut resolved, id, locale);
    Ok(resolved)
}

fn visit(node: &mut Value, id: &str, locale: Locale) {
    match node {
        Value::Object(map) => {
            for key in PARAMETER_KEYS {
                if let Some(Value::Object(parameters)) = map.get_mut(key) {
                    substitute_placeholders(parameters, id);
                    parameters.insert(
                        "language".to_string(),
                        Value::String(locale.as_str().to_string()),
                    );
                }
            }
            for value in map.values_mut() {
                visit(value, id, locale);
            }
        }
        Value::Array(items) => {
            for item in items {
                visit(item, id, locale);
            }
        }
        _ => {}
    }
}

/// A string value beginning with `@` names a reserved placeholder. Only
/// `@id` is defined so far.
fn substitute_placeholders(parameters: &mut serde_json::Map<String, Value>, id: &str) {
    for value in parameters.values_mut() {
        if let Value::String(text) = value {
            if let Some(placeholder) = text.strip_prefix('@') {
                if placeholder.trim().to_lowercase() == "id" {
                    *value = Value::String(id.to_string());
                }
            }
        }
    }
}
