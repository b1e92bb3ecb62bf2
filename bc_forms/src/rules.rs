use crate::schema::RuleStrong;

const VISIBILITY: &str = "visibility";
const ON_CHANGE: &str = "on_change";

/// Decides whether a visibility rule hides `field_key`. A field is hidden
/// iff some `visibility` rule targets it, fires on `on_change`, and says
/// `visible == "false"`; any hiding rule wins. No match means visible.
///
/// Pure over the static rule config: the evaluator never consults live
/// field values, so the outcome per field is fixed for a given rule set.
pub fn is_field_hidden(rules: &[RuleStrong], field_key: &str) -> bool {
    rules
        .iter()
        .filter(|rule| rule.code == VISIBILITY)
        .any(|rule| {
            rule.config
                .component_result
                .split(';')
                .map(str::trim)
                .any(|target| target == field_key)
                && rule.config.component_event == ON_CHANGE
                && rule.config.visible == "false"
        })
}
