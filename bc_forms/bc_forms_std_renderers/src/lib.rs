use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use bc_forms::control::{Control, RenderedForm};
use bc_forms::registry::RendererRegistry;
use bc_forms::render::FormEngine;
use bc_forms::schema::{FormDesignDetail, Input};
use bc_forms::traits::{InputRenderer, RenderContext};
use bc_forms::transcode::{decode_field, DataFormat};

mod select;

pub use select::{SelectRenderer, KEY_JSELECT, SELECT_NULL};

/// Registers the standard renderer set under the input types the form
/// designer emits.
pub fn register_standard_renderers(registry: &mut RendererRegistry) {
    registry.register(Arc::new(TextInputRenderer));
    registry.register(Arc::new(TextAreaRenderer));
    registry.register(Arc::new(SelectRenderer));
    registry.register(Arc::new(TableRenderer));
    registry.register(Arc::new(ButtonRenderer));
    registry.register(Arc::new(LabelRenderer));
    registry.register(Arc::new(DateRenderer));
    registry.register(Arc::new(AdvancedSearchRenderer));
}

/// Assembles the standard registry and renders a full form design in one
/// call.
pub fn render_standard_form(
    design: &FormDesignDetail,
    ctx: &RenderContext,
    active_tab: usize,
) -> Result<RenderedForm> {
    let mut registry = RendererRegistry::new();
    register_standard_renderers(&mut registry);
    let engine = FormEngine::new(&registry);
    engine.render_form(design, ctx, active_tab)
}

/// Current value as display text: live form state, then server view data,
/// then the schema's static default.
fn current_text(input: &Input, ctx: &RenderContext) -> String {
    ctx.resolve_value(input)
        .map(value_as_text)
        .or_else(|| input.value.clone())
        .unwrap_or_default()
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct TextInputRenderer;

impl InputRenderer for TextInputRenderer {
    fn handled_input_types(&self) -> Vec<String> {
        vec!["cTextInput".to_string()]
    }

    fn render(&self, input: &Input, ctx: &RenderContext) -> Result<Control> {
        Ok(Control::Text {
            value: current_text(input, ctx),
            password: input.password(),
        })
    }
}

/// Structured text area (JSON editor / XML editor). The wire value is a
/// string in the field's configured format; the editor works on a plain
/// object tree.
pub struct TextAreaRenderer;

impl InputRenderer for TextAreaRenderer {
    fn handled_input_types(&self) -> Vec<String> {
        vec!["cTextArea".to_string()]
    }

    fn render(&self, input: &Input, ctx: &RenderContext) -> Result<Control> {
        let format = DataFormat::parse(input.config.get_data_format.as_deref());
        let value = match ctx.resolve_value(input) {
            // Already decoded by an earlier edit round.
            Some(Value::Object(map)) => Value::Object(map.clone()),
            other => decode_field(
                other.map(value_as_text).unwrap_or_default().as_str(),
                format,
            ),
        };
        Ok(Control::TextArea { value, format })
    }
}

pub struct TableRenderer;

impl InputRenderer for TableRenderer {
    fn handled_input_types(&self) -> Vec<String> {
        vec!["cTableDefault".to_string()]
    }

    fn render(&self, input: &Input, ctx: &RenderContext) -> Result<Control> {
        let rows = ctx
            .resolve_value(input)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let columns = rows
            .first()
            .and_then(Value::as_object)
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        Ok(Control::Table { columns, rows })
    }
}

pub struct ButtonRenderer;

impl InputRenderer for ButtonRenderer {
    fn handled_input_types(&self) -> Vec<String> {
        vec!["cButton".to_string()]
    }

    fn render(&self, input: &Input, ctx: &RenderContext) -> Result<Control> {
        // Preview contexts have no workflow execution wired up.
        let enabled = !ctx.preview && ctx.client.is_some();
        Ok(Control::Button {
            enabled,
            workflow: input.value.clone(),
        })
    }
}

pub struct LabelRenderer;

impl InputRenderer for LabelRenderer {
    fn handled_input_types(&self) -> Vec<String> {
        vec!["cLabel".to_string()]
    }

    fn render(&self, input: &Input, ctx: &RenderContext) -> Result<Control> {
        let text = input
            .title_for(ctx.locale)
            .map(str::to_string)
            .or_else(|| input.value.clone())
            .unwrap_or_else(|| input.default.name.clone());
        Ok(Control::Label { text })
    }
}

pub struct DateRenderer;

impl InputRenderer for DateRenderer {
    fn handled_input_types(&self) -> Vec<String> {
        vec!["cDate".to_string()]
    }

    fn render(&self, input: &Input, ctx: &RenderContext) -> Result<Control> {
        let value = ctx.resolve_value(input).map(value_as_text);
        Ok(Control::Date {
            value: value.filter(|text| !text.is_empty()),
        })
    }
}

/// Per-field advanced-search text box. Rendering shows the current value;
/// the on-blur store update is driven by the page through
/// `FormSearchStore::update_advanced_search_field`.
pub struct AdvancedSearchRenderer;

impl InputRenderer for AdvancedSearchRenderer {
    fn handled_input_types(&self) -> Vec<String> {
        vec!["cAdvanceSearch".to_string()]
    }

    fn render(&self, input: &Input, ctx: &RenderContext) -> Result<Control> {
        Ok(Control::SearchText {
            value: current_text(input, ctx),
        })
    }
}
