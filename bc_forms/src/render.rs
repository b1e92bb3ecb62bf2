use anyhow::Result;
use log::warn;
use regex::Regex;
use serde_json::{Map, Value};

use crate::control::{Control, GridProps, RenderedControl, RenderedForm, RenderedView, TabStrip};
use crate::registry::RendererRegistry;
use crate::rules;
use crate::schema::{FormDesignDetail, Input, View};
use crate::traits::RenderContext;
use crate::transcode::{self, DataFormat};

pub struct FormEngine<'a> {
    registry: &'a RendererRegistry,
}

impl<'a> FormEngine<'a> {
    pub fn new(registry: &'a RendererRegistry) -> Self {
        Self { registry }
    }

    /// Renders a whole form design: non-tab views in document order, tab
    /// views multiplexed into a tab strip. Every tab panel is materialized
    /// here, so switching tabs is synchronous and local.
    pub fn render_form(
        &self,
        design: &FormDesignDetail,
        ctx: &RenderContext,
        active_tab: usize,
    ) -> Result<RenderedForm> {
        let mut sections = Vec::new();
        let mut labels = Vec::new();
        let mut panels = Vec::new();

        for layout in &design.list_layout {
            for view in &layout.list_view {
                if view.tabbed() {
                    labels.push(view.title_for(ctx.locale).unwrap_or(&view.name).to_string());
                    panels.push(self.render_view(view, ctx)?);
                } else {
                    sections.push(self.render_view(view, ctx)?);
                }
            }
        }

        let tabs = if panels.is_empty() {
            None
        } else {
            Some(TabStrip {
                active: active_tab.min(panels.len() - 1),
                labels,
                panels,
            })
        };

        Ok(RenderedForm {
            form_id: design.form_id.clone(),
            title: design
                .info
                .lang
                .as_ref()
                .and_then(|lang| lang.title_for(ctx.locale))
                .map(str::to_string),
            sections,
            tabs,
        })
    }

    pub fn render_view(&self, view: &View, ctx: &RenderContext) -> Result<RenderedView> {
        let mut controls = Vec::new();
        for input in &view.list_input {
            if let Some(control) = self.render_input(input, ctx)? {
                controls.push(control);
            }
        }
        Ok(RenderedView {
            code: view.code.clone(),
            title: if view.boxed() {
                view.title_for(ctx.locale).map(str::to_string)
            } else {
                None
            },
            boxed: view.boxed(),
            controls,
        })
    }

    /// Produces exactly one control for an input, or `None` when the field
    /// is hidden by a visibility rule or suppressed as empty and
    /// non-defaultable. Hidden fields keep their stored value; only the
    /// rendering is affected.
    pub fn render_input(
        &self,
        input: &Input,
        ctx: &RenderContext,
    ) -> Result<Option<RenderedControl>> {
        let key = input.field_key().to_string();

        if input.ishidden.unwrap_or(false) || rules::is_field_hidden(ctx.rules, &key) {
            return Ok(None);
        }

        if input.config.data_default == Some(false) && is_empty_value(ctx.resolve_value(input)) {
            return Ok(None);
        }

        let control = match self.registry.get(&input.inputtype) {
            Some(renderer) => renderer.render(input, ctx)?,
            None => {
                warn!(
                    "no renderer for input type '{}' (field {key})",
                    input.inputtype
                );
                Control::Unsupported {
                    inputtype: input.inputtype.clone(),
                }
            }
        };

        Ok(Some(RenderedControl {
            key,
            label: input.title_for(ctx.locale).map(str::to_string),
            grid: parse_grid_class(input.default.class.as_deref()),
            control,
        }))
    }
}

/// Routes a user edit back into the shared form-data record under the
/// input's field key. Structured fields are re-encoded to their wire format
/// string first. Key collisions follow last-write-wins.
pub fn apply_change(values: &mut Map<String, Value>, input: &Input, value: Value) {
    let encoded = if input.config.get_data_format.is_some() {
        let format = DataFormat::parse(input.config.get_data_format.as_deref());
        Value::String(transcode::encode_field(&value, format))
    } else {
        value
    };
    values.insert(input.field_key().to_string(), encoded);
}

/// Parses a `col-span-N` token out of the input's class string. Anything
/// else, or no class at all, is full width.
pub fn parse_grid_class(class: Option<&str>) -> GridProps {
    let Some(class) = class else {
        return GridProps::default();
    };
    let span = Regex::new(r"col-span-(\d+)").ok().and_then(|re| {
        re.captures(class)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
    });
    match span {
        Some(span) if (1..=12).contains(&span) => GridProps { span },
        _ => GridProps::default(),
    }
}

fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        _ => false,
    }
}
