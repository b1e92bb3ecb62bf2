use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use bc_workflow_api::Locale;

use crate::error::FormError;

/// Top-level document the system-service delivers for one page render.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DesignPayload {
    #[serde(default)]
    pub form_design_detail: Option<FormDesignDetail>,
    #[serde(default)]
    pub master_data: Option<Value>,
}

impl DesignPayload {
    /// Splits the payload into its two halves, failing fast when the backend
    /// left either of them out.
    pub fn into_parts(self) -> Result<(FormDesignDetail, Value), FormError> {
        let design = self
            .form_design_detail
            .ok_or(FormError::MissingFormDesign)?;
        let master_data = self.master_data.ok_or(FormError::MissingMasterData)?;
        Ok((design, master_data))
    }
}

/// Schema describing one page: layouts, their views, and the inputs inside.
/// Immutable once fetched; re-fetched per navigation.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FormDesignDetail {
    pub form_id: String,
    #[serde(default)]
    pub info: FormInfo,
    #[serde(default)]
    pub list_layout: Vec<Layout>,
    #[serde(default)]
    pub list_rule: Vec<RuleStrong>,
}

impl FormDesignDetail {
    pub fn from_json_str(raw: &str) -> Result<Self, FormError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Designer documents also ship as YAML.
    pub fn from_yaml_str(raw: &str) -> Result<Self, FormError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// Localized title/description plus the workflow executed on page load
/// (`data` carries the workflow id).
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FormInfo {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lang: Option<LangBlock>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LangBlock {
    #[serde(default)]
    pub title: HashMap<String, String>,
}

impl LangBlock {
    /// Missing locale entries fall back silently to no title.
    pub fn title_for(&self, locale: Locale) -> Option<&str> {
        self.title.get(locale.as_str()).map(String::as_str)
    }
}

/// A logical grouping of views, e.g. one tab page.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Layout {
    #[serde(rename = "codeHidden", default)]
    pub code_hidden: Option<String>,
    #[serde(default)]
    pub haveauthen: Option<String>,
    #[serde(default)]
    pub list_view: Vec<View>,
}

/// A named, possibly-tabbed group of inputs. The schema carries booleans as
/// the strings `"true"`/`"false"`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct View {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "isTab", default)]
    pub is_tab: String,
    #[serde(rename = "isBox", default)]
    pub is_box: String,
    #[serde(default)]
    pub lang: Option<LangBlock>,
    #[serde(default)]
    pub list_input: Vec<Input>,
}

impl View {
    pub fn tabbed(&self) -> bool {
        self.is_tab == "true"
    }

    pub fn boxed(&self) -> bool {
        self.is_box == "true"
    }

    pub fn title_for(&self, locale: Locale) -> Option<&str> {
        self.lang.as_ref().and_then(|lang| lang.title_for(locale))
    }
}

/// A single schema-described field/control.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Input {
    #[serde(default)]
    pub inputtype: String,
    #[serde(default)]
    pub default: InputDefault,
    #[serde(default)]
    pub config: InputConfig,
    #[serde(default)]
    pub lang: Option<LangBlock>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub iskey: Option<bool>,
    #[serde(default)]
    pub ishidden: Option<bool>,
    /// Code-dictionary lookup for select-style inputs.
    #[serde(default)]
    pub cdlist: Option<CdList>,
    /// Workflow-invocation template for dynamically sourced inputs. May
    /// contain `@id`-style placeholders, resolved before despatch.
    #[serde(default)]
    pub masterdata: Option<Value>,
}

impl Input {
    /// Key under which this field reads and writes the generic form-data
    /// record: the last dotted segment of `structable_read`, else the field
    /// code.
    pub fn field_key(&self) -> &str {
        self.config
            .structable_read
            .as_deref()
            .and_then(|path| path.rsplit('.').next())
            .filter(|segment| !segment.is_empty())
            .unwrap_or(&self.default.code)
    }

    pub fn title_for(&self, locale: Locale) -> Option<&str> {
        self.lang.as_ref().and_then(|lang| lang.title_for(locale))
    }

    pub fn password(&self) -> bool {
        self.config.is_password.as_deref() == Some("true")
    }

    pub fn has_null_option(&self) -> bool {
        self.config.is_has_data_null.as_deref() == Some("true")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct InputDefault {
    #[serde(default)]
    pub code: String,
    #[serde(rename = "codeHidden", default)]
    pub code_hidden: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    /// CSS-grid-like class string, parsed into a column span.
    #[serde(default)]
    pub class: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct InputConfig {
    /// Dotted path "table.column"; the last segment is the form-data key.
    #[serde(default)]
    pub structable_read: Option<String>,
    #[serde(default)]
    pub data_mode: Option<String>,
    /// "json" or "xml" for structured text-area fields.
    #[serde(default)]
    pub get_data_format: Option<String>,
    /// `false` suppresses the field entirely when its backing value is empty.
    #[serde(default)]
    pub data_default: Option<bool>,
    #[serde(default)]
    pub is_password: Option<String>,
    #[serde(rename = "isSearch", default)]
    pub is_search: Option<bool>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(rename = "isHasDataNull", default)]
    pub is_has_data_null: Option<String>,
    /// Static option rows merged ahead of any dynamic query.
    #[serde(default)]
    pub json_data: Option<Vec<Value>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CdList {
    #[serde(default)]
    pub cdgrp: String,
    #[serde(default)]
    pub cdname: String,
}

/// Declarative visibility constraint tied to field codes and an event.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RuleStrong {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub config: RuleConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RuleConfig {
    /// Semicolon-separated target field codes.
    #[serde(default)]
    pub component_result: String,
    #[serde(default)]
    pub component_event: String,
    #[serde(default)]
    pub visible: String,
}
