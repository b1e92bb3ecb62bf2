use serde::Serialize;
use serde_json::Value;

use crate::transcode::DataFormat;

/// Column span derived from the input's CSS-grid-like class string. Twelve
/// columns, absence means full width.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct GridProps {
    pub span: u8,
}

impl Default for GridProps {
    fn default() -> Self {
        GridProps { span: 12 }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// One concrete control produced by a renderer. The console client walks
/// this tree; it never sees the raw schema.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Control {
    Text {
        value: String,
        password: bool,
    },
    TextArea {
        value: Value,
        format: DataFormat,
    },
    Select {
        options: Vec<SelectOption>,
        /// Source rows, each stamped with its zero-based index under
        /// `key_jselect` for stable keying.
        rows: Vec<Value>,
        selected: Option<String>,
    },
    Table {
        columns: Vec<String>,
        rows: Vec<Value>,
    },
    Button {
        enabled: bool,
        workflow: Option<String>,
    },
    Label {
        text: String,
    },
    Date {
        value: Option<String>,
    },
    SearchText {
        value: String,
    },
    /// Fail-soft placeholder for an input type no renderer claims.
    Unsupported {
        inputtype: String,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderedControl {
    /// Form-data record key this control reads and writes.
    pub key: String,
    pub label: Option<String>,
    pub grid: GridProps,
    pub control: Control,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderedView {
    pub code: String,
    /// Localized box title; absent when the view is unboxed or the locale
    /// has no entry.
    pub title: Option<String>,
    pub boxed: bool,
    pub controls: Vec<RenderedControl>,
}

/// Tabbed views render one active panel at a time, but every panel is
/// materialized up front so switching stays local.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TabStrip {
    pub labels: Vec<String>,
    pub panels: Vec<RenderedView>,
    pub active: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderedForm {
    pub form_id: String,
    pub title: Option<String>,
    pub sections: Vec<RenderedView>,
    pub tabs: Option<TabStrip>,
}
