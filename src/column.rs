use crate::row::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Custom cell renderer: `(row, value) -> display text`.
pub type CellRenderer = Arc<dyn Fn(&Row, Option<&Value>) -> String + Send + Sync>;

/// Custom export renderer: `(row, value) -> primitive export value`.
pub type ExportRenderer = Arc<dyn Fn(&Row, Option<&Value>) -> ExportValue + Send + Sync>;

/// Primitive value written into an export cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl ExportValue {
    /// Convert a raw row value into an export value without any formatting.
    pub fn from_raw(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => ExportValue::Empty,
            Some(Value::String(s)) => ExportValue::Text(s.clone()),
            Some(Value::Bool(b)) => ExportValue::Bool(*b),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(f) => ExportValue::Number(f),
                None => ExportValue::Text(n.to_string()),
            },
            Some(other) => ExportValue::Text(other.to_string()),
        }
    }

    /// String form used by text-only exporters. Empty becomes `""`.
    pub fn as_text(&self) -> String {
        match self {
            ExportValue::Empty => String::new(),
            ExportValue::Text(s) => s.clone(),
            ExportValue::Number(n) => n.to_string(),
            ExportValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for ExportValue {
    fn from(value: &str) -> Self {
        ExportValue::Text(value.to_string())
    }
}

impl From<String> for ExportValue {
    fn from(value: String) -> Self {
        ExportValue::Text(value)
    }
}

impl From<f64> for ExportValue {
    fn from(value: f64) -> Self {
        ExportValue::Number(value)
    }
}

impl From<i64> for ExportValue {
    fn from(value: i64) -> Self {
        ExportValue::Number(value as f64)
    }
}

impl From<bool> for ExportValue {
    fn from(value: bool) -> Self {
        ExportValue::Bool(value)
    }
}

/// Widget a column offers for its filter input.
///
/// The widget only shapes the input; every filter still matches by
/// case-insensitive substring.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    Text,
    Select {
        #[serde(default)]
        options: Vec<String>,
    },
    Date,
    Number,
    Custom,
}

fn default_true() -> bool {
    true
}

/// Static description of one displayed field.
///
/// Definitions are template data: the table never mutates them. Current
/// width and visibility live in the [`ColumnRegistry`](crate::registry::ColumnRegistry).
///
/// # Examples
/// ```
/// use datatable::column::{ColumnDef, ExportValue, FilterKind};
///
/// let columns = vec![
///     ColumnDef::new("id", "ID").width(80.0),
///     ColumnDef::new("name", "Name").sortable().filterable(FilterKind::Text),
///     ColumnDef::new("fee", "Fee")
///         .sortable()
///         .render(|_, value| format!("${}", datatable::row::display_value(value)))
///         .export_render(|_, value| ExportValue::from_raw(value)),
/// ];
/// assert_eq!(columns[1].label, "Name");
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    /// Dotted key path into the row
    pub key: String,
    /// Header text
    pub label: String,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default, rename = "filterComponent")]
    pub filter: Option<FilterKind>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub min_width: Option<f64>,
    #[serde(default = "default_true")]
    pub resizable: bool,
    /// Initial visibility
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(skip)]
    pub render: Option<CellRenderer>,
    #[serde(skip)]
    pub export_render: Option<ExportRenderer>,
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: false,
            filterable: false,
            filter: None,
            width: None,
            min_width: None,
            resizable: true,
            visible: true,
            render: None,
            export_render: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn filterable(mut self, kind: FilterKind) -> Self {
        self.filterable = true;
        self.filter = Some(kind);
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn min_width(mut self, min_width: f64) -> Self {
        self.min_width = Some(min_width);
        self
    }

    pub fn fixed(mut self) -> Self {
        self.resizable = false;
        self
    }

    /// Start the column hidden.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&Row, Option<&Value>) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    pub fn export_render<F>(mut self, export_render: F) -> Self
    where
        F: Fn(&Row, Option<&Value>) -> ExportValue + Send + Sync + 'static,
    {
        self.export_render = Some(Arc::new(export_render));
        self
    }

    /// Display text for this column's cell in `row`.
    pub fn render_cell(&self, row: &Row) -> String {
        let value = crate::row::lookup(row, &self.key);
        match &self.render {
            Some(render) => render(row, value),
            None => crate::row::display_value(value),
        }
    }

    /// Export value for this column's cell in `row`.
    pub fn export_cell(&self, row: &Row) -> ExportValue {
        let value = crate::row::lookup(row, &self.key);
        match &self.export_render {
            Some(export_render) => export_render(row, value),
            None => ExportValue::from_raw(value),
        }
    }
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("filter", &self.filter)
            .field("width", &self.width)
            .field("min_width", &self.min_width)
            .field("resizable", &self.resizable)
            .field("visible", &self.visible)
            .field("render", &self.render.is_some())
            .field("export_render", &self.export_render.is_some())
            .finish()
    }
}
