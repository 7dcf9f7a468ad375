use crate::column::ColumnDef;
use crate::error::TableError;
use serde::Deserialize;
use std::path::Path;

/// Every recognised table option.
///
/// Deserializes from the camelCase option names the front end uses, with
/// each missing key falling back to its default.
///
/// # Examples
/// ```
/// use datatable::options::TableOptions;
///
/// let options: TableOptions =
///     serde_json::from_str(r#"{"pageSize": 25, "enableBulkSelection": true}"#).unwrap();
/// assert_eq!(options.page_size, 25);
/// assert!(options.enable_bulk_selection);
/// assert!(options.searchable);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TableOptions {
    pub searchable: bool,
    /// Fields the search reads; `None` reads every top-level field
    pub search_fields: Option<Vec<String>>,
    pub pagination: bool,
    pub page_size: usize,
    pub virtual_scrolling: bool,
    pub item_height: f64,
    /// Rows mounted above and below the viewport in virtual mode
    pub virtual_buffer: usize,
    pub enable_bulk_selection: bool,
    pub enable_column_management: bool,
    pub enable_excel_export: bool,
    #[serde(rename = "enablePDFExport")]
    pub enable_pdf_export: bool,
    pub enable_csv_export: bool,
    pub export_file_name: String,
    /// Dotted path to each row's identity
    pub row_key: String,
    pub sticky_header: bool,
    pub title: Option<String>,
    pub empty_message: String,
    pub class_name: Option<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            searchable: true,
            search_fields: None,
            pagination: true,
            page_size: 10,
            virtual_scrolling: false,
            item_height: 50.0,
            virtual_buffer: 5,
            enable_bulk_selection: false,
            enable_column_management: false,
            enable_excel_export: true,
            enable_pdf_export: true,
            enable_csv_export: false,
            export_file_name: "export".to_string(),
            row_key: "id".to_string(),
            sticky_header: true,
            title: None,
            empty_message: "No data available".to_string(),
            class_name: None,
        }
    }
}

/// Options plus column definitions, as stored in one JSON config file.
///
/// ```json
/// {
///   "options": { "title": "Members", "pageSize": 20 },
///   "columns": [
///     { "key": "id", "label": "ID", "width": 80 },
///     { "key": "name", "label": "Name", "sortable": true }
///   ]
/// }
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub options: TableOptions,
    pub columns: Vec<ColumnDef>,
}

impl TableConfig {
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
