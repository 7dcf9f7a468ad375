//! The data table: one owner for rows, query, pagination, selection and
//! column state, plus the callbacks a host wires in.

use crate::column::{ColumnDef, FilterKind};
use crate::downloader::{self, ExportArtifact, ExportData, ExportFormat};
use crate::error::ExportError;
use crate::options::{TableConfig, TableOptions};
use crate::pagination::{DisplayMode, Pagination, Viewport, VirtualWindow};
use crate::pipeline::{Query, SearchScope, SortDirection, SortState};
use crate::registry::{ColumnRegistry, ResizeGesture};
use crate::row::{Row, row_identity};
use crate::selection::{SelectAllState, Selection};
use chrono::{NaiveDate, Utc};
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub type RowCallback = Arc<dyn Fn(&Row) + Send + Sync>;
pub type VisibilityCallback = Arc<dyn Fn(&str, bool) + Send + Sync>;
pub type BulkHandler = Arc<dyn Fn(&[&Row]) + Send + Sync>;

/// A button that runs against the currently selected rows.
#[derive(Clone)]
pub struct BulkAction {
    pub label: String,
    handler: BulkHandler,
}

impl BulkAction {
    pub fn new<F>(label: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[&Row]) + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            handler: Arc::new(handler),
        }
    }
}

impl fmt::Debug for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Host callbacks. Each receives borrowed rows and cannot mutate them.
#[derive(Clone, Default)]
pub struct TableHandlers {
    pub on_row_click: Option<RowCallback>,
    pub on_column_visibility_change: Option<VisibilityCallback>,
    pub bulk_actions: Vec<BulkAction>,
}

/// Generic table over arbitrary JSON rows.
///
/// Derived rows are recomputed synchronously after every change to the
/// data, search, filters or sort, so reads never observe stale state.
///
/// # Examples
/// ```
/// use datatable::column::ColumnDef;
/// use datatable::options::TableOptions;
/// use datatable::table::DataTable;
/// use serde_json::json;
///
/// let columns = vec![ColumnDef::new("id", "ID"), ColumnDef::new("name", "Name").sortable()];
/// let rows = vec![json!({"id": 1, "name": "b"}), json!({"id": 2, "name": "a"})];
/// let mut table = DataTable::new(columns, rows, TableOptions::default());
///
/// table.toggle_sort("name");
/// let names: Vec<_> = table.display_rows().iter().map(|r| r["name"].clone()).collect();
/// assert_eq!(names, vec![json!("a"), json!("b")]);
/// ```
pub struct DataTable {
    options: TableOptions,
    columns: Vec<ColumnDef>,
    rows: Vec<Row>,
    ids: Vec<String>,
    query: Query,
    processed: Vec<usize>,
    pagination: Pagination,
    viewport: Viewport,
    selection: Selection,
    registry: ColumnRegistry,
    handlers: TableHandlers,
}

impl DataTable {
    pub fn new(columns: Vec<ColumnDef>, rows: Vec<Row>, options: TableOptions) -> Self {
        let registry = ColumnRegistry::from_columns(&columns);
        let pagination = Pagination::new(options.page_size);
        let mut table = Self {
            options,
            columns,
            rows: Vec::new(),
            ids: Vec::new(),
            query: Query::new(),
            processed: Vec::new(),
            pagination,
            viewport: Viewport::default(),
            selection: Selection::new(),
            registry,
            handlers: TableHandlers::default(),
        };
        table.set_data(rows);
        table
    }

    pub fn from_config(config: TableConfig, rows: Vec<Row>) -> Self {
        Self::new(config.columns, rows, config.options)
    }

    pub fn with_handlers(mut self, handlers: TableHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn on_row_click<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Row) + Send + Sync + 'static,
    {
        self.handlers.on_row_click = Some(Arc::new(callback));
        self
    }

    pub fn on_column_visibility_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, bool) + Send + Sync + 'static,
    {
        self.handlers.on_column_visibility_change = Some(Arc::new(callback));
        self
    }

    pub fn bulk_action<F>(mut self, label: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[&Row]) + Send + Sync + 'static,
    {
        self.handlers.bulk_actions.push(BulkAction::new(label, handler));
        self
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    // ---------------------------------------------------------------------
    // Data
    // ---------------------------------------------------------------------

    /// Replace the raw rows.
    ///
    /// Identities are re-resolved; selected ids that no longer exist are
    /// dropped and the page is clamped to the new row count.
    pub fn set_data(&mut self, rows: Vec<Row>) {
        let row_key = self.options.row_key.clone();
        let mut fallbacks = 0;
        self.ids = rows
            .iter()
            .map(|row| {
                row_identity(row, &row_key).unwrap_or_else(|| {
                    fallbacks += 1;
                    Uuid::new_v4().to_string()
                })
            })
            .collect();
        if fallbacks > 0 {
            warn!(
                "{} of {} rows have no value at row key '{}'; generated identities are used",
                fallbacks,
                rows.len(),
                row_key
            );
        }
        self.rows = rows;

        let known: HashSet<&str> = self.ids.iter().map(String::as_str).collect();
        self.selection.retain_known(&known);

        self.recompute();
        self.pagination.clamp(self.processed.len());
    }

    /// Identity of the raw row at `index`.
    pub fn row_id(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }

    // ---------------------------------------------------------------------
    // Pipeline
    // ---------------------------------------------------------------------

    fn recompute(&mut self) {
        let scope = SearchScope {
            enabled: self.options.searchable,
            fields: self.options.search_fields.as_deref(),
        };
        self.processed = self.query.apply(&self.rows, &scope);
    }

    /// Recompute after a query change; always lands back on page 1.
    fn query_changed(&mut self) {
        self.recompute();
        self.pagination.reset();
        debug!(
            "query changed: {} of {} rows match",
            self.processed.len(),
            self.rows.len()
        );
    }

    pub fn search(&self) -> &str {
        &self.query.search
    }

    pub fn set_search(&mut self, term: &str) {
        if self.query.search == term {
            return;
        }
        self.query.search = term.to_string();
        self.query_changed();
    }

    pub fn filter(&self, key: &str) -> &str {
        self.query.filter(key)
    }

    /// Set one column filter; an empty value clears it.
    pub fn set_filter(&mut self, key: &str, value: &str) {
        if self.query.filter(key) == value {
            return;
        }
        self.query.set_filter(key, value);
        self.query_changed();
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.query.sort.as_ref()
    }

    /// Header click on a sortable column: unsorted -> asc -> desc -> unsorted.
    pub fn toggle_sort(&mut self, key: &str) -> Option<&SortState> {
        let sortable = self
            .columns
            .iter()
            .any(|column| column.key == key && column.sortable);
        if !sortable {
            debug!("ignoring sort on non-sortable column '{}'", key);
            return self.query.sort.as_ref();
        }

        self.query.sort = SortState::toggle(self.query.sort.as_ref(), key);
        self.query_changed();
        self.query.sort.as_ref()
    }

    /// Clear search, filters, sort and selection. Column state is kept.
    pub fn reset_filters(&mut self) {
        self.query = Query::new();
        self.selection.clear();
        self.query_changed();
    }

    /// Rows after search, filter and sort, in display order.
    pub fn processed_rows(&self) -> Vec<&Row> {
        self.processed.iter().map(|&i| &self.rows[i]).collect()
    }

    /// Identities of [`processed_rows`](Self::processed_rows), same order.
    pub fn processed_ids(&self) -> Vec<&str> {
        self.processed.iter().map(|&i| self.ids[i].as_str()).collect()
    }

    pub fn filtered_count(&self) -> usize {
        self.processed.len()
    }

    // ---------------------------------------------------------------------
    // Pagination / virtualization
    // ---------------------------------------------------------------------

    pub fn display_mode(&self) -> DisplayMode {
        if self.options.virtual_scrolling {
            DisplayMode::Virtual
        } else if self.options.pagination {
            DisplayMode::Paginated
        } else {
            DisplayMode::All
        }
    }

    pub fn page(&self) -> usize {
        self.pagination.page()
    }

    pub fn total_pages(&self) -> usize {
        self.pagination.total_pages(self.processed.len())
    }

    /// Navigate to `page`, clamped into range. Returns the landed page.
    pub fn go_to_page(&mut self, page: i64) -> usize {
        self.pagination.go_to(page, self.processed.len())
    }

    /// Navigate from unparsed input; non-numeric input lands on page 1.
    pub fn go_to_page_str(&mut self, page: &str) -> usize {
        self.pagination.go_to_str(page, self.processed.len())
    }

    pub fn next_page(&mut self) -> usize {
        self.pagination.next(self.processed.len())
    }

    pub fn previous_page(&mut self) -> usize {
        self.pagination.previous(self.processed.len())
    }

    /// Scroll or resize event from the scroll container.
    pub fn on_scroll(&mut self, scroll_top: f64, client_height: f64) -> VirtualWindow {
        self.viewport = Viewport {
            scroll_top,
            client_height,
        };
        self.virtual_window()
    }

    pub fn virtual_window(&self) -> VirtualWindow {
        VirtualWindow::compute(
            self.processed.len(),
            self.options.item_height,
            self.viewport,
            self.options.virtual_buffer,
        )
    }

    fn display_indices(&self) -> &[usize] {
        let range = match self.display_mode() {
            DisplayMode::Paginated => self.pagination.slice_range(self.processed.len()),
            DisplayMode::Virtual => self.virtual_window().range(),
            DisplayMode::All => 0..self.processed.len(),
        };
        &self.processed[range]
    }

    /// Rows to mount right now: the current page, the virtual window, or
    /// everything, depending on [`display_mode`](Self::display_mode).
    pub fn display_rows(&self) -> Vec<&Row> {
        self.display_indices()
            .iter()
            .map(|&i| &self.rows[i])
            .collect()
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.is_selected(id)
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.selected()
    }

    /// Flip one row's checkbox. Returns whether it is selected afterwards.
    pub fn toggle_row(&mut self, id: &str) -> bool {
        if !self.options.enable_bulk_selection {
            debug!("bulk selection disabled; ignoring toggle of '{}'", id);
            return false;
        }
        if self.index_of(id).is_none() {
            debug!("ignoring toggle of unknown row '{}'", id);
            return false;
        }
        self.selection.toggle(id)
    }

    /// Header checkbox click.
    ///
    /// Selects exactly the filtered rows unless they are all selected
    /// already, in which case the entire selection is cleared, including
    /// rows selected under another filter.
    pub fn toggle_select_all(&mut self) {
        if !self.options.enable_bulk_selection || self.processed.is_empty() {
            return;
        }
        let ids: Vec<&str> = self.processed.iter().map(|&i| self.ids[i].as_str()).collect();
        self.selection.toggle_all(ids.iter().copied());
    }

    pub fn select_all_state(&self) -> SelectAllState {
        self.selection.state(self.processed.iter().map(|&i| self.ids[i].as_str()))
    }

    /// Selected rows resolved against the current filtered/sorted set, in
    /// display order.
    pub fn selected_rows(&self) -> Vec<&Row> {
        self.processed
            .iter()
            .filter(|&&i| self.selection.is_selected(&self.ids[i]))
            .map(|&i| &self.rows[i])
            .collect()
    }

    /// Run the bulk action named `label`. Returns false if there is no such
    /// action or nothing selected in the current view.
    pub fn run_bulk_action(&self, label: &str) -> bool {
        let Some(action) = self
            .handlers
            .bulk_actions
            .iter()
            .find(|action| action.label == label)
        else {
            debug!("no bulk action named '{}'", label);
            return false;
        };

        let rows = self.selected_rows();
        if rows.is_empty() {
            return false;
        }
        (action.handler)(&rows);
        true
    }

    /// Fire the row-click callback for `id`.
    pub fn click_row(&self, id: &str) -> bool {
        match (&self.handlers.on_row_click, self.index_of(id)) {
            (Some(callback), Some(index)) => {
                callback(&self.rows[index]);
                true
            }
            _ => false,
        }
    }

    // ---------------------------------------------------------------------
    // Columns
    // ---------------------------------------------------------------------

    pub fn column_registry(&self) -> &ColumnRegistry {
        &self.registry
    }

    /// Shown column definitions, in definition order.
    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        self.registry.visible_columns(&self.columns)
    }

    /// Show or hide a column. Returns the new visibility, or `None` when
    /// column management is off or the key is unknown.
    pub fn toggle_column(&mut self, key: &str) -> Option<bool> {
        if !self.options.enable_column_management {
            debug!("column management disabled; ignoring toggle of '{}'", key);
            return None;
        }
        let visible = self.registry.toggle(key)?;
        if let Some(callback) = &self.handlers.on_column_visibility_change {
            callback(key, visible);
        }
        Some(visible)
    }

    pub fn column_width(&self, key: &str) -> f64 {
        self.registry.width(key)
    }

    /// Set a column width directly, held at the column's minimum.
    pub fn set_column_width(&mut self, key: &str, width: f64) -> Option<f64> {
        let resizable = self
            .columns
            .iter()
            .any(|column| column.key == key && column.resizable);
        if !resizable {
            return None;
        }
        self.registry.set_width(key, width)
    }

    /// Press on a column edge; see [`ColumnRegistry::begin_resize`].
    pub fn begin_column_resize(&mut self, key: &str, start_x: f64) -> Option<ResizeGesture<'_>> {
        self.registry.begin_resize(key, start_x)
    }

    // ---------------------------------------------------------------------
    // Export
    // ---------------------------------------------------------------------

    /// Export is only offered while there are rows to export.
    pub fn can_export(&self) -> bool {
        !self.export_rows().is_empty()
    }

    pub fn export_enabled(&self, format: ExportFormat) -> bool {
        match format {
            ExportFormat::Xlsx => self.options.enable_excel_export,
            ExportFormat::Pdf => self.options.enable_pdf_export,
            ExportFormat::Csv => self.options.enable_csv_export,
        }
    }

    pub fn export_formats(&self) -> Vec<ExportFormat> {
        [ExportFormat::Xlsx, ExportFormat::Pdf, ExportFormat::Csv]
            .into_iter()
            .filter(|&format| self.export_enabled(format))
            .collect()
    }

    /// The selected rows when bulk selection is on and anything is
    /// selected, otherwise the whole filtered/sorted set.
    pub fn export_rows(&self) -> Vec<&Row> {
        if self.options.enable_bulk_selection && !self.selection.is_empty() {
            self.selected_rows()
        } else {
            self.processed_rows()
        }
    }

    /// Resolve headers and cells for the visible columns.
    pub fn export_data(&self) -> ExportData {
        let columns = self.visible_columns();
        ExportData {
            title: self.options.title.clone(),
            headers: columns.iter().map(|column| column.label.clone()).collect(),
            widths: columns
                .iter()
                .map(|column| self.registry.width(&column.key))
                .collect(),
            rows: self
                .export_rows()
                .into_iter()
                .map(|row| columns.iter().map(|column| column.export_cell(row)).collect())
                .collect(),
            sticky_header: self.options.sticky_header,
        }
    }

    /// Export dated today (UTC).
    pub fn export(&self, format: ExportFormat) -> Result<ExportArtifact, ExportError> {
        self.export_dated(format, Utc::now().date_naive())
    }

    pub fn export_dated(
        &self,
        format: ExportFormat,
        date: NaiveDate,
    ) -> Result<ExportArtifact, ExportError> {
        if !self.export_enabled(format) {
            return Err(ExportError::Disabled(format));
        }
        if !self.can_export() {
            return Err(ExportError::Empty);
        }
        let data = self.export_data();
        if data.rows.is_empty() {
            return Err(ExportError::Empty);
        }
        downloader::export(&data, format, &self.options.export_file_name, date)
    }

    // ---------------------------------------------------------------------
    // View
    // ---------------------------------------------------------------------

    /// Snapshot of everything a front end needs to draw the table.
    pub fn view(&self) -> TableView {
        let columns = self.visible_columns();
        let bulk = self.options.enable_bulk_selection;

        let rows: Vec<RowView> = self
            .display_indices()
            .iter()
            .map(|&i| {
                let row = &self.rows[i];
                RowView {
                    id: self.ids[i].clone(),
                    selected: self.selection.is_selected(&self.ids[i]),
                    cells: columns.iter().map(|column| column.render_cell(row)).collect(),
                }
            })
            .collect();

        let mode = self.display_mode();
        TableView {
            title: self.options.title.clone(),
            class_name: self.options.class_name.clone(),
            sticky_header: self.options.sticky_header,
            mode,
            columns: columns
                .iter()
                .map(|column| ColumnView {
                    key: column.key.clone(),
                    label: column.label.clone(),
                    width: self.registry.width(&column.key),
                    min_width: self.registry.min_width(&column.key),
                    sortable: column.sortable,
                    resizable: column.resizable,
                    sort: self
                        .query
                        .sort
                        .as_ref()
                        .filter(|sort| sort.key == column.key)
                        .map(|sort| sort.direction),
                    filter: column.filterable.then(|| {
                        column.filter.clone().unwrap_or(FilterKind::Text)
                    }),
                    filter_value: self.query.filter(&column.key).to_string(),
                })
                .collect(),
            column_toggles: if self.options.enable_column_management {
                self.columns
                    .iter()
                    .map(|column| ColumnToggle {
                        key: column.key.clone(),
                        label: column.label.clone(),
                        visible: self.registry.is_visible(&column.key),
                    })
                    .collect()
            } else {
                Vec::new()
            },
            empty_message: self
                .processed
                .is_empty()
                .then(|| self.options.empty_message.clone()),
            rows,
            pagination: (mode == DisplayMode::Paginated).then(|| PageInfo {
                page: self.pagination.page(),
                page_size: self.pagination.page_size(),
                total_pages: self.total_pages(),
            }),
            virtual_window: (mode == DisplayMode::Virtual).then(|| self.virtual_window()),
            search: self.query.search.clone(),
            filters: self.query.filters.clone(),
            total_rows: self.rows.len(),
            filtered_rows: self.processed.len(),
            selection: bulk.then(|| SelectionView {
                select_all: self.select_all_state(),
                select_all_enabled: !self.processed.is_empty(),
                selected_count: self.selection.len(),
                bulk_actions: self
                    .handlers
                    .bulk_actions
                    .iter()
                    .map(|action| action.label.clone())
                    .collect(),
            }),
            can_export: self.can_export(),
            export_formats: self.export_formats(),
        }
    }
}

impl fmt::Debug for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTable")
            .field("options", &self.options)
            .field("columns", &self.columns.len())
            .field("rows", &self.rows.len())
            .field("query", &self.query)
            .field("filtered", &self.processed.len())
            .field("page", &self.pagination.page())
            .field("selected", &self.selection.len())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub title: Option<String>,
    pub class_name: Option<String>,
    pub sticky_header: bool,
    pub mode: DisplayMode,
    pub columns: Vec<ColumnView>,
    /// Every defined column with its visibility, for the show/hide panel
    pub column_toggles: Vec<ColumnToggle>,
    pub rows: Vec<RowView>,
    pub empty_message: Option<String>,
    pub pagination: Option<PageInfo>,
    pub virtual_window: Option<VirtualWindow>,
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub selection: Option<SelectionView>,
    pub can_export: bool,
    pub export_formats: Vec<ExportFormat>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    pub key: String,
    pub label: String,
    pub width: f64,
    pub min_width: f64,
    pub sortable: bool,
    pub resizable: bool,
    pub sort: Option<SortDirection>,
    pub filter: Option<FilterKind>,
    pub filter_value: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ColumnToggle {
    pub key: String,
    pub label: String,
    pub visible: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct RowView {
    pub id: String,
    pub selected: bool,
    pub cells: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView {
    pub select_all: SelectAllState,
    pub select_all_enabled: bool,
    pub selected_count: usize,
    pub bulk_actions: Vec<String>,
}
