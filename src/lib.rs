/*!
# Data Table

A generic, headless data table for the membership portal's admin screens
(teams, events, resources, groups, members), built in Rust.

## Overview

Every admin list in the portal is the same component pointed at different
rows: a single table abstraction that searches, filters, sorts, paginates or
virtualizes, tracks checked rows, lets the user show/hide and resize
columns, and exports what is on screen to Excel or PDF. The REST backend,
authentication and the individual forms live elsewhere; this crate only
receives rows that were already fetched.

## Architecture

### Data Pipeline
- **Search** - case-insensitive substring over configured fields (or every field)
- **Filter** - one substring filter per column, ANDed together
- **Sort** - one active key, stable, missing values last in both directions

The stages always run in that order and produce indices into the caller's
rows, so the raw data is never touched.

### Display
- **Pagination** - 1-based pages, always clamped into range
- **Virtual scrolling** - only rows near the viewport are mounted, with a
  spacer sized to the full row count

### State
- **Selection** - checked rows keyed by row identity, independent of the view
- **Column Registry** - visibility and widths, separate from the immutable
  column definitions

### Export
- XLSX through `rust_xlsxwriter`, paginated PDF through `printpdf`, plus CSV
- Exports follow the visible columns and the selected (or filtered) rows

## Modules

- **row**: dotted-path lookup, value coercion and ordering, row identity
- **column**: column definitions, filter widgets, export values
- **pipeline**: search -> filter -> sort
- **pagination**: page cursor and virtual-scroll window
- **selection**: checked-row set and select-all state
- **registry**: column visibility/width and the resize gesture
- **downloader**: export serialization (XLSX, PDF, CSV) and file naming
- **options**: table options and JSON configuration
- **table**: the `DataTable` tying it all together
- **loader**: row data from JSON or CSV files
- **app**: HTTP host for one table (feature `web`)

## REST API Endpoints (feature `web`)

- `GET /api/table` - Current view of the table
- `POST /api/search`, `/api/filter`, `/api/sort/{key}` - Pipeline inputs
- `POST /api/page/{page}`, `/api/scroll` - Pagination and virtual scroll
- `POST /api/rows/{id}/toggle`, `/api/select_all`, `/api/bulk/{label}` - Selection
- `POST /api/columns/{key}/toggle`, `/api/columns/{key}/width` - Column registry
- `GET /api/export/{format}` - Download as `xlsx`, `pdf` or `csv`
*/

pub mod column;
pub mod downloader;
pub mod error;
pub mod loader;
pub mod options;
pub mod pagination;
pub mod pipeline;
pub mod registry;
pub mod row;
pub mod selection;
pub mod table;

#[cfg(feature = "web")]
pub mod app;

pub use column::{ColumnDef, ExportValue, FilterKind};
pub use downloader::{ExportArtifact, ExportData, ExportFormat};
pub use error::{ExportError, TableError};
pub use options::{TableConfig, TableOptions};
pub use pagination::{DisplayMode, Pagination, Viewport, VirtualWindow};
pub use pipeline::{Query, SortDirection, SortState};
pub use registry::{ColumnRegistry, ResizeGesture};
pub use row::Row;
pub use selection::{SelectAllState, Selection};
pub use table::{BulkAction, DataTable, TableHandlers, TableView};
