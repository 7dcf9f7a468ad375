use crate::column::ExportValue;
use crate::error::ExportError;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

lazy_static! {
    static ref UNSAFE_FILE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.\-]").unwrap();
}

/// Fixed worksheet name used by spreadsheet exports.
pub const SHEET_NAME: &str = "Data";

// PDF layout: A4 landscape, in millimetres (font sizes in points)
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 12.0;
const TITLE_HEIGHT: f32 = 14.0;
const HEADER_HEIGHT: f32 = 8.0;
const ROW_HEIGHT: f32 = 7.0;
const FOOTER_HEIGHT: f32 = 8.0;
const CELL_PADDING: f32 = 1.5;

const TITLE_SIZE: f32 = 14.0;
const HEADER_SIZE: f32 = 9.0;
const BODY_SIZE: f32 = 8.0;

const PT_TO_MM: f32 = 0.3528;
// Average Helvetica glyph advance as a fraction of the font size
const GLYPH_WIDTH: f32 = 0.5;
// Approximate pixels per spreadsheet character unit
const PIXELS_PER_CHAR: f64 = 7.0;

/// Output formats an export can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Pdf,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "pdf" => Ok(ExportFormat::Pdf),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

/// Resolved export content: one header per visible column and one
/// already-formatted value per visible cell.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportData {
    pub title: Option<String>,
    pub headers: Vec<String>,
    /// Current column widths in pixels, parallel to `headers`
    pub widths: Vec<f64>,
    pub rows: Vec<Vec<ExportValue>>,
    /// Freeze the header row in spreadsheet output
    pub sticky_header: bool,
}

impl ExportData {
    /// Body matrix coerced to strings; empty cells become `""`.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(ExportValue::as_text).collect())
            .collect()
    }
}

/// A finished download: file name, MIME type and bytes.
#[derive(Clone, Debug)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write the artifact into `dir` under its own file name.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Build the download name `{base}_{YYYY-MM-DD}.{ext}`.
///
/// Characters outside `[A-Za-z0-9_.-]` in the base are replaced with `_`.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use datatable::downloader::{ExportFormat, export_file_name};
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// assert_eq!(
///     export_file_name("members list", date, ExportFormat::Pdf),
///     "members_list_2024-03-09.pdf"
/// );
/// ```
pub fn export_file_name(base: &str, date: NaiveDate, format: ExportFormat) -> String {
    let base = if base.trim().is_empty() { "export" } else { base.trim() };
    let safe = UNSAFE_FILE_CHARS.replace_all(base, "_");
    format!("{}_{}.{}", safe, date.format("%Y-%m-%d"), format.extension())
}

/// Serialize `data` into `format` and wrap it with its download name.
pub fn export(
    data: &ExportData,
    format: ExportFormat,
    base_name: &str,
    date: NaiveDate,
) -> Result<ExportArtifact, ExportError> {
    let bytes = match format {
        ExportFormat::Xlsx => to_xlsx(data)?,
        ExportFormat::Pdf => to_pdf(data)?,
        ExportFormat::Csv => to_csv(data).into_bytes(),
    };

    let file_name = export_file_name(base_name, date, format);
    info!(
        "exported {} rows x {} columns to {} ({} bytes)",
        data.rows.len(),
        data.headers.len(),
        file_name,
        bytes.len()
    );

    Ok(ExportArtifact {
        file_name,
        content_type: format.content_type(),
        bytes,
    })
}

/// Convert export data to CSV format
///
/// The first line holds the column labels. Values containing commas,
/// quotes or newlines are quoted, with embedded quotes doubled.
pub fn to_csv(data: &ExportData) -> String {
    let mut csv_content = String::new();

    push_csv_line(&mut csv_content, data.headers.iter().map(String::as_str));
    for row in data.text_rows() {
        push_csv_line(&mut csv_content, row.iter().map(String::as_str));
    }

    csv_content
}

fn push_csv_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, value) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if value.contains(',') || value.contains('"') || value.contains('\n') {
            let escaped = value.replace('"', "\"\"");
            out.push_str(&format!("\"{}\"", escaped));
        } else {
            out.push_str(value);
        }
    }
    out.push('\n');
}

/// Convert export data to XLSX format
///
/// Writes one worksheet named [`SHEET_NAME`] with a bold header row.
/// Numbers and booleans keep their cell types; empty values leave the cell
/// blank.
///
/// # Returns
/// * `Result<Vec<u8>, ExportError>` - XLSX file content as bytes or an error
pub fn to_xlsx(data: &ExportData) -> Result<Vec<u8>, ExportError> {
    use rust_xlsxwriter::{Format, Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    for (c, label) in data.headers.iter().enumerate() {
        let col = c as u16;
        worksheet.write_string_with_format(0, col, label.as_str(), &header_format)?;
        if let Some(width) = data.widths.get(c) {
            worksheet.set_column_width(col, (width / PIXELS_PER_CHAR).max(1.0))?;
        }
    }

    for (r, row) in data.rows.iter().enumerate() {
        let xl_row = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let col = c as u16;
            match value {
                ExportValue::Empty => {}
                ExportValue::Text(s) => {
                    worksheet.write_string(xl_row, col, s.as_str())?;
                }
                ExportValue::Number(n) => {
                    worksheet.write_number(xl_row, col, *n)?;
                }
                ExportValue::Bool(b) => {
                    worksheet.write_boolean(xl_row, col, *b)?;
                }
            }
        }
    }

    if data.sticky_header {
        worksheet.set_freeze_panes(1, 0)?;
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Convert export data to a paginated PDF table
///
/// A4 landscape. The optional title banner sits above the first page's
/// table; every page repeats the header row on a dark fill, shades every
/// other body row and carries a `Page n of m` footer.
pub fn to_pdf(data: &ExportData) -> Result<Vec<u8>, ExportError> {
    use printpdf::{BuiltinFont, Mm, PdfDocument, Rect};

    let doc_title = data.title.as_deref().unwrap_or("Export");
    let (doc, first_page, first_layer) =
        PdfDocument::new(doc_title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Table");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let table_width = PAGE_WIDTH - 2.0 * MARGIN;
    let widths = pdf_column_widths(&data.widths, data.headers.len(), table_width);
    let body = data.text_rows();
    let pages = pdf_pages(body.len(), data.title.is_some());
    let page_count = pages.len();

    for (page_no, range) in pages.into_iter().enumerate() {
        let layer = if page_no == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Table");
            doc.get_page(page).get_layer(layer)
        };

        let mut y = PAGE_HEIGHT - MARGIN;

        if page_no == 0 {
            if let Some(title) = &data.title {
                layer.set_fill_color(rgb(TEXT));
                layer.use_text(
                    title.as_str(),
                    TITLE_SIZE,
                    Mm(MARGIN),
                    Mm(y - TITLE_HEIGHT + 5.0),
                    &bold,
                );
                y -= TITLE_HEIGHT;
            }
        }

        layer.set_fill_color(rgb(HEADER_FILL));
        layer.add_rect(Rect::new(
            Mm(MARGIN),
            Mm(y - HEADER_HEIGHT),
            Mm(MARGIN + table_width),
            Mm(y),
        ));
        layer.set_fill_color(rgb(HEADER_TEXT));
        let mut x = MARGIN;
        for (label, width) in data.headers.iter().zip(&widths) {
            layer.use_text(
                fit_text(label, *width, HEADER_SIZE),
                HEADER_SIZE,
                Mm(x + CELL_PADDING),
                Mm(y - HEADER_HEIGHT + 2.8),
                &bold,
            );
            x += width;
        }
        y -= HEADER_HEIGHT;

        for index in range {
            if index % 2 == 1 {
                layer.set_fill_color(rgb(STRIPE_FILL));
                layer.add_rect(Rect::new(
                    Mm(MARGIN),
                    Mm(y - ROW_HEIGHT),
                    Mm(MARGIN + table_width),
                    Mm(y),
                ));
            }

            layer.set_fill_color(rgb(TEXT));
            let mut x = MARGIN;
            for (cell, width) in body[index].iter().zip(&widths) {
                layer.use_text(
                    fit_text(cell, *width, BODY_SIZE),
                    BODY_SIZE,
                    Mm(x + CELL_PADDING),
                    Mm(y - ROW_HEIGHT + 2.4),
                    &regular,
                );
                x += width;
            }
            y -= ROW_HEIGHT;
        }

        layer.set_fill_color(rgb(MUTED_TEXT));
        layer.use_text(
            format!("Page {} of {}", page_no + 1, page_count),
            BODY_SIZE,
            Mm(PAGE_WIDTH - MARGIN - 25.0),
            Mm(MARGIN / 2.0),
            &regular,
        );
    }

    doc.save_to_bytes().map_err(pdf_error)
}

const TEXT: (f32, f32, f32) = (0.1, 0.1, 0.1);
const MUTED_TEXT: (f32, f32, f32) = (0.45, 0.45, 0.45);
const HEADER_FILL: (f32, f32, f32) = (0.16, 0.5, 0.73);
const HEADER_TEXT: (f32, f32, f32) = (1.0, 1.0, 1.0);
const STRIPE_FILL: (f32, f32, f32) = (0.96, 0.96, 0.96);

fn rgb((r, g, b): (f32, f32, f32)) -> printpdf::Color {
    printpdf::Color::Rgb(printpdf::Rgb::new(r, g, b, None))
}

fn pdf_error(err: impl fmt::Display) -> ExportError {
    ExportError::Pdf(err.to_string())
}

/// Scale pixel widths to fill `table_width` millimetres. Falls back to equal
/// widths when the pixel widths are missing or unusable.
fn pdf_column_widths(widths: &[f64], columns: usize, table_width: f32) -> Vec<f32> {
    if columns == 0 {
        return Vec::new();
    }
    let total: f64 = widths.iter().take(columns).sum();
    if widths.len() < columns || !(total > 0.0) {
        return vec![table_width / columns as f32; columns];
    }
    widths
        .iter()
        .take(columns)
        .map(|w| (w / total) as f32 * table_width)
        .collect()
}

/// Split `row_count` body rows into page ranges. The first page loses room
/// to the title banner. Always yields at least one (possibly empty) page.
fn pdf_pages(row_count: usize, has_title: bool) -> Vec<std::ops::Range<usize>> {
    let usable = PAGE_HEIGHT - 2.0 * MARGIN - HEADER_HEIGHT - FOOTER_HEIGHT;
    let per_page = ((usable / ROW_HEIGHT).floor() as usize).max(1);
    let title_rows = if has_title {
        (TITLE_HEIGHT / ROW_HEIGHT).ceil() as usize
    } else {
        0
    };
    let first_page = per_page.saturating_sub(title_rows).max(1);

    let mut pages = Vec::new();
    let mut start = 0;
    let mut capacity = first_page;
    loop {
        let end = (start + capacity).min(row_count);
        pages.push(start..end);
        if end >= row_count {
            break;
        }
        start = end;
        capacity = per_page;
    }
    pages
}

/// Cut `text` to what fits in `width_mm` at `font_size`, ending with `...`.
fn fit_text(text: &str, width_mm: f32, font_size: f32) -> String {
    let glyph = font_size * GLYPH_WIDTH * PT_TO_MM;
    let max_chars = ((width_mm - 2.0 * CELL_PADDING) / glyph).floor().max(0.0) as usize;
    let single_line = text.replace(['\n', '\r'], " ");

    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    if max_chars <= 3 {
        return single_line.chars().take(max_chars).collect();
    }
    let mut cut: String = single_line.chars().take(max_chars - 3).collect();
    cut.push_str("...");
    cut
}
