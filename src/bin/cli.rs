#![cfg(not(tarpaulin_include))]

use datatable::loader::load_rows;
use datatable::options::TableConfig;
use datatable::table::{DataTable, TableView};
use datatable::{DisplayMode, ExportFormat, SelectAllState, SortDirection};
use std::env;
use std::io::{self, Write};
use std::time::Instant;

// Terminal characters per pixel of column width
const PIXELS_PER_CHAR: f64 = 10.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <config.json> <data.json|data.csv> [export-dir]", args[0]);
        return Ok(());
    }
    let export_dir = args.get(3).cloned().unwrap_or_else(|| ".".to_string());

    let config = TableConfig::from_file(&args[1])?;
    let rows = load_rows(&args[2])?;
    let mut table = DataTable::from_config(config, rows)
        .on_row_click(|row| println!("{}", row))
        .on_column_visibility_change(|key, visible| {
            println!("column {} {}", key, if visible { "shown" } else { "hidden" })
        })
        .bulk_action("print", |rows| {
            for row in rows {
                println!("{}", row);
            }
        });

    let mut start_time = Instant::now();
    let mut status = String::from("ok");
    let mut show = true;
    loop {
        if show {
            print_view(&table.view());
        }

        let elapsed_time = start_time.elapsed().as_secs_f64();
        print!("[{:.1}] ({}) > ", elapsed_time, status);
        io::stdout().flush()?;

        let mut command = String::new();
        if io::stdin().read_line(&mut command)? == 0 {
            break;
        }
        let command = command.trim();
        start_time = Instant::now();

        if command == "q" {
            break;
        }
        if command == "help" {
            print_help();
            continue;
        }
        if command == "disable_output" {
            show = false;
            status = String::from("ok");
            continue;
        }
        if command == "enable_output" {
            show = true;
            status = String::from("ok");
            continue;
        }

        status = execute_command(&mut table, command, &export_dir);
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  q                       Quit");
    println!("  search <term>           Free-text search (empty clears)");
    println!("  filter <key> [value]    Column filter (no value clears)");
    println!("  sort <key>              Cycle sort on a column");
    println!("  page <n> | n | p        Go to page / next / previous");
    println!("  scroll <top> <height>   Move the virtual-scroll viewport");
    println!("  select <id>             Toggle a row");
    println!("  all                     Toggle select-all");
    println!("  bulk <label>            Run a bulk action on selected rows");
    println!("  click <id>              Click a row");
    println!("  col <key>               Show/hide a column");
    println!("  resize <key> <dx>       Drag a column edge by dx pixels");
    println!("  reset                   Clear search, filters, sort and selection");
    println!("  export <xlsx|pdf|csv>   Export to the export directory");
    println!("  disable_output / enable_output");
}

fn execute_command(table: &mut DataTable, command: &str, export_dir: &str) -> String {
    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    let rest = rest.trim();

    match name {
        "search" => {
            table.set_search(rest);
            "ok".to_string()
        }
        "filter" => {
            let (key, value) = rest.split_once(' ').unwrap_or((rest, ""));
            if key.is_empty() {
                return "invalid command".to_string();
            }
            table.set_filter(key, value.trim());
            "ok".to_string()
        }
        "sort" => match table.toggle_sort(rest) {
            Some(sort) => format!("sorted by {} {:?}", sort.key, sort.direction),
            None => "unsorted".to_string(),
        },
        "page" => format!("page {}", table.go_to_page_str(rest)),
        "n" => format!("page {}", table.next_page()),
        "p" => format!("page {}", table.previous_page()),
        "scroll" => {
            let mut parts = rest.split_whitespace().map(str::parse::<f64>);
            match (parts.next(), parts.next()) {
                (Some(Ok(top)), Some(Ok(height))) => {
                    let window = table.on_scroll(top, height);
                    format!("rows {}..{}", window.start, window.end)
                }
                _ => "invalid command".to_string(),
            }
        }
        "select" => {
            if table.toggle_row(rest) {
                "selected".to_string()
            } else {
                "not selected".to_string()
            }
        }
        "all" => {
            table.toggle_select_all();
            format!("{} selected", table.selected_ids().len())
        }
        "bulk" => {
            if table.run_bulk_action(rest) {
                "ok".to_string()
            } else {
                "nothing to do".to_string()
            }
        }
        "click" => {
            if table.click_row(rest) {
                "ok".to_string()
            } else {
                "no such row".to_string()
            }
        }
        "col" => match table.toggle_column(rest) {
            Some(true) => "shown".to_string(),
            Some(false) => "hidden".to_string(),
            None => "invalid column".to_string(),
        },
        "resize" => {
            let (key, dx) = rest.split_once(' ').unwrap_or((rest, ""));
            let Ok(dx) = dx.trim().parse::<f64>() else {
                return "invalid command".to_string();
            };
            match table.begin_column_resize(key, 0.0) {
                Some(gesture) => format!("width {}", gesture.release(dx)),
                None => "invalid column".to_string(),
            }
        }
        "reset" => {
            table.reset_filters();
            "ok".to_string()
        }
        "export" => {
            let format = match rest.parse::<ExportFormat>() {
                Ok(format) => format,
                Err(message) => return message,
            };
            match table.export(format).and_then(|artifact| Ok(artifact.write_to(export_dir)?)) {
                Ok(path) => format!("wrote {}", path.display()),
                Err(e) => e.to_string(),
            }
        }
        _ => "invalid command".to_string(),
    }
}

fn print_view(view: &TableView) {
    if let Some(title) = &view.title {
        println!("{}", title);
    }

    let widths: Vec<usize> = view
        .columns
        .iter()
        .map(|column| ((column.width / PIXELS_PER_CHAR) as usize).max(4))
        .collect();
    let checkbox = view.selection.is_some();

    let mut header = String::new();
    if let Some(selection) = &view.selection {
        header.push_str(match selection.select_all {
            SelectAllState::Checked => "[x] ",
            SelectAllState::Indeterminate => "[-] ",
            SelectAllState::Unchecked => "[ ] ",
        });
    }
    for (column, width) in view.columns.iter().zip(&widths) {
        let marker = match column.sort {
            Some(SortDirection::Ascending) => "^",
            Some(SortDirection::Descending) => "v",
            None => "",
        };
        header.push_str(&fit(&format!("{}{}", column.label, marker), *width));
        header.push(' ');
    }
    println!("{}", header);

    if let Some(message) = &view.empty_message {
        println!("  {}", message);
    }
    for row in &view.rows {
        let mut line = String::new();
        if checkbox {
            line.push_str(if row.selected { "[x] " } else { "[ ] " });
        }
        for (cell, width) in row.cells.iter().zip(&widths) {
            line.push_str(&fit(cell, *width));
            line.push(' ');
        }
        println!("{}", line);
    }

    match view.mode {
        DisplayMode::Paginated => {
            if let Some(page) = &view.pagination {
                println!(
                    "page {}/{} ({} of {} rows)",
                    page.page, page.total_pages, view.filtered_rows, view.total_rows
                );
            }
        }
        DisplayMode::Virtual => {
            if let Some(window) = &view.virtual_window {
                println!(
                    "rows {}..{} of {} (offset {}px, spacer {}px)",
                    window.start, window.end, view.filtered_rows, window.offset_y, window.total_height
                );
            }
        }
        DisplayMode::All => println!("{} of {} rows", view.filtered_rows, view.total_rows),
    }
}

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}
