use datatable::column::ColumnDef;
use datatable::options::TableOptions;
use datatable::pagination::{Pagination, Viewport, VirtualWindow};
use datatable::table::DataTable;
use serde_json::json;

fn viewport(scroll_top: f64, client_height: f64) -> Viewport {
    Viewport {
        scroll_top,
        client_height,
    }
}

#[test]
fn test_total_pages_is_ceiling() {
    let pagination = Pagination::new(3);
    assert_eq!(pagination.total_pages(0), 0);
    assert_eq!(pagination.total_pages(3), 1);
    assert_eq!(pagination.total_pages(7), 3);
}

#[test]
fn test_zero_page_size_means_one_row_per_page() {
    let mut pagination = Pagination::new(0);
    assert_eq!(pagination.page_size(), 1);
    assert_eq!(pagination.go_to(4, 5), 4);
    assert_eq!(pagination.slice_range(5), 3..4);
}

#[test]
fn test_window_near_the_end_is_cut_to_row_count() {
    let window = VirtualWindow::compute(40, 50.0, viewport(1800.0, 500.0), 5);
    assert_eq!((window.start, window.end), (31, 40));
    assert_eq!(window.len(), 9);
}

#[test]
fn test_huge_scroll_offset_mounts_nothing() {
    for scroll_top in [1e300, f64::INFINITY, f64::MAX] {
        let window = VirtualWindow::compute(100, 50.0, viewport(scroll_top, 500.0), 5);
        assert!(window.is_empty());
        assert_eq!(window.end, 100);
        assert_eq!(window.total_height, 5000.0);
    }
}

#[test]
fn test_huge_viewport_mounts_everything() {
    let window = VirtualWindow::compute(100, 50.0, viewport(0.0, f64::INFINITY), 5);
    assert_eq!((window.start, window.end), (0, 100));
}

#[test]
fn test_unusable_item_height_mounts_nothing() {
    for item_height in [0.0, -10.0, f64::NAN, f64::INFINITY] {
        let window = VirtualWindow::compute(100, item_height, viewport(0.0, 500.0), 5);
        assert!(window.is_empty());
        assert_eq!(window.total_height, 0.0);
    }
}

#[test]
fn test_table_survives_extreme_scroll_events() {
    let options = TableOptions {
        virtual_scrolling: true,
        ..TableOptions::default()
    };
    let rows = (1..=100).map(|i| json!({"id": i})).collect();
    let mut table = DataTable::new(vec![ColumnDef::new("id", "ID")], rows, options);

    assert!(table.on_scroll(1e300, 500.0).is_empty());
    assert!(table.on_scroll(f64::INFINITY, f64::INFINITY).is_empty());
    assert!(table.display_rows().is_empty());

    let window = table.on_scroll(f64::NAN, 500.0);
    assert_eq!(window.start, 0);
    assert_eq!(table.display_rows()[0]["id"], json!(1));
}
