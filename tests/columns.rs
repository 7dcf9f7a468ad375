use datatable::column::ColumnDef;
use datatable::options::TableOptions;
use datatable::registry::{ColumnRegistry, DEFAULT_COLUMN_WIDTH, MIN_COLUMN_WIDTH};
use datatable::table::DataTable;
use serde_json::json;

fn columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("id", "ID").width(60.0).fixed(),
        ColumnDef::new("name", "Name").width(200.0).min_width(120.0),
        ColumnDef::new("email", "Email"),
        ColumnDef::new("notes", "Notes").hidden(),
    ]
}

#[test]
fn test_registry_seeds_from_definitions() {
    let registry = ColumnRegistry::from_columns(&columns());
    assert_eq!(registry.width("id"), 60.0);
    assert_eq!(registry.width("email"), DEFAULT_COLUMN_WIDTH);
    assert_eq!(registry.min_width("email"), MIN_COLUMN_WIDTH);
    assert_eq!(registry.min_width("name"), 120.0);
    assert!(!registry.is_visible("notes"));

    let defs = columns();
    let keys: Vec<&str> = registry
        .visible_columns(&defs)
        .iter()
        .map(|c| c.key.as_str())
        .collect();
    assert_eq!(keys, vec!["id", "name", "email"]);
}

#[test]
fn test_visible_order_follows_definitions() {
    let defs = columns();
    let mut registry = ColumnRegistry::from_columns(&defs);
    registry.set_visible("name", false);
    registry.set_visible("notes", true);
    registry.set_visible("name", true);

    let keys: Vec<&str> = registry
        .visible_columns(&defs)
        .iter()
        .map(|c| c.key.as_str())
        .collect();
    assert_eq!(keys, vec!["id", "name", "email", "notes"]);
}

#[test]
fn test_drag_is_live_and_floored() {
    let mut registry = ColumnRegistry::from_columns(&columns());
    {
        let mut gesture = registry.begin_resize("email", 300.0).unwrap();
        assert_eq!(gesture.key(), "email");
        assert_eq!(gesture.pointer_move(350.0), 200.0);
        assert_eq!(gesture.pointer_move(100.0), MIN_COLUMN_WIDTH);
        assert_eq!(gesture.release(320.0), 170.0);
    }
    assert_eq!(registry.width("email"), 170.0);
    assert_eq!(registry.resizing(), None);
}

#[test]
fn test_custom_minimum_wins_over_global_floor() {
    let mut registry = ColumnRegistry::from_columns(&columns());
    let gesture = registry.begin_resize("name", 0.0).unwrap();
    assert_eq!(gesture.release(-500.0), 120.0);
}

#[test]
fn test_dropping_gesture_ends_resize() {
    let mut registry = ColumnRegistry::from_columns(&columns());
    let mut gesture = registry.begin_resize("name", 10.0).unwrap();
    gesture.pointer_move(40.0);
    drop(gesture);

    assert_eq!(registry.resizing(), None);
    assert_eq!(registry.width("name"), 230.0);
}

#[test]
fn test_fixed_and_unknown_columns_do_not_resize() {
    let mut registry = ColumnRegistry::from_columns(&columns());
    assert!(registry.begin_resize("id", 0.0).is_none());
    assert!(registry.begin_resize("missing", 0.0).is_none());
    assert_eq!(registry.set_width("missing", 300.0), None);
}

#[test]
fn test_non_finite_width_falls_back_to_floor() {
    let mut registry = ColumnRegistry::from_columns(&columns());
    assert_eq!(registry.set_width("email", f64::NAN), Some(MIN_COLUMN_WIDTH));
}

#[test]
fn test_table_width_changes_reach_view_and_export() {
    let rows = vec![json!({"id": 1, "name": "Ada", "email": "ada@example.org"})];
    let mut table = DataTable::new(columns(), rows, TableOptions::default());

    assert_eq!(table.set_column_width("id", 300.0), None);
    assert_eq!(table.set_column_width("email", 40.0), Some(MIN_COLUMN_WIDTH));

    if let Some(gesture) = table.begin_column_resize("name", 0.0) {
        gesture.release(25.0);
    }
    assert_eq!(table.column_width("name"), 225.0);

    let view = table.view();
    let widths: Vec<f64> = view.columns.iter().map(|c| c.width).collect();
    assert_eq!(widths, vec![60.0, 225.0, MIN_COLUMN_WIDTH]);
    assert_eq!(table.export_data().widths, widths);
}
