use datatable::pipeline::{
    Query, SearchScope, SortDirection, SortState, filter_stage, search_stage, sort_stage,
};
use serde_json::{Value, json};

fn five_rows() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "b"}),
        json!({"id": 2, "name": "a"}),
        json!({"id": 3, "name": "c"}),
        json!({"id": 4, "name": "a"}),
        json!({"id": 5, "name": "b"}),
    ]
}

fn ids(rows: &[Value], indices: &[usize]) -> Vec<i64> {
    indices
        .iter()
        .map(|&i| rows[i]["id"].as_i64().unwrap())
        .collect()
}

fn search_all() -> SearchScope<'static> {
    SearchScope {
        enabled: true,
        fields: None,
    }
}

#[test]
fn test_sort_ascending_is_stable() {
    let rows = five_rows();
    let mut query = Query::new();
    query.sort = Some(SortState::ascending("name"));
    let result = query.apply(&rows, &search_all());
    assert_eq!(ids(&rows, &result), vec![2, 4, 1, 5, 3]);
}

#[test]
fn test_sort_descending_keeps_ties_in_order() {
    let rows = five_rows();
    let mut query = Query::new();
    query.sort = Some(SortState::descending("name"));
    let result = query.apply(&rows, &search_all());
    assert_eq!(ids(&rows, &result), vec![3, 1, 5, 2, 4]);
}

#[test]
fn test_search_restricted_to_fields() {
    let rows = five_rows();
    let fields = vec!["name".to_string()];
    let scope = SearchScope {
        enabled: true,
        fields: Some(&fields),
    };
    let mut query = Query::new();
    query.search = "a".to_string();
    assert_eq!(ids(&rows, &query.apply(&rows, &scope)), vec![2, 4]);
}

#[test]
fn test_search_all_fields_includes_numbers() {
    let rows = five_rows();
    let mut query = Query::new();
    query.search = "3".to_string();
    assert_eq!(ids(&rows, &query.apply(&rows, &search_all())), vec![3]);
}

#[test]
fn test_search_disabled_keeps_everything() {
    let rows = five_rows();
    let scope = SearchScope {
        enabled: false,
        fields: None,
    };
    let result = search_stage(&rows, (0..5).collect(), "zzz", &scope);
    assert_eq!(result.len(), 5);
}

#[test]
fn test_search_is_case_insensitive_and_tolerates_missing() {
    let rows = vec![
        json!({"id": 1, "owner": {"name": "Ada Lovelace"}}),
        json!({"id": 2, "owner": null}),
        json!({"id": 3}),
    ];
    let fields = vec!["owner.name".to_string()];
    let scope = SearchScope {
        enabled: true,
        fields: Some(&fields),
    };
    let result = search_stage(&rows, vec![0, 1, 2], "LOVE", &scope);
    assert_eq!(ids(&rows, &result), vec![1]);
}

#[test]
fn test_filters_are_anded() {
    let rows = vec![
        json!({"id": 1, "team": "Alpha", "city": "Oslo"}),
        json!({"id": 2, "team": "Alpha", "city": "Bergen"}),
        json!({"id": 3, "team": "Beta", "city": "Oslo"}),
    ];
    let mut query = Query::new();
    query.set_filter("team", "alp");
    query.set_filter("city", "OSLO");
    assert_eq!(ids(&rows, &query.apply(&rows, &search_all())), vec![1]);
}

#[test]
fn test_empty_filter_value_is_no_filter() {
    let rows = five_rows();
    let mut query = Query::new();
    query.set_filter("name", "a");
    query.set_filter("name", "");
    assert!(query.filters.is_empty());

    let mut filters = std::collections::BTreeMap::new();
    filters.insert("name".to_string(), String::new());
    assert_eq!(filter_stage(&rows, (0..5).collect(), &filters).len(), 5);
}

#[test]
fn test_missing_values_sort_last_both_directions() {
    let rows = vec![
        json!({"id": 1, "age": 30}),
        json!({"id": 2}),
        json!({"id": 3, "age": 10}),
        json!({"id": 4, "age": null}),
        json!({"id": 5, "age": 20}),
    ];
    let asc = sort_stage(&rows, (0..5).collect(), Some(&SortState::ascending("age")));
    assert_eq!(ids(&rows, &asc), vec![3, 5, 1, 2, 4]);

    let desc = sort_stage(&rows, (0..5).collect(), Some(&SortState::descending("age")));
    assert_eq!(ids(&rows, &desc), vec![1, 5, 3, 2, 4]);
}

#[test]
fn test_numbers_sort_numerically() {
    let rows = vec![
        json!({"id": 1, "fee": 100}),
        json!({"id": 2, "fee": 9.5}),
        json!({"id": 3, "fee": 25}),
    ];
    let asc = sort_stage(&rows, vec![0, 1, 2], Some(&SortState::ascending("fee")));
    assert_eq!(ids(&rows, &asc), vec![2, 3, 1]);
}

#[test]
fn test_stage_order_matches_reference_composition() {
    let rows = vec![
        json!({"id": 1, "name": "anna", "team": "red"}),
        json!({"id": 2, "name": "bob", "team": "blue"}),
        json!({"id": 3, "name": "carla", "team": "red"}),
        json!({"id": 4, "name": "dan", "team": "red"}),
        json!({"id": 5, "name": "ana", "team": "blue"}),
    ];
    let fields = vec!["name".to_string()];
    let scope = SearchScope {
        enabled: true,
        fields: Some(&fields),
    };

    let mut query = Query::new();
    query.search = "a".to_string();
    query.set_filter("team", "red");
    query.sort = Some(SortState::descending("name"));

    let searched = search_stage(&rows, (0..5).collect(), "a", &scope);
    let filtered = filter_stage(&rows, searched, &query.filters);
    let reference = sort_stage(&rows, filtered, query.sort.as_ref());

    assert_eq!(query.apply(&rows, &scope), reference);
    assert_eq!(ids(&rows, &reference), vec![4, 3, 1]);
}

#[test]
fn test_paging_before_the_pipeline_gives_wrong_rows() {
    let rows = vec![
        json!({"id": 1, "name": "zed", "team": "red"}),
        json!({"id": 2, "name": "amy", "team": "blue"}),
        json!({"id": 3, "name": "bea", "team": "red"}),
        json!({"id": 4, "name": "cal", "team": "red"}),
    ];
    let mut query = Query::new();
    query.set_filter("team", "red");
    query.sort = Some(SortState::ascending("name"));

    let correct: Vec<usize> = query.apply(&rows, &search_all()).into_iter().take(2).collect();
    assert_eq!(ids(&rows, &correct), vec![3, 4]);

    let first_page: Vec<usize> = (0..2).collect();
    let swapped = sort_stage(
        &rows,
        filter_stage(&rows, first_page, &query.filters),
        query.sort.as_ref(),
    );
    assert_eq!(ids(&rows, &swapped), vec![1]);
    assert_ne!(correct, swapped);
}

#[test]
fn test_pipeline_is_idempotent_and_pure() {
    let rows = five_rows();
    let snapshot = rows.clone();
    let mut query = Query::new();
    query.search = "b".to_string();
    query.sort = Some(SortState::descending("id"));

    let first = query.apply(&rows, &search_all());
    let second = query.apply(&rows, &search_all());
    assert_eq!(first, second);
    assert_eq!(rows, snapshot);
}

#[test]
fn test_sort_toggle_cycles_three_states() {
    let first = SortState::toggle(None, "name");
    assert_eq!(first, Some(SortState::ascending("name")));
    let second = SortState::toggle(first.as_ref(), "name");
    assert_eq!(second.as_ref().map(|s| s.direction), Some(SortDirection::Descending));
    let third = SortState::toggle(second.as_ref(), "name");
    assert_eq!(third, None);

    let other = SortState::toggle(second.as_ref(), "id");
    assert_eq!(other, Some(SortState::ascending("id")));
}

#[test]
fn test_empty_search_field_list_searches_every_field() {
    let rows = vec![
        json!({"id": 1, "name": "alice"}),
        json!({"id": 2, "name": "bob"}),
    ];
    let fields: Vec<String> = Vec::new();
    let scope = SearchScope {
        enabled: true,
        fields: Some(&fields),
    };
    let result = search_stage(&rows, vec![0, 1], "alice", &scope);
    assert_eq!(ids(&rows, &result), vec![1]);
}

#[test]
fn test_search_reads_nested_values_not_key_names() {
    let rows = vec![
        json!({"id": 1, "address": {"city": "Oslo"}}),
        json!({"id": 2, "address": {"city": "Kigali"}, "tags": ["board", "Treasurer"]}),
    ];
    assert!(search_stage(&rows, vec![0, 1], "city", &search_all()).is_empty());

    let result = search_stage(&rows, vec![0, 1], "kigali", &search_all());
    assert_eq!(ids(&rows, &result), vec![2]);

    let result = search_stage(&rows, vec![0, 1], "treas", &search_all());
    assert_eq!(ids(&rows, &result), vec![2]);
}

#[test]
fn test_filter_on_nested_object_ignores_key_names() {
    let rows = vec![
        json!({"id": 1, "address": {"city": "Oslo"}}),
        json!({"id": 2, "address": {"city": "Bergen"}}),
    ];
    let mut filters = std::collections::BTreeMap::new();
    filters.insert("address".to_string(), "city".to_string());
    assert!(filter_stage(&rows, vec![0, 1], &filters).is_empty());

    filters.insert("address".to_string(), "berg".to_string());
    assert_eq!(ids(&rows, &filter_stage(&rows, vec![0, 1], &filters)), vec![2]);
}
