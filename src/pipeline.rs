//! Row derivation: search, then filter, then sort.
//!
//! The stages always run in that order. Each stage takes and returns a list
//! of indices into the caller's rows, so the source data is never cloned,
//! reordered or mutated.

use crate::row::{Row, compare_values, contains_ignore_case, lookup};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

/// The single active sort key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn ascending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Next state after a header click on `key`.
    ///
    /// Same column cycles unsorted -> ascending -> descending -> unsorted.
    /// A different column always starts ascending.
    pub fn toggle(current: Option<&SortState>, key: &str) -> Option<SortState> {
        match current {
            Some(sort) if sort.key == key => match sort.direction {
                SortDirection::Ascending => Some(SortState::descending(key)),
                SortDirection::Descending => None,
            },
            _ => Some(SortState::ascending(key)),
        }
    }
}

/// Where the search stage looks.
#[derive(Clone, Debug, Default)]
pub struct SearchScope<'a> {
    pub enabled: bool,
    /// `None` or an empty list searches every field of the row.
    pub fields: Option<&'a [String]>,
}

/// Mutable pipeline inputs: search string, per-column filters and sort.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub sort: Option<SortState>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one column filter. An empty value removes the entry.
    pub fn set_filter(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.filters.remove(key);
        } else {
            self.filters.insert(key.to_string(), value.to_string());
        }
    }

    pub fn filter(&self, key: &str) -> &str {
        self.filters.get(key).map(String::as_str).unwrap_or("")
    }

    /// Run search -> filter -> sort over `rows`.
    ///
    /// # Arguments
    /// * `rows` - Raw rows, untouched
    /// * `scope` - Whether search is enabled and which fields it reads
    ///
    /// # Returns
    /// * `Vec<usize>` - Indices into `rows` in display order
    pub fn apply(&self, rows: &[Row], scope: &SearchScope<'_>) -> Vec<usize> {
        let all: Vec<usize> = (0..rows.len()).collect();
        let searched = search_stage(rows, all, &self.search, scope);
        let filtered = filter_stage(rows, searched, &self.filters);
        sort_stage(rows, filtered, self.sort.as_ref())
    }
}

/// Keep rows where any searched field contains `term`, ignoring case.
pub fn search_stage(
    rows: &[Row],
    indices: Vec<usize>,
    term: &str,
    scope: &SearchScope<'_>,
) -> Vec<usize> {
    if !scope.enabled || term.is_empty() {
        return indices;
    }

    let needle = term.to_lowercase();
    indices
        .into_iter()
        .filter(|&i| {
            let row = &rows[i];
            match scope.fields {
                Some(fields) if !fields.is_empty() => fields
                    .iter()
                    .any(|field| contains_ignore_case(lookup(row, field), &needle)),
                _ => match row.as_object() {
                    Some(map) => map
                        .values()
                        .any(|value| contains_ignore_case(Some(value), &needle)),
                    None => contains_ignore_case(Some(row), &needle),
                },
            }
        })
        .collect()
}

/// Keep rows matching every non-empty filter (logical AND).
pub fn filter_stage(
    rows: &[Row],
    indices: Vec<usize>,
    filters: &BTreeMap<String, String>,
) -> Vec<usize> {
    let active: Vec<(&str, String)> = filters
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.as_str(), value.to_lowercase()))
        .collect();

    if active.is_empty() {
        return indices;
    }

    indices
        .into_iter()
        .filter(|&i| {
            active
                .iter()
                .all(|(key, needle)| contains_ignore_case(lookup(&rows[i], key), needle))
        })
        .collect()
}

/// Stable sort by the value at `sort.key`.
///
/// Missing values go last in both directions.
pub fn sort_stage(rows: &[Row], mut indices: Vec<usize>, sort: Option<&SortState>) -> Vec<usize> {
    let Some(sort) = sort else {
        return indices;
    };

    indices.sort_by(|&a, &b| {
        match (lookup(&rows[a], &sort.key), lookup(&rows[b], &sort.key)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                let ordering = compare_values(x, y);
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            }
        }
    });
    indices
}
