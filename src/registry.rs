//! Mutable column display state, kept apart from the column definitions.

use crate::column::ColumnDef;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Smallest width any column can be dragged down to.
pub const MIN_COLUMN_WIDTH: f64 = 80.0;

/// Width used when a definition does not declare one.
pub const DEFAULT_COLUMN_WIDTH: f64 = 150.0;

/// Per-column visibility and pixel width.
///
/// Column order is never stored here: it is always the definition order
/// filtered by the visible set.
#[derive(Clone, Debug, Default)]
pub struct ColumnRegistry {
    visible: HashSet<String>,
    widths: HashMap<String, f64>,
    floors: HashMap<String, f64>,
    resizable: HashSet<String>,
    resizing: Option<String>,
}

impl ColumnRegistry {
    /// Seed state from the definitions' `visible`, `width` and `min_width`.
    pub fn from_columns(columns: &[ColumnDef]) -> Self {
        let mut registry = Self::default();
        for column in columns {
            let floor = column.min_width.unwrap_or(0.0).max(MIN_COLUMN_WIDTH);
            let width = column.width.unwrap_or(DEFAULT_COLUMN_WIDTH);

            if column.visible {
                registry.visible.insert(column.key.clone());
            }
            if column.resizable {
                registry.resizable.insert(column.key.clone());
            }
            registry.floors.insert(column.key.clone(), floor);
            registry.widths.insert(column.key.clone(), width);
        }
        registry
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.visible.contains(key)
    }

    /// Flip visibility. Returns the new state, or `None` for unknown keys.
    pub fn toggle(&mut self, key: &str) -> Option<bool> {
        if !self.widths.contains_key(key) {
            return None;
        }
        let visible = !self.visible.contains(key);
        self.set_visible(key, visible);
        Some(visible)
    }

    pub fn set_visible(&mut self, key: &str, visible: bool) {
        if !self.widths.contains_key(key) {
            return;
        }
        if visible {
            self.visible.insert(key.to_string());
        } else {
            self.visible.remove(key);
        }
    }

    pub fn width(&self, key: &str) -> f64 {
        self.widths.get(key).copied().unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    pub fn min_width(&self, key: &str) -> f64 {
        self.floors.get(key).copied().unwrap_or(MIN_COLUMN_WIDTH)
    }

    /// Set a width directly, held at the column's floor. Returns the stored width.
    pub fn set_width(&mut self, key: &str, width: f64) -> Option<f64> {
        let floor = *self.floors.get(key)?;
        let width = if width.is_finite() { width.max(floor) } else { floor };
        self.widths.insert(key.to_string(), width);
        Some(width)
    }

    /// Definitions that are currently shown, in definition order.
    pub fn visible_columns<'a>(&self, columns: &'a [ColumnDef]) -> Vec<&'a ColumnDef> {
        columns
            .iter()
            .filter(|column| self.visible.contains(&column.key))
            .collect()
    }

    /// Key of the column being dragged, if a gesture is in progress.
    pub fn resizing(&self) -> Option<&str> {
        self.resizing.as_deref()
    }

    /// Press on a column's trailing edge.
    ///
    /// The returned gesture holds the registry for the whole drag; pointer
    /// moves go through it and dropping it ends the drag wherever the pointer
    /// was released. Non-resizable or unknown columns yield `None`.
    ///
    /// # Examples
    /// ```
    /// use datatable::column::ColumnDef;
    /// use datatable::registry::ColumnRegistry;
    ///
    /// let columns = vec![ColumnDef::new("name", "Name").width(200.0)];
    /// let mut registry = ColumnRegistry::from_columns(&columns);
    ///
    /// let mut gesture = registry.begin_resize("name", 500.0).unwrap();
    /// gesture.pointer_move(560.0);
    /// assert_eq!(gesture.release(400.0), 100.0);
    /// assert_eq!(registry.width("name"), 100.0);
    /// ```
    pub fn begin_resize(&mut self, key: &str, start_x: f64) -> Option<ResizeGesture<'_>> {
        if !self.resizable.contains(key) {
            return None;
        }
        let start_width = self.width(key);
        self.resizing = Some(key.to_string());
        debug!("resize of column {key} started at width {start_width}");

        Some(ResizeGesture {
            registry: self,
            key: key.to_string(),
            start_x,
            start_width,
        })
    }
}

/// An in-progress drag on one column edge.
///
/// `newWidth = max(floor, startWidth + (x - startX))`, written to the
/// registry on every move. The gesture is finished when this value drops.
#[derive(Debug)]
pub struct ResizeGesture<'a> {
    registry: &'a mut ColumnRegistry,
    key: String,
    start_x: f64,
    start_width: f64,
}

impl ResizeGesture<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Live update for a pointer move. Returns the applied width.
    pub fn pointer_move(&mut self, x: f64) -> f64 {
        let width = self.start_width + (x - self.start_x);
        self.registry
            .set_width(&self.key, width)
            .unwrap_or(self.start_width)
    }

    /// Pointer up at `x`: commit the final width and end the gesture.
    pub fn release(mut self, x: f64) -> f64 {
        self.pointer_move(x)
    }
}

impl Drop for ResizeGesture<'_> {
    fn drop(&mut self) {
        self.registry.resizing = None;
        debug!(
            "resize of column {} ended at width {}",
            self.key,
            self.registry.width(&self.key)
        );
    }
}
