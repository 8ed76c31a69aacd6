//! Sequential navigation over visible rows.
//!
//! Item lists clamp at both ends. Namespace and viewer tabs wrap around.

/// Where the current selection sits relative to the visible rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Nothing selected.
    Unselected,
    /// Selected, but not among the visible rows.
    Hidden,
    At(usize),
}

/// Index to select after `current`, clamped to the last row.
///
/// With nothing visibly selected the first row is next.
pub fn next_index(current: Position, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Position::At(i) => (i + 1).min(len - 1),
        Position::Hidden | Position::Unselected => 0,
    })
}

/// Index to select before `current`, clamped to the first row.
///
/// With nothing selected the last row is previous; a hidden selection
/// restarts at the first row.
pub fn prev_index(current: Position, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Position::At(i) => i.saturating_sub(1).min(len - 1),
        Position::Hidden => 0,
        Position::Unselected => len - 1,
    })
}

/// Index after `current`, wrapping to the start.
pub fn wrap_next(current: usize, len: usize) -> Option<usize> {
    (len > 0).then(|| (current + 1) % len)
}

/// Index before `current`, wrapping to the end.
pub fn wrap_prev(current: usize, len: usize) -> Option<usize> {
    (len > 0).then(|| (current % len + len - 1) % len)
}

/// Filterable single-selection list of opaque identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredList {
    items: Vec<String>,
    filter: String,
    selected: Option<String>,
}

impl FilteredList {
    pub fn new(items: Vec<String>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    /// Replace the items, keeping the filter and dropping the selection.
    pub fn set_items(&mut self, items: Vec<String>) {
        self.items = items;
        self.selected = None;
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn set_filter(&mut self, text: &str) {
        self.filter = text.trim().to_lowercase();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Items matching the filter, in list order.
    pub fn visible(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| self.filter.is_empty() || item.to_lowercase().contains(&self.filter))
            .map(String::as_str)
            .collect()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Select an item. Unknown items are ignored.
    pub fn select(&mut self, item: &str) -> bool {
        if !self.items.iter().any(|i| i == item) {
            return false;
        }
        self.selected = Some(item.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.filter.clear();
        self.selected = None;
    }

    fn position(&self, visible: &[&str]) -> Position {
        match &self.selected {
            None => Position::Unselected,
            Some(sel) => visible
                .iter()
                .position(|v| *v == sel.as_str())
                .map(Position::At)
                .unwrap_or(Position::Hidden),
        }
    }

    pub fn select_next(&mut self) -> Option<String> {
        let visible = self.visible();
        let index = next_index(self.position(&visible), visible.len())?;
        let item = visible[index].to_string();
        self.selected = Some(item.clone());
        Some(item)
    }

    pub fn select_prev(&mut self) -> Option<String> {
        let visible = self.visible();
        let index = prev_index(self.position(&visible), visible.len())?;
        let item = visible[index].to_string();
        self.selected = Some(item.clone());
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> FilteredList {
        FilteredList::new(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_clamped_navigation() {
        assert_eq!(next_index(Position::Unselected, 0), None);
        assert_eq!(prev_index(Position::At(0), 0), None);
        assert_eq!(next_index(Position::At(2), 3), Some(2));
        assert_eq!(prev_index(Position::At(0), 3), Some(0));
        assert_eq!(prev_index(Position::Unselected, 3), Some(2));
        assert_eq!(next_index(Position::Hidden, 3), Some(0));
    }

    #[test]
    fn test_wrapping_navigation() {
        assert_eq!(wrap_next(2, 3), Some(0));
        assert_eq!(wrap_prev(0, 3), Some(2));
        assert_eq!(wrap_prev(1, 3), Some(0));
        assert_eq!(wrap_next(0, 1), Some(0));
        assert_eq!(wrap_prev(0, 0), None);
    }

    #[test]
    fn test_filtered_list_walks_visible_items() {
        let mut ids = list(&["alpha", "beta", "alphabet", "gamma"]);
        ids.set_filter(" ALPHA");
        assert_eq!(ids.visible(), vec!["alpha", "alphabet"]);

        assert_eq!(ids.select_next().as_deref(), Some("alpha"));
        assert_eq!(ids.select_next().as_deref(), Some("alphabet"));
        assert_eq!(ids.select_next().as_deref(), Some("alphabet"));

        ids.set_filter("gam");
        assert_eq!(ids.select_prev().as_deref(), Some("gamma"));
        assert!(!ids.select("delta"));
    }

    #[test]
    fn test_empty_list_is_noop() {
        let mut ids = list(&[]);
        assert_eq!(ids.select_next(), None);
        assert_eq!(ids.select_prev(), None);
        assert_eq!(ids.selected(), None);
    }
}
