/// Selection view — one-way projection of the `SelectionStore` onto the screen.
///
/// Rebuilt from scratch after every store mutation. Nothing here is ever
/// mutated in place; the file pane, chips row and status bar all read the
/// latest snapshot.
use crate::registry::Registry;
use crate::selection::SelectionStore;
use crate::ui;

pub const EMPTY_PLACEHOLDER: &str = "No files selected - will search all files";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    All,
    Selected,
}

impl SearchScope {
    pub fn label(self) -> &'static str {
        match self {
            SearchScope::All => "Searching ALL files",
            SearchScope::Selected => "Searching selected files only",
        }
    }
}

/// One removable chip. Detaching it removes `id` from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub id: String,
    pub name: String,
    pub icon: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionView {
    pub count_label: String,
    pub scope: SearchScope,
    /// Store order
    pub chips: Vec<Chip>,
    /// Parallel to `registry.rows()`
    pub checked: Vec<bool>,
}

impl SelectionView {
    pub fn reconcile(store: &SelectionStore, registry: &Registry) -> Self {
        let scope = if store.is_empty() { SearchScope::All } else { SearchScope::Selected };
        let chips = store
            .entries()
            .iter()
            .map(|e| Chip {
                id: e.id.clone(),
                name: e.name.clone(),
                icon: ui::row_icon(&e.kind, &e.extension),
            })
            .collect();
        let checked = registry
            .rows()
            .iter()
            .map(|row| store.contains(&row.file.id))
            .collect();

        Self {
            count_label: count_label(store.len()),
            scope,
            chips,
            checked,
        }
    }

    /// Shown in the chips row when nothing is selected.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.chips.is_empty().then_some(EMPTY_PLACEHOLDER)
    }

    pub fn is_checked(&self, row: usize) -> bool {
        self.checked.get(row).copied().unwrap_or(false)
    }
}

fn count_label(n: usize) -> String {
    format!("{n} file{} selected", if n == 1 { "" } else { "s" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DirectoryNode;

    fn registry() -> Registry {
        let nodes: Vec<DirectoryNode> = serde_json::from_str(
            r#"[
                {"id": "d1", "name": "Docs", "type": "folder", "children": [
                    {"id": "f1", "name": "a.pdf", "type": "file", "extension": "pdf"},
                    {"id": "f2", "name": "b.xlsx", "type": "file", "extension": "xlsx"}
                ]},
                {"id": "f3", "name": "c.txt", "type": "file", "extension": "txt"}
            ]"#,
        )
        .unwrap();
        Registry::from_tree(&nodes)
    }

    #[test]
    fn test_empty_selection() {
        let view = SelectionView::reconcile(&SelectionStore::new(), &registry());
        assert_eq!(view.count_label, "0 files selected");
        assert_eq!(view.scope.label(), "Searching ALL files");
        assert_eq!(view.placeholder(), Some(EMPTY_PLACEHOLDER));
        assert_eq!(view.checked, vec![false; 4]);
    }

    #[test]
    fn test_singular_and_plural_labels() {
        let reg = registry();
        let mut store = SelectionStore::new();
        store.toggle(reg.find("f1").unwrap());
        let view = SelectionView::reconcile(&store, &reg);
        assert_eq!(view.count_label, "1 file selected");
        assert_eq!(view.scope, SearchScope::Selected);
        assert_eq!(view.scope.label(), "Searching selected files only");

        store.toggle(reg.find("f3").unwrap());
        assert_eq!(SelectionView::reconcile(&store, &reg).count_label, "2 files selected");
    }

    #[test]
    fn test_chips_follow_store_order() {
        let reg = registry();
        let mut store = SelectionStore::new();
        store.toggle(reg.find("f3").unwrap());
        store.toggle(reg.find("d1").unwrap());
        store.toggle(reg.find("f2").unwrap());

        let view = SelectionView::reconcile(&store, &reg);
        let chips: Vec<(&str, &str)> = view.chips.iter().map(|c| (c.id.as_str(), c.icon)).collect();
        assert_eq!(chips, vec![("f3", "file-alt"), ("d1", "folder"), ("f2", "file-excel")]);
        assert!(view.placeholder().is_none());
    }

    #[test]
    fn test_rows_checked_from_store() {
        let reg = registry();
        let mut store = SelectionStore::new();
        store.toggle(reg.find("f1").unwrap());
        store.toggle(reg.find("f3").unwrap());

        let view = SelectionView::reconcile(&store, &reg);
        // Rows: d1, f1, f2, f3
        assert_eq!(view.checked, vec![false, true, false, true]);
        assert!(view.is_checked(1));
        assert!(!view.is_checked(99));
    }

    #[test]
    fn test_detach_chip_unchecks_row() {
        let reg = registry();
        let mut store = SelectionStore::new();
        store.toggle(reg.find("f1").unwrap());
        store.toggle(reg.find("f2").unwrap());
        let view = SelectionView::reconcile(&store, &reg);

        let detached = view.chips[0].id.clone();
        store.remove(&detached);
        let view = SelectionView::reconcile(&store, &reg);

        assert_eq!(view.chips.len(), 1);
        assert_eq!(view.chips[0].id, "f2");
        assert!(!view.is_checked(1));
        assert!(view.is_checked(2));
    }

    #[test]
    fn test_selection_not_in_registry_still_chipped() {
        let reg = registry();
        let mut store = SelectionStore::new();
        store.toggle(reg.find("f1").unwrap());
        // A refresh that drops f1 keeps the selection
        let view = SelectionView::reconcile(&store, &Registry::default());
        assert_eq!(view.chips.len(), 1);
        assert!(view.checked.is_empty());
    }
}
