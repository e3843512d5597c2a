/// Selection model — the ordered set of files a question is scoped to.
///
/// Entries are value snapshots of registry rows taken at selection time, so a
/// registry reload never invalidates the selection. Uniqueness is by `id`;
/// insertion order is what the chips row displays.
///
/// The store does no I/O and never validates ids against the registry —
/// anything the caller hands over is accepted.
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::registry::FileDescriptor;

// ── SelectionEntry ────────────────────────────────────────────────────────────

/// Snapshot of a file's identifying metadata, serialised verbatim into
/// `selected_items` of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub extension: String,
}

impl From<&FileDescriptor> for SelectionEntry {
    fn from(d: &FileDescriptor) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            kind: d.kind.clone(),
            extension: d.extension.clone(),
        }
    }
}

// ── SelectionStore ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub struct SelectionStore {
    entries: Vec<SelectionEntry>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the file if selected, otherwise append it.
    /// Returns true if the file is selected afterwards.
    pub fn toggle(&mut self, file: &FileDescriptor) -> bool {
        if let Some(idx) = self.position(&file.id) {
            self.entries.remove(idx);
            debug!(id = %file.id, name = %file.name, total = self.entries.len(), "deselected");
            false
        } else {
            self.entries.push(SelectionEntry::from(file));
            debug!(id = %file.id, name = %file.name, total = self.entries.len(), "selected");
            true
        }
    }

    /// Append the file if absent. An existing entry keeps its position.
    pub fn add(&mut self, file: &FileDescriptor) {
        if self.contains(&file.id) {
            return;
        }
        self.entries.push(SelectionEntry::from(file));
        debug!(id = %file.id, total = self.entries.len(), "selected");
    }

    pub fn remove(&mut self, id: &str) {
        if let Some(idx) = self.position(id) {
            self.entries.remove(idx);
            debug!(%id, total = self.entries.len(), "deselected");
        }
    }

    /// Replace the whole selection with one entry per candidate.
    /// Repeated ids keep their first occurrence.
    pub fn select_all<'a>(&mut self, candidates: impl IntoIterator<Item = &'a FileDescriptor>) {
        self.entries.clear();
        for file in candidates {
            if !self.contains(&file.id) {
                self.entries.push(SelectionEntry::from(file));
            }
        }
        debug!(total = self.entries.len(), "selected all");
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        debug!("selection cleared");
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
