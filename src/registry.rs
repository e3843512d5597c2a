/// File registry — the read-only list of selectable rows shown in the file pane.
///
/// The server describes its files as a nested tree (`GET /api/directory`);
/// the registry flattens it depth-first so every folder and file becomes one
/// row with an indentation depth. Rows are never mutated — a refresh builds a
/// new registry and replaces the old one wholesale.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

// ── FileDescriptor ────────────────────────────────────────────────────────────

/// Identity and metadata of one selectable row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    /// "file" or "folder"
    #[serde(rename = "type")]
    pub kind: String,
    /// Lowercased extension; empty for folders
    pub extension: String,
}

impl FileDescriptor {
    /// A file known only by its id, used when the listing doesn't carry it.
    pub fn bare(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            kind: "file".to_string(),
            extension: extension_of(id),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == "folder"
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

/// One node of the server's directory tree. Unknown fields (size, web_url, …)
/// are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryNode {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub extension: Option<String>,
    #[serde(default)]
    pub children: Vec<DirectoryNode>,
}

/// Body of `GET /api/directory`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub directory: Vec<DirectoryNode>,
    pub error: Option<String>,
}

/// A listing file may hold either the bare tree or a saved server reply.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Bare(Vec<DirectoryNode>),
    Wrapped(DirectoryReply),
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRow {
    pub file: FileDescriptor,
    /// Nesting level in the source tree (0 = top level)
    pub depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    rows: Vec<RegistryRow>,
}

impl Registry {
    pub fn from_tree(nodes: &[DirectoryNode]) -> Self {
        let mut rows = Vec::new();
        flatten(nodes, 0, &mut rows);
        Self { rows }
    }

    /// Build from a server reply; an application-level `error` becomes `Err`.
    pub fn from_reply(reply: DirectoryReply) -> Result<Self> {
        if let Some(e) = reply.error.filter(|e| !e.is_empty()) {
            return Err(anyhow!("directory listing failed: {e}"));
        }
        Ok(Self::from_tree(&reply.directory))
    }

    /// Load a listing saved as JSON — either a bare node array or a full
    /// `/api/directory` reply.
    pub fn load_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry file at {}", path.display()))?;
        let listing: Listing = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse registry file at {}", path.display()))?;
        match listing {
            Listing::Bare(nodes) => Ok(Self::from_tree(&nodes)),
            Listing::Wrapped(reply) => Self::from_reply(reply),
        }
    }

    pub fn rows(&self) -> &[RegistryRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&RegistryRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.rows.iter().map(|r| &r.file)
    }

    /// First row carrying `id`.
    pub fn find(&self, id: &str) -> Option<&FileDescriptor> {
        self.descriptors().find(|d| d.id == id)
    }
}

fn flatten(nodes: &[DirectoryNode], depth: usize, out: &mut Vec<RegistryRow>) {
    for node in nodes {
        let name = node.name.clone().unwrap_or_else(|| "Unknown".to_string());
        let kind = node.kind.clone().unwrap_or_else(|| "file".to_string());
        let extension = if kind == "folder" {
            node.extension.clone().unwrap_or_default()
        } else {
            node.extension
                .clone()
                .unwrap_or_else(|| extension_of(&name))
        };
        out.push(RegistryRow {
            file: FileDescriptor {
                id: node.id.clone().unwrap_or_default(),
                name,
                kind,
                extension,
            },
            depth,
        });
        flatten(&node.children, depth + 1, out);
    }
}

/// Lowercased text after the last `.`, or "unknown" when there is none.
fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => "unknown".to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
