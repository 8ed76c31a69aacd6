//! File tree model.
//!
//! Builds a nested folder tree from flat slash-delimited paths and derives
//! the rows currently visible under the active filter and expansion state.
//! Navigation always walks the visible rows, computed fresh on every call.
//!
//! Ordering: folders before files at every level, each group sorted by
//! byte-wise (case-sensitive) name comparison, so `B` sorts before `a`.

use crate::nav;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Marker stored in a path to classify reference entries.
const REFS_SEGMENT: &str = "/refs/";
const DATA_SEGMENT: &str = "/data/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Folder,
    Json,
    Config,
    Metadata,
    Text,
    Binary,
    File,
}

impl FileKind {
    /// Classify a file by its name's extension.
    pub fn from_name(name: &str) -> Self {
        if name.ends_with(".json") {
            FileKind::Json
        } else if name.ends_with(".config") {
            FileKind::Config
        } else if name.ends_with(".metadata") {
            FileKind::Metadata
        } else if name.ends_with(".txt") {
            FileKind::Text
        } else if name.ends_with(".bin") || name.ends_with(".binary") {
            FileKind::Binary
        } else {
            FileKind::File
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Folder => "folder",
            FileKind::Json => "json",
            FileKind::Config => "config",
            FileKind::Metadata => "metadata",
            FileKind::Text => "text",
            FileKind::Binary => "binary",
            FileKind::File => "file",
        }
    }

    /// Auxiliary files rendered dimmed.
    pub fn is_auxiliary(&self) -> bool {
        matches!(self, FileKind::Config | FileKind::Metadata)
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileNode {
    name: String,
    path: String,
    kind: FileKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FolderNode {
    name: String,
    path: String,
    folders: BTreeMap<String, FolderNode>,
    files: Vec<FileNode>,
}

impl FolderNode {
    fn walk_folders<'a>(&'a self, out: &mut Vec<&'a str>) {
        for folder in self.folders.values() {
            out.push(&folder.path);
            folder.walk_folders(out);
        }
    }

    fn has_match(&self, filter: &str) -> bool {
        matches_filter(&self.path, filter)
            || self.files.iter().any(|f| matches_filter(&f.path, filter))
            || self.folders.values().any(|f| f.has_match(filter))
    }
}

fn matches_filter(path: &str, filter: &str) -> bool {
    filter.is_empty() || path.to_lowercase().contains(filter)
}

/// A row of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleRow {
    pub path: String,
    pub name: String,
    pub kind: FileKind,
    pub depth: usize,
    /// Folder rows only.
    pub expanded: bool,
    pub selected: bool,
}

impl VisibleRow {
    pub fn is_folder(&self) -> bool {
        self.kind == FileKind::Folder
    }
}

/// Path counts for the tree's stats bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub total: usize,
    pub refs: usize,
    pub data: usize,
}

/// Tree, expansion, filter and selection state of one file tree.
#[derive(Debug, Clone, Default)]
pub struct FileTreeModel {
    files: Vec<String>,
    root: FolderNode,
    expanded: BTreeSet<String>,
    filter: String,
    selected: Option<String>,
}

impl FileTreeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from flat paths. Empty segments are ignored; a file keeps its
    /// original path string.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut model = Self::new();
        model.set_files(paths.into_iter().map(Into::into).collect());
        model
    }

    /// Replace the file list. Expansion and selection are reset.
    pub fn set_files(&mut self, files: Vec<String>) {
        let mut root = FolderNode::default();
        for path in &files {
            let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
            let Some((file_name, folders)) = parts.split_last() else {
                continue;
            };
            let mut current = &mut root;
            for (depth, part) in folders.iter().enumerate() {
                current = current
                    .folders
                    .entry(part.to_string())
                    .or_insert_with(|| FolderNode {
                        name: part.to_string(),
                        path: folders[..=depth].join("/"),
                        ..Default::default()
                    });
            }
            current.files.push(FileNode {
                name: file_name.to_string(),
                path: path.clone(),
                kind: FileKind::from_name(file_name),
            });
        }
        sort_files(&mut root);

        self.files = files;
        self.root = root;
        self.expanded.clear();
        self.selected = None;
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            total: self.files.len(),
            ..Default::default()
        };
        for path in &self.files {
            if path.contains(REFS_SEGMENT) {
                stats.refs += 1;
            } else if path.contains(DATA_SEGMENT) {
                stats.data += 1;
            }
        }
        stats
    }

    /// Number of files passing the current filter.
    pub fn file_count(&self) -> usize {
        self.files
            .iter()
            .filter(|p| matches_filter(p, &self.filter))
            .count()
    }

    // ------------------------------------------------------------------
    // Expansion
    // ------------------------------------------------------------------

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path)
    }

    pub fn is_folder(&self, path: &str) -> bool {
        self.folder(path).is_some()
    }

    fn folder(&self, path: &str) -> Option<&FolderNode> {
        let mut current = &self.root;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = current.folders.get(part)?;
        }
        (current.path == path && !path.is_empty()).then_some(current)
    }

    /// Toggle a folder. Returns the new expansion state, or `None` for an
    /// unknown folder.
    pub fn toggle_folder(&mut self, path: &str) -> Option<bool> {
        if !self.is_folder(path) {
            return None;
        }
        if self.expanded.remove(path) {
            Some(false)
        } else {
            self.expanded.insert(path.to_string());
            Some(true)
        }
    }

    pub fn expand(&mut self, path: &str) -> bool {
        self.is_folder(path) && self.expanded.insert(path.to_string())
    }

    pub fn collapse(&mut self, path: &str) -> bool {
        self.expanded.remove(path)
    }

    pub fn expand_all(&mut self) {
        let mut paths = Vec::new();
        self.root.walk_folders(&mut paths);
        self.expanded = paths.into_iter().map(str::to_string).collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn expand_first_level(&mut self) {
        let top: Vec<String> = self.root.folders.values().map(|f| f.path.clone()).collect();
        self.expanded.extend(top);
    }

    // ------------------------------------------------------------------
    // Filter
    // ------------------------------------------------------------------

    /// Set the filter text. Matching is a case-insensitive substring test
    /// against the full path.
    pub fn set_filter(&mut self, text: &str) {
        self.filter = text.trim().to_lowercase();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    // ------------------------------------------------------------------
    // Visible rows
    // ------------------------------------------------------------------

    /// Rows currently visible, in display order.
    ///
    /// With a filter active, folders on the way to a match are shown open
    /// without touching the stored expansion state.
    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        let mut rows = Vec::new();
        self.push_rows(&self.root, 0, &mut rows);
        rows
    }

    fn push_rows(&self, node: &FolderNode, depth: usize, rows: &mut Vec<VisibleRow>) {
        let filtering = !self.filter.is_empty();
        for folder in node.folders.values() {
            if filtering && !folder.has_match(&self.filter) {
                continue;
            }
            let open = filtering || self.expanded.contains(&folder.path);
            rows.push(VisibleRow {
                path: folder.path.clone(),
                name: folder.name.clone(),
                kind: FileKind::Folder,
                depth,
                expanded: open,
                selected: self.selected.as_deref() == Some(folder.path.as_str()),
            });
            if open {
                self.push_rows(folder, depth + 1, rows);
            }
        }
        for file in &node.files {
            if !matches_filter(&file.path, &self.filter) {
                continue;
            }
            rows.push(VisibleRow {
                path: file.path.clone(),
                name: file.name.clone(),
                kind: file.kind,
                depth,
                expanded: false,
                selected: self.selected.as_deref() == Some(file.path.as_str()),
            });
        }
    }

    /// Visible paths in display order.
    pub fn visible_paths(&self) -> Vec<String> {
        self.visible_rows().into_iter().map(|r| r.path).collect()
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Kind of the entry at `path`, if it exists.
    pub fn kind_of(&self, path: &str) -> Option<FileKind> {
        if self.is_folder(path) {
            return Some(FileKind::Folder);
        }
        self.files
            .iter()
            .find(|p| p.as_str() == path)
            .map(|p| FileKind::from_name(p.rsplit('/').next().unwrap_or(p)))
    }

    /// Select a folder or file. Unknown paths leave the selection alone.
    pub fn select(&mut self, path: &str) -> Option<FileKind> {
        let kind = self.kind_of(path)?;
        self.selected = Some(path.to_string());
        Some(kind)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Select the visible row after the current one, clamping at the end.
    pub fn select_next(&mut self) -> Option<VisibleRow> {
        let rows = self.visible_rows();
        let current = self.current_position(&rows);
        let index = nav::next_index(current, rows.len())?;
        self.take_row(rows, index)
    }

    /// Select the visible row before the current one, clamping at the start.
    pub fn select_prev(&mut self) -> Option<VisibleRow> {
        let rows = self.visible_rows();
        let current = self.current_position(&rows);
        let index = nav::prev_index(current, rows.len())?;
        self.take_row(rows, index)
    }

    fn current_position(&self, rows: &[VisibleRow]) -> nav::Position {
        match &self.selected {
            None => nav::Position::Unselected,
            Some(path) => match rows.iter().position(|r| &r.path == path) {
                Some(index) => nav::Position::At(index),
                None => nav::Position::Hidden,
            },
        }
    }

    fn take_row(&mut self, mut rows: Vec<VisibleRow>, index: usize) -> Option<VisibleRow> {
        if index >= rows.len() {
            return None;
        }
        let mut row = rows.swap_remove(index);
        self.selected = Some(row.path.clone());
        row.selected = true;
        Some(row)
    }

    /// Expand the selected folder, or step into its first child when it is
    /// already open. Returns the newly selected row, if the selection moved.
    pub fn expand_or_descend(&mut self) -> Option<VisibleRow> {
        let selected = self.selected.clone()?;
        if !self.is_folder(&selected) {
            return None;
        }
        if !self.expanded.contains(&selected) && self.filter.is_empty() {
            self.expanded.insert(selected);
            return None;
        }
        let rows = self.visible_rows();
        let index = rows.iter().position(|r| r.path == selected)?;
        let depth = rows[index].depth;
        match rows.get(index + 1) {
            Some(child) if child.depth > depth => self.take_row(rows, index + 1),
            _ => None,
        }
    }

    /// Collapse the selected folder, or step up to the parent folder.
    /// Returns the newly selected row, if the selection moved.
    pub fn collapse_or_ascend(&mut self) -> Option<VisibleRow> {
        let selected = self.selected.clone()?;
        if self.is_folder(&selected) && self.expanded.remove(&selected) {
            return None;
        }
        let rows = self.visible_rows();
        let index = rows.iter().position(|r| r.path == selected)?;
        let depth = rows[index].depth;
        if depth == 0 {
            return None;
        }
        let parent = rows[..index].iter().rposition(|r| r.depth + 1 == depth && r.is_folder())?;
        self.take_row(rows, parent)
    }
}

fn sort_files(node: &mut FolderNode) {
    node.files.sort_by(|a, b| a.name.cmp(&b.name));
    for folder in node.folders.values_mut() {
        sort_files(folder);
    }
}
