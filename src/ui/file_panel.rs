use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::services::size_cache::SizeTracker;

pub const PARENT_MARKER: &str = "..";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Parent,
    Directory,
    File,
    Executable,
}

impl EntryKind {
    pub fn is_directory_like(&self) -> bool {
        matches!(self, EntryKind::Parent | EntryKind::Directory)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    fn parent() -> Self {
        Self {
            name: PARENT_MARKER.to_string(),
            kind: EntryKind::Parent,
        }
    }
}

fn classify(path: &Path) -> EntryKind {
    // Follows symlinks, so a link to a directory browses like one.
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => EntryKind::Directory,
        Ok(meta) => {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if meta.is_file() && meta.permissions().mode() & 0o111 != 0 {
                    return EntryKind::Executable;
                }
            }
            #[cfg(not(unix))]
            let _ = meta;
            EntryKind::File
        }
        Err(_) => EntryKind::File,
    }
}

/// One directory browser pane.
#[derive(Debug)]
pub struct FilePanel {
    pub path: PathBuf,
    pub entries: Vec<Entry>,
    pub cursor: usize,
    pub scroll_offset: usize,
    /// Absolute paths, kept across navigation
    pub selected: HashSet<PathBuf>,
    pending_focus: Option<String>,
}

impl FilePanel {
    pub fn new(path: PathBuf) -> Self {
        let mut panel = Self {
            path,
            entries: Vec::new(),
            cursor: 0,
            scroll_offset: 0,
            selected: HashSet::new(),
            pending_focus: None,
        };
        panel.refresh();
        panel
    }

    /// Re-list `path`: parent marker first, then directories, then files,
    /// each group in case-insensitive name order. An unreadable directory
    /// lists as the parent marker alone.
    pub fn refresh(&mut self) {
        let mut items: Vec<Entry> = match fs::read_dir(&self.path) {
            Ok(read_dir) => read_dir
                .filter_map(|e| e.ok())
                .map(|e| {
                    let name = e.file_name().to_string_lossy().to_string();
                    let kind = classify(&e.path());
                    Entry { name, kind }
                })
                .collect(),
            Err(e) => {
                tracing::debug!("cannot list {}: {}", self.path.display(), e);
                Vec::new()
            }
        };

        items.sort_by_cached_key(|entry| {
            let group = if entry.kind == EntryKind::Directory { 0 } else { 1 };
            (group, entry.name.to_lowercase())
        });

        self.entries.clear();
        self.entries.reserve(items.len() + 1);
        self.entries.push(Entry::parent());
        self.entries.extend(items);

        if let Some(focus) = self.pending_focus.take() {
            if let Some(idx) = self.entries.iter().position(|e| e.name == focus) {
                self.cursor = idx;
            }
        }

        self.cursor = self.cursor.min(self.entries.len().saturating_sub(1));
        self.scroll_offset = 0;
    }

    pub fn current_entry(&self) -> Option<&Entry> {
        self.entries.get(self.cursor)
    }

    pub fn entry_path(&self, entry: &Entry) -> PathBuf {
        self.path.join(&entry.name)
    }

    /// Absolute path under the cursor; `None` on the parent marker.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.current_entry()
            .filter(|e| e.kind != EntryKind::Parent)
            .map(|e| self.entry_path(e))
    }

    /// Move the cursor by `delta`, clamped to the listing. With
    /// `visible_rows`, also scroll so the cursor stays on screen.
    pub fn move_cursor(&mut self, delta: isize, visible_rows: Option<usize>) {
        let last = self.entries.len().saturating_sub(1) as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, last.max(0)) as usize;
        if let Some(rows) = visible_rows {
            self.ensure_cursor_visible(rows);
        }
    }

    pub fn ensure_cursor_visible(&mut self, visible_rows: usize) {
        let rows = visible_rows.max(1);
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + rows {
            self.scroll_offset = self.cursor + 1 - rows;
        }
    }

    fn change_dir(&mut self, path: PathBuf) {
        if path != self.path {
            tracing::debug!("cd {} -> {}", self.path.display(), path.display());
            self.path = path;
            self.cursor = 0;
        }
    }

    fn parent_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"))
    }

    /// Open the entry under the cursor: the parent marker goes up, a
    /// directory is entered, a file leaves the path unchanged. Always
    /// refreshes the listing.
    pub fn enter(&mut self) {
        match self.current_entry().cloned() {
            Some(entry) if entry.kind == EntryKind::Parent => self.go_to_parent(),
            Some(entry) if entry.kind == EntryKind::Directory => {
                let target = self.entry_path(&entry);
                self.change_dir(target);
                self.refresh();
            }
            _ => self.refresh(),
        }
    }

    /// Go up one level, keeping the cursor on the directory just left.
    pub fn go_to_parent(&mut self) {
        let parent = self.parent_dir();
        if parent != self.path {
            self.pending_focus = self.path.file_name().map(|n| n.to_string_lossy().to_string());
        }
        self.change_dir(parent);
        self.refresh();
    }

    /// Add or remove the cursor entry from the selection.
    pub fn toggle_select(&mut self) {
        let Some(path) = self.current_path() else {
            return;
        };
        if !self.selected.remove(&path) {
            self.selected.insert(path);
        }
    }

    pub fn is_selected(&self, entry: &Entry) -> bool {
        entry.kind != EntryKind::Parent && self.selected.contains(&self.entry_path(entry))
    }

    /// Size of the cursor entry. Files are stat'ed live; directories come
    /// from the tracker, which schedules a walk on first request and
    /// answers `None` until it finishes.
    pub fn current_item_size(&self, sizes: &SizeTracker) -> Option<u64> {
        let entry = self.current_entry()?;
        let path = self.entry_path(entry);
        match entry.kind {
            EntryKind::Parent => None,
            EntryKind::Directory => sizes.directory_size(&path),
            EntryKind::File | EntryKind::Executable => {
                fs::metadata(&path).ok().filter(|m| m.is_file()).map(|m| m.len())
            }
        }
    }

    /// Selected paths in a stable order, for running jobs.
    pub fn selected_sorted(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.selected.iter().cloned().collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn names(panel: &FilePanel) -> Vec<&str> {
        panel.entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn make_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("dirA")).unwrap();
        fs::write(dir.path().join("fileB.txt"), b"hello").unwrap();
        dir
    }

    #[test]
    fn test_listing_parent_then_dirs_then_files() {
        let dir = make_tree();
        let panel = FilePanel::new(dir.path().to_path_buf());
        assert_eq!(names(&panel), vec!["..", "dirA", "fileB.txt"]);
        assert_eq!(panel.entries[0].kind, EntryKind::Parent);
        assert_eq!(panel.entries[1].kind, EntryKind::Directory);
    }

    #[test]
    fn test_sort_is_case_insensitive_per_group() {
        let dir = tempfile::tempdir().unwrap();
        for d in ["zeta", "Alpha", "beta"] {
            fs::create_dir(dir.path().join(d)).unwrap();
        }
        for f in ["b.txt", "A.txt", "c.TXT"] {
            fs::write(dir.path().join(f), b"").unwrap();
        }
        let panel = FilePanel::new(dir.path().to_path_buf());
        assert_eq!(names(&panel), vec!["..", "Alpha", "beta", "zeta", "A.txt", "b.txt", "c.TXT"]);
    }

    #[test]
    fn test_unreadable_directory_lists_only_parent() {
        let panel = FilePanel::new(PathBuf::from("/nonexistent/rclone-tui/panel"));
        assert_eq!(names(&panel), vec![".."]);
        assert_eq!(panel.cursor, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_classified() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("run.sh");
        fs::write(&script, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let panel = FilePanel::new(dir.path().to_path_buf());
        assert_eq!(panel.entries[1].kind, EntryKind::Executable);
    }

    #[test]
    fn test_move_cursor_clamps_and_scrolls() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..20 {
            fs::write(dir.path().join(format!("f{:02}", i)), b"").unwrap();
        }
        let mut panel = FilePanel::new(dir.path().to_path_buf());
        assert_eq!(panel.entries.len(), 21);

        panel.move_cursor(-5, Some(5));
        assert_eq!(panel.cursor, 0);
        assert_eq!(panel.scroll_offset, 0);

        for _ in 0..7 {
            panel.move_cursor(1, Some(5));
            assert!(panel.cursor >= panel.scroll_offset);
            assert!(panel.cursor < panel.scroll_offset + 5);
        }
        assert_eq!(panel.cursor, 7);
        assert_eq!(panel.scroll_offset, 3);

        panel.move_cursor(100, Some(5));
        assert_eq!(panel.cursor, 20);
        assert_eq!(panel.scroll_offset, 16);

        panel.move_cursor(-18, Some(5));
        assert_eq!(panel.cursor, 2);
        assert_eq!(panel.scroll_offset, 2);
    }

    #[test]
    fn test_move_cursor_unbounded_keeps_scroll() {
        let dir = make_tree();
        let mut panel = FilePanel::new(dir.path().to_path_buf());
        panel.scroll_offset = 1;
        panel.move_cursor(2, None);
        assert_eq!(panel.cursor, 2);
        assert_eq!(panel.scroll_offset, 1);
    }

    #[test]
    fn test_enter_directory_and_back_to_parent() {
        let dir = make_tree();
        let root = dir.path().to_path_buf();
        let mut panel = FilePanel::new(root.clone());

        panel.move_cursor(1, Some(10));
        panel.enter();
        assert_eq!(panel.path, root.join("dirA"));
        assert_eq!(names(&panel), vec![".."]);

        panel.enter();
        assert_eq!(panel.path, root);
        // Cursor returns to the directory we came from.
        assert_eq!(panel.current_entry().map(|e| e.name.as_str()), Some("dirA"));
    }

    #[test]
    fn test_enter_on_file_keeps_path() {
        let dir = make_tree();
        let mut panel = FilePanel::new(dir.path().to_path_buf());
        panel.move_cursor(2, None);
        panel.enter();
        assert_eq!(panel.path, dir.path());
        assert_eq!(panel.cursor, 2);
    }

    #[test]
    fn test_parent_of_root_is_root() {
        let mut panel = FilePanel::new(PathBuf::from("/"));
        panel.go_to_parent();
        assert_eq!(panel.path, PathBuf::from("/"));
        assert_eq!(panel.entries[0].name, PARENT_MARKER);
    }

    #[test]
    fn test_toggle_select_is_its_own_inverse() {
        let dir = make_tree();
        let mut panel = FilePanel::new(dir.path().to_path_buf());
        panel.move_cursor(2, None);
        let path = dir.path().join("fileB.txt");

        panel.toggle_select();
        assert!(panel.selected.contains(&path));
        panel.toggle_select();
        assert!(!panel.selected.contains(&path));
    }

    #[test]
    fn test_toggle_on_parent_is_noop() {
        let dir = make_tree();
        let mut panel = FilePanel::new(dir.path().to_path_buf());
        panel.toggle_select();
        assert!(panel.selected.is_empty());
    }

    #[test]
    fn test_selection_survives_navigation() {
        let dir = make_tree();
        let mut panel = FilePanel::new(dir.path().to_path_buf());
        panel.move_cursor(2, None);
        panel.toggle_select();
        panel.move_cursor(-1, None);
        panel.enter();
        assert_eq!(panel.selected.len(), 1);
        assert!(panel.selected.contains(&dir.path().join("fileB.txt")));
    }

    #[test]
    fn test_current_item_size_file_and_parent() {
        let dir = make_tree();
        let sizes = SizeTracker::new(1);
        let mut panel = FilePanel::new(dir.path().to_path_buf());
        assert_eq!(panel.current_item_size(&sizes), None);
        panel.move_cursor(2, None);
        assert_eq!(panel.current_item_size(&sizes), Some(5));
        assert_eq!(sizes.jobs_submitted(), 0);
    }

    #[test]
    fn test_current_item_size_directory_resolves() {
        let dir = make_tree();
        fs::write(dir.path().join("dirA/inner.bin"), vec![0u8; 64]).unwrap();
        let sizes = SizeTracker::new(1);
        let mut panel = FilePanel::new(dir.path().to_path_buf());
        panel.move_cursor(1, None);

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut size = panel.current_item_size(&sizes);
        while size.is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            size = panel.current_item_size(&sizes);
        }
        assert_eq!(size, Some(64));
        assert_eq!(sizes.jobs_submitted(), 1);
    }
}
