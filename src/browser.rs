use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;

use crate::core::{DialogMode, FileDialogError, Modifiers, Selection};
use crate::entry::{DirEntry, EntryId};
use crate::filter::{FileFilter, filter_entries, parse_filters};
use crate::fs::{FileSystem, StdFileSystem};
use crate::history::HistoryStack;
use crate::metadata::{
    DEFAULT_METADATA_TIMEOUT, MetadataCoordinator, MetadataProviders, MetadataRecord,
};
use crate::scan::{DEFAULT_SCAN_TIMEOUT, ScanCommit, ScanCoordinator};
use crate::scroll::{ScrollWindow, visible};
use crate::selection::SelectionEngine;

/// Configuration for a [`FileBrowser`].
#[derive(Clone, Debug)]
pub struct BrowserOptions {
    /// Dialog mode.
    pub mode: DialogMode,
    /// Filter grammar string, e.g. `Images{png,jpg},All files{*}`.
    pub filters: String,
    /// Index of the initially active filter.
    pub active_filter: usize,
    /// Selection cap in multi-open mode; 0 = unlimited.
    pub max_open_count: usize,
    /// Initial file-name input in save mode.
    pub default_file_name: String,
    /// Extension enforced on the file-name input in save mode (no dot).
    pub extension: Option<String>,
    /// Deadline for a single directory scan.
    pub scan_timeout: Duration,
    /// Window within which repeated navigation coalesces into one scan.
    pub scan_debounce: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            mode: DialogMode::OpenFile,
            filters: String::new(),
            active_filter: 0,
            max_open_count: 0,
            default_file_name: "Untitled".to_string(),
            extension: None,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            scan_debounce: Duration::ZERO,
        }
    }
}

impl BrowserOptions {
    /// Options for a mode, everything else defaulted.
    pub fn new(mode: DialogMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Set the filter grammar string.
    pub fn filters(mut self, filters: impl Into<String>) -> Self {
        self.filters = filters.into();
        self
    }

    /// Set the initially active filter index.
    pub fn active_filter(mut self, index: usize) -> Self {
        self.active_filter = index;
        self
    }

    /// Cap the number of selectable entries in multi-open mode (0 = unlimited).
    pub fn max_open_count(mut self, count: usize) -> Self {
        self.max_open_count = count;
        self
    }

    /// Set the initial save-mode file name.
    pub fn default_file_name(mut self, name: impl Into<String>) -> Self {
        self.default_file_name = name.into();
        self
    }

    /// Enforce an extension on the save-mode file name.
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        self.extension = Some(ext.trim_start_matches('.').to_string());
        self
    }

    /// Set the per-scan deadline.
    pub fn scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Coalesce rapid navigation into one scan per window.
    pub fn scan_debounce(mut self, window: Duration) -> Self {
        self.scan_debounce = window;
        self
    }
}

/// Renderer-agnostic file browser state machine.
///
/// The widget layer forwards input events (clicks, keys, text edits) and
/// calls [`poll`](Self::poll) once per frame to commit background work. All
/// listing, filtering, selection, history, and metadata state lives here.
pub struct FileBrowser {
    options: BrowserOptions,
    fs: Arc<dyn FileSystem>,
    scan: ScanCoordinator,
    meta: MetadataCoordinator,
    providers: Arc<MetadataProviders>,
    history: HistoryStack<PathBuf>,
    filters: Vec<FileFilter>,
    active_filter: Option<usize>,
    search: String,
    entries: Vec<DirEntry>,
    filtered: Vec<DirEntry>,
    selection: SelectionEngine,
    focused: Option<EntryId>,
    active_dir: Option<PathBuf>,
    path_input: String,
    file_input: String,
    is_open: bool,
    result: Option<Result<Selection, FileDialogError>>,
    pending_overwrite: Option<Selection>,
    ui_error: Option<String>,
    pending_history: bool,
}

impl FileBrowser {
    /// New browser over the real file system.
    pub fn new(options: BrowserOptions) -> Self {
        Self::with_fs(options, Arc::new(StdFileSystem))
    }

    /// New browser over a custom [`FileSystem`].
    pub fn with_fs(options: BrowserOptions, fs: Arc<dyn FileSystem>) -> Self {
        let filters = parse_filters(&options.filters);
        let active_filter = if filters.is_empty() {
            None
        } else {
            Some(options.active_filter.min(filters.len() - 1))
        };
        let max_count = if options.mode == DialogMode::OpenFiles {
            options.max_open_count
        } else {
            1
        };
        let providers = Arc::new(MetadataProviders::new());
        Self {
            scan: ScanCoordinator::new(
                fs.clone(),
                options.mode.is_folder(),
                options.scan_timeout,
                options.scan_debounce,
            ),
            meta: MetadataCoordinator::new(providers.clone(), DEFAULT_METADATA_TIMEOUT),
            providers,
            history: HistoryStack::new(),
            filters,
            active_filter,
            search: String::new(),
            entries: Vec::new(),
            filtered: Vec::new(),
            selection: SelectionEngine::new(max_count, options.mode.is_open()),
            focused: None,
            active_dir: None,
            path_input: String::new(),
            file_input: String::new(),
            is_open: false,
            result: None,
            pending_overwrite: None,
            ui_error: None,
            pending_history: false,
            fs,
            options,
        }
    }

    /// Register a metadata provider for an extension.
    pub fn register_metadata_provider<F>(&self, extension: &str, provider: F)
    where
        F: Fn(&Path) -> Option<MetadataRecord> + Send + Sync + 'static,
    {
        self.providers.register(extension, provider);
    }

    /// Open the browser at a starting directory.
    pub fn open(&mut self, start_dir: impl Into<PathBuf>) {
        let start_dir = start_dir.into();
        self.is_open = true;
        self.result = None;
        self.pending_overwrite = None;
        self.ui_error = None;
        self.file_input = if self.options.mode == DialogMode::SaveFile {
            enforce_extension(
                self.options.default_file_name.clone(),
                self.options.extension.as_deref(),
            )
        } else {
            String::new()
        };
        let start_dir = self
            .fs
            .canonicalize(&start_dir)
            .unwrap_or(start_dir);
        self.open_directory(start_dir, true);
    }

    /// Close the browser, cancelling all in-flight work. Keeps any result
    /// already produced so the caller can still take it.
    pub fn close(&mut self) {
        self.is_open = false;
        self.scan.close();
        self.meta.close();
        self.entries.clear();
        self.filtered.clear();
        self.selection.clear();
        self.focused = None;
        self.pending_overwrite = None;
        self.pending_history = false;
    }

    /// Dismiss the browser without a selection.
    pub fn cancel(&mut self) {
        if self.result.is_none() {
            self.result = Some(Err(FileDialogError::Cancelled));
        }
        self.close();
    }

    /// Navigate to a directory. `log_history` records it (deduplicated) once
    /// the scan commits.
    pub fn open_directory(&mut self, path: PathBuf, log_history: bool) {
        self.pending_history = log_history;
        self.path_input = path.display().to_string();
        self.scan.begin_scan(path);
    }

    /// Re-scan the current directory.
    pub fn refresh(&mut self) {
        if let Some(dir) = self.active_dir.clone() {
            self.open_directory(dir, false);
        }
    }

    /// Step back in history.
    pub fn go_back(&mut self) {
        if let Some(path) = self.history.previous().cloned() {
            self.open_directory(path, false);
        }
    }

    /// Step forward in history.
    pub fn go_forward(&mut self) {
        if let Some(path) = self.history.next().cloned() {
            self.open_directory(path, false);
        }
    }

    /// Whether back navigation is possible.
    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    /// Whether forward navigation is possible.
    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    /// Navigate to the directory typed into the path input. A failing scan
    /// reverts the input and raises a user-visible error.
    pub fn submit_path_input(&mut self) {
        let path = PathBuf::from(self.path_input.trim());
        if path.as_os_str().is_empty() {
            return;
        }
        self.open_directory(path, true);
    }

    /// Replace the search text and rebuild the filtered view.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.reapply_filters();
    }

    /// Switch the active filter and rebuild the filtered view. An
    /// out-of-range index is clamped; no filters means no filtering.
    pub fn set_active_filter(&mut self, index: usize) {
        self.active_filter = if self.filters.is_empty() {
            None
        } else {
            Some(index.min(self.filters.len() - 1))
        };
        self.reapply_filters();
    }

    /// Single click on an entry: focus it, and select it when selectable
    /// (files always; directories only in folder mode).
    pub fn click_entry(&mut self, id: EntryId, modifiers: Modifiers) {
        self.focused = Some(id);
        let Some(entry) = self.filtered.iter().find(|e| e.id == id) else {
            return;
        };
        let selectable = !entry.kind.is_dir() || self.options.mode.is_folder();
        if selectable {
            self.selection.select(&self.filtered, id, modifiers);
            self.update_file_input(true);
        }
    }

    /// Double click: navigate into directories, confirm files.
    pub fn double_click_entry(&mut self, id: EntryId) {
        let Some(entry) = self.filtered.iter().find(|e| e.id == id).cloned() else {
            return;
        };
        if entry.kind.is_dir() {
            self.open_directory(entry.path, true);
            return;
        }
        self.selection.select(&self.filtered, id, Modifiers::default());
        self.update_file_input(true);
        self.try_confirm();
    }

    /// Move keyboard focus by `delta` rows. Focus is independent of the
    /// multi-selection; it only tracks the highlighted row.
    pub fn move_focus(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            self.focused = None;
            return;
        }
        let last = self.filtered.len() - 1;
        let next = match self
            .focused
            .and_then(|id| self.filtered.iter().position(|e| e.id == id))
        {
            Some(i) => (i as isize + delta).clamp(0, last as isize) as usize,
            None => {
                if delta >= 0 {
                    0
                } else {
                    last
                }
            }
        };
        self.focused = Some(self.filtered[next].id);
    }

    /// Currently focused entry id, if any.
    pub fn focused(&self) -> Option<EntryId> {
        self.focused
    }

    /// Activate the focused entry: navigate for directories, select and
    /// confirm for files.
    pub fn activate_focused(&mut self) {
        if let Some(id) = self.focused {
            self.double_click_entry(id);
        }
    }

    /// Attempt to confirm with the current selection and file-name input.
    /// In save mode an existing target raises the overwrite gate instead of
    /// producing a result.
    pub fn confirm(&mut self) {
        self.try_confirm();
    }

    /// Accept the pending overwrite and produce the result.
    pub fn accept_overwrite(&mut self) {
        if let Some(selection) = self.pending_overwrite.take() {
            if self.result.is_none() {
                self.result = Some(Ok(selection));
            }
            self.close();
        }
    }

    /// Dismiss the overwrite gate, keeping the browser open.
    pub fn cancel_overwrite(&mut self) {
        self.pending_overwrite = None;
    }

    /// Whether the overwrite gate is waiting for a decision.
    pub fn has_pending_overwrite(&self) -> bool {
        self.pending_overwrite.is_some()
    }

    /// Per-frame pump: commits scan and metadata outcomes, promotes parked
    /// scans, and refocuses the metadata loader on the sole selected entry.
    pub fn poll(&mut self) {
        if let Some(commit) = self.scan.poll() {
            match commit {
                ScanCommit::Committed { path, entries } => {
                    self.active_dir = Some(path.clone());
                    self.path_input = path.display().to_string();
                    self.entries = entries;
                    self.selection.clear();
                    self.focused = None;
                    if std::mem::take(&mut self.pending_history) {
                        self.history.add_unique(path);
                    }
                    self.reapply_filters();
                    self.update_file_input(true);
                }
                ScanCommit::Failed { path, error } => {
                    self.pending_history = false;
                    self.path_input = self
                        .active_dir
                        .as_ref()
                        .map(|d| d.display().to_string())
                        .unwrap_or_default();
                    self.ui_error =
                        Some(format!("Could not open {}: {}", path.display(), error));
                }
            }
        }

        let focus = if self.selection.selected_count() == 1 {
            self.selection
                .selected_ids()
                .next()
                .and_then(|id| self.entries.iter().find(|e| e.id == id))
                .map(|e| e.path.clone())
        } else {
            None
        };
        self.meta.focus(focus.as_deref());
        self.meta.poll();
    }

    /// Ordered entries after filter and search narrowing.
    pub fn filtered_entries(&self) -> &[DirEntry] {
        &self.filtered
    }

    /// Parsed filter options, in grammar order.
    pub fn filters(&self) -> &[FileFilter] {
        &self.filters
    }

    /// Index of the active filter, if any.
    pub fn active_filter_index(&self) -> Option<usize> {
        self.active_filter
    }

    /// Directory whose listing is shown.
    pub fn current_dir(&self) -> Option<&Path> {
        self.active_dir.as_deref()
    }

    /// Editable path-input text.
    pub fn path_input(&self) -> &str {
        &self.path_input
    }

    /// Replace the path-input text (does not navigate).
    pub fn set_path_input(&mut self, text: impl Into<String>) {
        self.path_input = text.into();
    }

    /// Editable file-name input text.
    pub fn file_input(&self) -> &str {
        &self.file_input
    }

    /// Replace the file-name input text. In save mode the configured
    /// extension is enforced on the new text.
    pub fn set_file_input(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.file_input = if self.options.mode == DialogMode::SaveFile {
            enforce_extension(text, self.options.extension.as_deref())
        } else {
            text
        };
    }

    /// Current search text.
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Whether the browser is open.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Whether a scan is in flight (spinner signal).
    pub fn is_loading(&self) -> bool {
        self.scan.is_loading()
    }

    /// Number of selected entries.
    pub fn selected_count(&self) -> usize {
        self.selection.selected_count()
    }

    /// Whether an entry is selected.
    pub fn is_selected(&self, id: EntryId) -> bool {
        self.selection.is_selected(id)
    }

    /// Metadata record for the sole selected entry, once loaded.
    pub fn metadata(&self) -> Option<&MetadataRecord> {
        self.meta.current()
    }

    /// Take the final result, if one was produced.
    pub fn take_result(&mut self) -> Option<Result<Selection, FileDialogError>> {
        self.result.take()
    }

    /// Take the pending user-visible error message, if any.
    pub fn take_error(&mut self) -> Option<String> {
        self.ui_error.take()
    }

    /// Compute the visible row window for the filtered list.
    pub fn scroll_window(&self, item_height: f32, frame_height: f32, scroll: f32) -> ScrollWindow {
        visible(self.filtered.len(), item_height, frame_height, scroll)
    }

    fn reapply_filters(&mut self) {
        let active = self.active_filter.and_then(|i| self.filters.get(i));
        self.filtered = filter_entries(&self.entries, active, &self.search);
        if let Some(id) = self.focused {
            if !self.filtered.iter().any(|e| e.id == id) {
                self.focused = None;
            }
        }
        trace_view_rebuilt(self.entries.len(), self.filtered.len());
    }

    /// Mirror the selection into the file-name input. With exactly one
    /// selected entry the input takes its name; otherwise `auto` clears it in
    /// open modes and points at the current directory in folder mode. Save
    /// mode keeps whatever the user typed.
    fn update_file_input(&mut self, auto: bool) {
        if self.selection.selected_count() == 1 {
            if let Some(entry) = self
                .selection
                .selected_ids()
                .next()
                .and_then(|id| self.entries.iter().find(|e| e.id == id))
            {
                let name = entry.name.clone();
                self.file_input = if self.options.mode == DialogMode::SaveFile {
                    enforce_extension(name, self.options.extension.as_deref())
                } else {
                    name
                };
            }
            return;
        }
        if auto && self.options.mode != DialogMode::SaveFile {
            self.file_input = if self.options.mode.is_folder() {
                ".".to_string()
            } else {
                String::new()
            };
        }
    }

    fn try_confirm(&mut self) {
        let Some(active_dir) = self.active_dir.clone() else {
            return;
        };
        let mut paths: IndexSet<PathBuf> = IndexSet::new();
        let input = self.file_input.trim();
        if !input.is_empty() {
            let candidate = if input == "." {
                active_dir.clone()
            } else {
                active_dir.join(input)
            };
            paths.insert(candidate);
        }
        for id in self.selection.selected_ids() {
            if let Some(entry) = self.entries.iter().find(|e| e.id == id) {
                paths.insert(entry.path.clone());
            }
        }
        if paths.is_empty() {
            return;
        }

        let max = match self.options.mode {
            DialogMode::OpenFiles => self.options.max_open_count,
            _ => 1,
        };
        let mut paths: Vec<PathBuf> = paths.into_iter().collect();
        if max > 0 {
            paths.truncate(max);
        }

        if self.options.mode == DialogMode::SaveFile && paths.iter().any(|p| self.fs.exists(p)) {
            self.pending_overwrite = Some(Selection { paths });
            return;
        }

        if self.result.is_none() {
            self.result = Some(Ok(Selection { paths }));
        }
        self.close();
    }
}

/// Append the enforced extension when the name does not already end with it
/// (case-insensitive).
fn enforce_extension(name: String, extension: Option<&str>) -> String {
    let Some(ext) = extension else {
        return name;
    };
    if ext.is_empty() || name.is_empty() {
        return name;
    }
    let suffix = format!(".{}", ext.to_ascii_lowercase());
    if name.to_ascii_lowercase().ends_with(&suffix) {
        name
    } else {
        format!("{name}.{ext}")
    }
}

#[cfg(feature = "tracing")]
fn trace_view_rebuilt(total: usize, shown: usize) {
    tracing::trace!(total, shown, "filtered view rebuilt");
}
#[cfg(not(feature = "tracing"))]
fn trace_view_rebuilt(_total: usize, _shown: usize) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforce_extension_appends_once() {
        assert_eq!(enforce_extension("a".into(), Some("txt")), "a.txt");
        assert_eq!(enforce_extension("a.txt".into(), Some("txt")), "a.txt");
        assert_eq!(enforce_extension("a.TXT".into(), Some("txt")), "a.TXT");
        assert_eq!(enforce_extension("a.png".into(), Some("txt")), "a.png.txt");
        assert_eq!(enforce_extension("a".into(), None), "a");
    }

    #[test]
    fn options_builder_normalizes_extension() {
        let opts = BrowserOptions::new(DialogMode::SaveFile).extension(".Json");
        assert_eq!(opts.extension.as_deref(), Some("Json"));
    }
}
