//! Renderer-agnostic core for in-UI file browsers.
//!
//! This crate owns everything a file-dialog widget needs except the pixels:
//! cancellable background directory scans with last-writer-wins commit,
//! extension/search filtering, race-free multi-select with an optional cap,
//! back/forward history, sidecar metadata loading, and fixed-height list
//! windowing. The widget layer forwards input events into [`FileBrowser`]
//! and calls [`FileBrowser::poll`] once per frame.
//!
//! ```no_run
//! use file_browser_core::{BrowserOptions, DialogMode, FileBrowser};
//!
//! let mut browser = FileBrowser::new(
//!     BrowserOptions::new(DialogMode::OpenFiles)
//!         .filters("Images{png,jpg},All files{*}")
//!         .max_open_count(8),
//! );
//! browser.open("/home/me/pictures");
//! // each frame:
//! browser.poll();
//! if let Some(result) = browser.take_result() {
//!     // paths picked or dialog cancelled
//!     let _ = result;
//! }
//! ```

#![deny(missing_docs)]

mod browser;
mod core;
mod entry;
mod filter;
mod fs;
mod history;
mod metadata;
#[cfg(feature = "preview-image")]
mod metadata_image;
mod scan;
mod scroll;
mod selection;

pub use browser::{BrowserOptions, FileBrowser};
pub use crate::core::{DialogMode, FileDialogError, Modifiers, Selection};
pub use entry::{DirEntry, EntryId, EntryKind, format_size};
pub use filter::{FileFilter, filter_entries, parse_filters};
pub use fs::{FileSystem, FsEntry, FsMetadata, StdFileSystem};
pub use history::HistoryStack;
pub use metadata::{
    DEFAULT_METADATA_TIMEOUT, DecodedRgbaImage, MetadataCoordinator, MetadataProviders,
    MetadataRecord,
};
pub use scan::{DEFAULT_SCAN_TIMEOUT, ScanCommit, ScanCoordinator};
pub use scroll::{ScrollWindow, visible};
pub use selection::SelectionEngine;
