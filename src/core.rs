use std::path::PathBuf;
use thiserror::Error;

/// Dialog mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogMode {
    /// Pick a single existing file
    OpenFile,
    /// Pick multiple existing files
    OpenFiles,
    /// Pick a directory
    PickFolder,
    /// Save file (target may not exist yet)
    SaveFile,
}

impl DialogMode {
    /// Whether only existing entries may be selected.
    pub fn is_open(self) -> bool {
        matches!(self, DialogMode::OpenFile | DialogMode::OpenFiles)
    }

    /// Whether only directories are listed and selectable.
    pub fn is_folder(self) -> bool {
        matches!(self, DialogMode::PickFolder)
    }
}

/// Keyboard/mouse modifier keys used by selection logic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Ctrl key held.
    pub ctrl: bool,
    /// Shift key held.
    pub shift: bool,
}

/// Selection result containing one or more resolved paths
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Selected filesystem paths
    pub paths: Vec<PathBuf>,
}

/// Errors surfaced by the browser core.
///
/// Scan failures are recoverable: the browser reverts the path input and keeps
/// the previous entry list. Metadata failures are never surfaced to the user
/// at all; the metadata panel is simply suppressed.
#[derive(Error, Debug)]
pub enum FileDialogError {
    /// User cancelled the browser
    #[error("cancelled")]
    Cancelled,
    /// I/O error while enumerating a directory
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A background task was cancelled or exceeded its deadline
    #[error("scan cancelled or timed out")]
    Interrupted,
    /// Invalid or non-existing path requested
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// A background task panicked or failed unexpectedly
    #[error("internal error: {0}")]
    Internal(String),
}
