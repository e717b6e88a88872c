use std::path::PathBuf;
use std::time::SystemTime;

/// Stable identity of a listed entry within one scan.
///
/// Ids carry the scan generation, so an id taken from an older listing never
/// compares equal to any id of the current listing. Selection keyed by
/// `EntryId` therefore cannot leak across scans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    generation: u64,
    index: u32,
}

impl EntryId {
    pub(crate) fn new(generation: u64, index: u32) -> Self {
        Self { generation, index }
    }

    /// Scan generation this id belongs to.
    pub fn generation(self) -> u64 {
        self.generation
    }

    /// Position within the scan that produced it.
    pub fn index(self) -> u32 {
        self.index
    }
}

/// Kind of a listed entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Dir,
    /// The synthetic `..` entry pointing at the parent directory
    ParentLink,
}

impl EntryKind {
    /// Whether activating this entry navigates instead of selecting a file.
    pub fn is_dir(self) -> bool {
        matches!(self, EntryKind::Dir | EntryKind::ParentLink)
    }
}

/// Immutable snapshot of a directory entry produced by a scan.
#[derive(Clone, Debug)]
pub struct DirEntry {
    /// Identity within the producing scan.
    pub id: EntryId,
    /// Display name (`..` for the parent link).
    pub name: String,
    /// Full path.
    pub path: PathBuf,
    /// File, directory, or parent link.
    pub kind: EntryKind,
    /// Size in bytes; `None` for directories.
    pub size: Option<u64>,
    /// Last modified timestamp, when the file system reported one.
    pub modified: Option<SystemTime>,
}

impl DirEntry {
    /// Short type label for list columns: `Folder` for directories, the
    /// extension (without dot) for files, empty when there is none.
    pub fn type_label(&self) -> String {
        if self.kind.is_dir() {
            return "Folder".to_string();
        }
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Human-readable size label; empty for directories.
    pub fn size_label(&self) -> String {
        match self.size {
            Some(bytes) => format_size(bytes),
            None => String::new(),
        }
    }

    /// Short `date time` label for the modified column; empty when unknown.
    pub fn modified_label(&self) -> String {
        match self.modified {
            Some(ts) => {
                let dt: chrono::DateTime<chrono::Local> = ts.into();
                dt.format("%Y-%m-%d %H:%M").to_string()
            }
            None => String::new(),
        }
    }
}

const SIZE_SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with a 1024-based suffix and one decimal place.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mag = (bytes as f64).log(1024.0).floor() as usize;
    let mag = mag.min(SIZE_SUFFIXES.len() - 1);
    let scaled = bytes as f64 / 1024f64.powi(mag as i32);
    let rounded = (scaled * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, SIZE_SUFFIXES[mag])
    } else {
        format!("{:.1} {}", rounded, SIZE_SUFFIXES[mag])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_from_different_generations_never_equal() {
        let a = EntryId::new(1, 0);
        let b = EntryId::new(2, 0);
        assert_ne!(a, b);
        assert_eq!(a, EntryId::new(1, 0));
    }

    #[test]
    fn size_labels() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1 MB");
    }

    #[test]
    fn type_label_for_dirs_and_files() {
        let dir = DirEntry {
            id: EntryId::new(1, 0),
            name: "docs".into(),
            path: "/docs".into(),
            kind: EntryKind::Dir,
            size: None,
            modified: None,
        };
        assert_eq!(dir.type_label(), "Folder");
        assert_eq!(dir.size_label(), "");

        let file = DirEntry {
            id: EntryId::new(1, 1),
            name: "a.TXT".into(),
            path: "/a.TXT".into(),
            kind: EntryKind::File,
            size: Some(3),
            modified: None,
        };
        assert_eq!(file.type_label(), "TXT");
        assert_eq!(file.size_label(), "3 B");
    }
}
