use indexmap::IndexSet;
use regex::Regex;

use crate::entry::DirEntry;

/// A single parsed filter option.
///
/// An empty extension set means the filter matches every file (`*` or a bare
/// name without an extension group both parse to this).
#[derive(Clone, Debug)]
pub struct FileFilter {
    /// Name as written in the grammar string (without the extension group).
    pub name: String,
    /// Full label for combo display, e.g. `Images{png,jpg}`.
    pub label: String,
    /// Lowercased extensions without leading dots; empty = match-all.
    pub extensions: IndexSet<String>,
}

impl FileFilter {
    /// Whether a file name passes this filter. Comparison is by exact
    /// extension, case-insensitive.
    pub fn matches(&self, file_name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let ext = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
            _ => return false,
        };
        self.extensions.contains(&ext)
    }
}

/// Parse a filter grammar string into its options.
///
/// Grammar: comma-separated terms, each either a bare name (match-all) or
/// `Name{ext1,ext2}`. Extensions are trimmed, lowercased, and stripped of a
/// leading dot. Malformed trailing garbage is ignored by the tokenizer.
pub fn parse_filters(spec: &str) -> Vec<FileFilter> {
    let Ok(re) = Regex::new(r"[^,{}]+(\{([^{}]*?)\})?") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for cap in re.captures_iter(spec) {
        let full = cap.get(0).map(|m| m.as_str().trim()).unwrap_or("");
        if full.is_empty() {
            continue;
        }
        let name = match full.find('{') {
            Some(i) => full[..i].trim().to_string(),
            None => full.to_string(),
        };
        let mut extensions = IndexSet::new();
        if let Some(group) = cap.get(2) {
            for ext in group.as_str().split(',') {
                let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
                if !ext.is_empty() && ext != "*" {
                    extensions.insert(ext);
                }
            }
        }
        out.push(FileFilter {
            name,
            label: full.to_string(),
            extensions,
        });
    }
    out
}

/// Run the narrowing pipeline over a scan's entry list.
///
/// Directories are always navigable, so they pass both the extension stage
/// and the search stage; files must match the active filter's extensions and
/// then the case-insensitive substring search. The result is an owned
/// replacement list, rebuilt whenever the entries, the active filter, or the
/// search text change.
pub fn filter_entries(
    entries: &[DirEntry],
    active: Option<&FileFilter>,
    search: &str,
) -> Vec<DirEntry> {
    let needle = search.trim().to_lowercase();
    entries
        .iter()
        .filter(|e| {
            if e.kind.is_dir() {
                return true;
            }
            if let Some(f) = active {
                if !f.matches(&e.name) {
                    return false;
                }
            }
            needle.is_empty() || e.name.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
