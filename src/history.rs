/// Cursor-based back/forward timeline.
///
/// The cursor counts entries behind it, so `cursor == 0` means "before the
/// first entry" and `cursor == timeline.len()` means "at the head". `add`
/// truncates the redo tail; `add_unique` additionally removes every prior
/// occurrence of the value so a revisited directory appears once, at the head.
#[derive(Clone, Debug, Default)]
pub struct HistoryStack<T: PartialEq> {
    cursor: usize,
    timeline: Vec<T>,
}

impl<T: PartialEq> HistoryStack<T> {
    /// Empty history.
    pub fn new() -> Self {
        Self {
            cursor: 0,
            timeline: Vec::new(),
        }
    }

    /// Push a new entry, discarding everything after the cursor.
    pub fn add(&mut self, value: T) {
        self.timeline.truncate(self.cursor);
        self.timeline.push(value);
        self.cursor += 1;
    }

    /// Push a new entry after removing all prior occurrences of it.
    ///
    /// Each removal before the cursor shifts the cursor back by one so it
    /// keeps pointing at the same logical position.
    pub fn add_unique(&mut self, value: T) {
        let mut i = 0;
        while i < self.timeline.len() {
            if self.timeline[i] == value {
                self.timeline.remove(i);
                if i < self.cursor {
                    self.cursor -= 1;
                }
            } else {
                i += 1;
            }
        }
        self.add(value);
    }

    /// Step back and return the entry now at the cursor. No-op at the start.
    pub fn previous(&mut self) -> Option<&T> {
        if self.can_go_back() {
            self.cursor -= 1;
            self.current()
        } else {
            None
        }
    }

    /// Step forward and return the entry now at the cursor. No-op at the end.
    pub fn next(&mut self) -> Option<&T> {
        if self.can_go_forward() {
            self.cursor += 1;
            self.current()
        } else {
            None
        }
    }

    /// Entry at the cursor, if any.
    pub fn current(&self) -> Option<&T> {
        if self.cursor > 0 {
            self.timeline.get(self.cursor - 1)
        } else {
            None
        }
    }

    /// Whether stepping back would land on an entry.
    pub fn can_go_back(&self) -> bool {
        self.cursor > 1
    }

    /// Whether there is a redo tail to step into.
    pub fn can_go_forward(&self) -> bool {
        self.cursor < self.timeline.len()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.cursor = 0;
        self.timeline.clear();
    }

    /// Number of entries in the timeline.
    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    /// Whether the timeline is empty.
    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Read-only view of the timeline, oldest first.
    pub fn entries(&self) -> &[T] {
        &self.timeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_truncates_redo_tail() {
        let mut h = HistoryStack::new();
        h.add("a");
        h.add("b");
        h.add("c");
        assert_eq!(h.previous(), Some(&"b"));
        h.add("d");
        assert_eq!(h.entries(), &["a", "b", "d"]);
        assert!(!h.can_go_forward());
    }

    #[test]
    fn add_unique_dedups_and_keeps_cursor() {
        let mut h = HistoryStack::new();
        h.add_unique("/a");
        h.add_unique("/b");
        h.add_unique("/a");
        assert_eq!(h.entries(), &["/b", "/a"]);
        assert_eq!(h.current(), Some(&"/a"));
        assert_eq!(h.previous(), Some(&"/b"));
        assert!(!h.can_go_back());
    }

    #[test]
    fn boundaries_are_noops() {
        let mut h: HistoryStack<i32> = HistoryStack::new();
        assert_eq!(h.previous(), None);
        assert_eq!(h.next(), None);
        h.add(1);
        assert!(!h.can_go_back());
        assert_eq!(h.previous(), None);
        assert_eq!(h.current(), Some(&1));
        h.add(2);
        assert_eq!(h.previous(), Some(&1));
        assert_eq!(h.next(), Some(&2));
        assert_eq!(h.next(), None);
    }
}
