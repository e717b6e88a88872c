use indexmap::IndexSet;

use crate::core::Modifiers;
use crate::entry::{DirEntry, EntryId};

/// Multi-select state over the ordered, filtered entry list.
///
/// All mutation goes through [`select`](Self::select), which resolves the
/// target and the anchor against the view passed in. Ids from an older scan
/// simply resolve to nothing, so stale clicks fail silently. Entries hidden
/// by the current view keep their selection: only entries present in the
/// view get their flags reassigned.
#[derive(Debug, Default)]
pub struct SelectionEngine {
    selected: IndexSet<EntryId>,
    anchor: Option<EntryId>,
    max_count: usize,
    open_mode: bool,
}

impl SelectionEngine {
    /// New engine. `max_count` of 0 means unlimited; `open_mode` enables the
    /// plain re-click toggle on a sole selected entry.
    pub fn new(max_count: usize, open_mode: bool) -> Self {
        Self {
            selected: IndexSet::new(),
            anchor: None,
            max_count,
            open_mode,
        }
    }

    /// Apply a click on `target` with the given modifiers.
    ///
    /// Shift extends a range from the anchor (clamped so at most `max_count`
    /// entries nearest the anchor are taken); ctrl toggles the target while
    /// keeping the rest; a plain click replaces the visible selection with
    /// the target, except that in open mode re-clicking the sole selected
    /// entry deselects it. Entries not present in `view` keep their state.
    /// When both ctrl and shift are held and an anchor exists, shift wins.
    ///
    /// Returns whether `target` ended up selected. A target not present in
    /// `view` leaves the state untouched and returns `false`.
    pub fn select(&mut self, view: &[DirEntry], target: EntryId, modifiers: Modifiers) -> bool {
        let Some(target_index) = view.iter().position(|e| e.id == target) else {
            return false;
        };
        let anchor_index = self
            .anchor
            .and_then(|a| view.iter().position(|e| e.id == a));

        let is_shift = modifiers.shift && anchor_index.is_some();
        let is_ctrl = modifiers.ctrl && !is_shift;
        let has_max = self.max_count > 0;

        let mut flags: Vec<bool> = view.iter().map(|e| self.selected.contains(&e.id)).collect();
        let visible_selected = flags.iter().filter(|f| **f).count();
        // Selected entries hidden by the current view are left untouched and
        // still count against the cap.
        let hidden_selected = self.selected.len() - visible_selected;
        let prev_was_multi = self.selected.len() > 1;
        let target_was_selected = flags[target_index];

        // Clamp the shift range so at most max_count entries, nearest the
        // anchor, can be taken.
        let (range_lo, range_hi) = if is_shift {
            let prev = anchor_index.unwrap_or(target_index) as isize;
            let mut idx = target_index as isize;
            if has_max {
                let max = self.max_count as isize;
                idx = idx.clamp(prev - max + 1, prev + max - 1);
            }
            (idx.min(prev), idx.max(prev))
        } else {
            (0, -1)
        };

        let mut count = hidden_selected + if is_ctrl { visible_selected } else { 0 };
        for (i, e) in view.iter().enumerate() {
            let last = flags[i];
            let mut select = if is_ctrl {
                last ^ (e.id == target)
            } else if is_shift {
                let i = i as isize;
                i >= range_lo && i <= range_hi
            } else {
                e.id == target && !(self.open_mode && target_was_selected && !prev_was_multi)
            };
            if has_max && select && !last && count >= self.max_count {
                select = false;
            }
            if select && !last {
                count += 1;
            } else if !select && last {
                count = count.saturating_sub(1);
            }
            flags[i] = select;
        }

        for (i, e) in view.iter().enumerate() {
            if flags[i] {
                self.selected.insert(e.id);
            } else {
                self.selected.shift_remove(&e.id);
            }
        }

        let selected = flags[target_index];
        if selected && !is_shift {
            self.anchor = Some(target);
        }
        selected
    }

    /// Whether an entry is selected.
    pub fn is_selected(&self, id: EntryId) -> bool {
        self.selected.contains(&id)
    }

    /// Number of selected entries.
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected ids in view order of the last `select` call.
    pub fn selected_ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.selected.iter().copied()
    }

    /// Drop all selection state, including the anchor.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }
}
