//! Option flags shared by the find and replace front ends.
//!
//! The bit values match the classic find dialog so hosts that persist the
//! option mask keep working.

use bitflags::bitflags;

bitflags! {
    /// Independently combinable search options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FindOptions: u32 {
        /// Reject matches touching a word character on either side.
        const WHOLE_WORDS_ONLY   = 1;
        /// Start from the host supplied anchor instead of the corpus edge.
        const FROM_CURSOR        = 1 << 1;
        /// The corpus holds only the current selection.
        const SELECTED_TEXT      = 1 << 2;
        const CASE_SENSITIVE     = 1 << 3;
        const FIND_BACKWARDS     = 1 << 4;
        /// Treat the pattern as a regular expression.
        const REGULAR_EXPRESSION = 1 << 5;
        /// Replace only: ask before every replacement. Ignored by matching.
        const PROMPT_ON_REPLACE  = 1 << 8;
        /// Replace only: expand `\N` placeholders in the replacement text.
        const BACK_REFERENCE     = 1 << 9;
    }
}

/// Scan order over the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self::empty()
    }
}

impl FindOptions {
    /// Options that change how the pattern itself is compiled.
    pub const COMPILE: Self = Self::CASE_SENSITIVE.union(Self::REGULAR_EXPRESSION);

    /// Options that change which candidates are accepted.
    pub const RESULTS: Self = Self::COMPILE.union(Self::WHOLE_WORDS_ONLY);

    pub fn direction(self) -> Direction {
        if self.contains(Self::FIND_BACKWARDS) {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    pub fn is_case_sensitive(self) -> bool {
        self.contains(Self::CASE_SENSITIVE)
    }

    pub fn is_regex(self) -> bool {
        self.contains(Self::REGULAR_EXPRESSION)
    }

    pub fn whole_words(self) -> bool {
        self.contains(Self::WHOLE_WORDS_ONLY)
    }

    /// Whether the scan origin comes from the host anchor.
    pub fn uses_anchor(self) -> bool {
        self.intersects(Self::FROM_CURSOR | Self::SELECTED_TEXT)
    }

    /// FromCursor and SelectedText are exclusive in the dialog but nothing
    /// stops a host from passing both through the raw mask.
    pub fn has_origin_conflict(self) -> bool {
        self.contains(Self::FROM_CURSOR | Self::SELECTED_TEXT)
    }

    /// Drops every requested option the host does not support.
    pub fn restrict(self, supported: Self) -> Self {
        self & supported
    }

    /// Whether switching from `self` to `other` invalidates compiled state.
    pub fn changes_results(self, other: Self) -> bool {
        (self & Self::RESULTS) != (other & Self::RESULTS)
    }
}
