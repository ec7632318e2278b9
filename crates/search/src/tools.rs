//! Pattern editing helpers offered next to the pattern field.

use crate::engine::floor_boundary;

/// An external regular expression editor, e.g. a plugin dialog.
pub trait PatternEditor {
    /// Returns the edited pattern, or `None` when the user cancelled.
    fn edit_pattern(&mut self, pattern: &str) -> Option<String>;
}

/// A common regex fragment for the quick insert menu used when no
/// [`PatternEditor`] is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegexTerm {
    pub description: &'static str,
    pub fragment: &'static str,
    /// Cursor movement after insertion, relative to the end of the fragment.
    pub cursor_adjustment: isize,
}

pub const REGEX_TERMS: &[RegexTerm] = &[
    term("Any Character", ".", 0),
    term("Start of Line", "^", 0),
    term("End of Line", "$", 0),
    term("Set of Characters", "[]", -1),
    term("Repeats, Zero or More Times", "*", 0),
    term("Repeats, One or More Times", "+", 0),
    term("Optional", "?", 0),
    term("Escape", "\\", 0),
    term("TAB", "\\t", 0),
    term("Newline", "\\n", 0),
    term("Carriage Return", "\\r", 0),
    term("White Space", "\\s", 0),
    term("Digit", "\\d", 0),
];

const fn term(
    description: &'static str,
    fragment: &'static str,
    cursor_adjustment: isize,
) -> RegexTerm {
    RegexTerm {
        description,
        fragment,
        cursor_adjustment,
    }
}

impl RegexTerm {
    /// Inserts the fragment at byte offset `cursor` and returns the new
    /// pattern with the new cursor.
    pub fn insert_into(&self, pattern: &str, cursor: usize) -> (String, usize) {
        let cursor = floor_boundary(pattern, cursor);
        let mut edited = String::with_capacity(pattern.len() + self.fragment.len());
        edited.push_str(&pattern[..cursor]);
        edited.push_str(self.fragment);
        edited.push_str(&pattern[cursor..]);

        let end = cursor + self.fragment.len();
        let moved = end
            .checked_add_signed(self.cursor_adjustment)
            .unwrap_or(cursor)
            .clamp(cursor, end);
        let moved = floor_boundary(&edited, moved);
        (edited, moved)
    }
}

pub fn find_term(description: &str) -> Option<&'static RegexTerm> {
    REGEX_TERMS
        .iter()
        .find(|term| term.description.eq_ignore_ascii_case(description))
}

/// Runs the external editor when there is one. Returns the replacement
/// pattern only when it differs from `pattern`.
pub fn edit_with(editor: Option<&mut dyn PatternEditor>, pattern: &str) -> Option<String> {
    let edited = editor?.edit_pattern(pattern)?;
    (edited != pattern).then_some(edited)
}
