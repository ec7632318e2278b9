//! Replacement text with `\N` placeholders for regex captures.
//!
//! `\0` is the complete match, `\1`.. are capture groups. A doubled
//! backslash escapes: `\\1` yields a literal `\1`.

use crate::error::{FindError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Group(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementTemplate {
    pieces: Vec<Piece>,
}

impl ReplacementTemplate {
    /// A template that is inserted verbatim.
    pub fn literal(text: &str) -> Self {
        Self {
            pieces: vec![Piece::Text(text.to_string())],
        }
    }

    /// Splits `template` into text and placeholders.
    pub fn parse(template: &str) -> Self {
        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '\\' {
                text.push(c);
                continue;
            }
            match chars.peek() {
                Some('\\') => {
                    chars.next();
                    text.push('\\');
                }
                Some(d) if d.is_ascii_digit() => {
                    let mut index = 0usize;
                    while let Some(d) = chars.peek().and_then(|d| d.to_digit(10)) {
                        index = index.saturating_mul(10).saturating_add(d as usize);
                        chars.next();
                    }
                    if !text.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut text)));
                    }
                    pieces.push(Piece::Group(index));
                }
                _ => text.push('\\'),
            }
        }
        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }
        Self { pieces }
    }

    /// Highest group index referenced, if any.
    pub fn max_group(&self) -> Option<usize> {
        self.pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Group(index) => Some(*index),
                Piece::Text(_) => None,
            })
            .max()
    }

    /// Fails if a placeholder refers past `capture_count`.
    pub fn validate(&self, capture_count: usize) -> Result<()> {
        match self.max_group() {
            Some(index) if index > capture_count => Err(FindError::Placeholder {
                index,
                capture_count,
            }),
            _ => Ok(()),
        }
    }

    /// Builds the replacement from the texts of one match. `groups[0]` is
    /// the whole match; a group that did not participate expands to nothing.
    pub fn expand<S: AsRef<str>>(&self, groups: &[Option<S>]) -> Result<String> {
        let capture_count = groups.len().saturating_sub(1);
        self.validate(capture_count)?;

        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Group(index) => {
                    if let Some(Some(group)) = groups.get(*index) {
                        out.push_str(group.as_ref());
                    }
                }
            }
        }
        Ok(out)
    }
}

/// An entry of the placeholder menu offered next to the replacement field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub index: usize,
    pub label: String,
}

impl Placeholder {
    /// Text inserted into the replacement field.
    pub fn token(&self) -> String {
        format!("\\{}", self.index)
    }
}

pub fn placeholder_entries(capture_count: usize) -> Vec<Placeholder> {
    let mut entries = vec![Placeholder {
        index: 0,
        label: "Complete Match".to_string(),
    }];
    entries.extend((1..=capture_count).map(|index| Placeholder {
        index,
        label: format!("Captured Text ({index})"),
    }));
    entries
}
