use std::fmt;
use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::error::{FindError, Result};
use crate::options::{Direction, FindOptions};

/// Capture group ranges of one raw match; group 0 is the whole match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures {
    groups: Vec<Option<Range<usize>>>,
}

impl Captures {
    pub fn new(groups: Vec<Option<Range<usize>>>) -> Self {
        Self { groups }
    }

    fn whole(range: Range<usize>) -> Self {
        Self {
            groups: vec![Some(range)],
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.groups
            .first()
            .cloned()
            .flatten()
            .unwrap_or(0..0)
    }

    pub fn get(&self, group: usize) -> Option<Range<usize>> {
        self.groups.get(group).cloned().flatten()
    }

    /// Group count including the whole match.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Owned text of every group, for use after the segment may change.
    pub fn texts(&self, text: &str) -> Vec<Option<String>> {
        self.groups
            .iter()
            .map(|group| {
                group
                    .clone()
                    .and_then(|range| text.get(range))
                    .map(str::to_string)
            })
            .collect()
    }
}

/// A pattern compiled by a [`PatternEvaluator`].
pub trait CompiledMatcher: fmt::Debug {
    /// Leftmost match starting at or after byte offset `start`.
    fn find_at(&self, text: &str, start: usize) -> Option<Captures>;

    /// Number of capture groups, not counting the whole match.
    fn capture_count(&self) -> usize;
}

/// Compiles regular expressions. Any engine can be plugged into a session.
pub trait PatternEvaluator: fmt::Debug {
    fn compile(
        &self,
        pattern: &str,
        case_sensitive: bool,
    ) -> std::result::Result<Box<dyn CompiledMatcher>, String>;
}

/// The default evaluator, backed by the `regex` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexEvaluator;

impl PatternEvaluator for RegexEvaluator {
    fn compile(
        &self,
        pattern: &str,
        case_sensitive: bool,
    ) -> std::result::Result<Box<dyn CompiledMatcher>, String> {
        RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map(|regex| Box::new(RegexMatcher { regex }) as Box<dyn CompiledMatcher>)
            .map_err(|e| e.to_string())
    }
}

#[derive(Debug)]
struct RegexMatcher {
    regex: Regex,
}

impl CompiledMatcher for RegexMatcher {
    fn find_at(&self, text: &str, start: usize) -> Option<Captures> {
        let caps = self.regex.captures_at(text, start)?;
        Some(Captures::new(
            caps.iter().map(|group| group.map(|m| m.range())).collect(),
        ))
    }

    fn capture_count(&self) -> usize {
        self.regex.captures_len().saturating_sub(1)
    }
}

/// Letters, digits and underscore.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Neither neighbour of `range` is a word character.
pub fn is_whole_word(text: &str, range: &Range<usize>) -> bool {
    let before = text[..range.start].chars().next_back();
    let after = text[range.end..].chars().next();
    before.is_none_or(|c| !is_word_char(c)) && after.is_none_or(|c| !is_word_char(c))
}

/// Largest char boundary not above `index`.
pub(crate) fn floor_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn next_boundary(text: &str, index: usize) -> Option<usize> {
    let c = text[index..].chars().next()?;
    Some(index + c.len_utf8())
}

fn prev_boundary(text: &str, index: usize) -> Option<usize> {
    let c = text[..index].chars().next_back()?;
    Some(index - c.len_utf8())
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// End offset of `needle` if it occurs at `at`, folding case per character.
fn literal_match_at(text: &str, at: usize, needle: &str, case_sensitive: bool) -> Option<usize> {
    let rest = &text[at..];
    if case_sensitive {
        return rest.starts_with(needle).then_some(at + needle.len());
    }

    let mut hay = rest.char_indices();
    let mut end = at;
    for n in needle.chars() {
        let (offset, h) = hay.next()?;
        if !chars_eq_ignore_case(h, n) {
            return None;
        }
        end = at + offset + h.len_utf8();
    }
    Some(end)
}

fn literal_find_from(
    text: &str,
    from: usize,
    needle: &str,
    case_sensitive: bool,
) -> Option<Range<usize>> {
    if case_sensitive {
        return text[from..]
            .find(needle)
            .map(|i| from + i..from + i + needle.len());
    }
    text[from..].char_indices().find_map(|(offset, _)| {
        let at = from + offset;
        literal_match_at(text, at, needle, false).map(|end| at..end)
    })
}

/// A pattern ready to scan segment text.
#[derive(Debug)]
pub(crate) enum CompiledPattern {
    Literal {
        needle: String,
        case_sensitive: bool,
    },
    Expression(Box<dyn CompiledMatcher>),
}

impl CompiledPattern {
    pub(crate) fn compile(
        evaluator: &dyn PatternEvaluator,
        pattern: &str,
        options: FindOptions,
    ) -> Result<Self> {
        if pattern.is_empty() {
            return Err(FindError::EmptyPattern);
        }
        if !options.is_regex() {
            return Ok(Self::Literal {
                needle: pattern.to_string(),
                case_sensitive: options.is_case_sensitive(),
            });
        }
        evaluator
            .compile(pattern, options.is_case_sensitive())
            .map(Self::Expression)
            .map_err(|message| FindError::InvalidPattern {
                pattern: pattern.to_string(),
                message,
            })
    }

    pub(crate) fn capture_count(&self) -> usize {
        match self {
            Self::Literal { .. } => 0,
            Self::Expression(matcher) => matcher.capture_count(),
        }
    }

    pub(crate) fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    fn candidate_at_or_after(&self, text: &str, from: usize) -> Option<Captures> {
        match self {
            Self::Literal {
                needle,
                case_sensitive,
            } => literal_find_from(text, from, needle, *case_sensitive).map(Captures::whole),
            Self::Expression(matcher) => matcher.find_at(text, from),
        }
    }

    /// First accepted candidate starting at or after `from`.
    pub(crate) fn find_forward(
        &self,
        text: &str,
        from: usize,
        whole_words: bool,
    ) -> Option<Captures> {
        let mut from = from;
        while from <= text.len() {
            let candidate = self.candidate_at_or_after(text, from)?;
            let range = candidate.range();
            if !whole_words || is_whole_word(text, &range) {
                return Some(candidate);
            }
            from = next_boundary(text, range.start)?;
        }
        None
    }

    /// Last accepted candidate ending at or before `before`. With
    /// `skip_empty_at_bound`, an empty candidate at `before` itself is
    /// passed over because the previous step already reported it.
    ///
    /// A regex candidate is the match the evaluator reports for a start
    /// position. The one ending last wins; among those ending at the same
    /// offset the longest wins.
    pub(crate) fn find_backward(
        &self,
        text: &str,
        before: usize,
        skip_empty_at_bound: bool,
        whole_words: bool,
    ) -> Option<Captures> {
        let last_start = if skip_empty_at_bound {
            prev_boundary(text, before)?
        } else {
            before
        };
        let accepted = |range: &Range<usize>| {
            range.end <= before && (!whole_words || is_whole_word(text, range))
        };

        match self {
            Self::Literal {
                needle,
                case_sensitive,
            } => {
                let mut at = Some(last_start);
                while let Some(pos) = at {
                    if let Some(end) = literal_match_at(text, pos, needle, *case_sensitive)
                        && accepted(&(pos..end))
                    {
                        return Some(Captures::whole(pos..end));
                    }
                    at = prev_boundary(text, pos);
                }
                None
            }
            Self::Expression(matcher) => {
                let mut best: Option<Captures> = None;
                let mut from = 0;
                while let Some(candidate) = matcher.find_at(text, from) {
                    let range = candidate.range();
                    if range.start > last_start {
                        break;
                    }
                    let ends_later = best
                        .as_ref()
                        .is_none_or(|best| range.end > best.range().end);
                    if ends_later && accepted(&range) {
                        best = Some(candidate);
                    }
                    match next_boundary(text, range.start) {
                        Some(next) => from = next,
                        None => break,
                    }
                }
                best
            }
        }
    }

    /// Next candidate from `bound` in `direction`. `after_empty` means the
    /// previous step reported an empty match at `bound`.
    pub(crate) fn find(
        &self,
        text: &str,
        bound: usize,
        direction: Direction,
        after_empty: bool,
        whole_words: bool,
    ) -> Option<Captures> {
        match direction {
            Direction::Forward if after_empty => {
                self.find_forward(text, next_boundary(text, bound)?, whole_words)
            }
            Direction::Forward => self.find_forward(text, bound, whole_words),
            Direction::Backward => self.find_backward(text, bound, after_empty, whole_words),
        }
    }

    /// Every accepted, non-overlapping candidate in `text`, left to right.
    pub(crate) fn find_all(&self, text: &str, whole_words: bool) -> Vec<Captures> {
        let mut found = Vec::new();
        let mut from = 0;
        while let Some(candidate) = self.find_forward(text, from, whole_words) {
            let range = candidate.range();
            found.push(candidate);
            from = if range.is_empty() {
                match next_boundary(text, range.end) {
                    Some(next) => next,
                    None => break,
                }
            } else {
                range.end
            };
        }
        found
    }
}

/// Checks a pattern the way the find dialog does before accepting it,
/// without touching any session.
pub fn validate_pattern(pattern: &str, options: FindOptions) -> Result<()> {
    validate_pattern_with(&RegexEvaluator, pattern, options)
}

pub fn validate_pattern_with(
    evaluator: &dyn PatternEvaluator,
    pattern: &str,
    options: FindOptions,
) -> Result<()> {
    CompiledPattern::compile(evaluator, pattern, options).map(|_| ())
}
