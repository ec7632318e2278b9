use std::collections::HashMap;
use std::ops::Range;

use crate::corpus::{SearchCorpus, SegmentId};
use crate::options::Direction;
use crate::state::Position;

/// A located occurrence of the pattern. Offsets are UTF-8 byte offsets into
/// the segment text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Match {
    segment: SegmentId,
    index: usize,
    length: usize,
}

impl Match {
    pub fn new(segment: SegmentId, index: usize, length: usize) -> Self {
        Self {
            segment,
            index,
            length,
        }
    }

    pub fn segment(&self) -> SegmentId {
        self.segment
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn end(&self) -> usize {
        self.index + self.length
    }

    pub fn range(&self) -> Range<usize> {
        self.index..self.end()
    }

    pub fn contains(&self, segment: SegmentId, index: usize) -> bool {
        self.segment == segment && index >= self.index && index < self.end()
    }
}

/// Every match in a corpus, in corpus order, with at most one selected.
/// Built by find-all for highlighting; the session cursor never reads it.
#[derive(Debug, Clone, Default)]
pub struct MatchSet {
    matches: Vec<Match>,
    selected: Option<usize>,
    /// Slice of `matches` belonging to each segment.
    spans: HashMap<SegmentId, Range<usize>>,
}

impl MatchSet {
    /// `matches` must already be in corpus order.
    pub fn from_matches(matches: Vec<Match>) -> Self {
        let mut spans: HashMap<SegmentId, Range<usize>> = HashMap::new();
        for (i, found) in matches.iter().enumerate() {
            spans
                .entry(found.segment)
                .and_modify(|span| span.end = i + 1)
                .or_insert(i..i + 1);
        }
        Self {
            matches,
            selected: None,
            spans,
        }
    }

    pub fn count(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn in_segment(&self, segment: SegmentId) -> &[Match] {
        self.spans
            .get(&segment)
            .and_then(|span| self.matches.get(span.clone()))
            .unwrap_or_default()
    }

    pub fn selected(&self) -> Option<Match> {
        self.matches.get(self.selected?).copied()
    }

    /// One-based position of the selected match and the total.
    pub fn ordinal(&self) -> Option<(usize, usize)> {
        self.selected.map(|i| (i + 1, self.matches.len()))
    }

    /// Selects `found` if the set has it, typically the match the session
    /// just stepped to. Returns its one-based position.
    pub fn select(&mut self, found: Match) -> Option<usize> {
        let span = self.spans.get(&found.segment)?;
        let offset = self
            .matches
            .get(span.clone())?
            .binary_search_by_key(&found.index, Match::index)
            .ok()?;
        if self.matches[span.start + offset] != found {
            return None;
        }
        self.selected = Some(span.start + offset);
        Some(span.start + offset + 1)
    }

    /// Moves the selection one match in `direction`, wrapping at either end.
    /// With nothing selected it lands on the first or last match.
    pub fn step(&mut self, direction: Direction) -> Option<Match> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        let next = match (self.selected, direction) {
            (None, Direction::Forward) => 0,
            (None, Direction::Backward) => len - 1,
            (Some(i), Direction::Forward) => (i + 1) % len,
            (Some(i), Direction::Backward) => (i + len - 1) % len,
        };
        self.selected = Some(next);
        self.selected()
    }

    /// Selects the match a search from `anchor` would reach first: the
    /// first one starting at or after it going forward, the last one ending
    /// at or before it going backward. Wraps to the other end when nothing
    /// lies on that side. `None` if the set is empty or the anchor segment
    /// is not in `corpus`.
    pub fn select_from(
        &mut self,
        corpus: &SearchCorpus,
        anchor: Position,
        direction: Direction,
    ) -> Option<Match> {
        let anchor_key = (corpus.position(anchor.segment)?, anchor.index);
        let key = |found: &Match, offset: usize| {
            corpus.position(found.segment).map(|rank| (rank, offset))
        };
        let found = match direction {
            Direction::Forward => self
                .matches
                .iter()
                .position(|m| key(m, m.index).is_some_and(|k| k >= anchor_key)),
            Direction::Backward => self
                .matches
                .iter()
                .rposition(|m| key(m, m.end()).is_some_and(|k| k <= anchor_key)),
        };
        match found {
            Some(i) => self.selected = Some(i),
            None => {
                self.selected = None;
                return self.step(direction);
            }
        }
        self.selected()
    }

    pub fn is_highlighted(&self, segment: SegmentId, index: usize) -> bool {
        self.in_segment(segment)
            .iter()
            .any(|found| found.contains(segment, index))
    }

    pub fn is_selected(&self, segment: SegmentId, index: usize) -> bool {
        self.selected()
            .is_some_and(|found| found.contains(segment, index))
    }
}
