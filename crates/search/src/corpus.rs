//! The ordered set of text segments a search runs over.

use indexmap::IndexMap;

use crate::error::LookupError;
use crate::options::Direction;

/// Caller assigned, unique within one corpus.
pub type SegmentId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    id: SegmentId,
    text: String,
    dirty: bool,
    revision: u64,
}

impl Segment {
    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Set when the text changed since the host last marked it clean.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Corpus version at which this segment last changed or was marked dirty.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Segments in scan order with O(1) lookup by id.
#[derive(Debug, Clone, Default)]
pub struct SearchCorpus {
    segments: IndexMap<SegmentId, Segment>,
    /// Bumped on every mutation.
    version: u64,
    /// Bumped only when segments are added or removed.
    generation: u64,
}

impl SearchCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id)
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.segments.contains_key(&id)
    }

    /// Position of `id` in scan order.
    pub fn position(&self, id: SegmentId) -> Option<usize> {
        self.segments.get_index_of(&id)
    }

    pub fn first(&self) -> Option<&Segment> {
        self.segments.first().map(|(_, segment)| segment)
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last().map(|(_, segment)| segment)
    }

    /// Inserts a new segment at the end or replaces the text of an existing
    /// one in place. Changed text marks the segment dirty.
    pub fn upsert(&mut self, id: SegmentId, text: impl Into<String>) -> UpsertOutcome {
        let text = text.into();
        match self.segments.get_mut(&id) {
            Some(segment) if segment.text == text => UpsertOutcome::Unchanged,
            Some(segment) => {
                self.version += 1;
                segment.text = text;
                segment.dirty = true;
                segment.revision = self.version;
                UpsertOutcome::Updated
            }
            None => {
                self.version += 1;
                self.generation += 1;
                self.segments.insert(
                    id,
                    Segment {
                        id,
                        text,
                        dirty: false,
                        revision: self.version,
                    },
                );
                UpsertOutcome::Inserted
            }
        }
    }

    /// Like [`upsert`](Self::upsert) but the caller asserts `id` is new.
    pub fn insert(&mut self, id: SegmentId, text: impl Into<String>) -> Result<(), LookupError> {
        if self.contains(id) {
            return Err(LookupError::DuplicateId(id));
        }
        self.upsert(id, text);
        Ok(())
    }

    /// Like [`upsert`](Self::upsert) but the caller asserts `id` exists.
    /// Returns whether the text changed.
    pub fn replace(&mut self, id: SegmentId, text: impl Into<String>) -> Result<bool, LookupError> {
        if !self.contains(id) {
            return Err(LookupError::MissingId(id));
        }
        Ok(self.upsert(id, text) == UpsertOutcome::Updated)
    }

    /// Removes a segment, keeping the order of the rest.
    pub fn remove(&mut self, id: SegmentId) -> Result<Segment, LookupError> {
        let segment = self
            .segments
            .shift_remove(&id)
            .ok_or(LookupError::MissingId(id))?;
        self.version += 1;
        self.generation += 1;
        Ok(segment)
    }

    /// Forces cached positions in this segment to be re-matched.
    pub fn mark_dirty(&mut self, id: SegmentId) -> Result<(), LookupError> {
        let segment = self
            .segments
            .get_mut(&id)
            .ok_or(LookupError::MissingId(id))?;
        self.version += 1;
        segment.dirty = true;
        segment.revision = self.version;
        Ok(())
    }

    pub fn mark_clean(&mut self, id: SegmentId) -> Result<(), LookupError> {
        let segment = self
            .segments
            .get_mut(&id)
            .ok_or(LookupError::MissingId(id))?;
        segment.dirty = false;
        Ok(())
    }

    pub fn clear(&mut self) {
        if self.segments.is_empty() {
            return;
        }
        self.segments.clear();
        self.version += 1;
        self.generation += 1;
    }

    /// Every segment in `direction` order.
    pub fn iter(&self, direction: Direction) -> ScanIter<'_> {
        let next = match direction {
            Direction::Forward => (!self.segments.is_empty()).then_some(0),
            Direction::Backward => self.segments.len().checked_sub(1),
        };
        ScanIter {
            corpus: self,
            next,
            direction,
        }
    }

    /// Segments in `direction` order starting with `id` itself.
    pub fn iter_from(
        &self,
        id: SegmentId,
        direction: Direction,
    ) -> Result<ScanIter<'_>, LookupError> {
        let next = self.position(id).ok_or(LookupError::MissingId(id))?;
        Ok(ScanIter {
            corpus: self,
            next: Some(next),
            direction,
        })
    }
}

/// Lazy walk over a corpus in one direction.
#[derive(Debug, Clone)]
pub struct ScanIter<'a> {
    corpus: &'a SearchCorpus,
    next: Option<usize>,
    direction: Direction,
}

impl<'a> Iterator for ScanIter<'a> {
    type Item = &'a Segment;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let (_, segment) = self.corpus.segments.get_index(index)?;
        self.next = match self.direction {
            Direction::Forward => Some(index + 1).filter(|&i| i < self.corpus.segments.len()),
            Direction::Backward => index.checked_sub(1),
        };
        Some(segment)
    }
}
