//! Incremental search path: the last match seen for each pattern typed
//! during a session, so editing the query does not restart from the origin.

use std::collections::HashMap;

use crate::corpus::{SearchCorpus, SegmentId};
use crate::matcher::Match;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PathEntry {
    found: Match,
    revision: u64,
}

#[derive(Debug, Clone, Default)]
pub struct IncrementalPath {
    entries: HashMap<String, PathEntry>,
}

impl IncrementalPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::trace!("clearing {} incremental path entries", self.entries.len());
        }
        self.entries.clear();
    }

    /// Remembers `found` for `pattern`. `revision` is the owning segment's
    /// revision at the time of the scan.
    pub fn record(&mut self, pattern: &str, found: Match, revision: u64) {
        self.entries
            .insert(pattern.to_string(), PathEntry { found, revision });
    }

    /// The cached match for exactly `pattern`, if its segment is unchanged.
    /// A stale entry is dropped.
    pub fn lookup(&mut self, pattern: &str, corpus: &SearchCorpus) -> Option<Match> {
        let entry = *self.entries.get(pattern)?;
        if Self::is_current(&entry, corpus) {
            return Some(entry.found);
        }
        log::debug!(
            "dropping stale path entry for {:?} in segment {}",
            pattern,
            entry.found.segment()
        );
        self.entries.remove(pattern);
        None
    }

    /// The cached match for the longest proper prefix of `pattern`.
    ///
    /// Any occurrence of `pattern` is also an occurrence of each of its
    /// prefixes, so scanning can resume at the prefix match.
    pub fn lookup_prefix(&mut self, pattern: &str, corpus: &SearchCorpus) -> Option<Match> {
        let mut cut = pattern.len();
        while let Some((boundary, _)) = pattern[..cut].char_indices().next_back() {
            cut = boundary;
            if cut == 0 {
                break;
            }
            if let Some(found) = self.lookup(&pattern[..cut], corpus) {
                return Some(found);
            }
        }
        None
    }

    /// Forgets every entry inside `segment`.
    pub fn invalidate_segment(&mut self, segment: SegmentId) {
        self.entries
            .retain(|_, entry| entry.found.segment() != segment);
    }

    fn is_current(entry: &PathEntry, corpus: &SearchCorpus) -> bool {
        corpus
            .get(entry.found.segment())
            .is_some_and(|segment| segment.revision() == entry.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> SearchCorpus {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "alpha beta");
        corpus.upsert(2, "gamma delta");
        corpus
    }

    fn record(path: &mut IncrementalPath, corpus: &SearchCorpus, pattern: &str, found: Match) {
        let revision = corpus.get(found.segment()).unwrap().revision();
        path.record(pattern, found, revision);
    }

    #[test]
    fn test_lookup_exact() {
        let corpus = corpus();
        let mut path = IncrementalPath::new();
        record(&mut path, &corpus, "del", Match::new(2, 6, 3));
        assert_eq!(path.lookup("del", &corpus), Some(Match::new(2, 6, 3)));
        assert_eq!(path.lookup("de", &corpus), None);
    }

    #[test]
    fn test_lookup_prefix_prefers_longest() {
        let corpus = corpus();
        let mut path = IncrementalPath::new();
        record(&mut path, &corpus, "a", Match::new(1, 0, 1));
        record(&mut path, &corpus, "de", Match::new(2, 6, 2));
        record(&mut path, &corpus, "del", Match::new(2, 6, 3));

        assert_eq!(path.lookup_prefix("delt", &corpus), Some(Match::new(2, 6, 3)));
        assert_eq!(path.lookup_prefix("del", &corpus), Some(Match::new(2, 6, 2)));
        assert_eq!(path.lookup_prefix("x", &corpus), None);
    }

    #[test]
    fn test_prefix_on_multibyte_pattern() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "caf\u{e9}s");
        let mut path = IncrementalPath::new();
        record(&mut path, &corpus, "caf\u{e9}", Match::new(1, 0, 5));
        assert_eq!(path.lookup_prefix("caf\u{e9}s", &corpus), Some(Match::new(1, 0, 5)));
    }

    #[test]
    fn test_dirty_segment_invalidates_entry() {
        let mut corpus = corpus();
        let mut path = IncrementalPath::new();
        record(&mut path, &corpus, "beta", Match::new(1, 6, 4));

        corpus.mark_dirty(1).unwrap();
        assert_eq!(path.lookup("beta", &corpus), None);
        assert!(path.is_empty());
    }

    #[test]
    fn test_removed_segment_invalidates_entry() {
        let mut corpus = corpus();
        let mut path = IncrementalPath::new();
        record(&mut path, &corpus, "gamma", Match::new(2, 0, 5));
        record(&mut path, &corpus, "alpha", Match::new(1, 0, 5));

        corpus.remove(2).unwrap();
        assert_eq!(path.lookup("gamma", &corpus), None);

        path.invalidate_segment(1);
        assert!(path.is_empty());
    }
}
