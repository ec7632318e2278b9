use crate::corpus::{SearchCorpus, Segment, SegmentId};
use crate::engine::{CompiledPattern, PatternEvaluator, RegexEvaluator, floor_boundary};
use crate::error::{FindError, LookupError, Result};
use crate::matcher::{Match, MatchSet};
use crate::options::{Direction, FindOptions};
use crate::path::IncrementalPath;
use crate::replace::ReplacementTemplate;

/// A caller supplied position, e.g. the text cursor or selection start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub segment: SegmentId,
    pub index: usize,
}

impl Position {
    pub fn new(segment: SegmentId, index: usize) -> Self {
        Self { segment, index }
    }
}

/// Where the next scan starts. Forward scans accept matches starting at or
/// after `offset`; backward scans accept matches ending at or before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    segment: SegmentId,
    offset: usize,
    /// The previous match was empty at `offset` and must be stepped over.
    after_empty: bool,
    /// The match this cursor was placed past, the direction it was found
    /// in and the revision of its segment at that time.
    passed: Option<(Match, Direction, u64)>,
}

impl Cursor {
    fn at(segment: SegmentId, offset: usize) -> Self {
        Self {
            segment,
            offset,
            after_empty: false,
            passed: None,
        }
    }

    fn past(found: &Match, direction: Direction, revision: u64) -> Self {
        let offset = match direction {
            Direction::Forward => found.end(),
            Direction::Backward => found.index(),
        };
        Self {
            segment: found.segment(),
            offset,
            after_empty: found.length() == 0,
            passed: Some((*found, direction, revision)),
        }
    }
}

fn edge_bound(segment: &Segment, direction: Direction) -> usize {
    match direction {
        Direction::Forward => 0,
        Direction::Backward => segment.text().len(),
    }
}

/// Instrumentation for the most recent [`SearchSession::advance`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Segments whose text was scanned.
    pub segments_scanned: usize,
    /// The scan resumed from the incremental path instead of the origin.
    pub resumed_from_path: bool,
}

/// One find or replace interaction: pattern, options, cursor and the
/// incremental path. Borrows the corpus only for the duration of a call.
#[derive(Debug)]
pub struct SearchSession {
    evaluator: Box<dyn PatternEvaluator>,
    pattern: String,
    options: FindOptions,
    compiled: Option<CompiledPattern>,
    cursor: Option<Cursor>,
    anchor: Option<Position>,
    last_match: Option<Match>,
    last_groups: Vec<Option<String>>,
    pattern_changed: bool,
    exhausted: bool,
    closed: bool,
    path: IncrementalPath,
    matches_found: usize,
    seen_version: Option<u64>,
    seen_generation: Option<u64>,
    stats: SessionStats,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    pub fn new() -> Self {
        Self::with_evaluator(Box::new(RegexEvaluator))
    }

    pub fn with_evaluator(evaluator: Box<dyn PatternEvaluator>) -> Self {
        Self {
            evaluator,
            pattern: String::new(),
            options: FindOptions::empty(),
            compiled: None,
            cursor: None,
            anchor: None,
            last_match: None,
            last_groups: Vec::new(),
            pattern_changed: false,
            exhausted: false,
            closed: false,
            path: IncrementalPath::new(),
            matches_found: 0,
            seen_version: None,
            seen_generation: None,
            stats: SessionStats::default(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn options(&self) -> FindOptions {
        self.options
    }

    pub fn anchor(&self) -> Option<Position> {
        self.anchor
    }

    pub fn last_match(&self) -> Option<Match> {
        self.last_match
    }

    /// Matches produced since the pattern last changed.
    pub fn matches_found(&self) -> usize {
        self.matches_found
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn path(&self) -> &IncrementalPath {
        &self.path
    }

    /// Capture groups in the current pattern; zero for literal patterns.
    pub fn capture_count(&self) -> usize {
        self.compiled
            .as_ref()
            .map(CompiledPattern::capture_count)
            .unwrap_or(0)
    }

    /// Updates the pattern. A compile failure is reported right away and
    /// again from [`advance`](Self::advance) until the pattern is fixed; the
    /// cursor is left untouched.
    pub fn set_pattern(&mut self, pattern: &str) -> Result<()> {
        if pattern == self.pattern {
            return Ok(());
        }

        log::debug!("pattern changed from {:?} to {:?}", self.pattern, pattern);
        self.pattern = pattern.to_string();
        self.pattern_changed = true;
        self.forget_last_match();
        self.exhausted = false;
        self.matches_found = 0;

        if pattern.is_empty() {
            self.compiled = None;
            self.path.clear();
            self.cursor = None;
            return Ok(());
        }

        self.recompile()
    }

    pub fn set_options(&mut self, options: FindOptions) -> Result<()> {
        if options == self.options {
            return Ok(());
        }

        let previous = self.options;
        self.options = options;
        self.exhausted = false;

        if options.has_origin_conflict() {
            log::debug!("FromCursor and SelectedText both set; the anchor is the origin");
        }

        if !previous.changes_results(options) {
            return Ok(());
        }

        log::debug!("result affecting options changed: {:?} -> {:?}", previous, options);
        self.path.clear();
        self.pattern_changed = true;
        self.forget_last_match();
        self.matches_found = 0;
        if self.pattern.is_empty() {
            return Ok(());
        }
        self.recompile()
    }

    /// Drops the match and captures of the previous pattern.
    fn forget_last_match(&mut self) {
        self.last_match = None;
        self.last_groups.clear();
    }

    /// Origin used by FromCursor and SelectedText.
    pub fn set_anchor(&mut self, anchor: Option<Position>) {
        self.anchor = anchor;
    }

    fn recompile(&mut self) -> Result<()> {
        match CompiledPattern::compile(self.evaluator.as_ref(), &self.pattern, self.options) {
            Ok(compiled) => {
                self.compiled = Some(compiled);
                Ok(())
            }
            Err(e) => {
                log::debug!("failed to compile {:?}: {}", self.pattern, e);
                self.compiled = None;
                Err(e)
            }
        }
    }

    /// Host signal that the dialog went away. Every later `advance` is a
    /// no-op until [`reset`](Self::reset).
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Wraps around: the next `advance` starts from the origin again.
    pub fn restart(&mut self) {
        self.cursor = None;
        self.exhausted = false;
    }

    /// Discards all session state except the evaluator and options.
    pub fn reset(&mut self) {
        self.pattern.clear();
        self.compiled = None;
        self.cursor = None;
        self.anchor = None;
        self.last_match = None;
        self.last_groups.clear();
        self.pattern_changed = false;
        self.exhausted = false;
        self.closed = false;
        self.path.clear();
        self.matches_found = 0;
        self.seen_version = None;
        self.seen_generation = None;
        self.stats = SessionStats::default();
    }

    /// Drops cursor and path state tied to `segment`, e.g. before the host
    /// removes it.
    pub fn forget_segment(&mut self, segment: SegmentId) {
        self.path.invalidate_segment(segment);
        if self.cursor.is_some_and(|cursor| cursor.segment == segment) {
            log::debug!("cursor segment {} went away, restarting from origin", segment);
            self.cursor = None;
        }
        if self.anchor.is_some_and(|anchor| anchor.segment == segment) {
            self.anchor = None;
        }
    }

    /// Treats a lookup failure as a structural corpus change.
    pub fn structural_change(&mut self) {
        self.path.clear();
        self.cursor = None;
        self.exhausted = false;
    }

    fn sync_corpus(&mut self, corpus: &SearchCorpus) {
        if self.seen_generation.is_some_and(|g| g != corpus.generation()) {
            log::debug!("corpus structure changed, clearing incremental path");
            self.path.clear();
            self.exhausted = false;
        }
        if self.seen_version.is_some_and(|v| v != corpus.version()) {
            self.exhausted = false;
        }
        self.seen_generation = Some(corpus.generation());
        self.seen_version = Some(corpus.version());
    }

    /// Finds the next match from the cursor in the current direction.
    ///
    /// `Ok(None)` means the scan reached the end of the corpus. The session
    /// stays exhausted, without scanning again, until the pattern, options
    /// or corpus change or the host calls [`restart`](Self::restart).
    pub fn advance(&mut self, corpus: &SearchCorpus) -> Result<Option<Match>> {
        self.stats = SessionStats::default();
        if self.closed {
            return Ok(None);
        }

        self.sync_corpus(corpus);
        if self.pattern.is_empty() {
            return Err(FindError::EmptyPattern);
        }
        if self.compiled.is_none() {
            self.recompile()?;
        }
        if self.exhausted {
            log::trace!("session exhausted for {:?}", self.pattern);
            return Ok(None);
        }

        // The incremental path only applies to the first step after a
        // pattern change. A cleared cursor otherwise means the origin.
        let start = match (self.pattern_changed, self.cursor) {
            (true, _) => self.resume_point(corpus),
            (false, Some(cursor)) => Ok(Some(cursor)),
            (false, None) => self.origin(corpus),
        };
        let start = match start {
            Ok(start) => start,
            Err(e) => {
                self.structural_change();
                return Err(e);
            }
        };
        self.pattern_changed = false;

        let Some(start) = start else {
            log::debug!("nothing to search, corpus is empty");
            self.exhausted = true;
            return Ok(None);
        };

        let found = match self.turned_back(corpus, &start) {
            Some(found) => Ok(Some(found)),
            None => self.scan(corpus, start),
        };
        let found = match found {
            Ok(found) => found,
            Err(e) => {
                self.structural_change();
                return Err(e.into());
            }
        };

        match found {
            Some((found, revision)) => {
                self.cursor = Some(Cursor::past(&found, self.options.direction(), revision));
                self.path.record(&self.pattern, found, revision);
                self.last_match = Some(found);
                self.matches_found += 1;
                Ok(Some(found))
            }
            None => {
                log::debug!(
                    "no further match for {:?} after {} segment(s)",
                    self.pattern,
                    self.stats.segments_scanned
                );
                self.cursor = Some(start);
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Reversing direction right after a match offers that match again, so
    /// stepping back from just past a match lands on it.
    fn turned_back(&self, corpus: &SearchCorpus, start: &Cursor) -> Option<(Match, u64)> {
        let (found, direction, revision) = start.passed?;
        let unchanged = corpus
            .get(found.segment())
            .is_some_and(|segment| segment.revision() == revision);
        let reversed = direction != self.options.direction();
        (reversed && unchanged && self.last_match == Some(found)).then(|| {
            log::trace!("direction reversed, offering {:?} again", found);
            (found, revision)
        })
    }

    /// Start of a fresh scan: the incremental path when it applies,
    /// otherwise the origin implied by the options.
    fn resume_point(&mut self, corpus: &SearchCorpus) -> Result<Option<Cursor>> {
        let direction = self.options.direction();
        if let Some(found) = self.path.lookup(&self.pattern, corpus) {
            log::trace!("resuming {:?} at its cached match", self.pattern);
            self.stats.resumed_from_path = true;
            return Ok(Some(match direction {
                Direction::Forward => Cursor::at(found.segment(), found.index()),
                Direction::Backward => Cursor::at(found.segment(), found.end()),
            }));
        }

        // Prefix resumption holds only when accepting a match cannot depend
        // on what follows it, and only forward.
        let prefix_resumes = direction == Direction::Forward
            && !self.options.whole_words()
            && self.compiled.as_ref().is_some_and(CompiledPattern::is_literal);
        if prefix_resumes && let Some(found) = self.path.lookup_prefix(&self.pattern, corpus) {
            log::trace!("resuming {:?} at a cached prefix match", self.pattern);
            self.stats.resumed_from_path = true;
            return Ok(Some(Cursor::at(found.segment(), found.index())));
        }

        self.origin(corpus)
    }

    fn origin(&mut self, corpus: &SearchCorpus) -> Result<Option<Cursor>> {
        if self.options.uses_anchor()
            && let Some(anchor) = self.anchor
        {
            if !corpus.contains(anchor.segment) {
                self.anchor = None;
                return Err(LookupError::MissingId(anchor.segment).into());
            }
            return Ok(Some(Cursor::at(anchor.segment, anchor.index)));
        }

        let direction = self.options.direction();
        let edge = match direction {
            Direction::Forward => corpus.first(),
            Direction::Backward => corpus.last(),
        };
        Ok(edge.map(|segment| Cursor::at(segment.id(), edge_bound(segment, direction))))
    }

    fn scan(
        &mut self,
        corpus: &SearchCorpus,
        start: Cursor,
    ) -> std::result::Result<Option<(Match, u64)>, LookupError> {
        let Some(compiled) = self.compiled.as_ref() else {
            return Ok(None);
        };
        let direction = self.options.direction();
        let whole_words = self.options.whole_words();

        for segment in corpus.iter_from(start.segment, direction)? {
            let text = segment.text();
            let (bound, after_empty) = if segment.id() == start.segment {
                (floor_boundary(text, start.offset), start.after_empty)
            } else {
                (edge_bound(segment, direction), false)
            };

            self.stats.segments_scanned += 1;
            let candidate = compiled.find(text, bound, direction, after_empty, whole_words);
            if let Some(captures) = candidate {
                let range = captures.range();
                self.last_groups = captures.texts(text);
                let found = Match::new(segment.id(), range.start, range.len());
                log::trace!("match for {:?} at {:?}", self.pattern, found);
                return Ok(Some((found, segment.revision())));
            }
        }
        Ok(None)
    }

    /// Replacement text for the last match. Placeholders are expanded only
    /// when BackReference is set.
    pub fn replacement(&self, template: &str) -> Result<String> {
        if self.last_match.is_none() {
            return Err(FindError::NoCurrentMatch);
        }
        self.template(template).expand(&self.last_groups)
    }

    pub(crate) fn template(&self, template: &str) -> ReplacementTemplate {
        if self.options.contains(FindOptions::BACK_REFERENCE) {
            ReplacementTemplate::parse(template)
        } else {
            ReplacementTemplate::literal(template)
        }
    }

    fn ensure_compiled(&mut self) -> Result<&CompiledPattern> {
        if self.pattern.is_empty() {
            return Err(FindError::EmptyPattern);
        }
        if self.compiled.is_none() {
            self.recompile()?;
        }
        self.compiled.as_ref().ok_or(FindError::EmptyPattern)
    }

    /// Every match in the corpus in forward order. Leaves the cursor alone.
    pub fn find_all(&mut self, corpus: &SearchCorpus) -> Result<MatchSet> {
        let whole_words = self.options.whole_words();
        let compiled = self.ensure_compiled()?;
        let matches = corpus
            .iter(Direction::Forward)
            .flat_map(|segment| {
                compiled
                    .find_all(segment.text(), whole_words)
                    .into_iter()
                    .map(move |captures| {
                        let range = captures.range();
                        Match::new(segment.id(), range.start, range.len())
                    })
            })
            .collect();
        Ok(MatchSet::from_matches(matches))
    }

    /// New text for every segment containing a match, with all matches
    /// replaced. The corpus itself is not modified.
    pub fn replace_all(
        &mut self,
        corpus: &SearchCorpus,
        template: &str,
    ) -> Result<Vec<(SegmentId, String)>> {
        let template = self.template(template);
        let whole_words = self.options.whole_words();
        let compiled = self.ensure_compiled()?;
        template.validate(compiled.capture_count())?;

        let mut replaced = Vec::new();
        for segment in corpus.iter(Direction::Forward) {
            let text = segment.text();
            let found = compiled.find_all(text, whole_words);
            if found.is_empty() {
                continue;
            }

            let mut out = String::with_capacity(text.len());
            let mut last = 0;
            for captures in &found {
                let range = captures.range();
                out.push_str(&text[last..range.start]);
                out.push_str(&template.expand(&captures.texts(text))?);
                last = range.end;
            }
            out.push_str(&text[last..]);
            replaced.push((segment.id(), out));
        }
        log::debug!("replace all touched {} segment(s)", replaced.len());
        Ok(replaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fox_corpus() -> SearchCorpus {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "The quick Fox");
        corpus.upsert(2, "jumps over");
        corpus.upsert(3, "the lazy fox");
        corpus
    }

    fn open_session(pattern: &str, options: FindOptions) -> SearchSession {
        let mut session = SearchSession::new();
        session.set_options(options).unwrap();
        session.set_pattern(pattern).unwrap();
        session
    }

    #[test]
    fn test_whole_words_case_insensitive_scenario() {
        let corpus = fox_corpus();
        let mut session = open_session("fox", FindOptions::WHOLE_WORDS_ONLY);

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 10, 3)));
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(3, 9, 3)));
        assert_eq!(session.advance(&corpus).unwrap(), None);
        assert!(session.is_exhausted());
        assert_eq!(session.matches_found(), 2);
    }

    #[test]
    fn test_case_sensitive_scenario() {
        let corpus = fox_corpus();
        let mut session = open_session(
            "fox",
            FindOptions::WHOLE_WORDS_ONLY | FindOptions::CASE_SENSITIVE,
        );

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(3, 9, 3)));
        assert_eq!(session.advance(&corpus).unwrap(), None);
    }

    #[test]
    fn test_whole_words_rejects_inside_word() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "category");
        corpus.upsert(2, "the cat sat");
        let mut session = open_session("cat", FindOptions::WHOLE_WORDS_ONLY);

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(2, 4, 3)));
        assert_eq!(session.advance(&corpus).unwrap(), None);
    }

    #[test]
    fn test_backward_scan_from_end() {
        let corpus = fox_corpus();
        let mut session = open_session("fox", FindOptions::FIND_BACKWARDS);

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(3, 9, 3)));
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 10, 3)));
        assert_eq!(session.advance(&corpus).unwrap(), None);
    }

    #[test]
    fn test_forward_then_backward_round_trip() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "aa aa");
        corpus.upsert(2, "aa");
        let mut session = open_session("a", FindOptions::empty());

        session.advance(&corpus).unwrap();
        let forward = session.advance(&corpus).unwrap().unwrap();
        assert_eq!(forward, Match::new(1, 1, 1));

        session
            .set_options(FindOptions::FIND_BACKWARDS)
            .unwrap();
        assert_eq!(session.advance(&corpus).unwrap(), Some(forward));
    }

    #[test]
    fn test_regex_round_trip_from_unaligned_cursor() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "aaa");
        for pattern in ["aa", "a+"] {
            let options = FindOptions::REGULAR_EXPRESSION | FindOptions::FROM_CURSOR;
            let mut session = open_session(pattern, options);
            session.set_anchor(Some(Position::new(1, 1)));

            let forward = session.advance(&corpus).unwrap();
            assert_eq!(forward, Some(Match::new(1, 1, 2)), "pattern {pattern}");

            session.set_options(options | FindOptions::FIND_BACKWARDS).unwrap();
            assert_eq!(session.advance(&corpus).unwrap(), forward, "pattern {pattern}");
        }
    }

    #[test]
    fn test_regex_backward_continues_past_round_trip() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "12 345");
        let mut session = open_session(r"\d+", FindOptions::REGULAR_EXPRESSION);

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 0, 2)));
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 3, 3)));

        let backward = FindOptions::REGULAR_EXPRESSION | FindOptions::FIND_BACKWARDS;
        session.set_options(backward).unwrap();
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 3, 3)));
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 0, 2)));
        assert_eq!(session.advance(&corpus).unwrap(), None);
    }

    #[test]
    fn test_round_trip_needs_unchanged_segment() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "ab ab");
        let mut session = open_session("ab", FindOptions::empty());

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 0, 2)));
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 3, 2)));
        corpus.mark_dirty(1).unwrap();

        session.set_options(FindOptions::FIND_BACKWARDS).unwrap();
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 3, 2)));
        assert_eq!(session.stats().segments_scanned, 1);
    }

    #[test]
    fn test_exhaustion_is_idempotent() {
        let corpus = fox_corpus();
        let mut session = open_session("zebra", FindOptions::empty());

        assert_eq!(session.advance(&corpus).unwrap(), None);
        assert_eq!(session.stats().segments_scanned, 3);
        for _ in 0..3 {
            assert_eq!(session.advance(&corpus).unwrap(), None);
            assert_eq!(session.stats().segments_scanned, 0);
        }
    }

    #[test]
    fn test_restart_wraps_to_origin() {
        let corpus = fox_corpus();
        let mut session = open_session("lazy", FindOptions::empty());

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(3, 4, 4)));
        assert_eq!(session.advance(&corpus).unwrap(), None);
        session.restart();
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(3, 4, 4)));
    }

    #[test]
    fn test_restart_ignores_cached_match() {
        let corpus = fox_corpus();
        let mut session = open_session("fox", FindOptions::FROM_CURSOR);
        session.set_anchor(Some(Position::new(2, 0)));

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(3, 9, 3)));
        assert_eq!(session.advance(&corpus).unwrap(), None);
        session.set_options(FindOptions::empty()).unwrap();
        session.restart();
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 10, 3)));
    }

    #[test]
    fn test_corpus_change_clears_exhaustion() {
        let mut corpus = fox_corpus();
        let mut session = open_session("over", FindOptions::empty());

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(2, 6, 4)));
        assert_eq!(session.advance(&corpus).unwrap(), None);

        corpus.upsert(3, "over the lazy fox");
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(3, 0, 4)));
    }

    #[test]
    fn test_appending_resumes_from_cached_prefix() {
        let mut corpus = SearchCorpus::new();
        for (id, text) in [(1, "alpha"), (2, "beta"), (3, "gamma"), (4, "fox fo"), (5, "fox")] {
            corpus.upsert(id, text);
        }
        let mut session = open_session("fo", FindOptions::empty());

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(4, 0, 2)));
        assert_eq!(session.stats().segments_scanned, 4);
        assert!(!session.stats().resumed_from_path);

        session.set_pattern("fox").unwrap();
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(4, 0, 3)));
        assert!(session.stats().resumed_from_path);
        assert_eq!(session.stats().segments_scanned, 1);
    }

    #[test]
    fn test_deleting_returns_to_cached_match() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "fog");
        corpus.upsert(2, "fox");
        let mut session = open_session("fo", FindOptions::empty());

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 0, 2)));
        session.set_pattern("fox").unwrap();
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(2, 0, 3)));

        session.set_pattern("fo").unwrap();
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 0, 2)));
        assert!(session.stats().resumed_from_path);
    }

    #[test]
    fn test_dirty_segment_forces_rescan() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "nothing here");
        corpus.upsert(2, "a fox");
        let mut session = open_session("fox", FindOptions::empty());

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(2, 2, 3)));
        session.set_pattern("a").unwrap();
        session.advance(&corpus).unwrap();

        corpus.mark_dirty(2).unwrap();
        session.set_pattern("fox").unwrap();
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(2, 2, 3)));
        assert!(!session.stats().resumed_from_path);
        assert_eq!(session.stats().segments_scanned, 2);
    }

    #[test]
    fn test_never_returns_stale_cached_match() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "a fox");
        let mut session = open_session("fox", FindOptions::empty());
        session.advance(&corpus).unwrap();
        session.set_pattern("x").unwrap();

        corpus.upsert(1, "no animals");
        session.set_pattern("fox").unwrap();
        assert_eq!(session.advance(&corpus).unwrap(), None);
    }

    #[test]
    fn test_whole_words_does_not_resume_from_prefix() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "abcd");
        corpus.upsert(2, "abc");
        let mut session = open_session("abc", FindOptions::WHOLE_WORDS_ONLY);

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(2, 0, 3)));
        session.set_pattern("abcd").unwrap();
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 0, 4)));
    }

    #[test]
    fn test_from_cursor_uses_anchor() {
        let corpus = fox_corpus();
        let mut session = open_session("the", FindOptions::FROM_CURSOR);
        session.set_anchor(Some(Position::new(1, 1)));

        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(3, 0, 3)));
    }

    #[test]
    fn test_conflicting_origin_flags_use_anchor() {
        let corpus = fox_corpus();
        let mut session = open_session(
            "fox",
            FindOptions::FROM_CURSOR | FindOptions::SELECTED_TEXT,
        );
        session.set_anchor(Some(Position::new(2, 0)));
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(3, 9, 3)));

        let options = FindOptions::FROM_CURSOR | FindOptions::SELECTED_TEXT;
        let mut session = open_session("fox", options);
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 10, 3)));
    }

    #[test]
    fn test_missing_anchor_is_lookup_error() {
        let corpus = fox_corpus();
        let mut session = open_session("fox", FindOptions::FROM_CURSOR);
        session.set_anchor(Some(Position::new(99, 0)));

        assert_eq!(
            session.advance(&corpus),
            Err(FindError::Lookup(LookupError::MissingId(99)))
        );
        assert!(session.anchor().is_none());
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 10, 3)));
    }

    #[test]
    fn test_removed_cursor_segment_is_lookup_error() {
        let mut corpus = fox_corpus();
        let mut session = open_session("fox", FindOptions::empty());
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 10, 3)));

        corpus.remove(1).unwrap();
        assert_eq!(
            session.advance(&corpus),
            Err(FindError::Lookup(LookupError::MissingId(1)))
        );
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(3, 9, 3)));
    }

    #[test]
    fn test_invalid_pattern_keeps_cursor() {
        let corpus = fox_corpus();
        let mut session = open_session("o", FindOptions::REGULAR_EXPRESSION);
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 11, 1)));

        assert!(matches!(
            session.set_pattern("o("),
            Err(FindError::InvalidPattern { .. })
        ));
        assert!(matches!(
            session.advance(&corpus),
            Err(FindError::InvalidPattern { .. })
        ));
        assert_eq!(session.stats().segments_scanned, 0);
    }

    #[test]
    fn test_closed_session_is_noop() {
        let corpus = fox_corpus();
        let mut session = open_session("fox", FindOptions::empty());
        session.close();
        assert_eq!(session.advance(&corpus).unwrap(), None);
        assert!(session.last_match().is_none());

        session.reset();
        assert_eq!(session.advance(&corpus), Err(FindError::EmptyPattern));
    }

    #[test]
    fn test_empty_regex_match_advances() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "ab");
        corpus.upsert(2, "");
        let mut session = open_session("x*", FindOptions::REGULAR_EXPRESSION);

        let found: Vec<_> = std::iter::from_fn(|| session.advance(&corpus).unwrap()).collect();
        assert_eq!(
            found,
            vec![
                Match::new(1, 0, 0),
                Match::new(1, 1, 0),
                Match::new(1, 2, 0),
                Match::new(2, 0, 0),
            ]
        );
    }

    #[test]
    fn test_empty_regex_match_backward() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "ax");
        corpus.upsert(2, "");
        let options = FindOptions::REGULAR_EXPRESSION | FindOptions::FIND_BACKWARDS;
        let mut session = open_session("x*", options);

        let found: Vec<_> = std::iter::from_fn(|| session.advance(&corpus).unwrap()).collect();
        assert_eq!(
            found,
            vec![Match::new(2, 0, 0), Match::new(1, 1, 1), Match::new(1, 0, 0)]
        );
    }

    #[test]
    fn test_regex_whole_words_backward() {
        let corpus = fox_corpus();
        let options = FindOptions::REGULAR_EXPRESSION
            | FindOptions::WHOLE_WORDS_ONLY
            | FindOptions::FIND_BACKWARDS;
        let mut session = open_session(r"o\w*", options);

        let found: Vec<_> = std::iter::from_fn(|| session.advance(&corpus).unwrap()).collect();
        assert_eq!(found, vec![Match::new(2, 6, 4)]);
    }

    #[test]
    fn test_capture_count_and_replacement() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "Doe John");
        let mut session = open_session(
            r"(\w+) (\w+)",
            FindOptions::REGULAR_EXPRESSION | FindOptions::BACK_REFERENCE,
        );
        assert_eq!(session.capture_count(), 2);
        assert_eq!(session.replacement(r"\2"), Err(FindError::NoCurrentMatch));

        session.advance(&corpus).unwrap();
        assert_eq!(session.replacement(r"\2 \1").unwrap(), "John Doe");
        assert!(matches!(
            session.replacement(r"\3"),
            Err(FindError::Placeholder { index: 3, .. })
        ));
    }

    #[test]
    fn test_replacement_without_back_reference_is_literal() {
        let corpus = fox_corpus();
        let mut session = open_session("fox", FindOptions::empty());
        session.advance(&corpus).unwrap();
        assert_eq!(session.replacement(r"\0!").unwrap(), r"\0!");
    }

    #[test]
    fn test_pattern_change_drops_previous_captures() {
        let mut corpus = SearchCorpus::new();
        corpus.upsert(1, "ab");
        let mut session = open_session(
            r"(a)(b)",
            FindOptions::REGULAR_EXPRESSION | FindOptions::BACK_REFERENCE,
        );
        session.advance(&corpus).unwrap();
        assert_eq!(session.replacement(r"\2\1").unwrap(), "ba");

        session.set_pattern("(a)").unwrap();
        assert_eq!(session.last_match(), None);
        assert_eq!(session.replacement(r"\1"), Err(FindError::NoCurrentMatch));

        session.advance(&corpus).unwrap();
        session.set_options(FindOptions::BACK_REFERENCE).unwrap();
        assert_eq!(session.replacement(r"\1"), Err(FindError::NoCurrentMatch));
    }

    #[test]
    fn test_find_all_leaves_cursor() {
        let corpus = fox_corpus();
        let mut session = open_session("fox", FindOptions::empty());
        let set = session.find_all(&corpus).unwrap();
        assert_eq!(set.count(), 2);
        assert_eq!(session.advance(&corpus).unwrap(), Some(Match::new(1, 10, 3)));
    }

    #[test]
    fn test_replace_all() {
        let corpus = fox_corpus();
        let mut session = open_session(
            "(f)ox",
            FindOptions::REGULAR_EXPRESSION | FindOptions::BACK_REFERENCE,
        );
        let replaced = session.replace_all(&corpus, r"\1ish").unwrap();
        assert_eq!(
            replaced,
            vec![
                (1, "The quick Fish".to_string()),
                (3, "the lazy fish".to_string()),
            ]
        );
        assert!(matches!(
            session.replace_all(&corpus, r"\2"),
            Err(FindError::Placeholder { .. })
        ));
    }
}
