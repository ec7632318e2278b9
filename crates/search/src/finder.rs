use crate::corpus::{SearchCorpus, Segment, SegmentId, UpsertOutcome};
use crate::engine::PatternEvaluator;
use crate::error::{FindError, LookupError, Result};
use crate::matcher::{Match, MatchSet};
use crate::options::FindOptions;
use crate::replace::{Placeholder, placeholder_entries};
use crate::state::{Position, SearchSession, SessionStats};

/// The surface a host talks to: owns the corpus and the session and keeps
/// them consistent across corpus edits.
#[derive(Debug)]
pub struct Finder {
    corpus: SearchCorpus,
    session: SearchSession,
    supported: FindOptions,
}

impl Default for Finder {
    fn default() -> Self {
        Self::new()
    }
}

impl Finder {
    pub fn new() -> Self {
        Self::with_session(SearchSession::new())
    }

    pub fn with_evaluator(evaluator: Box<dyn PatternEvaluator>) -> Self {
        Self::with_session(SearchSession::with_evaluator(evaluator))
    }

    fn with_session(session: SearchSession) -> Self {
        Self {
            corpus: SearchCorpus::new(),
            session,
            supported: FindOptions::all(),
        }
    }

    pub fn corpus(&self) -> &SearchCorpus {
        &self.corpus
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    /// Options the host can honour. Anything else is dropped by
    /// [`set_options`](Self::set_options).
    pub fn set_supported(&mut self, supported: FindOptions) -> Result<()> {
        self.supported = supported;
        self.session
            .set_options(self.session.options().restrict(supported))
    }

    pub fn set_pattern(&mut self, pattern: &str) -> Result<()> {
        self.session.set_pattern(pattern)
    }

    pub fn set_options(&mut self, options: FindOptions) -> Result<()> {
        let effective = options.restrict(self.supported);
        if effective != options {
            log::debug!("dropping unsupported options {:?}", options - effective);
        }
        self.session.set_options(effective)
    }

    pub fn set_anchor(&mut self, anchor: Option<Position>) {
        self.session.set_anchor(anchor);
    }

    pub fn advance(&mut self) -> Result<Option<Match>> {
        self.session.advance(&self.corpus)
    }

    /// Sets pattern and options, then advances.
    pub fn find_next(&mut self, pattern: &str, options: FindOptions) -> Result<Option<Match>> {
        self.set_options(options)?;
        self.set_pattern(pattern)?;
        self.advance()
    }

    pub fn upsert(&mut self, id: SegmentId, text: impl Into<String>) -> UpsertOutcome {
        self.corpus.upsert(id, text)
    }

    pub fn insert(&mut self, id: SegmentId, text: impl Into<String>) -> Result<()> {
        self.corpus.insert(id, text).map_err(|e| self.lookup_failed(e))
    }

    pub fn replace(&mut self, id: SegmentId, text: impl Into<String>) -> Result<bool> {
        self.corpus.replace(id, text).map_err(|e| self.lookup_failed(e))
    }

    pub fn remove(&mut self, id: SegmentId) -> Result<Segment> {
        self.session.forget_segment(id);
        self.corpus.remove(id).map_err(|e| self.lookup_failed(e))
    }

    pub fn mark_dirty(&mut self, id: SegmentId) -> Result<()> {
        self.corpus.mark_dirty(id).map_err(|e| self.lookup_failed(e))
    }

    fn lookup_failed(&mut self, e: LookupError) -> FindError {
        log::warn!("corpus lookup failed: {e}; resetting search position");
        self.session.structural_change();
        e.into()
    }

    pub fn reset_session(&mut self) {
        self.session.reset();
    }

    /// Starts over from the origin after the host decided to wrap.
    pub fn restart(&mut self) {
        self.session.restart();
    }

    pub fn close(&mut self) {
        self.session.close();
    }

    pub fn stats(&self) -> SessionStats {
        self.session.stats()
    }

    pub fn capture_count(&self) -> usize {
        self.session.capture_count()
    }

    pub fn placeholders(&self) -> Vec<Placeholder> {
        placeholder_entries(self.capture_count())
    }

    pub fn replacement(&self, template: &str) -> Result<String> {
        self.session.replacement(template)
    }

    pub fn find_all(&mut self) -> Result<MatchSet> {
        self.session.find_all(&self.corpus)
    }

    pub fn replace_all(&mut self, template: &str) -> Result<Vec<(SegmentId, String)>> {
        self.session.replace_all(&self.corpus, template)
    }
}
