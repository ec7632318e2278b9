//! Incremental find and replace over an ordered set of text segments.

mod corpus;
mod engine;
mod error;
mod finder;
mod matcher;
mod options;
mod path;
mod replace;
mod spelling;
mod state;
mod tools;

pub use corpus::{ScanIter, SearchCorpus, Segment, SegmentId, UpsertOutcome};
pub use engine::{
    Captures, CompiledMatcher, PatternEvaluator, RegexEvaluator, is_whole_word, is_word_char,
    validate_pattern, validate_pattern_with,
};
pub use error::{FindError, LookupError, Result};
pub use finder::Finder;
pub use matcher::{Match, MatchSet};
pub use options::{Direction, FindOptions};
pub use path::IncrementalPath;
pub use replace::{Placeholder, ReplacementTemplate, placeholder_entries};
pub use spelling::{SpellingMenu, SpellingProvider, match_capitalization};
pub use state::{Position, SearchSession, SessionStats};
pub use tools::{PatternEditor, REGEX_TERMS, RegexTerm, edit_with, find_term};
