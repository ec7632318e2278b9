//! Spell-check suggestions for a single word, as offered by a context menu.
//! The checker itself is an external collaborator.

pub trait SpellingProvider {
    fn is_misspelled(&self, word: &str) -> bool;
    fn suggestions(&self, word: &str) -> Vec<String>;
    fn ignore_word(&mut self, word: &str);
    fn add_to_dictionary(&mut self, word: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellingMenu {
    word: String,
    suggestions: Vec<String>,
    enabled: bool,
}

impl SpellingMenu {
    /// Suggestions are only collected for misspelled words.
    pub fn new(provider: &dyn SpellingProvider, word: &str) -> Self {
        let enabled = provider.is_misspelled(word);
        let suggestions = if enabled {
            provider
                .suggestions(word)
                .iter()
                .map(|suggestion| match_capitalization(word, suggestion))
                .collect()
        } else {
            Vec::new()
        };
        log::debug!(
            "spelling menu for {:?}: misspelled={}, {} suggestion(s)",
            word,
            enabled,
            suggestions.len()
        );
        Self {
            word: word.to_string(),
            suggestions,
            enabled,
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ignore_word(&self, provider: &mut dyn SpellingProvider) {
        log::debug!("ignoring word {:?}", self.word);
        provider.ignore_word(&self.word);
    }

    pub fn add_to_dictionary(&self, provider: &mut dyn SpellingProvider) {
        log::debug!("adding {:?} to dictionary", self.word);
        provider.add_to_dictionary(&self.word);
    }
}

/// Re-cases `suggestion` like `word`: all caps stays all caps, a leading
/// capital stays a leading capital, anything else is left as suggested.
pub fn match_capitalization(word: &str, suggestion: &str) -> String {
    let mut letters = word.chars().filter(|c| c.is_alphabetic()).peekable();
    let Some(first) = letters.peek().copied() else {
        return suggestion.to_string();
    };

    let all_upper = word.chars().filter(|c| c.is_alphabetic()).count() > 1
        && letters.all(char::is_uppercase);
    if all_upper {
        return suggestion.to_uppercase();
    }
    if first.is_uppercase() {
        let mut chars = suggestion.chars();
        if let Some(head) = chars.next() {
            return head.to_uppercase().chain(chars).collect();
        }
    }
    suggestion.to_string()
}
