use serde::{Deserialize, Serialize};

/// Editorial rules that shape a generation prompt.
///
/// A rule set is a plain value: editing it means building a new one, so a
/// request in flight always sees the rules it was created with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleRuleSet {
    pub british_english: bool,
    pub no_full_stops: bool,
    pub include_descriptors: bool,
    pub avoid_repetition: bool,
    /// Free text appended to the instructions verbatim
    pub custom_instructions: String,
    /// Words the output must never contain, in the order they were entered
    pub forbidden_words: Vec<String>,
}

impl StyleRuleSet {
    /// Forbidden words with surrounding whitespace removed and blanks dropped
    pub fn active_forbidden_words(&self) -> impl Iterator<Item = &str> {
        self.forbidden_words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
    }

    /// Custom instructions exactly as entered, or `None` when there is nothing but whitespace
    pub fn active_custom_instructions(&self) -> Option<&str> {
        if self.custom_instructions.trim().is_empty() {
            None
        } else {
            Some(&self.custom_instructions)
        }
    }
}
