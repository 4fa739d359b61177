use crate::data::{GenerationResult, StyleFinding, StyleRule, StyleRuleSet};
use regex::Regex;

/// Reports house-style problems in the produced variants without changing them.
///
/// Checks forbidden words (whole word, case-insensitive) and, when full stops
/// are disallowed, a trailing full stop. Empty variants are skipped.
pub fn audit(result: &GenerationResult, rules: &StyleRuleSet) -> Vec<StyleFinding> {
    let forbidden: Vec<(&str, Regex)> = rules
        .active_forbidden_words()
        .filter_map(|word| word_pattern(word).map(|re| (word, re)))
        .collect();

    let mut findings = Vec::new();
    for variant in result.variants.iter().filter(|v| !v.text.trim().is_empty()) {
        for (word, re) in &forbidden {
            if re.is_match(&variant.text) {
                findings.push(StyleFinding {
                    label: variant.label.clone(),
                    rule: StyleRule::ForbiddenWord {
                        word: word.to_string(),
                    },
                });
            }
        }

        if rules.no_full_stops && ends_with_full_stop(&variant.text) {
            findings.push(StyleFinding {
                label: variant.label.clone(),
                rule: StyleRule::TrailingFullStop,
            });
        }
    }

    findings
}

/// Whole-word match that also holds for terms starting or ending in punctuation,
/// where `\b` would need a word character on the term's side.
fn word_pattern(word: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(word))).ok()
}

/// A single trailing '.', not an ellipsis
fn ends_with_full_stop(text: &str) -> bool {
    let text = text.trim_end();
    text.ends_with('.') && !text.ends_with("..")
}
