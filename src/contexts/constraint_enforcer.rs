//! Length enforcement for produced variants.
//!
//! Character lengths are counted in Unicode scalar values (`char`s), so an
//! accented letter counts once whether or not the text is later re-encoded.

use crate::contexts::ParsedRecord;
use crate::data::{ConstraintViolation, GenerationResult, LimitSpec, Unit, Variant};
use tracing::{debug, warn};

/// Length of `text` in `unit`
pub fn measure(text: &str, unit: Unit) -> usize {
    match unit {
        Unit::Characters => text.chars().count(),
        Unit::Words => text.split_whitespace().count(),
    }
}

/// Cuts `text` down to `bound` units; text already within bound is returned unchanged
pub fn repair(text: &str, bound: usize, unit: Unit) -> String {
    match unit {
        Unit::Characters => repair_characters(text, bound),
        Unit::Words => repair_words(text, bound),
    }
}

/// Hard cut at `bound` characters, pulled back to the last whitespace when the
/// cut splits a word and doing so keeps at least 80% of the allowance.
fn repair_characters(text: &str, bound: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= bound {
        return text.to_string();
    }

    let mut cut = bound;
    if !chars[bound].is_whitespace() {
        if let Some(space) = chars[..bound].iter().rposition(|c| c.is_whitespace()) {
            // space >= 0.8 * bound
            if space * 5 >= bound * 4 {
                cut = space;
            }
        }
    }

    let truncated: String = chars[..cut].iter().collect();
    truncated.trim_end().to_string()
}

fn repair_words(text: &str, bound: usize) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() <= bound {
        return text.to_string();
    }
    tokens[..bound].join(" ")
}

/// Builds the result for `limits` from a parsed record, repairing any variant
/// that is over its bound and recording those that remain over it.
pub fn enforce(record: &ParsedRecord, limits: &[LimitSpec]) -> GenerationResult {
    let mut variants = Vec::with_capacity(limits.len());
    let mut violations = Vec::new();

    for limit in limits {
        let raw = record.get(&limit.label);
        let text = repair(raw, limit.bound, limit.unit);

        if text.len() != raw.len() {
            debug!(
                label = %limit.label,
                bound = limit.bound,
                unit = %limit.unit,
                before = measure(raw, limit.unit),
                after = measure(&text, limit.unit),
                "Repaired over-limit variant"
            );
        }

        let actual = measure(&text, limit.unit);
        if actual > limit.bound {
            warn!(label = %limit.label, bound = limit.bound, actual, "Variant still over limit after repair");
            violations.push(ConstraintViolation {
                label: limit.label.clone(),
                bound: limit.bound,
                unit: limit.unit,
                actual,
            });
        }

        variants.push(Variant {
            label: limit.label.clone(),
            bound: limit.bound,
            unit: limit.unit,
            text,
        });
    }

    GenerationResult {
        variants,
        violations,
        style_findings: Vec::new(),
    }
}
