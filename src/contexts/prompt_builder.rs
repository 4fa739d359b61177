use crate::data::{LimitSpec, StyleRuleSet};
use std::fmt::Write;

const FIXED_RULES: [&str; 2] = [
    "Use only information contained in the source copy. Never invent facts, names, dates or claims",
    "Follow the general formatting guide for billing copy: plain sentences, no hashtags, no emoji, no quotation marks around the copy",
];

/// A populated prompt and the result keys the model has been asked to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    /// One key per limit label, in limit order
    pub expected_keys: Vec<String>,
}

/// Assembles the generation prompt.
///
/// Pure and deterministic: identical inputs always produce identical prompts.
pub fn build(source_text: &str, rules: &StyleRuleSet, limits: &[LimitSpec]) -> Prompt {
    let mut text = String::new();

    let _ = writeln!(
        text,
        "You are an editor of broadcast billing copy. Rewrite the source copy below into {} shortened version(s), one for each length limit.",
        limits.len()
    );

    text.push_str("\nSTYLE RULES:\n");
    for (idx, rule) in style_instructions(rules).iter().enumerate() {
        let _ = writeln!(text, "{}. {}", idx + 1, rule);
    }

    text.push_str("\nLENGTH LIMITS:\n");
    for limit in limits {
        let _ = writeln!(text, "{}", constraint_line(limit));
    }

    text.push_str("\nCOUNTING:\n");
    text.push_str("- Words are whitespace-delimited tokens.\n");
    text.push_str("- Characters are every single character, including spaces and punctuation.\n");
    text.push_str(
        "- If there is insufficient original content to meaningfully fill a longer version, leave it blank (use an empty string).\n",
    );

    text.push_str("\nSOURCE COPY:\n\"\"\"\n");
    text.push_str(&quote_source(source_text.trim()));
    text.push_str("\n\"\"\"\n");

    text.push_str("\nRESPONSE FORMAT:\n");
    text.push_str(
        "Your entire response must be valid JSON with no text, explanation or code fences before or after it, in exactly this shape:\n",
    );
    text.push_str(&response_shape(limits));
    text.push('\n');

    Prompt {
        text,
        expected_keys: limits.iter().map(|l| l.label.clone()).collect(),
    }
}

/// The numbered style instructions, in the order they appear in the prompt
fn style_instructions(rules: &StyleRuleSet) -> Vec<String> {
    let mut lines = Vec::new();

    if rules.british_english {
        lines.push("Use British English spelling and conventions (e.g. colour, programme, centre)".to_string());
    }
    if rules.no_full_stops {
        lines.push("Do not end any version with a full stop".to_string());
    }
    if rules.include_descriptors {
        lines.push("Include descriptors such as genre, tone or format where space allows".to_string());
    }
    if rules.avoid_repetition {
        lines.push("Avoid repeating words or phrases within a version".to_string());
    }

    lines.extend(FIXED_RULES.iter().map(|r| r.to_string()));

    let forbidden: Vec<String> = rules
        .active_forbidden_words()
        .map(|w| format!("\"{}\"", w))
        .collect();
    if !forbidden.is_empty() {
        lines.push(format!("Never use the following words: {}", forbidden.join(", ")));
    }

    if let Some(custom) = rules.active_custom_instructions() {
        lines.push(format!("Additional instructions: {}", custom));
    }

    lines
}

/// Escapes every `"` when the source holds a `"""` run, so the quoted block
/// cannot be closed early. Sources without one are embedded unchanged.
fn quote_source(source: &str) -> String {
    if source.contains(r#"""""#) {
        source.replace('"', r#"\""#)
    } else {
        source.to_string()
    }
}

fn constraint_line(limit: &LimitSpec) -> String {
    format!(
        "{}: ABSOLUTE MAXIMUM {} {} including spaces and punctuation — NEVER EXCEED THIS LIMIT",
        limit.label, limit.bound, limit.unit
    )
}

/// `{"<label>": "...", ...}` with keys JSON-escaped and kept in limit order
fn response_shape(limits: &[LimitSpec]) -> String {
    let fields: Vec<String> = limits
        .iter()
        .map(|limit| {
            let key = serde_json::Value::String(limit.label.clone()).to_string();
            format!("  {}: \"<text or empty string>\"", key)
        })
        .collect();
    format!("{{\n{}\n}}", fields.join(",\n"))
}
