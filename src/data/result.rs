use crate::data::{LimitSpec, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One produced variant, carrying the limit it was measured against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub label: String,
    pub bound: usize,
    pub unit: Unit,
    pub text: String,
}

/// A variant that is still over its bound after repair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub label: String,
    pub bound: usize,
    pub unit: Unit,
    /// Measured length after repair, in `unit`
    pub actual: usize,
}

impl ConstraintViolation {
    pub fn excess(&self) -> usize {
        self.actual.saturating_sub(self.bound)
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "'{}' is over limit: {} {} against a maximum of {} ({} over)",
            self.label,
            self.actual,
            self.unit,
            self.bound,
            self.excess()
        )
    }
}

/// House-style rule a finding refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum StyleRule {
    ForbiddenWord { word: String },
    TrailingFullStop,
}

/// A house-style problem spotted in a produced variant. Findings are reported, not repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleFinding {
    pub label: String,
    #[serde(flatten)]
    pub rule: StyleRule,
}

impl fmt::Display for StyleFinding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.rule {
            StyleRule::ForbiddenWord { word } => {
                write!(f, "'{}' uses forbidden word '{}'", self.label, word)
            }
            StyleRule::TrailingFullStop => write!(f, "'{}' ends with a full stop", self.label),
        }
    }
}

/// The outcome of one successful generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Exactly one entry per limit, in limit order
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub violations: Vec<ConstraintViolation>,
    #[serde(default)]
    pub style_findings: Vec<StyleFinding>,
}

impl GenerationResult {
    /// Produced text for `label`; unknown labels read as empty
    pub fn value(&self, label: &str) -> &str {
        self.variants
            .iter()
            .find(|v| v.label == label)
            .map(|v| v.text.as_str())
            .unwrap_or("")
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.label.as_str())
    }

    pub fn is_violated(&self, label: &str) -> bool {
        self.violations.iter().any(|v| v.label == label)
    }

    /// True when at least one variant could not be brought under its bound
    pub fn is_degraded(&self) -> bool {
        !self.violations.is_empty()
    }

    /// A placeholder result that marks every variant with an error message,
    /// used to keep failed batch items visible alongside successful ones
    pub fn error_sentinel(limits: &[LimitSpec], message: &str) -> Self {
        let text = format!("Error: {}", message);
        Self {
            variants: limits
                .iter()
                .map(|limit| Variant {
                    label: limit.label.clone(),
                    bound: limit.bound,
                    unit: limit.unit,
                    text: text.clone(),
                })
                .collect(),
            violations: Vec::new(),
            style_findings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GenerationResult {
        GenerationResult {
            variants: vec![
                Variant {
                    label: "Short".to_string(),
                    bound: 20,
                    unit: Unit::Characters,
                    text: "Lighthouse drama".to_string(),
                },
                Variant {
                    label: "Long".to_string(),
                    bound: 90,
                    unit: Unit::Characters,
                    text: String::new(),
                },
            ],
            violations: Vec::new(),
            style_findings: Vec::new(),
        }
    }

    #[test]
    fn test_value_is_total() {
        let result = sample();
        assert_eq!(result.value("Short"), "Lighthouse drama");
        assert_eq!(result.value("Long"), "");
        assert_eq!(result.value("Missing"), "");
    }

    #[test]
    fn test_labels_keep_limit_order() {
        let binding = sample();
        let labels: Vec<&str> = binding.labels().collect();
        assert_eq!(labels, vec!["Short", "Long"]);
    }

    #[test]
    fn test_violation_reports_excess() {
        let violation = ConstraintViolation {
            label: "Short".to_string(),
            bound: 10,
            unit: Unit::Characters,
            actual: 14,
        };
        assert_eq!(violation.excess(), 4);
        assert!(violation.to_string().contains("4 over"));
    }

    #[test]
    fn test_error_sentinel_covers_every_limit() {
        let limits = vec![LimitSpec::characters("Short", 20), LimitSpec::words("Teaser", 5)];
        let result = GenerationResult::error_sentinel(&limits, "rate limited");
        assert_eq!(result.variants.len(), 2);
        assert!(result.variants.iter().all(|v| v.text == "Error: rate limited"));
        assert!(!result.is_degraded());
    }

    #[test]
    fn test_finding_serialises_flat_with_rule_tag() {
        let finding = StyleFinding {
            label: "Short".to_string(),
            rule: StyleRule::ForbiddenWord {
                word: "iconic".to_string(),
            },
        };
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["label"], "Short");
        assert_eq!(json["rule"], "forbidden_word");
        assert_eq!(json["word"], "iconic");

        let back: StyleFinding = serde_json::from_value(json).unwrap();
        assert_eq!(back, finding);
    }
}
