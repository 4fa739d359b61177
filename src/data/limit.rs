use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What a limit's bound counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Characters,
    Words,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Characters => "characters",
            Unit::Words => "words",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = LimitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "characters" | "chars" | "c" => Ok(Unit::Characters),
            "words" | "w" => Ok(Unit::Words),
            other => Err(LimitParseError::UnknownUnit(other.to_string())),
        }
    }
}

/// One named output variant and the bound it must respect.
///
/// The label doubles as the instruction text in the prompt and the key of the
/// produced value in the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitSpec {
    pub label: String,
    pub bound: usize,
    #[serde(default)]
    pub unit: Unit,
}

impl LimitSpec {
    pub fn new(label: impl Into<String>, bound: usize, unit: Unit) -> Self {
        Self {
            label: label.into(),
            bound,
            unit,
        }
    }

    pub fn characters(label: impl Into<String>, bound: usize) -> Self {
        Self::new(label, bound, Unit::Characters)
    }

    pub fn words(label: impl Into<String>, bound: usize) -> Self {
        Self::new(label, bound, Unit::Words)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimitParseError {
    #[error("limit '{0}' must look like LABEL:BOUND[:UNIT]")]
    Malformed(String),
    #[error("invalid bound '{0}': expected a positive integer")]
    InvalidBound(String),
    #[error("unknown unit '{0}': expected characters or words")]
    UnknownUnit(String),
}

/// Parses `LABEL:BOUND[:UNIT]`, reading from the right so labels may contain colons
impl FromStr for LimitSpec {
    type Err = LimitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.rsplitn(3, ':').collect();
        parts.reverse();

        let (label, bound, unit) = match parts.as_slice() {
            [label, bound] => (*label, *bound, Unit::Characters),
            [label, bound, unit] => match bound.trim().parse::<usize>() {
                Ok(_) => (*label, *bound, unit.parse()?),
                // "Short: tagline:90" - the middle segment belongs to the label
                Err(_) if unit.trim().parse::<usize>().is_ok() => {
                    return Ok(LimitSpec::characters(
                        format!("{}:{}", label, bound).trim(),
                        parse_bound(unit)?,
                    ));
                }
                Err(_) => (*label, *bound, unit.parse()?),
            },
            _ => return Err(LimitParseError::Malformed(s.to_string())),
        };

        let label = label.trim();
        if label.is_empty() {
            return Err(LimitParseError::Malformed(s.to_string()));
        }

        Ok(LimitSpec::new(label, parse_bound(bound)?, unit))
    }
}

fn parse_bound(raw: &str) -> Result<usize, LimitParseError> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(LimitParseError::InvalidBound(raw.trim().to_string())),
        Ok(n) => Ok(n),
    }
}
