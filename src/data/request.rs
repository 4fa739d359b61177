use crate::data::{LimitSpec, StyleRuleSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// An opaque API credential supplied by the caller.
///
/// The value is never printed by `Debug` and never serialised.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Credentials(***)")
    }
}

/// Reasons a request is refused before any work is done
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("source text is empty")]
    EmptySource,
    #[error("at least one limit is required")]
    NoLimits,
    #[error("limit at position {0} has an empty label")]
    EmptyLabel(usize),
    #[error("limit '{0}' must have a bound greater than zero")]
    ZeroBound(String),
    #[error("limit label '{0}' is used more than once")]
    DuplicateLabel(String),
}

/// One unit of work for the generation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub source_text: String,
    #[serde(default)]
    pub style_rules: StyleRuleSet,
    pub limits: Vec<LimitSpec>,
    /// Per-call override; takes precedence over any configured provider
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

impl GenerationRequest {
    pub fn new(source_text: impl Into<String>, style_rules: StyleRuleSet, limits: Vec<LimitSpec>) -> Self {
        let source_text: String = source_text.into();
        Self {
            source_text: source_text.trim().to_string(),
            style_rules,
            limits,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Checks the invariants every request must hold before it reaches the backend
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.source_text.trim().is_empty() {
            return Err(RequestError::EmptySource);
        }
        if self.limits.is_empty() {
            return Err(RequestError::NoLimits);
        }

        let mut seen = HashSet::new();
        for (idx, limit) in self.limits.iter().enumerate() {
            if limit.label.trim().is_empty() {
                return Err(RequestError::EmptyLabel(idx));
            }
            if limit.bound == 0 {
                return Err(RequestError::ZeroBound(limit.label.clone()));
            }
            if !seen.insert(limit.label.as_str()) {
                return Err(RequestError::DuplicateLabel(limit.label.clone()));
            }
        }

        Ok(())
    }
}
