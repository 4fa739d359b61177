use crate::contexts::CredentialProvider;
use crate::data::Credentials;
use std::env;

pub const DEFAULT_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// A credential fixed at construction time, e.g. one typed in by the user
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    credentials: Option<Credentials>,
}

impl StaticCredentialProvider {
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self { credentials }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn credentials(&self) -> Option<Credentials> {
        self.credentials.clone()
    }
}

/// Reads the credential from an environment variable on every call.
///
/// A `.env` file is only seen if the binary loaded it first.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    var: String,
}

impl EnvCredentialProvider {
    /// Creates a new EnvCredentialProvider
    ///
    /// # Arguments
    /// * `var` - Optional variable name (defaults to "ANTHROPIC_API_KEY")
    pub fn new(var: Option<String>) -> Self {
        Self {
            var: var.unwrap_or_else(|| DEFAULT_API_KEY_VAR.to_string()),
        }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn credentials(&self) -> Option<Credentials> {
        env::var(&self.var)
            .ok()
            .map(Credentials::new)
            .filter(|c| !c.is_blank())
    }
}

/// Asks each provider in turn; the first one with a credential wins
#[derive(Default)]
pub struct CredentialChain {
    providers: Vec<Box<dyn CredentialProvider + Send + Sync>>,
}

impl CredentialChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, provider: impl CredentialProvider + Send + Sync + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

impl CredentialProvider for CredentialChain {
    fn credentials(&self) -> Option<Credentials> {
        self.providers
            .iter()
            .find_map(|p| p.credentials().filter(|c| !c.is_blank()))
    }
}
