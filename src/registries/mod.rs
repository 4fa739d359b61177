mod credential_registry;
mod history_log;
mod style_preset_registry;

pub use credential_registry::{CredentialChain, DEFAULT_API_KEY_VAR, EnvCredentialProvider, StaticCredentialProvider};
pub use history_log::{FileHistoryLog, HistoryEntry, fingerprint};
pub use style_preset_registry::{FileStylePresetRegistry, PresetError, StylePresetRegistry};
