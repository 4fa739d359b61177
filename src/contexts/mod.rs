mod cancellation;
pub mod constraint_enforcer;
mod error;
mod generation_client;
mod orchestrator;
pub mod prompt_builder;
pub mod response_parser;
pub mod style_audit;

pub use cancellation::CancellationToken;
pub use error::{ErrorKind, GenerationError};
pub use generation_client::{
    ClientConfig, DEFAULT_API_VERSION, DEFAULT_ENDPOINT, DEFAULT_MODEL, GenerationBackend, HttpGenerationClient,
};
pub use orchestrator::{BatchOutcome, CredentialProvider, DEFAULT_BATCH_DELAY, GenerationOrchestrator};
pub use prompt_builder::Prompt;
pub use response_parser::ParsedRecord;
