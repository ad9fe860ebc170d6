//! Error types for the ChainMate engine.
//!
//! Parse ambiguity and contact-resolution failures are conversational
//! outcomes, not errors: they surface as re-prompt turns and never appear
//! here. These types cover the collaborator boundaries (contacts,
//! enrichment, dispatch, reply generation, history) plus configuration.

/// Top-level error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Contact directory error: {0}")]
    Contact(#[from] ContactError),

    #[error("Enrichment error: {0}")]
    Enrich(#[from] EnrichError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Contact-directory lookup errors (transport only; "not found" is not an error).
#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("Contact lookup failed: {0}")]
    Lookup(String),
}

/// Pre-execution enrichment errors.
///
/// Reputation failures are advisory and handled fail-open by the engine.
/// Quote failures abort the current swap attempt before confirmation.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("Reputation lookup failed for {address}: {reason}")]
    ReputationUnavailable { address: String, reason: String },

    #[error("Swap quote unavailable for {from_token} -> {to_token}: {reason}")]
    QuoteUnavailable {
        from_token: String,
        to_token: String,
        reason: String,
    },
}

/// Execution dispatch errors.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Allowance approval failed: {0}")]
    Approval(String),

    #[error("Intent is not executable: {0}")]
    NotExecutable(&'static str),
}

/// Reply-generation backend errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Reply generation failed: {0}")]
    Generation(String),
}

/// Transaction-history persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to record history entry: {0}")]
    Record(String),
}
