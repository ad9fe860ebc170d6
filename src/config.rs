//! Engine configuration.
//!
//! Settings load with priority: env var > default. The engine is a library,
//! so hosts can also construct [`EngineConfig`] directly and skip the env
//! layer entirely.

use crate::engine::state::PendingReplacement;
use crate::error::ConfigError;
use crate::intent::classify::ClassifierDefaults;
use crate::model::Token;

/// Env var selecting the default token for transfer-like intents.
const ENV_DEFAULT_TOKEN: &str = "CHAINMATE_DEFAULT_TOKEN";
/// Env var selecting the dollar-amount default token.
const ENV_DOLLAR_TOKEN: &str = "CHAINMATE_DOLLAR_TOKEN";
/// Env var bounding how many prior turns are fed to the reply generator.
const ENV_MAX_CONTEXT_TURNS: &str = "CHAINMATE_MAX_CONTEXT_TURNS";
/// Env var selecting pending-intent replacement behavior:
/// `replace` (default) or `require-cancel`.
const ENV_PENDING_REPLACEMENT: &str = "CHAINMATE_PENDING_REPLACEMENT";

/// Main configuration for the chat engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Token assumed when a transfer-like intent names an amount but no symbol.
    pub default_token: Token,
    /// Token assumed for `$N` amounts with no explicit trailing symbol.
    pub dollar_token: Token,
    /// Prior turns handed to the reply generator as conversational context.
    pub max_context_turns: usize,
    /// What happens when a fresh instruction arrives while a confirmation
    /// is pending.
    pub pending_replacement: PendingReplacement,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_token: Token::Bnb,
            dollar_token: Token::Usdt,
            max_context_turns: 20,
            pending_replacement: PendingReplacement::ReplaceWithNotice,
        }
    }
}

impl EngineConfig {
    /// Build a config from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = optional_env(ENV_DEFAULT_TOKEN) {
            config.default_token = parse_token(ENV_DEFAULT_TOKEN, &raw)?;
        }
        if let Some(raw) = optional_env(ENV_DOLLAR_TOKEN) {
            config.dollar_token = parse_token(ENV_DOLLAR_TOKEN, &raw)?;
        }
        if let Some(raw) = optional_env(ENV_MAX_CONTEXT_TURNS) {
            config.max_context_turns =
                raw.trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_MAX_CONTEXT_TURNS.to_string(),
                        message: format!("expected a positive integer, got '{raw}'"),
                    })?;
        }
        if let Some(raw) = optional_env(ENV_PENDING_REPLACEMENT) {
            config.pending_replacement = match raw.trim().to_ascii_lowercase().as_str() {
                "replace" => PendingReplacement::ReplaceWithNotice,
                "require-cancel" => PendingReplacement::RequireExplicitCancel,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_PENDING_REPLACEMENT.to_string(),
                        message: format!("expected 'replace' or 'require-cancel', got '{raw}'"),
                    });
                }
            };
        }

        Ok(config)
    }

    /// The token defaults the classifier applies.
    pub fn classifier_defaults(&self) -> ClassifierDefaults {
        ClassifierDefaults {
            default_token: self.default_token,
            dollar_token: self.dollar_token,
        }
    }
}

fn parse_token(key: &str, raw: &str) -> Result<Token, ConfigError> {
    Token::parse(raw).ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("unknown token symbol '{raw}'"),
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_transfer_conventions() {
        let config = EngineConfig::default();
        assert_eq!(config.default_token, Token::Bnb);
        assert_eq!(config.dollar_token, Token::Usdt);
        assert_eq!(
            config.pending_replacement,
            PendingReplacement::ReplaceWithNotice
        );
    }

    #[test]
    fn parse_token_rejects_unknown_symbol() {
        let err = parse_token("CHAINMATE_DEFAULT_TOKEN", "DOGE").unwrap_err();
        assert!(err.to_string().contains("DOGE"));
    }
}
