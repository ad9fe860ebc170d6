//! Shared domain types for the intent pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Failure parsing a hex address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address '{0}': expected 0x followed by 40 hex characters")]
pub struct AddressParseError(pub String);

/// 20-byte EVM address in `0x`-prefixed hex form.
///
/// Case is preserved exactly as supplied; comparisons are case-sensitive on
/// purpose so the engine echoes back what the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn parse(raw: &str) -> Result<Self, AddressParseError> {
        let hex = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError(raw.to_string()))?;
        if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressParseError(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token symbols the lexical extractors recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Token {
    Bnb,
    Cmt,
    Usdt,
    Busd,
    Wbnb,
    Dai,
}

impl Token {
    /// All recognized symbols, in extractor alternation order.
    pub const ALL: &'static [Token] = &[
        Token::Bnb,
        Token::Cmt,
        Token::Usdt,
        Token::Busd,
        Token::Wbnb,
        Token::Dai,
    ];

    /// Case-insensitive symbol parse.
    pub fn parse(symbol: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(symbol.trim()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bnb => "BNB",
            Self::Cmt => "CMT",
            Self::Usdt => "USDT",
            Self::Busd => "BUSD",
            Self::Wbnb => "WBNB",
            Self::Dai => "DAI",
        }
    }

    /// BNB moves via plain value transfers; everything else is an ERC-20 call.
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Bnb)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Delivery status attached to turns that reference a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Pending,
    Success,
    Error,
}

/// One message in the conversation. Append-only; persistence is the
/// host's side effect, not the state machine's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TurnStatus>,
    #[serde(default)]
    pub requires_confirmation: bool,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            transaction_hash: None,
            status: None,
            requires_confirmation: false,
        }
    }

    pub fn with_transaction_hash(mut self, hash: impl Into<String>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }

    pub fn with_status(mut self, status: TurnStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn needs_confirmation(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }
}

/// A saved contact: human name mapped to an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub address: Address,
}

/// On-chain reputation facts for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressReputation {
    pub transaction_count: u64,
    pub is_flagged: bool,
}

/// Advisory risk tier derived from reputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Advisory output of the reputation enrichment step. Ephemeral: folded
/// into the confirmation prompt text, never persisted as structured data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub warnings: Vec<String>,
}

/// Output of the swap-quote enrichment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub amount_out: Decimal,
    pub path: Vec<Address>,
}

impl SwapQuote {
    /// Number of pool hops along the route.
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn address_parse_accepts_mixed_case_40_hex() {
        let raw = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb1";
        let addr = Address::parse(raw).unwrap();
        assert_eq!(addr.as_str(), raw);
    }

    #[test]
    fn address_parse_rejects_wrong_length_and_prefix() {
        assert!(Address::parse("0x742d35Cc").is_err());
        assert!(Address::parse("742d35Cc6634C0532925a3b844Bc9e7595f0bEb1").is_err());
        assert!(Address::parse("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEbZZ").is_err());
    }

    #[test]
    fn token_parse_is_case_insensitive() {
        assert_eq!(Token::parse("bnb"), Some(Token::Bnb));
        assert_eq!(Token::parse("Usdt"), Some(Token::Usdt));
        assert_eq!(Token::parse("doge"), None);
    }

    #[test]
    fn swap_quote_hop_count() {
        let quote = SwapQuote {
            amount_out: dec!(19.4),
            path: vec![
                Address::parse("0x0000000000000000000000000000000000000001").unwrap(),
                Address::parse("0x0000000000000000000000000000000000000002").unwrap(),
                Address::parse("0x0000000000000000000000000000000000000003").unwrap(),
            ],
        };
        assert_eq!(quote.hops(), 2);
    }

    #[test]
    fn turn_builders_set_flags() {
        let turn = ConversationTurn::assistant("done")
            .with_transaction_hash("0xabc")
            .with_status(TurnStatus::Success);
        assert_eq!(turn.transaction_hash.as_deref(), Some("0xabc"));
        assert_eq!(turn.status, Some(TurnStatus::Success));
        assert!(!turn.requires_confirmation);
        assert!(ConversationTurn::assistant("?").needs_confirmation().requires_confirmation);
    }
}
