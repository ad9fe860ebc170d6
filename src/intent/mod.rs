//! Typed transaction intents extracted from free-form text.
//!
//! An utterance yields zero or one intent — never several. The variants
//! mirror the operations the execution dispatcher knows how to submit.

pub mod classify;
pub mod extract;
pub mod resolve;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{Address, Token};

/// A structured, executable financial instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransactionIntent {
    /// Immediate transfer of native BNB or a token.
    Send {
        #[serde(skip_serializing_if = "Option::is_none")]
        recipient: Option<Address>,
        #[serde(skip_serializing_if = "Option::is_none")]
        contact_name: Option<String>,
        amount: Decimal,
        token: Token,
        #[serde(skip_serializing_if = "Option::is_none")]
        memo: Option<String>,
    },
    /// Token swap; fields stay unset until the user supplies them.
    Swap {
        #[serde(skip_serializing_if = "Option::is_none")]
        from_token: Option<Token>,
        #[serde(skip_serializing_if = "Option::is_none")]
        to_token: Option<Token>,
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<Decimal>,
    },
    /// Transfer executed at an absolute future instant. Never produced
    /// without an amount.
    Schedule {
        #[serde(skip_serializing_if = "Option::is_none")]
        recipient: Option<Address>,
        #[serde(skip_serializing_if = "Option::is_none")]
        contact_name: Option<String>,
        amount: Decimal,
        token: Token,
        /// Absolute UNIX-seconds execution instant.
        execute_at: i64,
        memo: String,
    },
    /// Transfer triggered by a price threshold crossing.
    Conditional {
        #[serde(skip_serializing_if = "Option::is_none")]
        recipient: Option<Address>,
        #[serde(skip_serializing_if = "Option::is_none")]
        contact_name: Option<String>,
        amount: Decimal,
        token: Token,
        price_threshold: Decimal,
        is_above_threshold: bool,
        memo: String,
    },
    /// Multisig-style team creation.
    Team {
        #[serde(skip_serializing_if = "Option::is_none")]
        team_name: Option<String>,
        /// Order preserved; duplicates not deduplicated.
        team_members: Vec<Address>,
        required_approvals: u32,
    },
    /// Read-only balance query; `None` means the caller's own address.
    Balance {
        #[serde(skip_serializing_if = "Option::is_none")]
        recipient: Option<Address>,
    },
    /// Save a contact name/address pair.
    Contact {
        #[serde(skip_serializing_if = "Option::is_none")]
        contact_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        recipient: Option<Address>,
    },
    /// Read-only reputation query for an address.
    Reputation {
        #[serde(skip_serializing_if = "Option::is_none")]
        recipient: Option<Address>,
    },
    /// Claim test tokens from the faucet.
    Faucet,
}

impl TransactionIntent {
    /// Stable label for logging and status payloads.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Send { .. } => "send",
            Self::Swap { .. } => "swap",
            Self::Schedule { .. } => "schedule",
            Self::Conditional { .. } => "conditional",
            Self::Team { .. } => "team",
            Self::Balance { .. } => "balance",
            Self::Contact { .. } => "contact",
            Self::Reputation { .. } => "reputation",
            Self::Faucet => "faucet",
        }
    }

    /// Read-only intents execute immediately and never enter the
    /// confirmation slot.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Balance { .. } | Self::Reputation { .. })
    }

    /// Value-moving transfers that get a reputation check on the recipient.
    pub fn is_transfer_like(&self) -> bool {
        matches!(
            self,
            Self::Send { .. } | Self::Schedule { .. } | Self::Conditional { .. }
        )
    }

    /// Whether this variant cannot be dispatched without a recipient address.
    pub fn needs_recipient(&self) -> bool {
        matches!(
            self,
            Self::Send { .. } | Self::Schedule { .. } | Self::Conditional { .. } | Self::Contact { .. }
        )
    }

    pub fn recipient(&self) -> Option<&Address> {
        match self {
            Self::Send { recipient, .. }
            | Self::Schedule { recipient, .. }
            | Self::Conditional { recipient, .. }
            | Self::Contact { recipient, .. }
            | Self::Balance { recipient }
            | Self::Reputation { recipient } => recipient.as_ref(),
            _ => None,
        }
    }

    pub fn contact_name(&self) -> Option<&str> {
        match self {
            Self::Send { contact_name, .. }
            | Self::Schedule { contact_name, .. }
            | Self::Conditional { contact_name, .. }
            | Self::Contact { contact_name, .. } => contact_name.as_deref(),
            _ => None,
        }
    }

    /// Fill in a resolved recipient address. Only meaningful for the
    /// recipient-bearing variants; a no-op otherwise.
    pub fn set_recipient(&mut self, address: Address) {
        match self {
            Self::Send { recipient, .. }
            | Self::Schedule { recipient, .. }
            | Self::Conditional { recipient, .. }
            | Self::Contact { recipient, .. } => *recipient = Some(address),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn addr() -> Address {
        Address::parse("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb1").unwrap()
    }

    #[test]
    fn serde_tags_variants_by_lowercase_type() {
        let intent = TransactionIntent::Send {
            recipient: Some(addr()),
            contact_name: None,
            amount: dec!(10),
            token: Token::Bnb,
            memo: None,
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["type"], "send");
        assert_eq!(json["token"], "BNB");
        assert_eq!(json["amount"], "10");
        assert!(json.get("contact_name").is_none());
    }

    #[test]
    fn read_only_and_transfer_like_partitions() {
        assert!(TransactionIntent::Balance { recipient: None }.is_read_only());
        assert!(TransactionIntent::Reputation { recipient: None }.is_read_only());
        assert!(!TransactionIntent::Faucet.is_read_only());

        let send = TransactionIntent::Send {
            recipient: None,
            contact_name: None,
            amount: dec!(1),
            token: Token::Bnb,
            memo: None,
        };
        assert!(send.is_transfer_like());
        assert!(send.needs_recipient());
        assert!(!TransactionIntent::Faucet.needs_recipient());
    }

    #[test]
    fn set_recipient_fills_transfer_variants_only() {
        let mut send = TransactionIntent::Send {
            recipient: None,
            contact_name: Some("Alice".to_string()),
            amount: dec!(2),
            token: Token::Bnb,
            memo: None,
        };
        send.set_recipient(addr());
        assert_eq!(send.recipient(), Some(&addr()));

        let mut faucet = TransactionIntent::Faucet;
        faucet.set_recipient(addr());
        assert_eq!(faucet.recipient(), None);
    }
}
