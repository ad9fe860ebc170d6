//! Transaction-history recording.
//!
//! Recording is fire-and-forget: a failed write is logged and never blocks
//! or fails the conversation turn that produced it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::dispatch::ExecutionOutcome;
use crate::error::HistoryError;
use crate::intent::TransactionIntent;
use crate::model::{Address, Token, TurnStatus};

/// One recorded submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    /// Intent label, e.g. `send` or `swap`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: TurnStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl HistoryEntry {
    /// Build an entry from a dispatched intent and its outcome.
    pub fn from_dispatch(intent: &TransactionIntent, outcome: &ExecutionOutcome) -> Self {
        let (amount, token, memo) = match intent {
            TransactionIntent::Send {
                amount,
                token,
                memo,
                ..
            } => (Some(*amount), Some(*token), memo.clone()),
            TransactionIntent::Schedule {
                amount,
                token,
                memo,
                ..
            }
            | TransactionIntent::Conditional {
                amount,
                token,
                memo,
                ..
            } => (Some(*amount), Some(*token), Some(memo.clone())),
            TransactionIntent::Swap {
                amount, from_token, ..
            } => (*amount, *from_token, None),
            _ => (None, None, None),
        };

        Self {
            id: Uuid::new_v4(),
            kind: intent.label().to_string(),
            to: intent.recipient().cloned(),
            amount,
            token,
            tx_hash: outcome.transaction_id().map(String::from),
            timestamp: Utc::now(),
            status: if outcome.is_success() {
                TurnStatus::Success
            } else {
                TurnStatus::Error
            },
            memo,
        }
    }
}

/// History persistence collaborator.
#[async_trait]
pub trait HistorySink: Send + Sync + 'static {
    async fn record(&self, entry: HistoryEntry) -> Result<(), HistoryError>;
}

/// Record an entry off the turn's critical path.
pub fn record_in_background(sink: Arc<dyn HistorySink>, entry: HistoryEntry) {
    tokio::spawn(async move {
        let kind = entry.kind.clone();
        if let Err(error) = sink.record(entry).await {
            tracing::warn!(%kind, %error, "failed to record history entry");
        }
    });
}
