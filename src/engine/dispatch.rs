//! Execution dispatch: one external call per confirmed intent.
//!
//! The dispatcher never retries — every confirmed intent is at-most-once —
//! and never runs more than one underlying operation, with the single
//! documented exception of the approve-then-swap two-step for swaps out of
//! a non-native token.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::intent::TransactionIntent;
use crate::model::{Address, Token};

/// Signer/submitter collaborator. Each method submits one on-chain
/// operation and resolves to a transaction identifier.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn send_native(&self, to: &Address, amount: Decimal) -> Result<String, DispatchError>;

    async fn send_token(
        &self,
        to: &Address,
        token: Token,
        amount: Decimal,
    ) -> Result<String, DispatchError>;

    async fn create_scheduled_payment(
        &self,
        to: &Address,
        token: Token,
        amount: Decimal,
        execute_at: i64,
        memo: &str,
    ) -> Result<String, DispatchError>;

    #[allow(clippy::too_many_arguments)]
    async fn create_conditional_payment(
        &self,
        to: &Address,
        token: Token,
        amount: Decimal,
        price_threshold: Decimal,
        is_above_threshold: bool,
        memo: &str,
    ) -> Result<String, DispatchError>;

    async fn create_team(
        &self,
        name: &str,
        members: &[Address],
        required_approvals: u32,
    ) -> Result<String, DispatchError>;

    async fn add_contact(&self, name: &str, address: &Address) -> Result<String, DispatchError>;

    async fn swap(
        &self,
        from_token: Token,
        to_token: Token,
        amount: Decimal,
    ) -> Result<String, DispatchError>;

    async fn claim_faucet(&self) -> Result<String, DispatchError>;

    /// Native balance; `None` means the caller's own address.
    async fn balance_of(&self, address: Option<&Address>) -> Result<Decimal, DispatchError>;

    /// Current router allowance for a token.
    async fn allowance(&self, token: Token) -> Result<Decimal, DispatchError>;

    /// Approve the router to spend a token.
    async fn approve(&self, token: Token, amount: Decimal) -> Result<String, DispatchError>;
}

/// Uniform outcome record for a confirmed intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Submitted { transaction_id: String },
    Failed { error: String },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Submitted { .. })
    }

    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            Self::Submitted { transaction_id } => Some(transaction_id),
            Self::Failed { .. } => None,
        }
    }
}

/// Map a confirmed, fully-resolved intent onto exactly one collaborator
/// call and normalize the result.
pub async fn dispatch(intent: &TransactionIntent, client: &dyn ChainClient) -> ExecutionOutcome {
    match run(intent, client).await {
        Ok(transaction_id) => {
            tracing::info!(intent = intent.label(), %transaction_id, "dispatch submitted");
            ExecutionOutcome::Submitted { transaction_id }
        }
        Err(error) => {
            tracing::warn!(intent = intent.label(), %error, "dispatch failed");
            ExecutionOutcome::Failed {
                error: error.to_string(),
            }
        }
    }
}

async fn run(intent: &TransactionIntent, client: &dyn ChainClient) -> Result<String, DispatchError> {
    match intent {
        TransactionIntent::Send {
            recipient,
            amount,
            token,
            ..
        } => {
            let to = require_recipient(recipient.as_ref())?;
            if token.is_native() {
                client.send_native(to, *amount).await
            } else {
                client.send_token(to, *token, *amount).await
            }
        }
        TransactionIntent::Schedule {
            recipient,
            amount,
            token,
            execute_at,
            memo,
            ..
        } => {
            let to = require_recipient(recipient.as_ref())?;
            client
                .create_scheduled_payment(to, *token, *amount, *execute_at, memo)
                .await
        }
        TransactionIntent::Conditional {
            recipient,
            amount,
            token,
            price_threshold,
            is_above_threshold,
            memo,
            ..
        } => {
            let to = require_recipient(recipient.as_ref())?;
            client
                .create_conditional_payment(
                    to,
                    *token,
                    *amount,
                    *price_threshold,
                    *is_above_threshold,
                    memo,
                )
                .await
        }
        TransactionIntent::Team {
            team_name,
            team_members,
            required_approvals,
        } => {
            let name = team_name
                .as_deref()
                .ok_or(DispatchError::NotExecutable("team has no name"))?;
            if team_members.is_empty() {
                return Err(DispatchError::NotExecutable("team has no members"));
            }
            client
                .create_team(name, team_members, *required_approvals)
                .await
        }
        TransactionIntent::Contact {
            contact_name,
            recipient,
        } => {
            let name = contact_name
                .as_deref()
                .ok_or(DispatchError::NotExecutable("contact has no name"))?;
            let address = require_recipient(recipient.as_ref())?;
            client.add_contact(name, address).await
        }
        TransactionIntent::Swap {
            from_token,
            to_token,
            amount,
        } => {
            let from = from_token.ok_or(DispatchError::NotExecutable("swap has no source token"))?;
            let to = to_token.ok_or(DispatchError::NotExecutable("swap has no target token"))?;
            let amount = amount.ok_or(DispatchError::NotExecutable("swap has no amount"))?;
            swap_with_allowance(client, from, to, amount).await
        }
        TransactionIntent::Faucet => client.claim_faucet().await,
        TransactionIntent::Balance { .. } | TransactionIntent::Reputation { .. } => Err(
            DispatchError::NotExecutable("read-only intents never reach dispatch"),
        ),
    }
}

/// Swaps out of a non-native token need router spending approval first.
/// Approve-if-insufficient then swap is one logical confirmed action.
async fn swap_with_allowance(
    client: &dyn ChainClient,
    from_token: Token,
    to_token: Token,
    amount: Decimal,
) -> Result<String, DispatchError> {
    if !from_token.is_native() {
        let allowance = client.allowance(from_token).await?;
        if allowance < amount {
            let approval_tx = client.approve(from_token, amount).await?;
            tracing::debug!(token = %from_token, %approval_tx, "router allowance approved");
        }
    }
    client.swap(from_token, to_token, amount).await
}

fn require_recipient(recipient: Option<&Address>) -> Result<&Address, DispatchError> {
    recipient.ok_or(DispatchError::NotExecutable(
        "recipient missing; resolution should have re-prompted",
    ))
}
