//! On-demand wallet analysis: two generated narratives about an address.
//!
//! The two generations run concurrently and fail independently; a failed
//! half degrades to a fixed fallback sentence rather than failing the
//! whole analysis.

use crate::engine::enrich::ReputationOracle;
use crate::llm::ReplyGenerator;
use crate::model::{Address, AddressReputation};

const ANALYSIS_FALLBACK: &str = "Unable to analyze this address right now.";

/// Narrative analysis of one address.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletAnalysis {
    pub address: Address,
    /// Activity overview: volume, cadence, counterparties.
    pub overview: String,
    /// Contract-interaction audit: protocols touched, approval hygiene.
    pub contract_audit: String,
}

/// Run both analyses for an address.
///
/// Reputation facts are fetched first and folded into the prompts when
/// available; a lookup failure just means the prompts carry no facts.
pub async fn analyze_wallet(
    generator: &dyn ReplyGenerator,
    oracle: &dyn ReputationOracle,
    address: &Address,
) -> WalletAnalysis {
    let reputation = match oracle.reputation(address).await {
        Ok(reputation) => Some(reputation),
        Err(error) => {
            tracing::warn!(%address, %error, "reputation unavailable for analysis");
            None
        }
    };

    let overview_prompt = overview_prompt(address, reputation.as_ref());
    let audit_prompt = audit_prompt(address, reputation.as_ref());

    let (overview, contract_audit) = futures::future::join(
        generator.generate(&[], &overview_prompt),
        generator.generate(&[], &audit_prompt),
    )
    .await;

    WalletAnalysis {
        address: address.clone(),
        overview: fallback_on_error(overview, address, "overview"),
        contract_audit: fallback_on_error(contract_audit, address, "contract audit"),
    }
}

fn fallback_on_error(
    result: Result<String, crate::error::LlmError>,
    address: &Address,
    stage: &str,
) -> String {
    match result {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!(%address, stage, %error, "analysis generation failed");
            ANALYSIS_FALLBACK.to_string()
        }
    }
}

fn overview_prompt(address: &Address, reputation: Option<&AddressReputation>) -> String {
    let mut prompt = format!(
        "Summarize the on-chain activity of the BSC wallet {address} in two or three sentences."
    );
    if let Some(reputation) = reputation {
        prompt.push_str(&format!(
            " Known facts: {} transactions, flagged: {}.",
            reputation.transaction_count, reputation.is_flagged
        ));
    }
    prompt
}

fn audit_prompt(address: &Address, reputation: Option<&AddressReputation>) -> String {
    let mut prompt = format!(
        "Audit the smart-contract interactions of the BSC wallet {address}: protocols used, token approvals, anything risky. Two or three sentences."
    );
    if let Some(reputation) = reputation {
        if reputation.is_flagged {
            prompt.push_str(" This address has been flagged for suspicious activity.");
        }
    }
    prompt
}
