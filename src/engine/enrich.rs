//! Pre-execution enrichment: advisory risk checks and swap quotes.
//!
//! Both lookups run before the user sees a confirmation prompt, but they
//! fail differently: reputation is advisory and degrades to no warning
//! block, while a missing quote makes a swap confirmation meaningless and
//! aborts the attempt.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::EnrichError;
use crate::model::{Address, AddressReputation, RiskAssessment, RiskLevel, SwapQuote, Token};

/// Address-reputation collaborator.
#[async_trait]
pub trait ReputationOracle: Send + Sync {
    async fn reputation(&self, address: &Address) -> Result<AddressReputation, EnrichError>;
}

/// Swap-quote collaborator.
#[async_trait]
pub trait SwapQuoter: Send + Sync {
    async fn quote(
        &self,
        from_token: Token,
        to_token: Token,
        amount: Decimal,
    ) -> Result<SwapQuote, EnrichError>;
}

/// Derive the advisory risk tier from raw reputation facts: flagged is
/// high, a long history is low, everything else medium.
pub fn assess(reputation: &AddressReputation) -> RiskAssessment {
    let mut warnings = Vec::new();
    if reputation.is_flagged {
        warnings.push("This address has been flagged for suspicious activity.".to_string());
    }
    if reputation.transaction_count == 0 {
        warnings.push("This address has no transaction history.".to_string());
    }

    let risk_level = if reputation.is_flagged {
        RiskLevel::High
    } else if reputation.transaction_count > 100 {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    };

    RiskAssessment {
        risk_level,
        warnings,
    }
}

/// Warning block prepended to transfer confirmation prompts. `None` when
/// there is nothing to warn about, including when the lookup itself
/// failed: the check is advisory, not authorizing.
pub async fn risk_warning_block(
    oracle: &dyn ReputationOracle,
    recipient: &Address,
) -> Option<String> {
    let reputation = match oracle.reputation(recipient).await {
        Ok(reputation) => reputation,
        Err(error) => {
            tracing::warn!(%recipient, %error, "reputation lookup failed; proceeding without warning block");
            return None;
        }
    };

    let assessment = assess(&reputation);
    if !reputation.is_flagged && assessment.warnings.is_empty() {
        return None;
    }

    let mut block = format!("⚠️ Recipient risk: {}\n", assessment.risk_level.as_str());
    for warning in &assessment.warnings {
        block.push_str("- ");
        block.push_str(warning);
        block.push('\n');
    }
    Some(block)
}

/// Fetch a quote and render the confirmation-prompt block. Failure is
/// fatal to the current swap attempt.
pub async fn swap_quote_block(
    quoter: &dyn SwapQuoter,
    from_token: Token,
    to_token: Token,
    amount: Decimal,
) -> Result<(SwapQuote, String), EnrichError> {
    let quote = quoter.quote(from_token, to_token, amount).await?;
    let hops = quote.hops();
    let block = format!(
        "Quoted output: {} {}\nRoute: {} hop{}",
        quote.amount_out.normalize(),
        to_token,
        hops,
        if hops == 1 { "" } else { "s" },
    );
    Ok((quote, block))
}
