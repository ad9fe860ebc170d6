//! The conversation engine: wires the classifier, resolver, state machine,
//! enrichment, and dispatcher behind a single [`ChatEngine::handle`] entry
//! point.

pub mod analysis;
pub mod dispatch;
pub mod enrich;
pub mod state;

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;

use crate::config::EngineConfig;
use crate::engine::analysis::WalletAnalysis;
use crate::engine::dispatch::{ChainClient, ExecutionOutcome};
use crate::engine::enrich::{ReputationOracle, SwapQuoter};
use crate::engine::state::{ConversationState, Effect, PendingIntent, StateEvent};
use crate::history::{HistoryEntry, HistorySink, record_in_background};
use crate::intent::TransactionIntent;
use crate::intent::classify;
use crate::intent::resolve::{ContactDirectory, ResolvedIntent, resolve_recipient};
use crate::llm::{self, ReplyGenerator, TranscriptStore};
use crate::model::{Address, ConversationTurn, TurnStatus};

/// Injected collaborators behind the engine's outbound calls.
#[derive(Clone)]
pub struct Collaborators {
    pub contacts: Arc<dyn ContactDirectory>,
    pub reputation: Arc<dyn ReputationOracle>,
    pub quoter: Arc<dyn SwapQuoter>,
    pub chain: Arc<dyn ChainClient>,
    pub replies: Arc<dyn ReplyGenerator>,
    pub history: Arc<dyn HistorySink>,
}

/// Everything a host needs to render one completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The user turn followed by every assistant turn produced, in order.
    pub turns: Vec<ConversationTurn>,
    /// Starter chips to surface alongside the reply.
    pub suggestions: Vec<&'static str>,
    /// Whether a confirmation is now pending.
    pub awaiting_confirmation: bool,
}

/// One engine instance per conversation. Not `Sync`: turns within a
/// conversation are strictly sequential.
pub struct ChatEngine {
    config: EngineConfig,
    collab: Collaborators,
    state: ConversationState,
    transcript: Arc<dyn TranscriptStore>,
}

impl ChatEngine {
    pub fn new(config: EngineConfig, collab: Collaborators) -> Self {
        Self::with_transcript(config, collab, Arc::new(llm::InMemoryTranscript::default()))
    }

    pub fn with_transcript(
        config: EngineConfig,
        collab: Collaborators,
        transcript: Arc<dyn TranscriptStore>,
    ) -> Self {
        Self {
            config,
            collab,
            state: ConversationState::Idle,
            transcript,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Process one user utterance to completion.
    pub async fn handle(&mut self, utterance: &str) -> TurnOutcome {
        let context = self.transcript.recent(self.config.max_context_turns).await;

        let mut turns = Vec::new();
        let user_turn = ConversationTurn::user(utterance);
        self.transcript.append(user_turn.clone()).await;
        turns.push(user_turn);

        let mut events = VecDeque::from([StateEvent::Utterance(utterance.to_string())]);
        while let Some(event) = events.pop_front() {
            let current = std::mem::take(&mut self.state);
            let transition = state::step(current, event, self.config.pending_replacement);
            self.state = transition.state;

            for effect in transition.effects {
                match effect {
                    Effect::Say(text) => {
                        self.push(&mut turns, ConversationTurn::assistant(text)).await;
                    }
                    Effect::PromptConfirmation(text) => {
                        self.push(
                            &mut turns,
                            ConversationTurn::assistant(text).needs_confirmation(),
                        )
                        .await;
                    }
                    Effect::NotifyDiscarded(intent) => {
                        self.push(
                            &mut turns,
                            ConversationTurn::assistant(format!(
                                "Discarded the pending {} transaction in favor of your new request.",
                                intent.label()
                            )),
                        )
                        .await;
                    }
                    Effect::RunPipeline(text) => {
                        if let Some(event) = self.run_pipeline(&text, &context, &mut turns).await {
                            events.push_back(event);
                        }
                    }
                    Effect::Dispatch(intent) => {
                        self.execute(&intent, &mut turns).await;
                        events.push_back(StateEvent::DispatchFinished);
                    }
                }
            }
        }

        TurnOutcome {
            awaiting_confirmation: matches!(
                self.state,
                ConversationState::AwaitingConfirmation(_)
            ),
            suggestions: llm::suggestions(),
            turns,
        }
    }

    /// Narrative analysis of an arbitrary address, outside the turn flow.
    pub async fn analyze(&self, address: &Address) -> WalletAnalysis {
        analysis::analyze_wallet(
            self.collab.replies.as_ref(),
            self.collab.reputation.as_ref(),
            address,
        )
        .await
    }

    /// Drop the stored conversation. Transaction history is unaffected.
    pub async fn clear_transcript(&mut self) {
        self.transcript.clear().await;
        self.state = ConversationState::Idle;
    }

    async fn push(&self, turns: &mut Vec<ConversationTurn>, turn: ConversationTurn) {
        self.transcript.append(turn.clone()).await;
        turns.push(turn);
    }

    /// Classify, resolve, validate, and enrich one instruction. Returns the
    /// event that pins an intent for confirmation, or `None` when the turn
    /// resolved conversationally (reply, re-prompt, or immediate read).
    async fn run_pipeline(
        &mut self,
        text: &str,
        context: &[ConversationTurn],
        turns: &mut Vec<ConversationTurn>,
    ) -> Option<StateEvent> {
        let Some(intent) = classify::classify(text, Utc::now(), self.config.classifier_defaults())
        else {
            let reply = match self.collab.replies.generate(context, text).await {
                Ok(reply) => reply,
                Err(error) => {
                    tracing::warn!(%error, "reply generation failed");
                    llm::FALLBACK_REPLY.to_string()
                }
            };
            self.push(turns, ConversationTurn::assistant(reply)).await;
            return None;
        };

        if intent.is_read_only() {
            self.execute_read_only(&intent, turns).await;
            return None;
        }

        // Contact-add carries the NEW contact's name; only transfers
        // resolve a name against the existing directory.
        let resolved = if intent.is_transfer_like() {
            match resolve_recipient(intent, self.collab.contacts.as_ref()).await {
                Ok(resolved) => resolved,
                Err(error) => {
                    tracing::warn!(%error, "contact lookup failed");
                    self.push(
                        turns,
                        ConversationTurn::assistant(
                            "I couldn't reach your contact list just now. Please try again.",
                        ),
                    )
                    .await;
                    return None;
                }
            }
        } else {
            ResolvedIntent {
                intent,
                unmatched_contact: None,
            }
        };

        if let Some(name) = resolved.unmatched_contact {
            self.push(
                turns,
                ConversationTurn::assistant(format!(
                    "I don't have a contact named {name}. Add them first, or give me their 0x address.",
                )),
            )
            .await;
            return None;
        }
        let intent = resolved.intent;

        if let Some(reprompt) = missing_details_prompt(&intent) {
            self.push(turns, ConversationTurn::assistant(reprompt)).await;
            return None;
        }

        let mut prompt = String::new();
        if intent.is_transfer_like() {
            if let Some(recipient) = intent.recipient() {
                if let Some(block) =
                    enrich::risk_warning_block(self.collab.reputation.as_ref(), recipient).await
                {
                    prompt.push_str(&block);
                }
            }
        }

        prompt.push_str("Please confirm this transaction:\n");
        prompt.push_str(&summarize(&intent));
        prompt.push('\n');

        if let TransactionIntent::Swap {
            from_token: Some(from),
            to_token: Some(to),
            amount: Some(amount),
        } = &intent
        {
            match enrich::swap_quote_block(self.collab.quoter.as_ref(), *from, *to, *amount).await
            {
                Ok((_quote, block)) => {
                    prompt.push_str(&block);
                    prompt.push('\n');
                }
                Err(error) => {
                    tracing::warn!(%error, "swap quote failed; aborting swap attempt");
                    self.push(
                        turns,
                        ConversationTurn::assistant(
                            "I couldn't get a quote for that swap right now, so I won't proceed. Please try again in a moment.",
                        ),
                    )
                    .await;
                    return None;
                }
            }
        }

        prompt.push_str("Reply with \"confirm\" to proceed or \"cancel\" to abort.");
        Some(StateEvent::IntentReady(PendingIntent::new(intent, prompt)))
    }

    /// Balance and reputation reads bypass the confirmation slot.
    async fn execute_read_only(
        &self,
        intent: &TransactionIntent,
        turns: &mut Vec<ConversationTurn>,
    ) {
        let turn = match intent {
            TransactionIntent::Balance { recipient } => {
                match self.collab.chain.balance_of(recipient.as_ref()).await {
                    Ok(balance) => {
                        let balance = balance.normalize();
                        ConversationTurn::assistant(match recipient {
                            Some(address) => format!("Balance of {address}: {balance} BNB"),
                            None => format!("Your balance: {balance} BNB"),
                        })
                    }
                    Err(error) => {
                        tracing::warn!(%error, "balance read failed");
                        ConversationTurn::assistant(
                            "I couldn't read that balance right now. Please try again.",
                        )
                        .with_status(TurnStatus::Error)
                    }
                }
            }
            TransactionIntent::Reputation { recipient } => match recipient {
                Some(address) => {
                    match self.collab.reputation.reputation(address).await {
                        Ok(reputation) => {
                            let assessment = enrich::assess(&reputation);
                            let mut report = format!(
                                "Reputation for {address}:\n- Risk level: {}\n- Transactions: {}",
                                assessment.risk_level.as_str(),
                                reputation.transaction_count,
                            );
                            for warning in &assessment.warnings {
                                report.push_str("\n- ");
                                report.push_str(warning);
                            }
                            ConversationTurn::assistant(report)
                        }
                        Err(error) => {
                            tracing::warn!(%address, %error, "reputation read failed");
                            ConversationTurn::assistant(format!(
                                "I couldn't fetch reputation data for {address} right now.",
                            ))
                            .with_status(TurnStatus::Error)
                        }
                    }
                }
                None => ConversationTurn::assistant(
                    "Which address should I check? Paste the 0x address.",
                ),
            },
            _ => return,
        };
        self.push(turns, turn).await;
    }

    /// Dispatch a confirmed intent and report the outcome.
    async fn execute(&self, intent: &TransactionIntent, turns: &mut Vec<ConversationTurn>) {
        let outcome = dispatch::dispatch(intent, self.collab.chain.as_ref()).await;
        record_in_background(
            self.collab.history.clone(),
            HistoryEntry::from_dispatch(intent, &outcome),
        );

        let turn = match &outcome {
            ExecutionOutcome::Submitted { transaction_id } => {
                ConversationTurn::assistant(format!(
                    "✅ Transaction submitted! Hash: {transaction_id}"
                ))
                .with_transaction_hash(transaction_id.clone())
                .with_status(TurnStatus::Success)
            }
            ExecutionOutcome::Failed { error } => {
                ConversationTurn::assistant(format!("❌ Transaction failed: {error}"))
                    .with_status(TurnStatus::Error)
            }
        };
        self.push(turns, turn).await;
    }
}

/// Re-prompt text for intents the classifier produced but the dispatcher
/// could not execute. `None` means the intent is complete.
fn missing_details_prompt(intent: &TransactionIntent) -> Option<String> {
    match intent {
        TransactionIntent::Contact {
            contact_name: None, ..
        } => {
            return Some("What name should I save this contact under?".to_string());
        }
        TransactionIntent::Contact {
            recipient: None, ..
        } => {
            return Some("What's their 0x address?".to_string());
        }
        _ => {}
    }
    if intent.needs_recipient() && intent.recipient().is_none() {
        return Some(
            "Who should receive it? Give me a contact name or a 0x address.".to_string(),
        );
    }
    match intent {
        TransactionIntent::Swap {
            from_token,
            to_token,
            amount,
        } if from_token.is_none() || to_token.is_none() || amount.is_none() => Some(
            "To swap, tell me the amount and the pair, for example \"swap 5 BNB for USDT\"."
                .to_string(),
        ),
        TransactionIntent::Team { team_members, .. } if team_members.is_empty() => Some(
            "A team needs member addresses. List the 0x addresses of the members.".to_string(),
        ),
        TransactionIntent::Team { team_name: None, .. } => {
            Some("What should the team be called?".to_string())
        }
        _ => None,
    }
}

/// One-line human summary of an intent for the confirmation prompt.
fn summarize(intent: &TransactionIntent) -> String {
    match intent {
        TransactionIntent::Send {
            recipient,
            amount,
            token,
            ..
        } => format!(
            "Send {} {token} to {}",
            amount.normalize(),
            recipient_display(recipient.as_ref()),
        ),
        TransactionIntent::Schedule {
            recipient,
            amount,
            token,
            memo,
            ..
        } => format!(
            "{memo}: {} {token} to {}",
            amount.normalize(),
            recipient_display(recipient.as_ref()),
        ),
        TransactionIntent::Conditional {
            recipient,
            amount,
            token,
            memo,
            ..
        } => format!(
            "{memo}: {} {token} to {}",
            amount.normalize(),
            recipient_display(recipient.as_ref()),
        ),
        TransactionIntent::Swap {
            from_token,
            to_token,
            amount,
        } => format!(
            "Swap {} {} for {}",
            amount.map(|a| a.normalize().to_string()).unwrap_or_default(),
            from_token.map(|t| t.as_str()).unwrap_or("?"),
            to_token.map(|t| t.as_str()).unwrap_or("?"),
        ),
        TransactionIntent::Team {
            team_name,
            team_members,
            required_approvals,
        } => format!(
            "Create team {} with {} member{}, {required_approvals} approval{} required",
            team_name.as_deref().unwrap_or("?"),
            team_members.len(),
            if team_members.len() == 1 { "" } else { "s" },
            if *required_approvals == 1 { "" } else { "s" },
        ),
        TransactionIntent::Contact {
            contact_name,
            recipient,
        } => format!(
            "Save contact {} -> {}",
            contact_name.as_deref().unwrap_or("?"),
            recipient_display(recipient.as_ref()),
        ),
        TransactionIntent::Faucet => "Claim test tokens from the faucet".to_string(),
        TransactionIntent::Balance { .. } | TransactionIntent::Reputation { .. } => {
            intent.label().to_string()
        }
    }
}

fn recipient_display(recipient: Option<&Address>) -> String {
    recipient.map_or_else(|| "?".to_string(), ToString::to_string)
}
