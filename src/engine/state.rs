//! Conversation state machine: Idle -> AwaitingConfirmation -> Executing -> Idle.
//!
//! Transitions are pure: [`step`] maps (state, event) to the next state
//! plus an ordered list of effects for the engine to run. The ambiguous
//! "new utterance while a confirmation is pending" case is a deliberate,
//! policy-selected branch rather than silent fallthrough.

use chrono::{DateTime, Utc};

use crate::intent::TransactionIntent;

/// The single pinned intent awaiting user confirmation, together with the
/// prompt it was presented with.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingIntent {
    pub intent: TransactionIntent,
    pub prompt: String,
    /// When the slot was filled. No automatic timeout is applied here;
    /// hosts that want one can compare against this.
    pub created_at: DateTime<Utc>,
}

impl PendingIntent {
    pub fn new(intent: TransactionIntent, prompt: impl Into<String>) -> Self {
        Self {
            intent,
            prompt: prompt.into(),
            created_at: Utc::now(),
        }
    }
}

/// Conversation lifecycle state. Exactly one pending intent exists in
/// `AwaitingConfirmation`; `Executing` is transient within a turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingConfirmation(PendingIntent),
    Executing,
}

/// Behavior when a fresh instruction arrives while a confirmation is
/// pending. The source system silently replaced the pending intent; both
/// documented choices are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingReplacement {
    /// Abandon the pending intent with an explicit discard notice and
    /// process the new utterance as a fresh instruction.
    #[default]
    ReplaceWithNotice,
    /// Keep the pending intent and remind the user to confirm or cancel
    /// before issuing anything new.
    RequireExplicitCancel,
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// A new user utterance arrived.
    Utterance(String),
    /// The pipeline produced an actionable intent ready for confirmation.
    IntentReady(PendingIntent),
    /// The dispatcher finished (successfully or not) for a confirmed intent.
    DispatchFinished,
}

/// Effects the engine must run after a transition, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run classify -> resolve -> enrich on this text.
    RunPipeline(String),
    /// Hand this intent to the execution dispatcher.
    Dispatch(TransactionIntent),
    /// Emit a plain assistant turn.
    Say(String),
    /// Emit an assistant turn flagged as requiring confirmation.
    PromptConfirmation(String),
    /// The pending intent was abandoned in favor of a new instruction.
    NotifyDiscarded(TransactionIntent),
}

/// A completed transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ConversationState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(state: ConversationState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

pub const CANCELLED_MESSAGE: &str = "Transaction cancelled. How else can I help you?";
pub const STILL_PENDING_MESSAGE: &str =
    "A transaction is still awaiting your confirmation. Reply \"confirm\" to proceed or \"cancel\" to abort before asking for something new.";

/// Substring confirmation check, evaluated before the cancel check.
pub fn is_confirmation(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("confirm") || lower.contains("yes")
}

/// Substring cancellation check.
pub fn is_cancellation(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("cancel") || lower.contains("no")
}

/// Pure transition function.
pub fn step(
    state: ConversationState,
    event: StateEvent,
    replacement: PendingReplacement,
) -> Transition {
    match (state, event) {
        (ConversationState::AwaitingConfirmation(pending), StateEvent::Utterance(text)) => {
            if is_confirmation(&text) {
                tracing::debug!(intent = pending.intent.label(), "confirmation received");
                return Transition::new(
                    ConversationState::Executing,
                    vec![Effect::Dispatch(pending.intent)],
                );
            }
            if is_cancellation(&text) {
                tracing::debug!(intent = pending.intent.label(), "cancellation received");
                return Transition::new(
                    ConversationState::Idle,
                    vec![Effect::Say(CANCELLED_MESSAGE.to_string())],
                );
            }
            match replacement {
                PendingReplacement::ReplaceWithNotice => Transition::new(
                    ConversationState::Idle,
                    vec![
                        Effect::NotifyDiscarded(pending.intent),
                        Effect::RunPipeline(text),
                    ],
                ),
                PendingReplacement::RequireExplicitCancel => Transition::new(
                    ConversationState::AwaitingConfirmation(pending),
                    vec![Effect::Say(STILL_PENDING_MESSAGE.to_string())],
                ),
            }
        }
        (ConversationState::Idle, StateEvent::Utterance(text)) => {
            Transition::new(ConversationState::Idle, vec![Effect::RunPipeline(text)])
        }
        // Turns are serialized by the host; an utterance during Executing
        // has nowhere sane to go, so it is dropped.
        (ConversationState::Executing, StateEvent::Utterance(_)) => {
            Transition::new(ConversationState::Executing, vec![])
        }
        (_, StateEvent::IntentReady(pending)) => {
            let prompt = pending.prompt.clone();
            Transition::new(
                ConversationState::AwaitingConfirmation(pending),
                vec![Effect::PromptConfirmation(prompt)],
            )
        }
        (_, StateEvent::DispatchFinished) => Transition::new(ConversationState::Idle, vec![]),
    }
}
