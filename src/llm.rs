//! Conversational fallback: reply generation and transcript storage.
//!
//! The LLM is only consulted when the lexical classifier produces no
//! intent. It never executes anything; its output is plain assistant text.

use async_trait::async_trait;

use crate::error::LlmError;
use crate::model::ConversationTurn;

/// Persona and guardrails handed to reply-generator backends.
pub const SYSTEM_PROMPT: &str = "You are ChainMate, a friendly crypto wallet assistant on BNB Smart Chain. \
You help users send BNB and tokens, swap tokens, schedule payments, set up conditional transfers, \
manage contacts and teams, check balances, and review address reputation. \
Keep replies short and conversational. Never invent transaction results, balances, or addresses. \
When the user seems to want a transaction, ask for the missing details (recipient, amount, token) \
instead of guessing.";

/// Canned reply when the generator itself fails. The turn still completes.
pub const FALLBACK_REPLY: &str =
    "I'm having trouble processing that request. Could you please rephrase?";

const SUGGESTIONS: &[&str] = &[
    "Send 10 BNB to 0x...",
    "Show my transaction history",
    "Schedule payment for tomorrow",
    "Check my balance",
    "Add a new contact",
];

/// Starter chips surfaced alongside assistant replies.
pub fn suggestions() -> Vec<&'static str> {
    SUGGESTIONS.iter().take(3).copied().collect()
}

/// Free-form reply backend. `turns` is recent context, oldest first; the
/// current utterance is passed separately and is not yet in `turns`.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(
        &self,
        turns: &[ConversationTurn],
        utterance: &str,
    ) -> Result<String, LlmError>;
}

/// Append-only transcript storage.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn append(&self, turn: ConversationTurn);

    /// The most recent `limit` turns, oldest first.
    async fn recent(&self, limit: usize) -> Vec<ConversationTurn>;

    /// Drop every stored turn. Transaction history is unaffected.
    async fn clear(&self);
}

/// Process-local transcript, suitable for single-session hosts and tests.
#[derive(Debug, Default)]
pub struct InMemoryTranscript {
    turns: tokio::sync::Mutex<Vec<ConversationTurn>>,
}

#[async_trait]
impl TranscriptStore for InMemoryTranscript {
    async fn append(&self, turn: ConversationTurn) {
        self.turns.lock().await.push(turn);
    }

    async fn recent(&self, limit: usize) -> Vec<ConversationTurn> {
        let turns = self.turns.lock().await;
        let start = turns.len().saturating_sub(limit);
        turns[start..].to_vec()
    }

    async fn clear(&self) {
        self.turns.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn three_suggestion_chips() {
        let chips = suggestions();
        assert_eq!(chips.len(), 3);
        assert_eq!(chips[0], "Send 10 BNB to 0x...");
    }

    #[tokio::test]
    async fn recent_returns_tail_oldest_first() {
        let store = InMemoryTranscript::default();
        for i in 0..5 {
            store.append(ConversationTurn::user(format!("msg {i}"))).await;
        }
        let tail = store.recent(2).await;
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].content, "msg 3");
        assert_eq!(tail[1].content, "msg 4");
    }

    #[tokio::test]
    async fn clear_empties_the_transcript() {
        let store = InMemoryTranscript::default();
        store.append(ConversationTurn::user("hi")).await;
        store.clear().await;
        assert!(store.recent(10).await.is_empty());
    }
}
