//! End-to-end conversation flows through the engine with mock backends.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use chainmate::engine::enrich::{ReputationOracle, SwapQuoter};
use chainmate::error::{DispatchError, EnrichError, HistoryError, LlmError};
use chainmate::model::{AddressReputation, Contact, SwapQuote};
use chainmate::{
    Address, ChainClient, ChatEngine, Collaborators, ConversationState, ConversationTurn,
    EngineConfig, HistoryEntry, HistorySink, InMemoryContacts, PendingReplacement, ReplyGenerator,
    Token, TurnStatus,
};

const ADDR: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb1";

struct MockOracle {
    flagged: bool,
}

#[async_trait]
impl ReputationOracle for MockOracle {
    async fn reputation(&self, _address: &Address) -> Result<AddressReputation, EnrichError> {
        Ok(AddressReputation {
            transaction_count: 500,
            is_flagged: self.flagged,
        })
    }
}

#[derive(Default)]
struct MockQuoter {
    fail: AtomicBool,
}

#[async_trait]
impl SwapQuoter for MockQuoter {
    async fn quote(
        &self,
        from_token: Token,
        to_token: Token,
        amount: Decimal,
    ) -> Result<SwapQuote, EnrichError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EnrichError::QuoteUnavailable {
                from_token: from_token.to_string(),
                to_token: to_token.to_string(),
                reason: "router timeout".to_string(),
            });
        }
        Ok(SwapQuote {
            amount_out: amount * dec!(600),
            path: vec![
                Address::parse("0x0000000000000000000000000000000000000001").unwrap(),
                Address::parse("0x0000000000000000000000000000000000000002").unwrap(),
            ],
        })
    }
}

#[derive(Default)]
struct MockChain {
    calls: Mutex<Vec<String>>,
}

impl MockChain {
    fn log(&self, call: impl Into<String>) -> Result<String, DispatchError> {
        let call = call.into();
        self.calls.lock().unwrap().push(call.clone());
        Ok(format!("0xhash-{call}"))
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn send_native(&self, to: &Address, amount: Decimal) -> Result<String, DispatchError> {
        self.log(format!("send_native:{to}:{amount}"))
    }

    async fn send_token(
        &self,
        to: &Address,
        token: Token,
        amount: Decimal,
    ) -> Result<String, DispatchError> {
        self.log(format!("send_token:{to}:{token}:{amount}"))
    }

    async fn create_scheduled_payment(
        &self,
        to: &Address,
        token: Token,
        amount: Decimal,
        execute_at: i64,
        _memo: &str,
    ) -> Result<String, DispatchError> {
        self.log(format!("schedule:{to}:{token}:{amount}:{execute_at}"))
    }

    async fn create_conditional_payment(
        &self,
        to: &Address,
        token: Token,
        amount: Decimal,
        price_threshold: Decimal,
        is_above_threshold: bool,
        _memo: &str,
    ) -> Result<String, DispatchError> {
        self.log(format!(
            "conditional:{to}:{token}:{amount}:{price_threshold}:{is_above_threshold}"
        ))
    }

    async fn create_team(
        &self,
        name: &str,
        members: &[Address],
        required_approvals: u32,
    ) -> Result<String, DispatchError> {
        self.log(format!("team:{name}:{}:{required_approvals}", members.len()))
    }

    async fn add_contact(&self, name: &str, address: &Address) -> Result<String, DispatchError> {
        self.log(format!("contact:{name}:{address}"))
    }

    async fn swap(
        &self,
        from_token: Token,
        to_token: Token,
        amount: Decimal,
    ) -> Result<String, DispatchError> {
        self.log(format!("swap:{from_token}:{to_token}:{amount}"))
    }

    async fn claim_faucet(&self) -> Result<String, DispatchError> {
        self.log("faucet")
    }

    async fn balance_of(&self, _address: Option<&Address>) -> Result<Decimal, DispatchError> {
        Ok(dec!(12.5))
    }

    async fn allowance(&self, _token: Token) -> Result<Decimal, DispatchError> {
        Ok(dec!(1000000))
    }

    async fn approve(&self, token: Token, amount: Decimal) -> Result<String, DispatchError> {
        self.log(format!("approve:{token}:{amount}"))
    }
}

struct MockReplies;

#[async_trait]
impl ReplyGenerator for MockReplies {
    async fn generate(
        &self,
        _turns: &[ConversationTurn],
        utterance: &str,
    ) -> Result<String, LlmError> {
        Ok(format!("chat: {utterance}"))
    }
}

#[derive(Default)]
struct MockHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

#[async_trait]
impl HistorySink for MockHistory {
    async fn record(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

struct Harness {
    engine: ChatEngine,
    chain: Arc<MockChain>,
    quoter: Arc<MockQuoter>,
    history: Arc<MockHistory>,
}

fn harness_with(config: EngineConfig, flagged: bool) -> Harness {
    let chain = Arc::new(MockChain::default());
    let quoter = Arc::new(MockQuoter::default());
    let history = Arc::new(MockHistory::default());
    let contacts = InMemoryContacts::new(vec![Contact {
        name: "Alice".to_string(),
        address: Address::parse(ADDR).unwrap(),
    }]);

    let collab = Collaborators {
        contacts: Arc::new(contacts),
        reputation: Arc::new(MockOracle { flagged }),
        quoter: quoter.clone(),
        chain: chain.clone(),
        replies: Arc::new(MockReplies),
        history: history.clone(),
    };

    Harness {
        engine: ChatEngine::new(config, collab),
        chain,
        quoter,
        history,
    }
}

fn harness() -> Harness {
    harness_with(EngineConfig::default(), false)
}

fn last_content(turns: &[ConversationTurn]) -> &str {
    &turns.last().unwrap().content
}

#[tokio::test]
async fn send_then_confirm_dispatches_once() {
    let mut h = harness();

    let outcome = h.engine.handle(&format!("Send 10 BNB to {ADDR}")).await;
    assert!(outcome.awaiting_confirmation);
    assert!(last_content(&outcome.turns).contains("Please confirm this transaction:"));
    assert!(last_content(&outcome.turns).contains(&format!("Send 10 BNB to {ADDR}")));
    assert!(outcome.turns.last().unwrap().requires_confirmation);
    assert!(h.chain.calls().is_empty());

    let outcome = h.engine.handle("confirm").await;
    assert!(!outcome.awaiting_confirmation);
    assert_eq!(h.engine.state(), &ConversationState::Idle);
    assert_eq!(h.chain.calls(), vec![format!("send_native:{ADDR}:10")]);

    let done = outcome.turns.last().unwrap();
    assert!(done.content.starts_with("✅"));
    assert_eq!(done.status, Some(TurnStatus::Success));
    assert!(done.transaction_hash.is_some());

    tokio::task::yield_now().await;
    let recorded = h.history.entries.lock().unwrap().clone();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].kind, "send");
    assert_eq!(recorded[0].status, TurnStatus::Success);
}

#[tokio::test]
async fn cancel_clears_pending_without_dispatch() {
    let mut h = harness();
    h.engine.handle(&format!("Send 10 BNB to {ADDR}")).await;

    let outcome = h.engine.handle("cancel").await;
    assert!(!outcome.awaiting_confirmation);
    assert!(last_content(&outcome.turns).contains("cancelled"));
    assert!(h.chain.calls().is_empty());
}

#[tokio::test]
async fn contact_name_resolves_to_saved_address() {
    let mut h = harness();

    let outcome = h.engine.handle("Send 3 BNB to Alice").await;
    assert!(outcome.awaiting_confirmation);
    assert!(last_content(&outcome.turns).contains(ADDR));

    h.engine.handle("yes").await;
    assert_eq!(h.chain.calls(), vec![format!("send_native:{ADDR}:3")]);
}

#[tokio::test]
async fn unknown_contact_reprompts_instead_of_pinning() {
    let mut h = harness();
    let outcome = h.engine.handle("Send 3 BNB to Mallory").await;
    assert!(!outcome.awaiting_confirmation);
    assert!(last_content(&outcome.turns).contains("Mallory"));
    assert!(h.chain.calls().is_empty());
}

#[tokio::test]
async fn flagged_recipient_gets_a_risk_warning_in_the_prompt() {
    let mut h = harness_with(EngineConfig::default(), true);
    let outcome = h.engine.handle(&format!("Send 1 BNB to {ADDR}")).await;
    let prompt = last_content(&outcome.turns);
    assert!(prompt.contains("Recipient risk: high"));
    assert!(prompt.contains("flagged"));
    assert!(outcome.awaiting_confirmation);
}

#[tokio::test]
async fn swap_prompt_carries_the_quote() {
    let mut h = harness();
    let outcome = h.engine.handle("swap 5 BNB for USDT").await;
    let prompt = last_content(&outcome.turns);
    assert!(outcome.awaiting_confirmation);
    assert!(prompt.contains("Quoted output: 3000 USDT"));

    h.engine.handle("confirm").await;
    assert_eq!(h.chain.calls(), vec!["swap:BNB:USDT:5".to_string()]);
}

#[tokio::test]
async fn failed_quote_aborts_the_swap_then_retry_succeeds() {
    let mut h = harness();
    h.quoter.fail.store(true, Ordering::SeqCst);

    let outcome = h.engine.handle("swap 5 BNB for USDT").await;
    assert!(!outcome.awaiting_confirmation);
    assert_eq!(h.engine.state(), &ConversationState::Idle);
    assert!(last_content(&outcome.turns).contains("quote"));

    h.quoter.fail.store(false, Ordering::SeqCst);
    let outcome = h.engine.handle("swap 5 BNB for USDT").await;
    assert!(outcome.awaiting_confirmation);
}

#[tokio::test]
async fn balance_reads_execute_without_confirmation() {
    let mut h = harness();
    let outcome = h.engine.handle("what's my balance?").await;
    assert!(!outcome.awaiting_confirmation);
    assert_eq!(last_content(&outcome.turns), "Your balance: 12.5 BNB");
    assert!(h.chain.calls().is_empty());
}

#[tokio::test]
async fn new_instruction_discards_pending_with_a_notice_by_default() {
    let mut h = harness();
    h.engine.handle(&format!("Send 10 BNB to {ADDR}")).await;

    let outcome = h.engine.handle("what's my balance?").await;
    assert!(!outcome.awaiting_confirmation);
    let contents: Vec<&str> = outcome.turns.iter().map(|t| t.content.as_str()).collect();
    assert!(contents.iter().any(|c| c.contains("Discarded the pending send")));
    assert_eq!(*contents.last().unwrap(), "Your balance: 12.5 BNB");
    assert!(h.chain.calls().is_empty());
}

#[tokio::test]
async fn require_cancel_policy_keeps_the_pending_intent() {
    let config = EngineConfig {
        pending_replacement: PendingReplacement::RequireExplicitCancel,
        ..EngineConfig::default()
    };
    let mut h = harness_with(config, false);
    h.engine.handle(&format!("Send 10 BNB to {ADDR}")).await;

    let outcome = h.engine.handle("what's my balance?").await;
    assert!(outcome.awaiting_confirmation);
    assert!(last_content(&outcome.turns).contains("still awaiting your confirmation"));

    h.engine.handle("confirm").await;
    assert_eq!(h.chain.calls(), vec![format!("send_native:{ADDR}:10")]);
}

#[tokio::test]
async fn contact_add_confirms_and_saves_without_directory_lookup() {
    let mut h = harness();

    let outcome = h.engine.handle(&format!("add contact Bob {ADDR}")).await;
    assert!(outcome.awaiting_confirmation);
    assert!(last_content(&outcome.turns).contains(&format!("Save contact Bob -> {ADDR}")));

    h.engine.handle("confirm").await;
    assert_eq!(h.chain.calls(), vec![format!("contact:Bob:{ADDR}")]);
}

#[tokio::test]
async fn contact_add_without_address_asks_for_one() {
    let mut h = harness();
    let outcome = h.engine.handle("add contact Bob").await;
    assert!(!outcome.awaiting_confirmation);
    assert!(last_content(&outcome.turns).contains("0x address"));
    assert!(h.chain.calls().is_empty());
}

#[tokio::test]
async fn faucet_claim_needs_a_confirmation_too() {
    let mut h = harness();
    let outcome = h.engine.handle("claim from the faucet").await;
    assert!(outcome.awaiting_confirmation);

    h.engine.handle("yes").await;
    assert_eq!(h.chain.calls(), vec!["faucet".to_string()]);
}

#[tokio::test]
async fn stray_yes_without_pending_goes_to_the_reply_generator() {
    let mut h = harness();
    let outcome = h.engine.handle("yes").await;
    assert!(!outcome.awaiting_confirmation);
    assert_eq!(last_content(&outcome.turns), "chat: yes");
    assert!(h.chain.calls().is_empty());
}

#[tokio::test]
async fn stray_cancel_without_pending_goes_to_the_reply_generator() {
    let mut h = harness();
    let outcome = h.engine.handle("no thanks, cancel that").await;
    assert!(!outcome.awaiting_confirmation);
    assert_eq!(h.engine.state(), &ConversationState::Idle);
    assert_eq!(last_content(&outcome.turns), "chat: no thanks, cancel that");
    assert!(h.chain.calls().is_empty());
}

#[tokio::test]
async fn conversational_turns_fall_through_to_the_llm() {
    let mut h = harness();
    let outcome = h.engine.handle("hello, what can you do?").await;
    assert_eq!(last_content(&outcome.turns), "chat: hello, what can you do?");
    assert_eq!(outcome.suggestions.len(), 3);
}
