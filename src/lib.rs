//! ChainMate: a conversational transaction engine for BSC chat wallets.
//!
//! Free-form chat messages become typed [`intent::TransactionIntent`]
//! values through lexical extraction and a fixed-priority rule cascade.
//! Value-moving intents pass through contact resolution, pre-execution
//! enrichment (recipient risk, swap quotes), and a two-phase confirmation
//! state machine before the execution dispatcher submits them. Everything
//! that touches the outside world (contacts, chain, quotes, reputation,
//! reply generation, history) sits behind an injected trait, so hosts and
//! tests supply their own backends.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use chainmate::{ChatEngine, Collaborators, EngineConfig};
//! # async fn run(collab: Collaborators) {
//! let mut engine = ChatEngine::new(EngineConfig::default(), collab);
//! let outcome = engine.handle("Send 10 BNB to Alice").await;
//! for turn in &outcome.turns {
//!     println!("{:?}: {}", turn.role, turn.content);
//! }
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod intent;
pub mod llm;
pub mod model;

pub use config::EngineConfig;
pub use engine::{ChatEngine, Collaborators, TurnOutcome};
pub use engine::dispatch::{ChainClient, ExecutionOutcome};
pub use engine::enrich::{ReputationOracle, SwapQuoter};
pub use engine::state::{ConversationState, PendingReplacement};
pub use error::Error;
pub use history::{HistoryEntry, HistorySink};
pub use intent::TransactionIntent;
pub use intent::resolve::{ContactDirectory, InMemoryContacts};
pub use llm::{ReplyGenerator, TranscriptStore};
pub use model::{Address, ConversationTurn, Role, Token, TurnStatus};

/// Install a `tracing` subscriber honoring `RUST_LOG`, defaulting to
/// `info` for this crate. Intended for binaries and examples; libraries
/// embedding the engine should install their own.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chainmate=info"));
    fmt().with_env_filter(filter).init();
}
