//! Fixed-priority intent classification.
//!
//! The rules are an explicit ordered list of named predicate+constructor
//! pairs evaluated with early exit: the first match wins and later rules
//! are never consulted. The ordering is observable behavior, not an
//! implementation detail — schedule and conditional are checked before
//! plain transfers so a time- or condition-qualified instruction is never
//! downgraded to an immediate send, and a message containing several
//! trigger words deliberately resolves to the earliest rule.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::intent::TransactionIntent;
use crate::intent::extract::{
    AmountMatch, SwapPairMatch, extract_addresses, extract_amount, extract_contact_add_name,
    extract_contact_name, extract_delay_hours, extract_price_threshold, extract_required_approvals,
    extract_swap_pair, extract_team_name,
};
use crate::model::{Address, Token};

/// Token defaults applied when an utterance names an amount without a
/// symbol. Hosts derive these from [`crate::config::EngineConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierDefaults {
    /// Assumed for bare amounts in transfer-like intents.
    pub default_token: Token,
    /// Assumed for `$N` amounts with no explicit symbol.
    pub dollar_token: Token,
}

impl Default for ClassifierDefaults {
    fn default() -> Self {
        Self {
            default_token: Token::Bnb,
            dollar_token: Token::Usdt,
        }
    }
}

/// Everything the rules look at, scanned once per utterance.
struct Cues<'a> {
    original: &'a str,
    lower: String,
    addresses: Vec<Address>,
    amount: Option<AmountMatch>,
    delay_hours: Option<f64>,
    threshold: Option<(Decimal, bool)>,
    contact_name: Option<String>,
    swap_pair: Option<SwapPairMatch>,
    now: DateTime<Utc>,
    defaults: ClassifierDefaults,
}

impl<'a> Cues<'a> {
    fn scan(utterance: &'a str, now: DateTime<Utc>, defaults: ClassifierDefaults) -> Self {
        Self {
            original: utterance,
            lower: utterance.to_lowercase(),
            addresses: extract_addresses(utterance),
            amount: extract_amount(utterance, defaults.dollar_token),
            delay_hours: extract_delay_hours(utterance),
            threshold: extract_price_threshold(utterance),
            contact_name: extract_contact_name(utterance),
            swap_pair: extract_swap_pair(utterance),
            now,
            defaults,
        }
    }

    fn has(&self, keyword: &str) -> bool {
        self.lower.contains(keyword)
    }

    fn first_address(&self) -> Option<Address> {
        self.addresses.first().cloned()
    }
}

type Rule = fn(&Cues<'_>) -> Option<TransactionIntent>;

/// Priority-ordered rule table. Reordering entries changes observable
/// behavior and is a breaking change.
const RULES: &[(&str, Rule)] = &[
    ("faucet", faucet_rule),
    ("balance", balance_rule),
    ("reputation", reputation_rule),
    ("contact", contact_rule),
    ("team", team_rule),
    ("schedule", schedule_rule),
    ("conditional", conditional_rule),
    ("send", send_rule),
    ("swap", swap_rule),
];

/// Labels of the rule cascade in evaluation order, for auditing.
pub fn rule_order() -> Vec<&'static str> {
    RULES.iter().map(|(label, _)| *label).collect()
}

/// Classify an utterance into at most one intent.
///
/// `now` anchors relative-time resolution so classification is
/// reproducible. The assistant's free-text reply is deliberately not an
/// input: it is conversational context only, never authoritative for the
/// structured intent.
pub fn classify(
    utterance: &str,
    now: DateTime<Utc>,
    defaults: ClassifierDefaults,
) -> Option<TransactionIntent> {
    let cues = Cues::scan(utterance, now, defaults);
    for (label, rule) in RULES {
        if let Some(intent) = rule(&cues) {
            tracing::debug!(rule = label, "intent rule matched");
            return Some(intent);
        }
    }
    tracing::debug!("no intent rule matched; conversational turn");
    None
}

fn faucet_rule(cues: &Cues<'_>) -> Option<TransactionIntent> {
    if cues.has("faucet") || cues.has("claim") {
        return Some(TransactionIntent::Faucet);
    }
    None
}

fn balance_rule(cues: &Cues<'_>) -> Option<TransactionIntent> {
    if cues.has("balance") || cues.has("how much") {
        return Some(TransactionIntent::Balance {
            recipient: cues.first_address(),
        });
    }
    None
}

fn reputation_rule(cues: &Cues<'_>) -> Option<TransactionIntent> {
    if cues.has("reputation") || cues.has("risk") || cues.has("check address") {
        return Some(TransactionIntent::Reputation {
            recipient: cues.first_address(),
        });
    }
    None
}

fn contact_rule(cues: &Cues<'_>) -> Option<TransactionIntent> {
    let phrase = cues.has("add contact") || cues.has("save contact");
    let split = cues.has("add") && cues.has("contact");
    if phrase || split {
        return Some(TransactionIntent::Contact {
            contact_name: extract_contact_add_name(cues.original),
            recipient: cues.first_address(),
        });
    }
    None
}

fn team_rule(cues: &Cues<'_>) -> Option<TransactionIntent> {
    if cues.has("create team") || cues.has("new team") {
        let members = cues.addresses.clone();
        let required_approvals = extract_required_approvals(cues.original)
            .unwrap_or_else(|| (members.len() as u32).div_ceil(2));
        return Some(TransactionIntent::Team {
            team_name: extract_team_name(cues.original),
            team_members: members,
            required_approvals,
        });
    }
    None
}

fn schedule_rule(cues: &Cues<'_>) -> Option<TransactionIntent> {
    let keyword = cues.has("schedule") || cues.has("tomorrow") || cues.has("later");
    if !(keyword || cues.delay_hours.is_some()) {
        return None;
    }
    // A schedule without an amount is not actionable; fall through so a
    // later rule (or the conversational fallback) handles the turn.
    let amount = cues.amount?;

    let hours = cues.delay_hours.unwrap_or(24.0);
    let execute_at = cues.now.timestamp() + (hours * 3600.0).round() as i64;
    Some(TransactionIntent::Schedule {
        recipient: cues.first_address(),
        contact_name: cues.contact_name.clone(),
        amount: amount.amount,
        token: amount.token.unwrap_or(cues.defaults.default_token),
        execute_at,
        memo: format!("Scheduled transfer in {}", describe_delay(hours)),
    })
}

fn conditional_rule(cues: &Cues<'_>) -> Option<TransactionIntent> {
    let condition = cues.has("if") || cues.has("when") || cues.has("condition");
    let price = cues.has("price") || cues.has("above") || cues.has("below");
    if !(condition && price) {
        return None;
    }
    let amount = cues.amount?;

    let (price_threshold, is_above_threshold) =
        cues.threshold.unwrap_or((Decimal::ZERO, true));
    let direction = if is_above_threshold { "above" } else { "below" };
    Some(TransactionIntent::Conditional {
        recipient: cues.first_address(),
        contact_name: cues.contact_name.clone(),
        amount: amount.amount,
        token: amount.token.unwrap_or(cues.defaults.default_token),
        price_threshold,
        is_above_threshold,
        memo: format!("Conditional transfer when price is {direction} {price_threshold}"),
    })
}

fn send_rule(cues: &Cues<'_>) -> Option<TransactionIntent> {
    if !(cues.has("send") || cues.has("transfer") || cues.has("pay")) {
        return None;
    }
    let amount = cues.amount?;

    Some(TransactionIntent::Send {
        recipient: cues.first_address(),
        contact_name: cues.contact_name.clone(),
        amount: amount.amount,
        token: amount.token.unwrap_or(cues.defaults.default_token),
        memo: None,
    })
}

fn swap_rule(cues: &Cues<'_>) -> Option<TransactionIntent> {
    if !(cues.has("swap") || cues.has("exchange") || cues.has("trade")) {
        return None;
    }
    match cues.swap_pair {
        Some(pair) => Some(TransactionIntent::Swap {
            from_token: Some(pair.from_token),
            to_token: Some(pair.to_token),
            amount: pair.amount,
        }),
        // Keyword present but no pattern matched: downstream prompts for
        // the missing details.
        None => Some(TransactionIntent::Swap {
            from_token: None,
            to_token: None,
            amount: None,
        }),
    }
}

/// Delay rendered in the coarsest sensible unit.
fn describe_delay(hours: f64) -> String {
    let secs = (hours * 3600.0).round() as i64;
    if secs < 60 {
        format!("{} second{}", secs, plural(secs))
    } else if secs < 3600 {
        let minutes = (secs as f64 / 60.0).round() as i64;
        format!("{} minute{}", minutes, plural(minutes))
    } else {
        let whole_hours = (secs as f64 / 3600.0).round() as i64;
        format!("{} hour{}", whole_hours, plural(whole_hours))
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}
