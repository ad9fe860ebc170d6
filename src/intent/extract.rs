//! Lexical extractors over raw utterance text.
//!
//! Each extractor is a pure function returning an optional match. They are
//! independent and order-insensitive relative to each other; the classifier
//! applies its own fixed precedence when several of them fire.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;

use crate::model::{Address, Token};

const ADDRESS_PATTERN: &str = r"\b0[xX][0-9a-fA-F]{40}\b";
const TOKEN_ALTERNATION: &str = "bnb|cmt|usdt|busd|wbnb|dai";
const NUMBER: &str = r"\d+(?:\.\d+)?";

fn captures<'t>(pattern: &str, text: &'t str) -> Option<regex::Captures<'t>> {
    let regex = Regex::new(pattern).ok()?;
    regex.captures(text)
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw).ok()
}

/// All hex addresses in the text, in order of appearance. Duplicates are
/// preserved: team creation counts repeated members as supplied.
pub fn extract_addresses(text: &str) -> Vec<Address> {
    let Ok(regex) = Regex::new(ADDRESS_PATTERN) else {
        return Vec::new();
    };
    regex
        .find_iter(text)
        .filter_map(|m| Address::parse(m.as_str()).ok())
        .collect()
}

/// First hex address in the text, when a single recipient is expected.
pub fn extract_address(text: &str) -> Option<Address> {
    extract_addresses(text).into_iter().next()
}

/// Blank out address substrings so their hex digits never alias an amount
/// or threshold during numeric extraction.
fn mask_addresses(text: &str) -> String {
    match Regex::new(ADDRESS_PATTERN) {
        Ok(regex) => regex
            .replace_all(text, |m: &regex::Captures<'_>| {
                " ".repeat(m.get(0).map_or(0, |g| g.as_str().len()))
            })
            .into_owned(),
        Err(_) => text.to_string(),
    }
}

/// An extracted amount with its (possibly implied) token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountMatch {
    pub amount: Decimal,
    /// `None` means no symbol appeared; the classifier applies the
    /// variant-specific default.
    pub token: Option<Token>,
}

/// Three-tier amount/token extraction.
///
/// 1. `$N SYMBOL` — explicit symbol wins over the dollar-implied default.
/// 2. `$N` — dollar amount, token implied by `dollar_token` (a stablecoin
///    in the default configuration).
/// 3. bare `N [SYMBOL]` — leftmost number, symbol attached only when it
///    immediately follows.
pub fn extract_amount(text: &str, dollar_token: Token) -> Option<AmountMatch> {
    let masked = mask_addresses(text);

    let dollar_with_symbol = format!(r"(?i)\$\s*({NUMBER})\s*({TOKEN_ALTERNATION})\b");
    if let Some(caps) = captures(&dollar_with_symbol, &masked) {
        return Some(AmountMatch {
            amount: parse_decimal(caps.get(1)?.as_str())?,
            token: Token::parse(caps.get(2)?.as_str()),
        });
    }

    let dollar_bare = format!(r"\$\s*({NUMBER})");
    if let Some(caps) = captures(&dollar_bare, &masked) {
        return Some(AmountMatch {
            amount: parse_decimal(caps.get(1)?.as_str())?,
            token: Some(dollar_token),
        });
    }

    let bare = format!(r"({NUMBER})");
    let caps = captures(&bare, &masked)?;
    let number = caps.get(1)?;
    let amount = parse_decimal(number.as_str())?;
    let trailing_symbol = format!(r"(?i)^\s*({TOKEN_ALTERNATION})\b");
    let token = captures(&trailing_symbol, &masked[number.end()..])
        .and_then(|c| Token::parse(c.get(1)?.as_str()));
    Some(AmountMatch { amount, token })
}

/// Relative-time phrase converted to fractional hours from now.
///
/// `in/after N second|minute|hour|day` scales to hours; bare "tomorrow"
/// with no numeric pattern means 24 hours.
pub fn extract_delay_hours(text: &str) -> Option<f64> {
    let pattern =
        format!(r"(?i)\b(?:in|after)\s+({NUMBER})\s*(seconds?|secs?|minutes?|mins?|hours?|hrs?|days?)\b");
    if let Some(caps) = captures(&pattern, text) {
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str().to_ascii_lowercase();
        let hours = if unit.starts_with("day") {
            value * 24.0
        } else if unit.starts_with("hour") || unit.starts_with("hr") {
            value
        } else if unit.starts_with("min") {
            value / 60.0
        } else {
            value / 3600.0
        };
        return Some(hours);
    }

    if text.to_lowercase().contains("tomorrow") {
        return Some(24.0);
    }
    None
}

/// Price threshold with direction: `true` when the trigger is
/// above/over/`>`.
pub fn extract_price_threshold(text: &str) -> Option<(Decimal, bool)> {
    let pattern = format!(r"(?i)(above|over|below|under|>|<)\s*\$?({NUMBER})");
    let caps = captures(&pattern, text)?;
    let direction = caps.get(1)?.as_str().to_ascii_lowercase();
    let threshold = parse_decimal(caps.get(2)?.as_str())?;
    let is_above = matches!(direction.as_str(), "above" | "over" | ">");
    Some((threshold, is_above))
}

/// Candidate contact name: a capitalized word after to/pay/for. Only a
/// hint — resolution happens downstream against the contact directory.
pub fn extract_contact_name(text: &str) -> Option<String> {
    let caps = captures(r"(?i:\b(?:to|pay|for)\s+)([A-Z][a-zA-Z]*)\b", text)?;
    Some(caps.get(1)?.as_str().to_string())
}

/// Contact name in an add/save-contact phrase.
pub fn extract_contact_add_name(text: &str) -> Option<String> {
    let caps = captures(
        r"(?i)\b(?:add|save)\s+(?:contact\s+)?([A-Za-z][A-Za-z0-9_]*)\b",
        text,
    )?;
    let name = caps.get(1)?.as_str();
    if name.eq_ignore_ascii_case("contact") {
        return None;
    }
    Some(name.to_string())
}

/// Team name in a create/new-team phrase.
pub fn extract_team_name(text: &str) -> Option<String> {
    let caps = captures(
        r"(?i)\b(?:create|new)\s+team\s+(?:called\s+|named\s+)?([A-Za-z][A-Za-z0-9_]*)\b",
        text,
    )?;
    let name = caps.get(1)?.as_str();
    if name.eq_ignore_ascii_case("with") {
        return None;
    }
    Some(name.to_string())
}

/// Explicit approval count, e.g. "2 approvals".
pub fn extract_required_approvals(text: &str) -> Option<u32> {
    let caps = captures(r"(?i)\b(\d+)\s+approvals?\b", text)?;
    caps.get(1)?.as_str().parse().ok()
}

/// A matched swap pair, amount optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPairMatch {
    pub amount: Option<Decimal>,
    pub from_token: Token,
    pub to_token: Token,
}

/// `swap [N] TOK to|for|into TOK`, trying the full amount-bearing pattern
/// before falling back to the pair-only form.
pub fn extract_swap_pair(text: &str) -> Option<SwapPairMatch> {
    let full = format!(
        r"(?i)\b(?:swap|exchange|trade)\s+({NUMBER})\s*({TOKEN_ALTERNATION})\s+(?:to|for|into)\s+({TOKEN_ALTERNATION})\b"
    );
    if let Some(caps) = captures(&full, text) {
        return Some(SwapPairMatch {
            amount: parse_decimal(caps.get(1)?.as_str()),
            from_token: Token::parse(caps.get(2)?.as_str())?,
            to_token: Token::parse(caps.get(3)?.as_str())?,
        });
    }

    let pair_only =
        format!(r"(?i)\b({TOKEN_ALTERNATION})\s+(?:to|for|into)\s+({TOKEN_ALTERNATION})\b");
    let caps = captures(&pair_only, text)?;
    Some(SwapPairMatch {
        amount: None,
        from_token: Token::parse(caps.get(1)?.as_str())?,
        to_token: Token::parse(caps.get(2)?.as_str())?,
    })
}
