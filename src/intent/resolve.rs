//! Contact-name resolution against an injected directory.

use async_trait::async_trait;

use crate::error::ContactError;
use crate::intent::TransactionIntent;
use crate::model::{Address, Contact};

/// Name -> address lookup collaborator.
///
/// "Not found" is `Ok(None)`; `Err` is reserved for transport failures.
/// Matching is case-insensitive exact-match on the stored name.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<Option<Address>, ContactError>;
}

/// Outcome of recipient resolution. The caller distinguishes "no name
/// given" (recipient and name both absent) from "name given but not
/// found" (`unmatched_contact` set) when re-prompting.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIntent {
    pub intent: TransactionIntent,
    pub unmatched_contact: Option<String>,
}

/// Fill an unresolved `recipient` from the intent's contact name.
///
/// Intents with a recipient already set pass through unchanged, as do
/// intents with no contact name. On a directory miss the intent is also
/// returned unchanged with the unmatched name flagged.
pub async fn resolve_recipient(
    mut intent: TransactionIntent,
    contacts: &dyn ContactDirectory,
) -> Result<ResolvedIntent, ContactError> {
    if intent.recipient().is_some() {
        return Ok(ResolvedIntent {
            intent,
            unmatched_contact: None,
        });
    }

    let Some(name) = intent.contact_name().map(str::to_string) else {
        return Ok(ResolvedIntent {
            intent,
            unmatched_contact: None,
        });
    };

    match contacts.lookup(&name).await? {
        Some(address) => {
            tracing::debug!(contact = %name, address = %address, "contact resolved");
            intent.set_recipient(address);
            Ok(ResolvedIntent {
                intent,
                unmatched_contact: None,
            })
        }
        None => {
            tracing::debug!(contact = %name, "contact not found in directory");
            Ok(ResolvedIntent {
                intent,
                unmatched_contact: Some(name),
            })
        }
    }
}

/// In-memory directory with case-insensitive exact-match semantics.
/// Suitable for hosts without external contact storage and for tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryContacts {
    contacts: Vec<Contact>,
}

impl InMemoryContacts {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }

    pub fn add(&mut self, contact: Contact) {
        self.contacts.push(contact);
    }
}

#[async_trait]
impl ContactDirectory for InMemoryContacts {
    async fn lookup(&self, name: &str) -> Result<Option<Address>, ContactError> {
        Ok(self
            .contacts
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.address.clone()))
    }
}
