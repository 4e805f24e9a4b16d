//! Recipient lock model for editing already-sent posts.
//!
//! # Responsibility
//! - Snapshot the original audience once per edit session.
//! - Let the audience grow while refusing to drop original invitees.
//!
//! # Invariants
//! - `locked` never changes after construction.
//! - `locked ∩ mutable = ∅`.
//! - New posts carry no locked set; their whole audience is mutable.

use std::collections::BTreeSet;

/// Locked/mutable recipient split for one post audience.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipientLock {
    /// Original invitees in persisted order; `None` for a new post.
    locked: Option<Vec<String>>,
    locked_index: BTreeSet<String>,
    /// Added this session, in insertion order.
    mutable: Vec<String>,
}

impl RecipientLock {
    /// Audience for a brand-new post: nothing locked.
    pub fn for_new_post() -> Self {
        Self::default()
    }

    /// Audience for editing a sent post.
    ///
    /// Duplicate and blank persisted entries are collapsed; order of first
    /// occurrence is kept.
    pub fn for_edit<S: AsRef<str>>(persisted_recipients: &[S]) -> Self {
        let mut locked = Vec::with_capacity(persisted_recipients.len());
        let mut locked_index = BTreeSet::new();
        for recipient in persisted_recipients {
            let recipient = recipient.as_ref();
            if recipient.trim().is_empty() {
                continue;
            }
            if locked_index.insert(recipient.to_string()) {
                locked.push(recipient.to_string());
            }
        }

        Self {
            locked: Some(locked),
            locked_index,
            mutable: Vec::new(),
        }
    }

    /// Whether this audience came from an existing post.
    pub fn is_edit(&self) -> bool {
        self.locked.is_some()
    }

    /// Flips a recipient in the mutable set.
    ///
    /// Locked and blank recipients are a defined no-op; returns whether the
    /// audience changed.
    pub fn toggle_recipient(&mut self, recipient: &str) -> bool {
        if recipient.trim().is_empty() || self.locked_index.contains(recipient) {
            return false;
        }
        match self.mutable.iter().position(|value| value == recipient) {
            Some(position) => {
                self.mutable.remove(position);
            }
            None => self.mutable.push(recipient.to_string()),
        }
        true
    }

    pub fn is_locked(&self, recipient: &str) -> bool {
        self.locked_index.contains(recipient)
    }

    pub fn contains(&self, recipient: &str) -> bool {
        self.is_locked(recipient) || self.mutable.iter().any(|value| value == recipient)
    }

    /// Original invitees, or `None` for a new post.
    pub fn locked_recipients(&self) -> Option<&[String]> {
        self.locked.as_deref()
    }

    pub fn mutable_recipients(&self) -> &[String] {
        &self.mutable
    }

    /// Locked entries verbatim, then mutable additions.
    pub fn effective_recipients(&self) -> Vec<String> {
        let mut recipients = self.locked.clone().unwrap_or_default();
        recipients.extend(self.mutable.iter().cloned());
        recipients
    }
}
