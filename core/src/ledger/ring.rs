//! Ring State
//!
//! ```text
//! ┌──────┐  N-th deposit  ┌───────┐  withdraw  ┌────────────────────┐  last withdraw  ┌──────┐
//! │ Open │──────────────->│ Ready │───────────>│ PartiallyWithdrawn │────────────────>│ Dead │
//! └──────┘                └───────┘            └────────────────────┘                 └──────┘
//!    deposits only           withdrawals only (tag must be unspent)        nothing
//! ```
//!
//! Transitions only move forward. Dead rings stay in the ledger for audit.

use std::collections::HashSet;

use mixer_ring::{LinkTag, PublicKey, RingId, RingMessage, TokenId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingState {
    Open,
    Ready,
    PartiallyWithdrawn,
    Dead,
}

impl RingState {
    pub fn accepts_deposits(self) -> bool {
        matches!(self, RingState::Open)
    }

    pub fn accepts_withdrawals(self) -> bool {
        matches!(self, RingState::Ready | RingState::PartiallyWithdrawn)
    }
}

/// A capacity-limited anonymity group for one (denomination, token) pair
#[derive(Debug, Clone)]
pub struct Ring {
    id: RingId,
    denomination: u64,
    token: TokenId,
    capacity: usize,
    /// Deposit order; defines the ring the signatures are made over
    participants: Vec<PublicKey>,
    message: Option<RingMessage>,
    spent_tags: HashSet<LinkTag>,
    remaining: usize,
    state: RingState,
    deposited: u128,
    released: u128,
}

impl Ring {
    pub(crate) fn new(id: RingId, denomination: u64, token: TokenId, capacity: usize) -> Self {
        Self {
            id,
            denomination,
            token,
            capacity,
            participants: Vec::with_capacity(capacity),
            message: None,
            spent_tags: HashSet::new(),
            remaining: 0,
            state: RingState::Open,
            deposited: 0,
            released: 0,
        }
    }

    pub fn id(&self) -> RingId {
        self.id
    }

    pub fn denomination(&self) -> u64 {
        self.denomination
    }

    pub fn token(&self) -> TokenId {
        self.token
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn participants(&self) -> &[PublicKey] {
        &self.participants
    }

    pub fn message(&self) -> Option<&RingMessage> {
        self.message.as_ref()
    }

    pub fn spent_tags(&self) -> &HashSet<LinkTag> {
        &self.spent_tags
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn state(&self) -> RingState {
        self.state
    }

    /// Value credited by deposits
    pub fn deposited(&self) -> u128 {
        self.deposited
    }

    /// Value paid out by withdrawals
    pub fn released(&self) -> u128 {
        self.released
    }

    /// Value still held for this ring
    pub fn escrow(&self) -> u128 {
        self.deposited - self.released
    }

    pub fn matches(&self, denomination: u64, token: TokenId) -> bool {
        self.denomination == denomination && self.token == token
    }

    pub fn contains(&self, key: &PublicKey) -> bool {
        self.participants.iter().any(|p| p == key)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() == self.capacity
    }

    pub fn is_tag_spent(&self, tag: &LinkTag) -> bool {
        self.spent_tags.contains(tag)
    }

    // ------------------------------------------------------------------------
    // Mutations (ledger only, after validation)
    // ------------------------------------------------------------------------

    /// Append a validated participant; returns its position
    pub(crate) fn admit(&mut self, key: PublicKey, value: u64) -> usize {
        debug_assert!(self.state.accepts_deposits() && !self.is_full());
        self.participants.push(key);
        self.deposited += value as u128;
        self.participants.len() - 1
    }

    /// Seal the ring once full. The message is never recomputed.
    pub(crate) fn mark_ready(&mut self, message: RingMessage) {
        debug_assert!(self.is_full() && self.message.is_none());
        self.message = Some(message);
        self.remaining = self.capacity;
        self.state = RingState::Ready;
    }

    /// Spend `tag` and release one denomination; returns true if the ring died
    pub(crate) fn record_withdrawal(&mut self, tag: LinkTag) -> bool {
        debug_assert!(self.state.accepts_withdrawals() && self.remaining > 0);
        let fresh = self.spent_tags.insert(tag);
        debug_assert!(fresh);
        self.released += self.denomination as u128;
        self.remaining -= 1;
        self.state = if self.remaining == 0 {
            RingState::Dead
        } else {
            RingState::PartiallyWithdrawn
        };
        self.state == RingState::Dead
    }
}
