use serde::Serialize;

use crate::types::{LinkTag, RingId, RingMessage};

/// Lifecycle events emitted by ledger transactions.
///
/// A single transaction may emit more than one (a filling deposit emits
/// `Deposit` then `Ready`; a final withdrawal emits `Withdraw` then `Dead`).
/// Serialized for logs and reports only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MixerEvent {
    /// A key joined `ring_id` at zero-based `position`
    Deposit { ring_id: RingId, position: usize },
    /// The ring is full and accepts withdrawals signed over `message`
    Ready { ring_id: RingId, message: RingMessage },
    /// A member withdrew; `tag` is now spent on this ring
    Withdraw { ring_id: RingId, tag: LinkTag },
    /// Every slot has been withdrawn
    Dead { ring_id: RingId },
    /// Control transaction that skipped the ring protocol
    Benchmark { value: u64 },
}

impl MixerEvent {
    pub fn ring_id(&self) -> Option<RingId> {
        match self {
            MixerEvent::Deposit { ring_id, .. }
            | MixerEvent::Ready { ring_id, .. }
            | MixerEvent::Withdraw { ring_id, .. }
            | MixerEvent::Dead { ring_id } => Some(*ring_id),
            MixerEvent::Benchmark { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MixerEvent::Deposit { .. } => "Deposit",
            MixerEvent::Ready { .. } => "Ready",
            MixerEvent::Withdraw { .. } => "Withdraw",
            MixerEvent::Dead { .. } => "Dead",
            MixerEvent::Benchmark { .. } => "Benchmark",
        }
    }
}
