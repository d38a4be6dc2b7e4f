//! Mixer Ring SDK
//!
//! Primitives shared between the ring ledger, the signer adapters and the
//! benchmark harness.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                          Ring                              │
//! │  participants: [pk_0, pk_1, .., pk_{N-1}]  (deposit order) │
//! │  message:      H(id, participants)         (set when full) │
//! │  spent_tags:   {tau, ..}                   (grows only)    │
//! │                                                            │
//! │  withdraw(tau, ctlist) valid iff                           │
//! │    Verify(participants, message, tau, ctlist)              │
//! │    and tau not in spent_tags                               │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod event;
pub mod serde_utils;
pub mod signature;
pub mod types;

pub use event::MixerEvent;
pub use signature::{KeySet, RingSignature, SignatureSet};
pub use types::{LinkTag, ParseError, Point, PublicKey, RingId, RingMessage, TokenId};
