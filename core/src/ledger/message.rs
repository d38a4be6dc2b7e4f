//! Ring message derivation.
//!
//! The message is the statement every withdrawal signature on a ring is bound
//! to. The only contract is that it is deterministic in (ring id, ordered
//! participants) and unique per ring; the derivation itself is pluggable.

use mixer_ring::{PublicKey, RingId, RingMessage};

const MESSAGE_DOMAIN: &[u8] = b"mixer-ring-message-v1";

pub trait MessageDeriver: Send + Sync {
    fn derive(&self, ring_id: RingId, participants: &[PublicKey]) -> RingMessage;
}

/// blake3(domain || ring_id || len || participants...)
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Message;

impl MessageDeriver for Blake3Message {
    fn derive(&self, ring_id: RingId, participants: &[PublicKey]) -> RingMessage {
        let mut hasher = blake3::Hasher::new();
        hasher.update(MESSAGE_DOMAIN);
        hasher.update(&ring_id.to_le_bytes());
        hasher.update(&(participants.len() as u64).to_le_bytes());
        for key in participants {
            key.absorb(&mut hasher);
        }
        RingMessage(*hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixer_ring::Point;

    #[test]
    fn test_message_binds_id_and_order() {
        let a = Point::new(1u32, 2u32);
        let b = Point::new(3u32, 4u32);
        let deriver = Blake3Message;

        let m = deriver.derive(RingId(0), &[a.clone(), b.clone()]);
        assert_eq!(m, deriver.derive(RingId(0), &[a.clone(), b.clone()]));
        assert_ne!(m, deriver.derive(RingId(1), &[a.clone(), b.clone()]));
        assert_ne!(m, deriver.derive(RingId(0), &[b, a]));
    }
}
