use super::engine::PacketFilter;
use crate::message::MAX_MESSAGE_ID;
use crate::packet::Packet;

/// Accepts packets whose decoded message id is in the allowed set.
/// Undecodable packets are rejected.
#[derive(Debug, Clone)]
pub struct MessageTypeFilter {
    allowed: [bool; MAX_MESSAGE_ID as usize + 1],
}

impl MessageTypeFilter {
    /// Ids above the highest defined message id are ignored.
    pub fn new(ids: &[u8]) -> Self {
        let mut allowed = [false; MAX_MESSAGE_ID as usize + 1];
        for &id in ids {
            if let Some(slot) = allowed.get_mut(id as usize) {
                *slot = true;
            }
        }
        Self { allowed }
    }

    pub fn allows(&self, id: u8) -> bool {
        self.allowed.get(id as usize).copied().unwrap_or(false)
    }
}

impl PacketFilter for MessageTypeFilter {
    fn accept(&self, packet: &Packet) -> bool {
        packet
            .try_decoded_message()
            .is_some_and(|m| self.allows(m.message_id()))
    }
}
