use std::sync::Arc;

use super::clock::Clock;
use super::engine::PacketFilter;
use crate::packet::{Packet, NO_TIMESTAMP};

/// Rejects packets timestamped more than `threshold_ms` after "now".
///
/// Packets without a timestamp are accepted.
pub struct PastFilter {
    threshold_ms: i64,
    clock: Arc<dyn Clock>,
}

impl PastFilter {
    pub fn new(threshold_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            threshold_ms: i64::try_from(threshold_ms).unwrap_or(i64::MAX),
            clock,
        }
    }

    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms as u64
    }
}

impl PacketFilter for PastFilter {
    fn accept(&self, packet: &Packet) -> bool {
        let timestamp = packet.best_timestamp();
        if timestamp == NO_TIMESTAMP {
            return true;
        }
        let age = self.clock.now_ms().saturating_sub(timestamp);
        let accepted = age >= -self.threshold_ms;
        if !accepted {
            tracing::debug!(timestamp, age_ms = age, "past: packet is from the future");
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FixedClock;
    use crate::packet::fake::*;
    use crate::sentence::TagBlock;

    fn tagged_at(ms: i64) -> Packet {
        // 13 digits, read back as milliseconds
        let mut block = TagBlock::new();
        block.insert_missing("c", &ms.to_string());
        Packet::from_text(&format!("{}{}", block.render(), POSITION_LINE))
    }

    fn filter_at(threshold_ms: u64, now_ms: i64) -> PastFilter {
        PastFilter::new(threshold_ms, Arc::new(FixedClock::new(now_ms)))
    }

    #[test]
    fn test_packets_in_the_past_pass() {
        let filter = filter_at(5_000, TIME_2013_MS + 3_600_000);
        assert!(filter.accept(&tagged_at(TIME_2013_MS)));
    }

    #[test]
    fn test_future_packets_within_threshold_pass() {
        let filter = filter_at(5_000, TIME_2013_MS - 4_000);
        assert!(filter.accept(&tagged_at(TIME_2013_MS)));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let filter = filter_at(5_000, TIME_2013_MS - 5_000);
        assert!(filter.accept(&tagged_at(TIME_2013_MS)));
    }

    #[test]
    fn test_future_packets_beyond_threshold_rejected() {
        let filter = filter_at(5_000, TIME_2013_MS - 5_001);
        assert!(!filter.accept(&tagged_at(TIME_2013_MS)));
        let filter = filter_at(5_000, TIME_2013_MS - 60_000);
        assert!(!filter.accept(&tagged_at(TIME_2013_MS)));
    }

    #[test]
    fn test_untimed_packets_pass() {
        let filter = filter_at(0, 0);
        assert!(filter.accept(&Packet::from_text(POSITION_LINE)));
        assert!(filter.accept(&Packet::from_text("garbage")));
    }

    #[test]
    fn test_huge_threshold_saturates() {
        let filter = filter_at(u64::MAX, 0);
        assert_eq!(filter.threshold_ms(), i64::MAX as u64);
        assert!(filter.accept(&tagged_at(TIME_2013_MS)));
    }
}
