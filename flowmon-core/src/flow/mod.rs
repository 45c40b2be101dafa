mod id;

use crate::time::SimTime;

pub use self::id::FlowId;

/// Cumulative statistics of one flow, as reported by the
/// [`FlowStatsSource`] at the time of a snapshot.
///
/// A sample is produced fresh on every query and never modified
/// afterwards. All the counters are cumulative since the flow started.
///
/// [`FlowStatsSource`]: crate::source::FlowStatsSource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowSample {
    /// bytes received so far
    pub rx_bytes: u64,
    /// time the first packet of the flow was transmitted
    pub time_first_tx: SimTime,
    /// time the most recent packet of the flow was received
    pub time_last_rx: SimTime,
    /// packets lost so far
    pub lost_packets: u64,
}

impl FlowSample {
    /// how long the flow has been observed: from its first transmitted
    /// packet to its last received one.
    ///
    /// `None` if no packet was received after the first transmission.
    pub fn lifetime(&self) -> Option<std::time::Duration> {
        self.time_last_rx
            .checked_duration_since(self.time_first_tx)
            .filter(|lifetime| !lifetime.is_zero())
    }
}
