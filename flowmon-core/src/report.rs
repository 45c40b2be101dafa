use crate::flow::FlowId;
use std::{collections::BTreeMap, fmt};

/// Cumulative lost packets of every flow, as of the last processed
/// sample of that flow.
///
/// Rendered as the end of run summary:
///
/// ```
/// # use flowmon_core::{flow::FlowId, report::LossReport};
/// let mut report = LossReport::new();
/// report.record(FlowId::new(2), 4);
/// report.record(FlowId::new(1), 0);
/// report.record(FlowId::new(2), 7);
///
/// assert_eq!(report.total(), 7);
/// assert_eq!(
///     report.to_string(),
///     "Lost packets count\nFlow 1: 0\nFlow 2: 7\n"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LossReport {
    flows: BTreeMap<FlowId, u64>,
}

impl LossReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// record the cumulative count of `flow`, replacing the previous one
    pub fn record(&mut self, flow: FlowId, lost_packets: u64) {
        self.flows.insert(flow, lost_packets);
    }

    pub fn get(&self, flow: FlowId) -> Option<u64> {
        self.flows.get(&flow).copied()
    }

    pub fn total(&self) -> u64 {
        self.flows.values().sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlowId, u64)> + '_ {
        self.flows.iter().map(|(flow, lost)| (*flow, *lost))
    }
}

impl fmt::Display for LossReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lost packets count")?;
        for (flow, lost) in self.iter() {
            writeln!(f, "Flow {flow}: {lost}")?;
        }
        Ok(())
    }
}
