use super::{AggregateSample, FlowRecord, OutputSink, SinkError};
use crate::flow::FlowId;
use std::collections::BTreeMap;

/// Keeps every series in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    flows: BTreeMap<FlowId, Vec<FlowRecord>>,
    aggregate: Vec<AggregateSample>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// the series of `flow`, empty if nothing was written for it
    pub fn flow(&self, flow: FlowId) -> &[FlowRecord] {
        self.flows.get(&flow).map(Vec::as_slice).unwrap_or_default()
    }

    /// the flows with at least one record, in increasing order
    pub fn flow_ids(&self) -> impl Iterator<Item = FlowId> + '_ {
        self.flows.keys().copied()
    }

    pub fn aggregate(&self) -> &[AggregateSample] {
        &self.aggregate
    }
}

impl OutputSink for MemorySink {
    fn write_flow(&mut self, flow: FlowId, record: &FlowRecord) -> Result<(), SinkError> {
        self.flows.entry(flow).or_default().push(*record);
        Ok(())
    }

    fn write_aggregate(&mut self, sample: &AggregateSample) -> Result<(), SinkError> {
        self.aggregate.push(*sample);
        Ok(())
    }
}
