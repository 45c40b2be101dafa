use crate::{
    flow::{FlowId, FlowSample},
    time::SimTime,
};
use std::collections::{HashMap, hash_map};

/// What the sampler remembers of a flow between two ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowState {
    /// `time_last_rx` of the last processed sample
    pub prev_time: SimTime,
    /// `rx_bytes` of the last processed sample
    pub prev_rx_bytes: u64,
}

impl FlowState {
    /// The state assumed for a flow that was never sampled before:
    /// time zero and no bytes received.
    pub const BASELINE: Self = Self {
        prev_time: SimTime::ZERO,
        prev_rx_bytes: 0,
    };

    /// the state to remember once `sample` has been processed
    pub fn after(sample: &FlowSample) -> Self {
        Self {
            prev_time: sample.time_last_rx,
            prev_rx_bytes: sample.rx_bytes,
        }
    }
}

/// The previous sample of every flow seen so far, keyed by [`FlowId`].
///
/// Created when the sampler starts and only ever mutated by an executed
/// tick. Entries are never removed during a run.
#[derive(Debug, Clone, Default)]
pub struct FlowStateTable {
    flows: HashMap<FlowId, FlowState>,
}

impl FlowStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// the recorded state of `flow`, `None` if it was never sampled
    #[inline]
    pub fn get(&self, flow: FlowId) -> Option<&FlowState> {
        self.flows.get(&flow)
    }

    /// record the state of `flow`, returning the previous one if any
    pub fn commit(&mut self, flow: FlowId, state: FlowState) -> Option<FlowState> {
        self.flows.insert(flow, state)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, FlowId, FlowState> {
        self.flows.iter()
    }
}
