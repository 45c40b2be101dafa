//! Where the cumulative flow counters come from.
//!
//! The simulated network maintains the counters; the sampler only reads
//! them through [`FlowStatsSource::snapshot`].

mod trace;

use crate::{
    flow::{FlowId, FlowSample},
    time::SimTime,
};
use std::collections::{BTreeMap, btree_map};
use thiserror::Error;

pub use self::trace::{FlowTrace, TraceError};

/// Read-only access to the per-flow statistics of the simulated network.
///
/// Querying twice at the same time must return the same snapshot, and
/// `rx_bytes` and `lost_packets` must never decrease from one snapshot to
/// the next.
pub trait FlowStatsSource {
    /// the statistics of every active flow at `now`
    fn snapshot(&self, now: SimTime) -> Result<Snapshot, SourceError>;
}

impl<S: FlowStatsSource + ?Sized> FlowStatsSource for &S {
    fn snapshot(&self, now: SimTime) -> Result<Snapshot, SourceError> {
        (**self).snapshot(now)
    }
}

/// The whole source could not be read.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Flow statistics are not available: {reason}")]
    Unavailable { reason: String },
}

/// The statistics of a single flow could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Flow ({flow}) statistics are unreadable: {reason}")]
pub struct SampleError {
    pub flow: FlowId,
    pub reason: String,
}

/// A point-in-time view of every active flow.
///
/// Iteration is ordered by [`FlowId`].
///
/// ```
/// # use flowmon_core::{flow::{FlowId, FlowSample}, source::Snapshot};
/// let snapshot: Snapshot = [(FlowId::new(2), FlowSample::default())]
///     .into_iter()
///     .collect();
///
/// assert_eq!(snapshot.len(), 1);
/// assert!(snapshot.get(FlowId::new(2)).unwrap().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    flows: BTreeMap<FlowId, Result<FlowSample, SampleError>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, flow: FlowId, sample: FlowSample) {
        self.flows.insert(flow, Ok(sample));
    }

    /// mark `flow` as present but unreadable in this snapshot
    pub fn insert_error(&mut self, flow: FlowId, reason: impl Into<String>) {
        let reason = reason.into();
        self.flows.insert(flow, Err(SampleError { flow, reason }));
    }

    pub fn get(&self, flow: FlowId) -> Option<&Result<FlowSample, SampleError>> {
        self.flows.get(&flow)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, FlowId, Result<FlowSample, SampleError>> {
        self.flows.iter()
    }
}

impl FromIterator<(FlowId, FlowSample)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (FlowId, FlowSample)>>(iter: I) -> Self {
        let flows = iter
            .into_iter()
            .map(|(flow, sample)| (flow, Ok(sample)))
            .collect();
        Self { flows }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a FlowId, &'a Result<FlowSample, SampleError>);
    type IntoIter = btree_map::Iter<'a, FlowId, Result<FlowSample, SampleError>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_by_flow() {
        let mut snapshot = Snapshot::new();
        for id in [9, 1, 5] {
            snapshot.insert(FlowId::new(id), FlowSample::default());
        }

        let ids: Vec<_> = snapshot.iter().map(|(id, _)| id.into_u64()).collect();
        assert_eq!(ids, vec![1, 5, 9]);
    }

    #[test]
    fn unreadable_flow() {
        let mut snapshot = Snapshot::new();
        snapshot.insert_error(FlowId::new(4), "counter overflow");

        let error = snapshot.get(FlowId::new(4)).unwrap().as_ref().unwrap_err();
        assert_eq!(error.flow, FlowId::new(4));
        assert_eq!(
            error.to_string(),
            "Flow (4) statistics are unreadable: counter overflow"
        );
    }

    #[test]
    fn empty() {
        let snapshot = Snapshot::new();
        assert!(snapshot.is_empty());
        assert!(snapshot.get(FlowId::new(1)).is_none());
    }
}
