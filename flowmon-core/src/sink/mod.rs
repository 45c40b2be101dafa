//! Where the computed series go.
//!
//! Every flow has its own series of [`FlowRecord`] and all the flows
//! share one series of [`AggregateSample`]. Series are append only.

mod file;
mod memory;

use crate::{flow::FlowId, format::Decimal, measure::Throughput, time::SimTime};
use std::{fmt, io, path::PathBuf};
use thiserror::Error;

pub use self::{
    file::{FileSink, SeriesNaming},
    memory::MemorySink,
};

/// Destination of the sampler's output.
pub trait OutputSink {
    /// append `record` to the series of `flow`
    fn write_flow(&mut self, flow: FlowId, record: &FlowRecord) -> Result<(), SinkError>;

    /// append `sample` to the aggregate series
    fn write_aggregate(&mut self, sample: &AggregateSample) -> Result<(), SinkError>;
}

impl<O: OutputSink + ?Sized> OutputSink for &mut O {
    fn write_flow(&mut self, flow: FlowId, record: &FlowRecord) -> Result<(), SinkError> {
        (**self).write_flow(flow, record)
    }

    fn write_aggregate(&mut self, sample: &AggregateSample) -> Result<(), SinkError> {
        (**self).write_aggregate(sample)
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Cannot open series {}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot write to series {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One line of a flow's series.
///
/// ```
/// # use flowmon_core::{measure::Throughput, sink::FlowRecord, time::SimTime};
/// let record = FlowRecord {
///     time: SimTime::from_millis(2_500),
///     instantaneous: Throughput::from_mbps(1.0),
///     average: Throughput::from_mbps(0.75),
/// };
/// assert_eq!(record.to_string(), "2.5\t1.0\t0.75");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowRecord {
    pub time: SimTime,
    pub instantaneous: Throughput,
    pub average: Throughput,
}

/// One line of the aggregate series: the sums over all the flows of a
/// tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateSample {
    pub time: SimTime,
    pub sum_instantaneous: Throughput,
    pub sum_average: Throughput,
    /// number of flows that received data since the previous tick
    pub active_flows: u64,
}

impl AggregateSample {
    /// an aggregate with no flow at `time`
    pub fn empty(time: SimTime) -> Self {
        Self {
            time,
            sum_instantaneous: Throughput::ZERO,
            sum_average: Throughput::ZERO,
            active_flows: 0,
        }
    }
}

impl fmt::Display for FlowRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}",
            self.time,
            Decimal(self.instantaneous.as_mbps()),
            Decimal(self.average.as_mbps())
        )
    }
}

impl fmt::Display for AggregateSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.time,
            Decimal(self.sum_instantaneous.as_mbps()),
            Decimal(self.sum_average.as_mbps()),
            self.active_flows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_line() {
        let sample = AggregateSample {
            time: SimTime::from_secs(2),
            sum_instantaneous: Throughput::from_mbps(1.0),
            sum_average: Throughput::from_mbps(1.5),
            active_flows: 1,
        };
        assert_eq!(sample.to_string(), "2.0\t1.0\t1.5\t1");
    }

    #[test]
    fn empty_aggregate_line() {
        assert_eq!(
            AggregateSample::empty(SimTime::from_millis(500)).to_string(),
            "0.5\t0.0\t0.0\t0"
        );
    }
}
