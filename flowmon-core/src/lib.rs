/*!
# Flow throughput sampler

Periodically samples the cumulative per-flow counters of a simulated
network and derives, for every flow, its instantaneous and average
throughput in Mbps, plus an aggregate over all the flows.

The [`PeriodicSampler`] is a [`Timer`]: register it with a
[`Scheduler`] at its start time and it fires every period until the
stop time, reading a [`FlowStatsSource`] and writing to an
[`OutputSink`].

```
# use flowmon_core::{
#     flow::{FlowId, FlowSample},
#     sampler::PeriodicSampler,
#     scheduler::Scheduler,
#     sink::MemorySink,
#     source::FlowTrace,
#     time::SimTime,
# };
# use std::time::Duration;
let mut trace = FlowTrace::new();
trace.record(
    SimTime::from_secs(2),
    FlowId::new(1),
    FlowSample {
        rx_bytes: 131_072,
        time_first_tx: SimTime::from_secs(1),
        time_last_rx: SimTime::from_secs(2),
        lost_packets: 0,
    },
);

let mut sampler = PeriodicSampler::new(trace, MemorySink::new(), Duration::from_millis(500));
let mut scheduler = Scheduler::new(SimTime::from_secs(3));
scheduler.schedule(SimTime::from_secs(2), &mut sampler).unwrap();
scheduler.run();
# drop(scheduler);

let sink = sampler.into_sink();
assert_eq!(sink.aggregate().len(), 3); // 2.0, 2.5 and 3.0
assert_eq!(sink.aggregate()[0].to_string(), "2.0\t0.5\t1.0\t1");
```
*/

pub mod config;
pub mod defaults;
pub mod flow;
pub mod format;
pub mod measure;
pub mod report;
pub mod sampler;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod state;
pub mod time;

pub use self::{
    config::{ConfigError, SamplerConfig},
    flow::{FlowId, FlowSample},
    measure::{Activity, Measurement, Throughput, ThroughputCalculator},
    report::LossReport,
    sampler::{PeriodicSampler, TickError, TickReport},
    scheduler::{Reschedule, RunSummary, Scheduler, StopSignal, Timer},
    sink::{AggregateSample, FileSink, FlowRecord, MemorySink, OutputSink, SinkError},
    source::{FlowStatsSource, FlowTrace, SampleError, Snapshot, SourceError},
    state::{FlowState, FlowStateTable},
    time::SimTime,
};
