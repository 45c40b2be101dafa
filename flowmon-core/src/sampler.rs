use crate::{
    flow::FlowId,
    measure::{Activity, Measurement, ThroughputCalculator},
    report::LossReport,
    scheduler::{Reschedule, Timer},
    sink::{AggregateSample, FlowRecord, OutputSink},
    source::{FlowStatsSource, SampleError, Snapshot, SourceError},
    state::FlowStateTable,
    time::SimTime,
};
use log::{debug, warn};
use std::time::Duration;
use thiserror::Error;

/// A tick that could not be executed.
///
/// Nothing is recorded or written for such a tick.
#[derive(Debug, Error)]
pub enum TickError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Cannot tick at {now}, the last tick was at {last}")]
    Stale { now: SimTime, last: SimTime },
}

/// Everything computed during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub time: SimTime,
    /// the measurement of every readable flow, ordered by [`FlowId`]
    pub flows: Vec<(FlowId, Measurement)>,
    /// flows present in the snapshot but unreadable
    pub skipped: Vec<SampleError>,
    pub aggregate: AggregateSample,
}

impl TickReport {
    pub fn get(&self, flow: FlowId) -> Option<&Measurement> {
        self.flows
            .iter()
            .find_map(|(id, measurement)| (*id == flow).then_some(measurement))
    }
}

/// Samples the flow statistics at a fixed period and writes the derived
/// throughput series.
///
/// Registered with a [`Scheduler`] the sampler fires once at its start
/// time, then every `period` until the stop time. On every tick it
///
/// 1. reads a [`Snapshot`] from its [`FlowStatsSource`];
/// 2. measures every flow against the state left by the previous tick;
/// 3. records the new state of every measured flow;
/// 4. writes one [`FlowRecord`] per flow and one [`AggregateSample`].
///
/// Failures never stop the sampler: an unreadable flow is skipped for
/// that tick, a record that cannot be written is dropped, and a tick
/// whose snapshot cannot be read is skipped entirely. The next tick is
/// scheduled regardless.
///
/// [`Scheduler`]: crate::scheduler::Scheduler
pub struct PeriodicSampler<S, O> {
    source: S,
    sink: O,
    calculator: ThroughputCalculator,
    period: Duration,

    table: FlowStateTable,
    losses: LossReport,

    ticks: u64,
    last_tick: Option<SimTime>,
}

impl<S, O> PeriodicSampler<S, O>
where
    S: FlowStatsSource,
    O: OutputSink,
{
    pub fn new(source: S, sink: O, period: Duration) -> Self {
        Self {
            source,
            sink,
            calculator: ThroughputCalculator,
            period,
            table: FlowStateTable::new(),
            losses: LossReport::new(),
            ticks: 0,
            last_tick: None,
        }
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn table(&self) -> &FlowStateTable {
        &self.table
    }

    /// lost packets of every flow as of its last processed sample
    pub fn losses(&self) -> &LossReport {
        &self.losses
    }

    /// number of executed ticks
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// time of the last executed tick
    #[inline]
    pub fn last_tick(&self) -> Option<SimTime> {
        self.last_tick
    }

    pub fn sink(&self) -> &O {
        &self.sink
    }

    pub fn into_sink(self) -> O {
        self.sink
    }

    /// what a tick at `now` would compute, without recording any state
    /// or writing any output.
    pub fn preview(&self, now: SimTime) -> Result<TickReport, SourceError> {
        let snapshot = self.source.snapshot(now)?;
        Ok(self.measure(now, &snapshot))
    }

    /// execute a tick at `now`.
    ///
    /// # Errors
    ///
    /// [`TickError::Stale`] if `now` is not after the last executed tick,
    /// [`TickError::Source`] if the snapshot cannot be read at all.
    pub fn tick(&mut self, now: SimTime) -> Result<TickReport, TickError> {
        if let Some(last) = self.last_tick.filter(|last| *last >= now) {
            return Err(TickError::Stale { now, last });
        }

        let snapshot = self.source.snapshot(now)?;
        let report = self.measure(now, &snapshot);

        for error in &report.skipped {
            warn!("{error}, skipped at {now}");
        }

        for (flow, measurement) in &report.flows {
            let flow = *flow;
            self.table.commit(flow, measurement.state);
            self.losses.record(flow, measurement.lost_packets);

            if measurement.activity == Activity::Regressed {
                warn!("Flow ({flow}) last reception went backward at {now}");
            }

            let record = FlowRecord {
                time: now,
                instantaneous: measurement.instantaneous,
                average: measurement.average,
            };
            if let Err(error) = self.sink.write_flow(flow, &record) {
                warn!("Flow ({flow}) record at {now} dropped: {error}");
            }
        }

        if let Err(error) = self.sink.write_aggregate(&report.aggregate) {
            warn!("Aggregate record at {now} dropped: {error}");
        }

        debug!(
            "tick at {now}: {} flows ({} active, {} skipped), {} in total",
            report.flows.len(),
            report.aggregate.active_flows,
            report.skipped.len(),
            report.aggregate.sum_instantaneous,
        );

        self.ticks += 1;
        self.last_tick = Some(now);

        Ok(report)
    }

    /// take the closing sample at `stop`, unless a tick already ran at
    /// (or after) that time.
    pub fn finish(&mut self, stop: SimTime) -> Option<Result<TickReport, TickError>> {
        if self.last_tick.is_some_and(|last| last >= stop) {
            return None;
        }
        Some(self.tick(stop))
    }

    fn measure(&self, now: SimTime, snapshot: &Snapshot) -> TickReport {
        let mut flows = Vec::with_capacity(snapshot.len());
        let mut skipped = Vec::new();
        let mut aggregate = AggregateSample::empty(now);

        for (flow, sample) in snapshot {
            let sample = match sample {
                Ok(sample) => sample,
                Err(error) => {
                    skipped.push(error.clone());
                    continue;
                }
            };

            let measurement = self.calculator.compute(sample, self.table.get(*flow));

            aggregate.sum_instantaneous += measurement.instantaneous;
            aggregate.sum_average += measurement.average;
            if measurement.activity.is_active() {
                aggregate.active_flows += 1;
            }

            flows.push((*flow, measurement));
        }

        TickReport {
            time: now,
            flows,
            skipped,
            aggregate,
        }
    }
}

impl<S, O> Timer for PeriodicSampler<S, O>
where
    S: FlowStatsSource,
    O: OutputSink,
{
    fn fire(&mut self, now: SimTime) -> Reschedule {
        if let Err(error) = self.tick(now) {
            warn!("tick at {now} skipped: {error}");
        }
        Reschedule::After(self.period)
    }
}
