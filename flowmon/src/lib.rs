/*!
# Flow monitor

Runs a [`PeriodicSampler`] over a [`FlowStatsSource`] on the virtual
clock, from the configured start time to the stop time, and reports what
happened.

```
# use flowmon::Simulation;
# use flowmon_core::{FlowTrace, MemorySink, SamplerConfig, SimTime};
let trace = FlowTrace::parse("1.0\t1\t131072\t0.0\t1.0\t2\n").unwrap();
let config = SamplerConfig::default()
    .set_start(SimTime::from_secs(1))
    .set_stop(SimTime::from_secs(2));

let outcome = Simulation::new(config).unwrap().run(trace, MemorySink::new()).unwrap();

assert_eq!(outcome.ticks, 3); // 1.0, 1.5 and 2.0
assert_eq!(outcome.losses.total(), 2);
assert_eq!(outcome.sink.aggregate()[0].to_string(), "1.0\t1.0\t1.0\t1");
```
*/

mod progress;

use anyhow::{Context as _, Result};
use flowmon_core::{
    ConfigError, FlowStatsSource, LossReport, OutputSink, PeriodicSampler, RunSummary,
    SamplerConfig, Scheduler, StopSignal,
};
use log::{info, warn};

pub use self::progress::{ProgressTimer, expected_ticks};

// convenient re-export of `flowmon_core`
pub use flowmon_core;

/// What a [`Simulation::run`] did.
#[derive(Debug)]
pub struct RunOutcome<O> {
    pub summary: RunSummary,
    /// number of executed ticks, the closing sample included
    pub ticks: u64,
    /// a closing sample was taken after the run
    pub closing_sample: bool,
    pub losses: LossReport,
    pub sink: O,
}

impl<O> RunOutcome<O> {
    /// the run was interrupted by the [`StopSignal`]
    #[inline]
    pub fn halted(&self) -> bool {
        self.summary.halted
    }
}

/// A validated sampler configuration and the signal that interrupts its
/// runs.
pub struct Simulation {
    config: SamplerConfig,
    stop: StopSignal,
    progress: bool,
}

impl Simulation {
    pub fn new(config: SamplerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            stop: StopSignal::new(),
            progress: false,
        })
    }

    /// display a progress bar while running
    pub fn set_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// toggling this signal ends the current run after the event in
    /// progress
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn run<S, O>(&self, source: S, sink: O) -> Result<RunOutcome<O>>
    where
        S: FlowStatsSource,
        O: OutputSink,
    {
        let config = &self.config;
        let mut sampler = PeriodicSampler::new(source, sink, config.period());
        let mut progress = self.progress.then(|| ProgressTimer::new(config));

        info!(
            "sampling every {:?} from {} to {}",
            config.period(),
            config.start(),
            config.stop()
        );

        let mut scheduler = Scheduler::with_stop_signal(config.stop(), self.stop.clone());
        scheduler
            .schedule(config.start(), &mut sampler)
            .context("Failed to schedule the sampler")?;
        if let Some(progress) = progress.as_mut() {
            scheduler
                .schedule(config.start(), progress)
                .context("Failed to schedule the progress bar")?;
        }
        let summary = scheduler.run();
        drop(scheduler);

        if let Some(progress) = &progress {
            progress.finish(summary.halted);
        }

        let closing_sample = if summary.halted {
            warn!("interrupted at {}, no closing sample", summary.end);
            false
        } else if config.final_sample() {
            match sampler.finish(config.stop()) {
                Some(Ok(_)) => true,
                Some(Err(error)) => {
                    warn!("closing sample at {} skipped: {error}", config.stop());
                    false
                }
                None => false,
            }
        } else {
            false
        };

        let ticks = sampler.ticks();
        info!("{ticks} ticks executed, last one at {:?}", sampler.last_tick());

        let losses = sampler.losses().clone();
        Ok(RunOutcome {
            summary,
            ticks,
            closing_sample,
            losses,
            sink: sampler.into_sink(),
        })
    }
}
