use flowmon_core::{Reschedule, SamplerConfig, SimTime, Timer};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use std::time::Duration;

const TEMPLATE: &str = "{elapsed_precise} [{wide_bar}] {pos}/{len} ticks, t={msg}s";

/// Follows the sampler's ticks on a progress bar.
///
/// Scheduled at the same start time and period as the sampler, it fires
/// right after each tick.
pub struct ProgressTimer {
    bar: ProgressBar,
    period: Duration,
}

impl ProgressTimer {
    pub fn new(config: &SamplerConfig) -> Self {
        let bar = ProgressBar::new(expected_ticks(config));
        match ProgressStyle::with_template(TEMPLATE) {
            Ok(style) => bar.set_style(style),
            Err(error) => warn!("default progress style in use: {error}"),
        }
        Self::with_bar(bar, config.period())
    }

    pub fn with_bar(bar: ProgressBar, period: Duration) -> Self {
        Self { bar, period }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// leave the bar on screen, complete or not
    pub fn finish(&self, halted: bool) {
        if halted {
            self.bar.abandon_with_message("interrupted");
        } else {
            self.bar.finish();
        }
    }
}

impl Timer for ProgressTimer {
    fn fire(&mut self, now: SimTime) -> Reschedule {
        self.bar.inc(1);
        self.bar.set_message(now.to_string());
        Reschedule::After(self.period)
    }
}

/// number of ticks executed between the start and the stop time, both
/// included
pub fn expected_ticks(config: &SamplerConfig) -> u64 {
    let span = config
        .stop()
        .checked_duration_since(config.start())
        .unwrap_or_default();

    span.as_nanos()
        .checked_div(config.period().as_nanos())
        .and_then(|ticks| u64::try_from(ticks).ok())
        .map_or(0, |ticks| ticks.saturating_add(1))
}
