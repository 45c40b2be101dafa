use crate::{
    defaults::{DEFAULT_PERIOD, DEFAULT_START, DEFAULT_STOP},
    time::SimTime,
};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("The sampling period must not be zero")]
    ZeroPeriod,
    #[error("The first tick ({start}) is after the stop time ({stop})")]
    StartAfterStop { start: SimTime, stop: SimTime },
}

/// When the sampler runs.
///
/// ```
/// # use flowmon_core::{config::SamplerConfig, time::SimTime};
/// # use std::time::Duration;
/// let config = SamplerConfig::default()
///     .set_period(Duration::from_secs(1))
///     .set_stop(SimTime::from_secs(60));
///
/// assert_eq!(config.start(), SimTime::from_secs(2));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    start: SimTime,
    period: Duration,
    stop: SimTime,
    final_sample: bool,
}

impl SamplerConfig {
    /// time of the first tick
    pub fn set_start(mut self, start: SimTime) -> Self {
        self.start = start;
        self
    }

    /// interval between two ticks
    pub fn set_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// no tick is executed after this time
    pub fn set_stop(mut self, stop: SimTime) -> Self {
        self.stop = stop;
        self
    }

    /// take one last sample at the stop time once the run is over
    pub fn set_final_sample(mut self, final_sample: bool) -> Self {
        self.final_sample = final_sample;
        self
    }

    #[inline]
    pub fn start(&self) -> SimTime {
        self.start
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[inline]
    pub fn stop(&self) -> SimTime {
        self.stop
    }

    #[inline]
    pub fn final_sample(&self) -> bool {
        self.final_sample
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.start > self.stop {
            return Err(ConfigError::StartAfterStop {
                start: self.start,
                stop: self.stop,
            });
        }
        Ok(())
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            start: DEFAULT_START,
            period: DEFAULT_PERIOD,
            stop: DEFAULT_STOP,
            final_sample: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = SamplerConfig::default();

        assert_eq!(config.period(), Duration::from_millis(500));
        assert_eq!(config.stop(), SimTime::from_secs(1_600));
        assert!(config.final_sample());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_period() {
        let config = SamplerConfig::default().set_period(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPeriod));
    }

    #[test]
    fn start_after_stop() {
        let config = SamplerConfig::default()
            .set_start(SimTime::from_secs(10))
            .set_stop(SimTime::from_secs(5));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StartAfterStop { .. })
        ));
    }

    #[test]
    fn start_at_stop() {
        let config = SamplerConfig::default()
            .set_start(SimTime::from_secs(5))
            .set_stop(SimTime::from_secs(5));
        assert_eq!(config.validate(), Ok(()));
    }
}
