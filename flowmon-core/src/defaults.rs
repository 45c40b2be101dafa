use crate::time::SimTime;
use std::time::Duration;

/// Default time of the first tick.
///
/// Leaves the traffic generators time to start before the first sample.
///
/// ```
/// # use flowmon_core::defaults::*;
/// assert_eq!(DEFAULT_START.to_string(), "2.0");
/// ```
pub const DEFAULT_START: SimTime = SimTime::from_secs(2);

/// Default interval between two ticks.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(500);

/// Default stop time of the simulation.
///
/// ```
/// # use flowmon_core::defaults::*;
/// assert_eq!(DEFAULT_STOP.to_string(), "1600.0");
/// ```
pub const DEFAULT_STOP: SimTime = SimTime::from_secs(1_600);

/// Default name of the aggregate series file.
pub const DEFAULT_AGGREGATE_FILE: &str = "throughput.dat";

/// Default prefix of a flow's series file, followed by the flow id.
///
/// See [`SeriesNaming`] for more details
///
/// [`SeriesNaming`]: crate::sink::SeriesNaming
pub const DEFAULT_FLOW_FILE_PREFIX: &str = "throughput_";

/// Default extension of a flow's series file.
pub const DEFAULT_FLOW_FILE_EXTENSION: &str = "dat";
