use super::Throughput;
use crate::{flow::FlowSample, state::FlowState};

/// How a flow behaved since its previous sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// a packet was received since the previous sample
    ///
    /// The flow counts toward the aggregate's active flows even when
    /// the computed rate happens to be zero.
    Active,
    /// no packet was received since the previous sample
    Stalled,
    /// the last reception time went backward since the previous sample
    ///
    /// Only a misbehaving source can produce this.
    Regressed,
}

impl Activity {
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// The result of processing one [`FlowSample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// rate since the previous sample
    pub instantaneous: Throughput,
    /// rate over the whole observed lifetime of the flow
    pub average: Throughput,
    pub activity: Activity,
    /// the state to remember for the next sample
    pub state: FlowState,
    /// cumulative lost packets, as reported in the sample
    pub lost_packets: u64,
}

/// Converts a [`FlowSample`] and the state left by the previous sample
/// into a [`Measurement`].
///
/// The computation is pure: recording [`Measurement::state`] is up to
/// the caller.
///
/// # First sample of a flow
///
/// A flow without prior state is measured against
/// [`FlowState::BASELINE`] (time zero, no bytes). Its first
/// instantaneous rate is therefore its rate since the start of the
/// simulation, unless its last reception time is itself zero, in which
/// case it is [`Activity::Stalled`].
///
/// ```
/// # use flowmon_core::{flow::FlowSample, measure::{Activity, ThroughputCalculator}, time::SimTime};
/// let sample = FlowSample {
///     rx_bytes: 131_072,
///     time_first_tx: SimTime::from_secs(1),
///     time_last_rx: SimTime::from_secs(2),
///     lost_packets: 0,
/// };
///
/// let measurement = ThroughputCalculator.compute(&sample, None);
/// assert_eq!(measurement.activity, Activity::Active);
/// assert_eq!(measurement.instantaneous.as_mbps(), 0.5);
/// assert_eq!(measurement.average.as_mbps(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ThroughputCalculator;

impl ThroughputCalculator {
    pub fn compute(&self, sample: &FlowSample, prior: Option<&FlowState>) -> Measurement {
        let prior = prior.copied().unwrap_or(FlowState::BASELINE);

        let average = sample
            .lifetime()
            .and_then(|lifetime| Throughput::over(sample.rx_bytes, lifetime))
            .unwrap_or(Throughput::ZERO);

        let (instantaneous, activity) =
            match sample.time_last_rx.checked_duration_since(prior.prev_time) {
                None => (Throughput::ZERO, Activity::Regressed),
                Some(elapsed) if elapsed.is_zero() => (Throughput::ZERO, Activity::Stalled),
                Some(elapsed) => {
                    let bytes = sample.rx_bytes.saturating_sub(prior.prev_rx_bytes);
                    let rate = Throughput::over(bytes, elapsed).unwrap_or(Throughput::ZERO);
                    (rate, Activity::Active)
                }
            };

        Measurement {
            instantaneous,
            average,
            activity,
            state: FlowState::after(sample),
            lost_packets: sample.lost_packets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SimTime;
    use rand_chacha::ChaChaRng;
    use rand_core::{Rng, SeedableRng as _};

    fn sample(rx_bytes: u64, first_tx_ms: u64, last_rx_ms: u64) -> FlowSample {
        FlowSample {
            rx_bytes,
            time_first_tx: SimTime::from_millis(first_tx_ms),
            time_last_rx: SimTime::from_millis(last_rx_ms),
            lost_packets: 0,
        }
    }

    fn state(prev_time_ms: u64, prev_rx_bytes: u64) -> FlowState {
        FlowState {
            prev_time: SimTime::from_millis(prev_time_ms),
            prev_rx_bytes,
        }
    }

    #[test]
    fn one_megabit_over_one_second() {
        let prior = state(1_000, 0);
        let measurement = ThroughputCalculator.compute(&sample(131_072, 1_000, 2_000), Some(&prior));

        assert_eq!(measurement.activity, Activity::Active);
        assert!((measurement.instantaneous.as_mbps() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stalled_flow() {
        let prior = state(2_000, 131_072);
        let measurement = ThroughputCalculator.compute(&sample(131_072, 1_000, 2_000), Some(&prior));

        assert_eq!(measurement.activity, Activity::Stalled);
        assert_eq!(measurement.instantaneous, Throughput::ZERO);
        // the lifetime average is still reported
        assert_eq!(measurement.average.as_mbps(), 1.0);
    }

    #[test]
    fn active_with_no_new_bytes() {
        // a packet was received (time moved) but carried no payload bytes:
        // still counted as active
        let prior = state(1_000, 500);
        let measurement = ThroughputCalculator.compute(&sample(500, 0, 1_500), Some(&prior));

        assert_eq!(measurement.activity, Activity::Active);
        assert!(measurement.instantaneous.is_zero());
    }

    #[test]
    fn first_sample_uses_baseline() {
        let measurement = ThroughputCalculator.compute(&sample(262_144, 1_000, 2_000), None);

        assert_eq!(measurement.activity, Activity::Active);
        // 262_144 bytes since time zero, over 2 seconds
        assert_eq!(measurement.instantaneous.as_mbps(), 1.0);
        assert_eq!(measurement.average.as_mbps(), 2.0);
    }

    #[test]
    fn first_sample_without_reception_is_stalled() {
        let measurement = ThroughputCalculator.compute(&sample(0, 2_000, 0), None);

        assert_eq!(measurement.activity, Activity::Stalled);
        assert_eq!(measurement.instantaneous, Throughput::ZERO);
        assert_eq!(measurement.average, Throughput::ZERO);
    }

    #[test]
    fn first_sample_same_as_baseline() {
        assert_eq!(
            ThroughputCalculator.compute(&sample(4_096, 500, 1_000), None),
            ThroughputCalculator.compute(&sample(4_096, 500, 1_000), Some(&FlowState::BASELINE)),
        );
    }

    #[test]
    fn average_without_lifetime_is_zero() {
        let measurement = ThroughputCalculator.compute(&sample(1_000, 2_000, 2_000), None);

        assert_eq!(measurement.average, Throughput::ZERO);
        assert!(measurement.average.as_mbps().is_finite());
    }

    #[test]
    fn regressed_flow() {
        let prior = state(3_000, 10_000);
        let measurement = ThroughputCalculator.compute(&sample(5_000, 1_000, 2_000), Some(&prior));

        assert_eq!(measurement.activity, Activity::Regressed);
        assert!(!measurement.activity.is_active());
        assert_eq!(measurement.instantaneous, Throughput::ZERO);
        assert_eq!(measurement.state, state(2_000, 5_000));
    }

    #[test]
    fn state_always_advances() {
        let prior = state(2_000, 100);
        for sample in [sample(100, 0, 2_000), sample(200, 0, 2_500)] {
            let measurement = ThroughputCalculator.compute(&sample, Some(&prior));
            assert_eq!(measurement.state, FlowState::after(&sample));
        }
    }

    #[test]
    fn lost_packets_are_cumulative() {
        let mut sample = sample(100, 0, 2_000);
        sample.lost_packets = 12;
        let prior = FlowState::after(&sample);

        let measurement = ThroughputCalculator.compute(&sample, Some(&prior));
        assert_eq!(measurement.lost_packets, 12);
    }

    #[test]
    fn average_is_monotonic_in_bytes() {
        let mut rng = ChaChaRng::seed_from_u64(42);

        for _ in 0..1_000 {
            let first_tx = rng.next_u64() % 10_000;
            let last_rx = first_tx + 1 + rng.next_u64() % 10_000;
            let bytes = rng.next_u64() % (1 << 40);
            let more = bytes + rng.next_u64() % (1 << 20);

            let lower = ThroughputCalculator.compute(&sample(bytes, first_tx, last_rx), None);
            let upper = ThroughputCalculator.compute(&sample(more, first_tx, last_rx), None);

            assert!(
                lower.average <= upper.average,
                "{} bytes gave {} but {} bytes gave {}",
                bytes,
                lower.average,
                more,
                upper.average
            );
        }
    }
}
