use crate::format::Decimal;
use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
    time::Duration,
};

/// Number of bits in a megabit, as used for the reported rates.
pub const BITS_PER_MEGABIT: f64 = 1_024.0 * 1_024.0;

/// A data rate in megabits per second of simulation time.
///
/// A megabit is `1_024 * 1_024` bits, so `131_072` bytes over one
/// second is exactly `1` megabit per second.
///
/// ```
/// # use flowmon_core::measure::Throughput;
/// # use std::time::Duration;
/// let rate = Throughput::over(131_072, Duration::from_secs(1)).unwrap();
/// assert_eq!(rate.as_mbps(), 1.0);
/// assert_eq!(rate.to_string(), "1.0Mbps");
///
/// // no elapsed time: there is no rate to speak of
/// assert!(Throughput::over(131_072, Duration::ZERO).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Throughput(f64);

impl Throughput {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub const fn from_mbps(mbps: f64) -> Self {
        Self(mbps)
    }

    /// the rate of receiving `bytes` during `elapsed`
    ///
    /// returns `None` if `elapsed` is zero.
    pub fn over(bytes: u64, elapsed: Duration) -> Option<Self> {
        if elapsed.is_zero() {
            return None;
        }

        let bits = bytes as f64 * 8.0;
        Some(Self(bits / elapsed.as_secs_f64() / BITS_PER_MEGABIT))
    }

    #[inline]
    pub const fn as_mbps(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl Add for Throughput {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Throughput {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Throughput {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Mbps", Decimal(self.0))
    }
}
