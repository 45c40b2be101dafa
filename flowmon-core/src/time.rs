use anyhow::{Result, anyhow, bail, ensure};
use core::fmt;
use logos::{Lexer, Logos};
use std::{ops::Add, str::FromStr, time::Duration};

/// A point on the simulation's virtual clock.
///
/// The clock starts at [`SimTime::ZERO`] and counts nanoseconds, it is
/// never related to the wall clock. Comparing two [`SimTime`] is exact,
/// which is what the sampler relies on to detect a stalled flow.
///
/// ```
/// # use flowmon_core::time::SimTime;
/// # use std::time::Duration;
/// let start = SimTime::from_secs(2);
/// let next = start + Duration::from_millis(500);
///
/// assert_eq!(next.as_secs_f64(), 2.5);
/// assert_eq!(next.to_string(), "2.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimTime(u64);

impl SimTime {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u64::MAX);

    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * 1_000_000)
    }

    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1_000_000_000)
    }

    /// build a [`SimTime`] from a decimal number of seconds.
    ///
    /// The value is rounded to the nearest nanosecond.
    ///
    /// # Errors
    ///
    /// fails if `secs` is negative, not finite or too large to fit the clock.
    pub fn try_from_secs_f64(secs: f64) -> Result<Self> {
        let duration = Duration::try_from_secs_f64(secs)
            .map_err(|error| anyhow!("Invalid simulation time {secs}: {error}"))?;
        Self::try_from_duration(duration)
    }

    fn try_from_duration(duration: Duration) -> Result<Self> {
        let nanos = u64::try_from(duration.as_nanos())
            .map_err(|_| anyhow!("Simulation time {duration:?} overflows the clock"))?;
        Ok(Self(nanos))
    }

    #[inline]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    /// time elapsed since `earlier`, `None` if `earlier` is after `self`
    #[inline]
    pub fn checked_duration_since(self, earlier: SimTime) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration::from_nanos)
    }

    /// `self + duration`, `None` if the clock would overflow
    pub fn checked_add(self, duration: Duration) -> Option<Self> {
        let nanos = u64::try_from(duration.as_nanos()).ok()?;
        self.0.checked_add(nanos).map(Self)
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    /// # Panics
    ///
    /// panics if the clock overflows, use [`SimTime::checked_add`]
    /// where that can happen.
    fn add(self, rhs: Duration) -> Self::Output {
        self.checked_add(rhs)
            .expect("overflow when adding duration to the simulation time")
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::format::Decimal(self.as_secs_f64()).fmt(f)
    }
}

/// Parses either a duration expression (`"2s"`, `"1s 500ms"`) measured
/// from the start of the simulation or a bare decimal number of seconds.
impl FromStr for SimTime {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(secs) = s.trim().parse::<f64>() {
            return Self::try_from_secs_f64(secs);
        }
        Self::try_from_duration(parse_duration(s)?)
    }
}

/// parse a duration expression such as `"500ms"`, `"0.5s"` or `"1m 30s"`.
///
/// Every number must be followed by its measure (`ns`, `us`, `ms`, `s`
/// or `m`). Consecutive terms are summed.
///
/// ```
/// # use flowmon_core::time::parse_duration;
/// # use std::time::Duration;
/// assert_eq!(parse_duration("0.5s").unwrap(), Duration::from_millis(500));
/// assert_eq!(parse_duration("1s 250ms").unwrap(), Duration::from_millis(1_250));
/// assert!(parse_duration("12").is_err());
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let mut lex = Lexer::new(s);

    let mut durations = Vec::new();

    while let Some(next) = lex.next() {
        let number: Token = next.map_err(|()| anyhow!("Failed to parse: {s}"))?;

        ensure!(
            number == Token::Value,
            "Expecting duration to starts with number. Cannot parse {s}"
        );
        let number: f64 = lex.slice().parse()?;

        let Some(Ok(measure)) = lex.next() else {
            bail!("Expecting a measure, failed to parse: {s}")
        };
        let secs = match measure {
            Token::NanoSeconds => number / 1_000_000_000.0,
            Token::MicroSeconds => number / 1_000_000.0,
            Token::MilliSeconds => number / 1_000.0,
            Token::Seconds => number,
            Token::Minutes => number * 60.0,
            Token::Value => bail!("Failed to parse `{s}', expecting a measure."),
        };
        let duration = Duration::try_from_secs_f64(secs)
            .map_err(|error| anyhow!("Failed to parse `{s}': {error}"))?;
        durations.push(duration);
    }

    ensure!(!durations.is_empty(), "Expecting a duration, got `{s}'");

    Ok(durations.into_iter().sum())
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")]
enum Token {
    #[token("ns")]
    NanoSeconds,
    #[regex("us|μs")]
    MicroSeconds,
    #[token("ms")]
    MilliSeconds,
    #[token("s")]
    Seconds,
    #[token("m")]
    Minutes,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Value,
}
