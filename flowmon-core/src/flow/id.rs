use anyhow::anyhow;
use std::{fmt, str};

/// The identifier of a unidirectional flow, as assigned by the
/// simulated network's classifier.
///
/// Identifiers are stable for the lifetime of a simulation. Nothing is
/// assumed about their range or density: they are only ever used as keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
pub struct FlowId(u64);

impl FlowId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for FlowId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl str::FromStr for FlowId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|error| anyhow!("Invalid flow id `{s}': {error}"))
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
