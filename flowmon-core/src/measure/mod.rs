mod calculator;
mod throughput;

pub use self::{
    calculator::{Activity, Measurement, ThroughputCalculator},
    throughput::{BITS_PER_MEGABIT, Throughput},
};
