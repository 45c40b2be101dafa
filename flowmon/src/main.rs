use anyhow::{Context as _, Result};
use clap::Parser;
use flowmon::Simulation;
use flowmon_core::{
    FileSink, FlowTrace, SamplerConfig, SimTime,
    defaults::{DEFAULT_START, DEFAULT_STOP},
    time::parse_duration,
};
use std::{fs, path::PathBuf, time::Duration};

/// Replay a trace of cumulative flow counters and write the throughput
/// series of every flow.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Command {
    /// the trace to replay (`time flow rx_bytes time_first_tx time_last_rx lost_packets`)
    trace: PathBuf,

    /// directory of the series files, created if missing
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// time of the first sample
    #[arg(long, default_value_t = DEFAULT_START)]
    start: SimTime,

    /// interval between two samples (e.g. `500ms`, `1s 250ms`)
    #[arg(long, default_value = "500ms", value_parser = parse_duration)]
    period: Duration,

    /// no sample is taken after this time
    #[arg(long, default_value_t = DEFAULT_STOP)]
    stop: SimTime,

    /// do not take a last sample at the stop time
    #[arg(long)]
    no_final_sample: bool,

    /// display a progress bar
    #[arg(long)]
    progress: bool,
}

impl Command {
    fn config(&self) -> SamplerConfig {
        SamplerConfig::default()
            .set_start(self.start)
            .set_period(self.period)
            .set_stop(self.stop)
            .set_final_sample(!self.no_final_sample)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cmd = Command::parse();

    let simulation = Simulation::new(cmd.config())
        .context("Invalid sampling configuration")?
        .set_progress(cmd.progress);

    let stop = simulation.stop_signal();
    ctrlc::set_handler(move || stop.toggle()).context("Failed to set interrupt handler")?;

    let trace = FlowTrace::load(&cmd.trace)
        .with_context(|| format!("Failed to load trace {}", cmd.trace.display()))?;
    fs::create_dir_all(&cmd.output_dir)
        .with_context(|| format!("Failed to create {}", cmd.output_dir.display()))?;

    let outcome = simulation.run(trace, FileSink::new(&cmd.output_dir))?;

    print!("{}", outcome.losses);

    Ok(())
}
