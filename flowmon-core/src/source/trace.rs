use super::{FlowStatsSource, Snapshot, SourceError};
use crate::{
    flow::{FlowId, FlowSample},
    time::SimTime,
};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Number of fields of a trace line.
const FIELDS: usize = 6;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Cannot open trace file {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot read trace")]
    Read(#[from] io::Error),
    #[error("Malformed trace at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

#[derive(Debug, Clone)]
struct Record {
    at: SimTime,
    sample: Result<FlowSample, String>,
}

/// Recorded cumulative flow counters, replayed as a [`FlowStatsSource`].
///
/// Each record gives the counters of one flow as they were at a given
/// time. A snapshot at `now` returns, for every flow, its latest record at
/// or before `now`. Flows without a record yet are not active.
///
/// # Text format
///
/// One record per line, tab (or space) separated, times in decimal
/// seconds:
///
/// ```text
/// # time  flow  rx_bytes  time_first_tx  time_last_rx  lost_packets
/// 2.0     1     1000      2.0            2.008         0
/// ```
///
/// Blank lines and lines starting with `#` are ignored. A line whose
/// time or flow cannot be read is rejected. A line whose counters cannot
/// be read makes that flow unreadable in the snapshots it belongs to.
///
/// ```
/// # use flowmon_core::{flow::FlowId, source::{FlowStatsSource, FlowTrace}, time::SimTime};
/// let trace = FlowTrace::parse("\
/// 1.0\t1\t0\t1.0\t0.0\t0
/// 2.0\t1\t131072\t1.0\t2.0\t3
/// ").unwrap();
///
/// let snapshot = trace.snapshot(SimTime::from_millis(2_500)).unwrap();
/// let sample = snapshot.get(FlowId::new(1)).unwrap().as_ref().unwrap();
/// assert_eq!(sample.rx_bytes, 131_072);
/// assert_eq!(sample.lost_packets, 3);
///
/// assert!(trace.snapshot(SimTime::from_millis(500)).unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlowTrace {
    flows: BTreeMap<FlowId, Vec<Record>>,
}

impl FlowTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// record the counters of `flow` as they are at `at`
    pub fn record(&mut self, at: SimTime, flow: FlowId, sample: FlowSample) {
        self.insert(flow, Record { at, sample: Ok(sample) });
    }

    /// record that the counters of `flow` could not be read at `at`
    pub fn record_error(&mut self, at: SimTime, flow: FlowId, reason: impl Into<String>) {
        let sample = Err(reason.into());
        self.insert(flow, Record { at, sample });
    }

    fn insert(&mut self, flow: FlowId, record: Record) {
        let records = self.flows.entry(flow).or_default();
        // records at the same time: the last one recorded wins
        let index = records.partition_point(|r| r.at <= record.at);
        records.insert(index, record);
    }

    /// number of distinct flows in the trace
    pub fn flows(&self) -> usize {
        self.flows.len()
    }

    /// time of the latest record, `None` if the trace is empty
    pub fn end(&self) -> Option<SimTime> {
        self.flows
            .values()
            .filter_map(|records| records.last())
            .map(|record| record.at)
            .max()
    }

    pub fn parse(text: &str) -> Result<Self, TraceError> {
        Self::from_reader(text.as_bytes())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TraceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, TraceError> {
        let mut trace = Self::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            trace.parse_line(index + 1, &line)?;
        }

        Ok(trace)
    }

    fn parse_line(&mut self, number: usize, line: &str) -> Result<(), TraceError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let malformed = |reason: String| TraceError::Malformed {
            line: number,
            reason,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [time, flow, counters @ ..] = fields.as_slice() else {
            return Err(malformed("expecting at least a time and a flow".to_owned()));
        };
        let at = time
            .parse::<SimTime>()
            .map_err(|error| malformed(format!("invalid time `{time}': {error}")))?;
        let flow = flow
            .parse::<FlowId>()
            .map_err(|error| malformed(error.to_string()))?;

        match parse_counters(counters) {
            Ok(sample) => self.record(at, flow, sample),
            Err(reason) => self.record_error(at, flow, format!("line {number}: {reason}")),
        }

        Ok(())
    }
}

fn parse_counters(fields: &[&str]) -> Result<FlowSample, String> {
    let [rx_bytes, time_first_tx, time_last_rx, lost_packets] = fields else {
        return Err(format!(
            "expecting {FIELDS} fields, found {}",
            fields.len() + 2
        ));
    };

    let count = |name: &str, value: &str| {
        value
            .parse::<u64>()
            .map_err(|error| format!("invalid {name} `{value}': {error}"))
    };
    let time = |name: &str, value: &str| {
        value
            .parse::<f64>()
            .map_err(|error| error.to_string())
            .and_then(|secs| SimTime::try_from_secs_f64(secs).map_err(|error| error.to_string()))
            .map_err(|error| format!("invalid {name} `{value}': {error}"))
    };

    Ok(FlowSample {
        rx_bytes: count("rx_bytes", *rx_bytes)?,
        time_first_tx: time("time_first_tx", *time_first_tx)?,
        time_last_rx: time("time_last_rx", *time_last_rx)?,
        lost_packets: count("lost_packets", *lost_packets)?,
    })
}

impl FlowStatsSource for FlowTrace {
    fn snapshot(&self, now: SimTime) -> Result<Snapshot, SourceError> {
        let mut snapshot = Snapshot::new();

        for (flow, records) in &self.flows {
            let seen = records.partition_point(|r| r.at <= now);
            let Some(record) = seen.checked_sub(1).map(|index| &records[index]) else {
                continue;
            };
            match &record.sample {
                Ok(sample) => snapshot.insert(*flow, *sample),
                Err(reason) => snapshot.insert_error(*flow, reason.as_str()),
            }
        }

        Ok(snapshot)
    }
}
