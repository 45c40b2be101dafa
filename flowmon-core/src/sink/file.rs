use super::{AggregateSample, FlowRecord, OutputSink, SinkError};
use crate::{
    defaults::{DEFAULT_AGGREGATE_FILE, DEFAULT_FLOW_FILE_EXTENSION, DEFAULT_FLOW_FILE_PREFIX},
    flow::FlowId,
};
use std::{
    collections::HashMap,
    fmt,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

/// How the series files are named.
///
/// ```
/// # use flowmon_core::{flow::FlowId, sink::SeriesNaming};
/// let naming = SeriesNaming::default();
///
/// assert_eq!(naming.aggregate_file(), "throughput.dat");
/// assert_eq!(naming.flow_file(FlowId::new(3)), "throughput_3.dat");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesNaming {
    pub aggregate: String,
    pub flow_prefix: String,
    pub flow_extension: String,
}

impl SeriesNaming {
    pub fn aggregate_file(&self) -> &str {
        &self.aggregate
    }

    pub fn flow_file(&self, flow: FlowId) -> String {
        format!("{}{flow}.{}", self.flow_prefix, self.flow_extension)
    }
}

impl Default for SeriesNaming {
    fn default() -> Self {
        Self {
            aggregate: DEFAULT_AGGREGATE_FILE.to_owned(),
            flow_prefix: DEFAULT_FLOW_FILE_PREFIX.to_owned(),
            flow_extension: DEFAULT_FLOW_FILE_EXTENSION.to_owned(),
        }
    }
}

/// Writes every series to its own file in a directory.
///
/// Files are opened in append mode and created if absent, so the
/// series of successive runs follow each other in the same files. A file
/// that cannot be opened is retried on the next write.
#[derive(Debug)]
pub struct FileSink {
    dir: PathBuf,
    naming: SeriesNaming,

    flows: HashMap<FlowId, File>,
    aggregate: Option<File>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_naming(dir, SeriesNaming::default())
    }

    pub fn with_naming(dir: impl Into<PathBuf>, naming: SeriesNaming) -> Self {
        Self {
            dir: dir.into(),
            naming,
            flows: HashMap::new(),
            aggregate: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn flow_path(&self, flow: FlowId) -> PathBuf {
        self.dir.join(self.naming.flow_file(flow))
    }

    pub fn aggregate_path(&self) -> PathBuf {
        self.dir.join(self.naming.aggregate_file())
    }
}

fn open(path: &Path) -> Result<File, SinkError> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|source| SinkError::Unavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// write `line` and its line feed with a single `write_all`
fn append<W: Write>(writer: &mut W, line: impl fmt::Display) -> io::Result<()> {
    let line = format!("{line}\n");
    writer.write_all(line.as_bytes())
}

impl OutputSink for FileSink {
    fn write_flow(&mut self, flow: FlowId, record: &FlowRecord) -> Result<(), SinkError> {
        let path = self.flow_path(flow);
        let mut file = match self.flows.remove(&flow) {
            Some(file) => file,
            None => open(&path)?,
        };

        // a handle that failed to write is not kept
        append(&mut file, record).map_err(|source| SinkError::Write { path, source })?;
        self.flows.insert(flow, file);
        Ok(())
    }

    fn write_aggregate(&mut self, sample: &AggregateSample) -> Result<(), SinkError> {
        let path = self.aggregate_path();
        let mut file = match self.aggregate.take() {
            Some(file) => file,
            None => open(&path)?,
        };

        append(&mut file, sample).map_err(|source| SinkError::Write { path, source })?;
        self.aggregate = Some(file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{measure::Throughput, time::SimTime};
    use std::fs;

    /// accepts its first write whole, fails every following one
    #[derive(Default)]
    struct OneShot {
        written: Vec<u8>,
        writes: usize,
    }

    impl Write for OneShot {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            if self.writes > 1 {
                return Err(io::Error::other("device full"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn record(secs: u64, mbps: f64) -> FlowRecord {
        FlowRecord {
            time: SimTime::from_secs(secs),
            instantaneous: Throughput::from_mbps(mbps),
            average: Throughput::from_mbps(mbps),
        }
    }

    #[test]
    fn line_is_written_at_once() {
        let mut writer = OneShot::default();

        append(&mut writer, record(2, 0.5)).unwrap();

        assert_eq!(writer.writes, 1);
        assert_eq!(writer.written, b"2.0\t0.5\t0.5\n");

        // a failed write leaves no partial line behind
        assert!(append(&mut writer, record(3, 1.0)).is_err());
        assert_eq!(writer.written, b"2.0\t0.5\t0.5\n");
    }

    #[test]
    fn one_file_per_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path());

        sink.write_flow(FlowId::new(1), &record(2, 0.5)).unwrap();
        sink.write_flow(FlowId::new(12), &record(2, 1.0)).unwrap();
        sink.write_flow(FlowId::new(1), &record(3, 0.25)).unwrap();

        let flow1 = fs::read_to_string(dir.path().join("throughput_1.dat")).unwrap();
        assert_eq!(flow1, "2.0\t0.5\t0.5\n3.0\t0.25\t0.25\n");
        let flow12 = fs::read_to_string(dir.path().join("throughput_12.dat")).unwrap();
        assert_eq!(flow12, "2.0\t1.0\t1.0\n");
    }

    #[test]
    fn aggregate_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path());

        sink.write_aggregate(&AggregateSample::empty(SimTime::from_secs(2)))
            .unwrap();
        sink.write_aggregate(&AggregateSample::empty(SimTime::from_millis(2_500)))
            .unwrap();

        let aggregate = fs::read_to_string(sink.aggregate_path()).unwrap();
        assert_eq!(aggregate, "2.0\t0.0\t0.0\t0\n2.5\t0.0\t0.0\t0\n");
    }

    #[test]
    fn appends_to_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("throughput_4.dat"), "1.0\t0.0\t0.0\n").unwrap();

        let mut sink = FileSink::new(dir.path());
        sink.write_flow(FlowId::new(4), &record(2, 1.0)).unwrap();

        let content = fs::read_to_string(sink.flow_path(FlowId::new(4))).unwrap();
        assert_eq!(content, "1.0\t0.0\t0.0\n2.0\t1.0\t1.0\n");
    }

    #[test]
    fn custom_naming() {
        let dir = tempfile::tempdir().unwrap();
        let naming = SeriesNaming {
            aggregate: "all.tsv".to_owned(),
            flow_prefix: "flow-".to_owned(),
            flow_extension: "tsv".to_owned(),
        };
        let mut sink = FileSink::with_naming(dir.path(), naming);

        sink.write_flow(FlowId::new(7), &record(2, 1.0)).unwrap();
        sink.write_aggregate(&AggregateSample::empty(SimTime::from_secs(2)))
            .unwrap();

        assert!(dir.path().join("flow-7.tsv").is_file());
        assert!(dir.path().join("all.tsv").is_file());
    }

    #[test]
    fn unavailable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("missing"));

        let error = sink.write_flow(FlowId::new(1), &record(2, 1.0)).unwrap_err();
        assert!(matches!(error, SinkError::Unavailable { .. }));

        // the directory shows up: the next write succeeds
        fs::create_dir(sink.dir()).unwrap();
        sink.write_flow(FlowId::new(1), &record(3, 1.0)).unwrap();
        let content = fs::read_to_string(sink.flow_path(FlowId::new(1))).unwrap();
        assert_eq!(content, "3.0\t1.0\t1.0\n");
    }
}
