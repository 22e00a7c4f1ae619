use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use log::{info, warn};
use crate::config::PipelineConfig;
use crate::drivers::PipelineError;
use crate::types::{RawSample, CHANNELS};
/// Trait representing something that can yield raw IMU samples on demand.
///
/// `Ok(None)` means the sequence is over. A live transport never restarts once it
/// has returned `None` or an error.
pub trait SampleSource {
    fn next_sample(&mut self) -> Result<Option<RawSample>, PipelineError>;
}
impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_sample(&mut self) -> Result<Option<RawSample>, PipelineError> {
        (**self).next_sample()
    }
}
/// Parses one transport line: six channel values, or a leading timestamp plus six.
pub fn parse_line(line: &str) -> Result<RawSample, PipelineError> {
    let malformed = |reason: String| PipelineError::MalformedLine {
        line: line.to_string(),
        reason,
    };
    let values = line
        .split(',')
        .map(|field| {
            let field = field.trim();
            field
                .parse::<f64>()
                .map_err(|_| malformed(format!("{field:?} is not a number")))
        })
        .collect::<Result<Vec<f64>, _>>()?;
    let (timestamp, readings) = match values.len() {
        n if n == CHANNELS => (None, &values[..]),
        n if n == CHANNELS + 1 => (Some(values[0]), &values[1..]),
        n => {
            return Err(malformed(format!(
                "expected {CHANNELS} or {} values, got {n}",
                CHANNELS + 1
            )))
        }
    };
    let mut channels = [0.0f32; CHANNELS];
    for (slot, value) in channels.iter_mut().zip(readings) {
        *slot = *value as f32;
    }
    Ok(RawSample {
        timestamp,
        channels,
    })
}
/// Running counters for a line-oriented source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub accepted: usize,
    pub skipped: usize,
    pub consecutive_malformed: usize,
}
/// Line-oriented source over any buffered reader (serial port, log file, pipe).
///
/// Malformed lines are logged and skipped. Read timeouts are waited through unless
/// the cancel flag is raised, in which case the source ends.
pub struct LineSource<R: BufRead> {
    reader: R,
    pending: Vec<u8>,
    max_consecutive_malformed: Option<usize>,
    cancel: Option<Arc<AtomicBool>>,
    stats: SourceStats,
    finished: bool,
}
impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R, max_consecutive_malformed: Option<usize>) -> Self {
        Self {
            reader,
            pending: Vec::new(),
            max_consecutive_malformed,
            cancel: None,
            stats: SourceStats::default(),
            finished: false,
        }
    }
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
    pub fn stats(&self) -> SourceStats {
        self.stats
    }
    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
    /// Reads the next complete line. `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>, PipelineError> {
        loop {
            if self.cancelled() {
                return Ok(None);
            }
            match self.reader.read_until(b'\n', &mut self.pending) {
                Ok(0) => {
                    if self.pending.is_empty() {
                        return Ok(None);
                    }
                    break;
                }
                Ok(_) => {
                    if self.pending.ends_with(b"\n") {
                        break;
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    continue
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(PipelineError::Transport(e.to_string())),
            }
        }
        let line = String::from_utf8_lossy(&self.pending).trim().to_string();
        self.pending.clear();
        Ok(Some(line))
    }
    fn record_malformed(&mut self, err: &PipelineError) -> Result<(), PipelineError> {
        warn!("skipping sample line: {err}");
        self.stats.skipped += 1;
        self.stats.consecutive_malformed += 1;
        match self.max_consecutive_malformed {
            Some(limit) if self.stats.consecutive_malformed >= limit => {
                Err(PipelineError::TooManyMalformed { limit })
            }
            _ => Ok(()),
        }
    }
}
impl<R: BufRead> SampleSource for LineSource<R> {
    fn next_sample(&mut self) -> Result<Option<RawSample>, PipelineError> {
        if self.finished {
            return Ok(None);
        }
        loop {
            let line = match self.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            };
            if line.is_empty() {
                continue;
            }
            match parse_line(&line) {
                Ok(sample) => {
                    self.stats.accepted += 1;
                    self.stats.consecutive_malformed = 0;
                    return Ok(Some(sample));
                }
                Err(err) => {
                    if let Err(fatal) = self.record_malformed(&err) {
                        self.finished = true;
                        return Err(fatal);
                    }
                }
            }
        }
    }
}
pub type SerialSource = LineSource<BufReader<Box<dyn serialport::SerialPort>>>;
/// Opens the configured serial port as a live sample source.
pub fn open_serial(config: &PipelineConfig) -> Result<SerialSource, PipelineError> {
    let port = serialport::new(&config.serial_port, config.baud_rate)
        .timeout(config.read_timeout())
        .open()?;
    info!(
        "opened {} at {} baud, waiting for data",
        config.serial_port, config.baud_rate
    );
    Ok(LineSource::new(
        BufReader::new(port),
        config.max_consecutive_malformed,
    ))
}
/// File-backed transport recording. Unlike a live port it can be re-read.
pub struct ReplaySource {
    path: PathBuf,
    max_consecutive_malformed: Option<usize>,
    inner: LineSource<BufReader<File>>,
}
impl ReplaySource {
    pub fn open(
        path: impl AsRef<Path>,
        max_consecutive_malformed: Option<usize>,
    ) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        let inner = LineSource::new(BufReader::new(File::open(&path)?), max_consecutive_malformed);
        Ok(Self {
            path,
            max_consecutive_malformed,
            inner,
        })
    }
    pub fn restart(&mut self) -> Result<(), PipelineError> {
        self.inner = LineSource::new(
            BufReader::new(File::open(&self.path)?),
            self.max_consecutive_malformed,
        );
        Ok(())
    }
    pub fn stats(&self) -> SourceStats {
        self.inner.stats()
    }
}
impl SampleSource for ReplaySource {
    fn next_sample(&mut self) -> Result<Option<RawSample>, PipelineError> {
        self.inner.next_sample()
    }
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<RawSample>,
}
impl ManualSource {
    pub fn new(samples: impl IntoIterator<Item = RawSample>) -> Self {
        Self {
            queue: samples.into_iter().collect(),
        }
    }
}
impl SampleSource for ManualSource {
    fn next_sample(&mut self) -> Result<Option<RawSample>, PipelineError> {
        Ok(self.queue.pop_front())
    }
}
