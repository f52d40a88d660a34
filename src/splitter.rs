//! Streaming trace splitter.
//!
//! Reads a gzip trace one record at a time and rotates to a fresh output
//! segment every `cutpoint` records. Memory use is bounded by the decoder and
//! encoder buffers plus a single record.

use std::fs::File;
use std::io::BufReader;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::Instant;

use flate2::Compression;
use log::{info, warn};

use crate::decoder::TraceDecoder;
use crate::error::{Error, Result};
use crate::naming::TraceName;
use crate::record::{ReadOutcome, RecordReader, RECORD_SIZE};
use crate::segment_writer::SegmentWriter;

/// Same level Python's `gzip` module writes trace files at.
pub const DEFAULT_LEVEL: u32 = 9;

#[derive(Clone, Debug)]
pub struct SplitConfig {
    pub cutpoint: NonZeroU64,
    pub level: u32,
    /// Directory for segment files; defaults to the input's directory.
    pub output_dir: Option<PathBuf>,
}

impl SplitConfig {
    /// Rejects a zero or negative cutpoint before any file is touched.
    pub fn new(cutpoint: i64) -> Result<Self> {
        let cutpoint = u64::try_from(cutpoint)
            .ok()
            .and_then(NonZeroU64::new)
            .ok_or(Error::InvalidCutpoint(cutpoint))?;
        Ok(Self {
            cutpoint,
            level: DEFAULT_LEVEL,
            output_dir: None,
        })
    }

    fn validate(&self) -> Result<Compression> {
        if self.level > 9 {
            return Err(Error::InvalidLevel(self.level));
        }
        Ok(Compression::new(self.level))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitStats {
    /// Complete records copied to segments.
    pub records: u64,
    /// Segment files created.
    pub segments: u64,
    /// Bytes of a trailing partial record that were dropped.
    pub truncated_bytes: usize,
    /// Segment paths in creation order.
    pub outputs: Vec<PathBuf>,
}

pub struct Splitter {
    config: SplitConfig,
}

impl Splitter {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Split `input` into segments of `cutpoint` records.
    ///
    /// Segments closed before a failure stay on disk and are complete. The
    /// segment open at the time of the failure is closed too, but holds fewer
    /// records than it should; its path is carried in
    /// `Error::Io::incomplete_segment`.
    pub fn split(&self, input: &Path) -> Result<SplitStats> {
        let name = TraceName::parse(input)?;
        let compression = self.config.validate()?;

        let file = File::open(input).map_err(|err| Error::io(input, err))?;
        let mut reader = RecordReader::new(TraceDecoder::new(BufReader::new(file)));
        if let Some(dir) = &self.config.output_dir {
            std::fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))?;
        }
        let mut writer = SegmentWriter::new(
            name,
            self.config.output_dir.clone(),
            compression,
            self.config.cutpoint,
        );

        info!(
            "splitting {} every {} records ({} bytes/record)",
            input.display(),
            self.config.cutpoint,
            RECORD_SIZE
        );
        let started = Instant::now();

        let mut stats = SplitStats::default();
        if let Err(err) = copy_records(input, &mut reader, &mut writer, &mut stats) {
            let incomplete = writer.current_path().map(Path::to_path_buf);
            if let Some(segment) = &incomplete {
                warn!(
                    "split failed after {} records; {} is incomplete",
                    stats.records,
                    segment.display()
                );
            }
            // Close the open segment; the copy error is what gets reported.
            let _ = writer.finish();
            return Err(err.with_incomplete_segment(incomplete));
        }
        writer.finish()?;

        stats.segments = writer.segments();
        stats.outputs = writer.outputs().to_vec();
        info!(
            "split {} records into {} segments in {:.2?}",
            stats.records,
            stats.segments,
            started.elapsed()
        );
        Ok(stats)
    }
}

fn copy_records(
    input: &Path,
    reader: &mut RecordReader<TraceDecoder<BufReader<File>>>,
    writer: &mut SegmentWriter,
    stats: &mut SplitStats,
) -> Result<()> {
    loop {
        match reader.read_next().map_err(|err| Error::io(input, err))? {
            ReadOutcome::Eof => return Ok(()),
            ReadOutcome::Truncated(dropped) => {
                warn!(
                    "dropping {} trailing bytes of {}: shorter than one record",
                    dropped,
                    input.display()
                );
                stats.truncated_bytes = dropped;
                return Ok(());
            }
            ReadOutcome::Record => {}
        }

        writer.append(reader.record())?;
        stats.records += 1;
    }
}

/// Split `input` with default settings.
pub fn split_trace(input: &Path, cutpoint: i64) -> Result<SplitStats> {
    Splitter::new(SplitConfig::new(cutpoint)?).split(input)
}
