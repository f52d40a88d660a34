//! Rolling gzip segment writer.
//!
//! Owns at most one open output at a time. `append` opens the first segment
//! and rolls to the next one every `records_per_segment` records; `finish`
//! closes whatever is open. Closing writes the gzip trailer and flushes the
//! file; a segment that was closed is complete on disk regardless of what
//! happens afterwards.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::Instant;

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};

use crate::error::{Error, Result};
use crate::naming::TraceName;

struct OpenSegment {
    path: PathBuf,
    encoder: GzEncoder<BufWriter<File>>,
    records: u64,
    opened_at: Instant,
}

pub struct SegmentWriter {
    name: TraceName,
    out_dir: Option<PathBuf>,
    compression: Compression,
    records_per_segment: u64,
    /// Records appended across all segments.
    appended: u64,
    /// Index of the next segment to open.
    segment_id: u64,
    current: Option<OpenSegment>,
    /// Paths of every segment opened so far, in creation order.
    outputs: Vec<PathBuf>,
}

impl SegmentWriter {
    /// No file is created until the first `append`.
    pub fn new(
        name: TraceName,
        out_dir: Option<PathBuf>,
        compression: Compression,
        records_per_segment: NonZeroU64,
    ) -> Self {
        Self {
            name,
            out_dir,
            compression,
            records_per_segment: records_per_segment.get(),
            appended: 0,
            segment_id: 0,
            current: None,
            outputs: Vec::new(),
        }
    }

    /// Number of segments opened so far.
    pub fn segments(&self) -> u64 {
        self.segment_id
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Path of the segment currently open, if any.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|segment| segment.path.as_path())
    }

    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    /// Write one record, rolling to a new segment on a segment boundary.
    pub fn append(&mut self, record: &[u8]) -> Result<()> {
        let on_boundary = self.appended % self.records_per_segment == 0;
        let mut segment = match self.current.take() {
            Some(segment) if !on_boundary => segment,
            previous => {
                if let Some(previous) = previous {
                    close(previous)?;
                }
                self.open_next()?
            }
        };

        let written = segment
            .encoder
            .write_all(record)
            .map_err(|err| Error::io(&segment.path, err));
        if written.is_ok() {
            segment.records += 1;
            self.appended += 1;
        }
        self.current = Some(segment);
        written
    }

    /// Close the active segment. Safe to call more than once.
    pub fn finish(&mut self) -> Result<()> {
        match self.current.take() {
            Some(segment) => close(segment),
            None => Ok(()),
        }
    }

    fn open_next(&mut self) -> Result<OpenSegment> {
        let path = self.name.segment_path(self.out_dir.as_deref(), self.segment_id);
        let file = File::create(&path).map_err(|err| Error::io(&path, err))?;
        debug!("opened segment {}", path.display());

        self.outputs.push(path.clone());
        self.segment_id = self.segment_id.saturating_add(1);
        Ok(OpenSegment {
            path,
            encoder: GzEncoder::new(BufWriter::new(file), self.compression),
            records: 0,
            opened_at: Instant::now(),
        })
    }
}

fn close(segment: OpenSegment) -> Result<()> {
    let OpenSegment {
        path,
        encoder,
        records,
        opened_at,
    } = segment;

    let mut out = encoder.finish().map_err(|err| Error::io(&path, err))?;
    out.flush().map_err(|err| Error::io(&path, err))?;

    let elapsed = opened_at.elapsed();
    let rate = records as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    info!(
        "closed segment {} ({} records, {:.2?}, {:.0} rec/sec)",
        display_name(&path),
        records,
        elapsed,
        rate
    );
    Ok(())
}

fn display_name(path: &Path) -> std::path::Display<'_> {
    path.file_name().map(Path::new).unwrap_or(path).display()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn writer_in(dir: &TempDir, per_segment: u64) -> SegmentWriter {
        let name = TraceName::parse(&dir.path().join("t.out.gz")).unwrap();
        SegmentWriter::new(
            name,
            None,
            Compression::fast(),
            NonZeroU64::new(per_segment).unwrap(),
        )
    }

    fn decode(path: &Path) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_nothing_created_before_first_append() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer_in(&dir, 2);

        assert!(!writer.is_open());
        writer.finish().unwrap();
        assert_eq!(writer.segments(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_rolls_on_segment_boundary() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer_in(&dir, 2);

        writer.append(b"a").unwrap();
        assert_eq!(writer.segments(), 1);
        writer.append(b"b").unwrap();
        assert_eq!(writer.segments(), 1);
        writer.append(b"c").unwrap();
        assert_eq!(writer.segments(), 2);

        // First segment is already sealed while the second is still open.
        assert_eq!(decode(&writer.outputs()[0]), b"ab");
        assert_eq!(writer.current_path(), Some(writer.outputs()[1].as_path()));

        writer.finish().unwrap();
        writer.finish().unwrap();
        assert!(!writer.is_open());
        assert_eq!(writer.current_path(), None);
        assert_eq!(decode(&writer.outputs()[1]), b"c");
        assert_eq!(writer.outputs()[1].file_name().unwrap(), "t_001.out.gz");
    }

    #[test]
    fn test_append_after_finish_reopens() {
        let dir = TempDir::new().unwrap();
        let mut writer = writer_in(&dir, 3);

        writer.append(b"x").unwrap();
        writer.finish().unwrap();
        writer.append(b"y").unwrap();
        writer.finish().unwrap();

        assert_eq!(writer.segments(), 2);
        assert_eq!(decode(&dir.path().join("t_000.out.gz")), b"x");
        assert_eq!(decode(&dir.path().join("t_001.out.gz")), b"y");
    }

    #[test]
    fn test_create_failure_names_path() {
        let dir = TempDir::new().unwrap();
        let name = TraceName::parse(&dir.path().join("t.out.gz")).unwrap();
        let missing = dir.path().join("no-such-dir");
        let mut writer = SegmentWriter::new(
            name,
            Some(missing.clone()),
            Compression::fast(),
            NonZeroU64::MIN,
        );

        match writer.append(b"x") {
            Err(Error::Io { path, .. }) => assert_eq!(path, missing.join("t_000.out.gz")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!writer.is_open());
        assert_eq!(writer.segments(), 0);
    }
}
