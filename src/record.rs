//! Fixed-width trace record framing.
//!
//! A ChampSim trace is a flat run of `trace_instr_format_t` records with no
//! delimiters. Fields are little-endian and packed; the splitter only needs
//! the total width to cut the stream, so field contents are never decoded.

use std::io::{self, ErrorKind, Read};

pub const IP_SIZE: usize = 8;
/// `is_branch`, `branch_taken`.
pub const BRANCH_FLAGS: usize = 2;
/// Register ids, one byte each.
pub const REGS: usize = 4;
/// Destination memory addresses, eight bytes each.
pub const DEST_MEM: usize = 2;
/// Source memory addresses, eight bytes each.
pub const SRC_MEM: usize = 4;

pub const IP_OFFSET: usize = 0;
pub const BRANCH_OFFSET: usize = IP_OFFSET + IP_SIZE;
pub const REGS_OFFSET: usize = BRANCH_OFFSET + BRANCH_FLAGS;
pub const DEST_MEM_OFFSET: usize = REGS_OFFSET + REGS;
pub const SRC_MEM_OFFSET: usize = DEST_MEM_OFFSET + DEST_MEM * 8;

/// Width of one packed record in bytes.
pub const RECORD_SIZE: usize = SRC_MEM_OFFSET + SRC_MEM * 8;

const _: () = assert!(RECORD_SIZE == 62);

pub type Record = [u8; RECORD_SIZE];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A full record was placed in the buffer.
    Record,
    /// Clean end of stream on a record boundary.
    Eof,
    /// Stream ended mid-record; holds the number of bytes dropped.
    Truncated(usize),
}

/// Pulls exactly one record at a time from a byte source.
pub struct RecordReader<R> {
    inner: R,
    buf: Record,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: [0u8; RECORD_SIZE],
        }
    }

    /// Fill the internal buffer with the next record.
    ///
    /// Short reads from the decoder are retried until either the record is
    /// complete or the source reports end of stream.
    pub fn read_next(&mut self) -> io::Result<ReadOutcome> {
        let mut filled = 0;
        while filled < RECORD_SIZE {
            match self.inner.read(&mut self.buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        Ok(match filled {
            0 => ReadOutcome::Eof,
            RECORD_SIZE => ReadOutcome::Record,
            partial => ReadOutcome::Truncated(partial),
        })
    }

    /// Bytes of the record produced by the last `ReadOutcome::Record`.
    pub fn record(&self) -> &Record {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields at most `step` bytes per read call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn record_layout_width() {
        assert_eq!(REGS_OFFSET, 10);
        assert_eq!(DEST_MEM_OFFSET, 14);
        assert_eq!(SRC_MEM_OFFSET, 30);
        assert_eq!(RECORD_SIZE, 62);
    }

    #[test]
    fn reassembles_short_reads() {
        let data: Vec<u8> = (0..RECORD_SIZE as u8 * 2).collect();
        let mut reader = RecordReader::new(Trickle {
            data: &data,
            step: 7,
        });

        assert_eq!(reader.read_next().unwrap(), ReadOutcome::Record);
        assert_eq!(&reader.record()[..], &data[..RECORD_SIZE]);
        assert_eq!(reader.read_next().unwrap(), ReadOutcome::Record);
        assert_eq!(&reader.record()[..], &data[RECORD_SIZE..]);
        assert_eq!(reader.read_next().unwrap(), ReadOutcome::Eof);
    }

    #[test]
    fn reports_trailing_partial_record() {
        let data = vec![0xAB; RECORD_SIZE + 5];
        let mut reader = RecordReader::new(&data[..]);

        assert_eq!(reader.read_next().unwrap(), ReadOutcome::Record);
        assert_eq!(reader.read_next().unwrap(), ReadOutcome::Truncated(5));
    }

    #[test]
    fn empty_source_is_eof() {
        let mut reader = RecordReader::new(&[0u8; 0][..]);
        assert_eq!(reader.read_next().unwrap(), ReadOutcome::Eof);
    }
}
