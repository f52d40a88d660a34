//! Split gzip-compressed ChampSim instruction traces into fixed-size segments.
//!
//! A trace is a gzip stream of packed 62-byte records. The splitter copies
//! records verbatim into `{base}_{NNN}.out.gz` files of `cutpoint` records
//! each, reading and writing in one streaming pass.

pub mod decoder;
pub mod error;
pub mod naming;
pub mod record;
pub mod segment_writer;
pub mod splitter;

pub use decoder::TraceDecoder;
pub use error::{Error, Result};
pub use naming::{TraceName, TRACE_SUFFIX};
pub use record::{RecordReader, RECORD_SIZE};
pub use segment_writer::SegmentWriter;
pub use splitter::{split_trace, SplitConfig, SplitStats, Splitter};
