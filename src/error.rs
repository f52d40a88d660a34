use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("expected input file with '{suffix}' extension: {}", path.display())]
    MissingSuffix { path: PathBuf, suffix: &'static str },
    #[error("trace file name has no base before the extension: {}", path.display())]
    EmptyStem { path: PathBuf },
    #[error("cutpoint must be a positive integer, got {0}")]
    InvalidCutpoint(i64),
    #[error("compression level must be in 0..=9, got {0}")]
    InvalidLevel(u32),
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        /// Segment that was open when the failure hit. It was closed with a
        /// valid trailer but holds fewer records than it should.
        incomplete_segment: Option<PathBuf>,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            incomplete_segment: None,
            source,
        }
    }

    pub(crate) fn with_incomplete_segment(mut self, segment: Option<PathBuf>) -> Self {
        if let Error::Io {
            incomplete_segment, ..
        } = &mut self
        {
            *incomplete_segment = segment;
        }
        self
    }

    /// True for errors raised before any file is touched.
    pub fn is_usage(&self) -> bool {
        !matches!(self, Error::Io { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
