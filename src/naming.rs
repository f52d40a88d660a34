use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Suffix carried by ChampSim trace files.
pub const TRACE_SUFFIX: &str = ".out.gz";

/// Input trace path split into its base name and recognized suffix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceName {
    dir: PathBuf,
    stem: OsString,
}

impl TraceName {
    /// The file name does not need to be UTF-8; only the suffix is matched.
    pub fn parse(path: &Path) -> Result<Self> {
        let missing = || Error::MissingSuffix {
            path: path.to_path_buf(),
            suffix: TRACE_SUFFIX,
        };
        let file_name = path.file_name().ok_or_else(missing)?;
        if file_name == TRACE_SUFFIX {
            return Err(Error::EmptyStem {
                path: path.to_path_buf(),
            });
        }

        // `.out.gz` is two extensions: peel `gz`, then `out`.
        let outer = Path::new(file_name);
        if outer.extension() != Some(OsStr::new("gz")) {
            return Err(missing());
        }
        let inner = Path::new(outer.file_stem().ok_or_else(missing)?);
        if inner.extension() != Some(OsStr::new("out")) {
            return Err(missing());
        }
        let stem = inner.file_stem().ok_or_else(missing)?;

        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self {
            dir,
            stem: stem.to_os_string(),
        })
    }

    /// File name with the suffix stripped.
    pub fn stem(&self) -> &OsStr {
        &self.stem
    }

    /// Directory holding the input trace.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Segment path next to the input, or under `out_dir` when given.
    pub fn segment_path(&self, out_dir: Option<&Path>, index: u64) -> PathBuf {
        out_dir
            .unwrap_or(&self.dir)
            .join(segment_filename(&self.stem, index))
    }
}

/// `{stem}_{index:03}.out.gz`; indices past 999 widen instead of wrapping.
pub fn segment_filename(stem: &OsStr, index: u64) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!("_{index:03}{TRACE_SUFFIX}"));
    name
}
