//! Gzip reader for trace inputs.
//!
//! Decodes concatenated gzip members as one payload. NUL padding between or
//! after members is skipped, the way trace tooling built on Python's `gzip`
//! module reads it. Padding before the first member is not accepted.

use std::io::{self, BufRead, ErrorKind, Read};

use flate2::bufread::GzDecoder;

pub struct TraceDecoder<R: BufRead> {
    member: Option<GzDecoder<R>>,
    /// Source positioned between members; `None` once the stream is done.
    idle: Option<R>,
    first: bool,
}

impl<R: BufRead> TraceDecoder<R> {
    pub fn new(inner: R) -> Self {
        Self {
            member: None,
            idle: Some(inner),
            first: true,
        }
    }
}

impl<R: BufRead> Read for TraceDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if let Some(mut member) = self.member.take() {
                let n = match member.read(buf) {
                    Ok(n) => n,
                    Err(err) => {
                        self.member = Some(member);
                        return Err(err);
                    }
                };
                if n > 0 {
                    self.member = Some(member);
                    return Ok(n);
                }
                self.idle = Some(member.into_inner());
            }

            let Some(mut inner) = self.idle.take() else {
                return Ok(0);
            };
            let at_end = if self.first {
                self.first = false;
                is_exhausted(&mut inner)?
            } else {
                skip_padding(&mut inner)?
            };
            if at_end {
                return Ok(0);
            }
            self.member = Some(GzDecoder::new(inner));
        }
    }
}

fn is_exhausted<R: BufRead>(inner: &mut R) -> io::Result<bool> {
    loop {
        match inner.fill_buf() {
            Ok(buf) => return Ok(buf.is_empty()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Consume NUL bytes; true when the source ends before another member.
fn skip_padding<R: BufRead>(inner: &mut R) -> io::Result<bool> {
    loop {
        let (zeros, len) = match inner.fill_buf() {
            Ok(buf) => (buf.iter().take_while(|&&b| b == 0).count(), buf.len()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        if len == 0 {
            return Ok(true);
        }
        inner.consume(zeros);
        if zeros < len {
            return Ok(false);
        }
    }
}
