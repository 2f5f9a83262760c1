//! Byte sources the demuxer reads from.
//!
//! The demuxer core never opens or closes the underlying resource; it only
//! needs sequential reads, skips, absolute seeks and the current position.

use crate::{Error, Result};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Sequential byte source with random access.
///
/// Reads and skips return [`Error::Eof`] once the source is exhausted. The
/// end-of-stream state is sticky until [`seek`](ByteSource::seek) or
/// [`reset`](ByteSource::reset) is called.
pub trait ByteSource {
    /// Fill `buf` completely.
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Skip `n` bytes without buffering them.
    fn skip(&mut self, n: u64) -> Result<()>;

    /// Current absolute position.
    fn tell(&self) -> u64;

    /// Move to an absolute position.
    fn seek(&mut self, pos: u64) -> Result<()>;

    /// Clear the end-of-stream state left behind by a failed probe and
    /// re-align the underlying reader with [`tell`](ByteSource::tell).
    fn reset(&mut self) -> Result<()>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read(buf)
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        (**self).skip(n)
    }

    fn tell(&self) -> u64 {
        (**self).tell()
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        (**self).seek(pos)
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }
}

/// [`ByteSource`] over any `Read + Seek`.
pub struct IoSource<R> {
    inner: R,
    pos: u64,
    len: u64,
    eof: bool,
}

impl IoSource<BufReader<File>> {
    /// Open a file as a byte source.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> IoSource<R> {
    /// Wrap a reader, starting at its current position.
    pub fn new(mut inner: R) -> Result<Self> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;
        Ok(Self {
            inner,
            pos,
            len,
            eof: false,
        })
    }

    /// Total length of the underlying data.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the underlying data is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the source is in the end-of-stream state.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for IoSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.eof {
            return Err(Error::Eof);
        }
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.eof = true;
                self.pos = self.len;
                Err(Error::Eof)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        if self.eof {
            return Err(Error::Eof);
        }
        if n == 0 {
            return Ok(());
        }
        let target = self.pos.saturating_add(n);
        if target > self.len {
            self.inner.seek(SeekFrom::Start(self.len))?;
            self.pos = self.len;
            self.eof = true;
            return Err(Error::Eof);
        }
        self.inner.seek(SeekFrom::Start(target))?;
        self.pos = target;
        Ok(())
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        self.eof = false;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.eof = false;
        // A short read leaves the reader somewhere past the tracked position.
        self.inner.seek(SeekFrom::Start(self.pos))?;
        Ok(())
    }
}
