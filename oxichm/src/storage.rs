//! Shared positional reads over the archive stream.

use oxichm_core::{ChmError, Result};
use parking_lot::Mutex;
use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// The archive reader behind a lock; every seek and read happen as a pair.
#[derive(Debug)]
pub(crate) struct SharedReader<R> {
    inner: Mutex<Option<R>>,
}

impl<R: Read + Seek> SharedReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            inner: Mutex::new(Some(reader)),
        }
    }

    /// Read up to `buf.len()` bytes at `offset`, stopping early only at end
    /// of input. Returns the number of bytes read.
    pub(crate) fn fetch(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut guard = self.inner.lock();
        let reader = guard.as_mut().ok_or(ChmError::ArchiveClosed)?;
        reader.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl<R> SharedReader<R> {
    /// Drop the reader. Returns false if it was already gone.
    pub(crate) fn close(&self) -> bool {
        self.inner.lock().take().is_some()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.inner.lock().is_some()
    }
}
