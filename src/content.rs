//! Content delivery: skip, buffer, or push each record's data.
//!
//! After a header is decoded, exactly `size` content bytes follow, then
//! enough padding to reach the next 512-byte boundary. [`consume`] moves the
//! stream over both, delivering the content according to the reader's
//! [`ContentPolicy`].

use std::fmt;

use log::trace;

use crate::error::{ArchiveError, Result};
use crate::header::BLOCK_SIZE;
use crate::record::Record;
use crate::stream::StreamHandle;

/// Default chunk size for reading content.
pub const DEFAULT_BUFFER_SIZE: usize = 8195;

/// Receives content chunks under [`ContentPolicy::Push`].
///
/// Implemented for any closure
/// `FnMut(&Record, &[u8], u64, usize) -> anyhow::Result<()>`.
pub trait ContentHandler {
    /// Handle one chunk of `record`'s content.
    ///
    /// `remaining` is the number of content bytes still to come after this
    /// chunk and `read` is the length of `chunk`. A zero-length record gets
    /// exactly one call with an empty chunk and both counts zero.
    ///
    /// # Errors
    ///
    /// Any error aborts decoding of the current record.
    fn handle(
        &mut self,
        record: &Record,
        chunk: &[u8],
        remaining: u64,
        read: usize,
    ) -> anyhow::Result<()>;
}

impl<F> ContentHandler for F
where
    F: FnMut(&Record, &[u8], u64, usize) -> anyhow::Result<()>,
{
    fn handle(
        &mut self,
        record: &Record,
        chunk: &[u8],
        remaining: u64,
        read: usize,
    ) -> anyhow::Result<()> {
        self(record, chunk, remaining, read)
    }
}

/// What to do with each record's content.
#[derive(Default)]
pub enum ContentPolicy {
    /// Seek past the content without reading it.
    Skip,
    /// Read the content into [`Record::contents`].
    #[default]
    Buffer,
    /// Hand the content to a handler chunk by chunk.
    Push(Box<dyn ContentHandler>),
}

impl ContentPolicy {
    /// Wrap `handler` in [`ContentPolicy::Push`].
    pub fn push<H>(handler: H) -> Self
    where
        H: ContentHandler + 'static,
    {
        ContentPolicy::Push(Box::new(handler))
    }
}

impl fmt::Debug for ContentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentPolicy::Skip => f.write_str("Skip"),
            ContentPolicy::Buffer => f.write_str("Buffer"),
            ContentPolicy::Push(_) => f.write_str("Push(..)"),
        }
    }
}

/// Number of padding bytes following `size` content bytes.
///
/// ```
/// use ustar_reader::padding;
///
/// assert_eq!(padding(0), 0);
/// assert_eq!(padding(1), 511);
/// assert_eq!(padding(512), 0);
/// assert_eq!(padding(1000), 24);
/// ```
#[must_use]
pub fn padding(size: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (block - size % block) % block
}

/// Grow `buf` by `additional` zeroed bytes, failing instead of aborting
/// when the allocation cannot be made.
fn grow_zeroed(buf: &mut Vec<u8>, additional: usize) -> Result<()> {
    buf.try_reserve(additional)
        .map_err(|_| std::io::Error::from(std::io::ErrorKind::OutOfMemory))?;
    buf.resize(buf.len() + additional, 0);
    Ok(())
}

/// Length of the next chunk.
fn chunk_len(remaining: u64, buffer_size: usize) -> usize {
    usize::try_from(remaining).map_or(buffer_size, |r| r.min(buffer_size))
}

/// Consume `record`'s content and padding from `stream`.
///
/// On return the stream sits at the next header, `record.offset + 512 +
/// record.content_region()`.
pub(crate) fn consume(
    stream: &mut StreamHandle,
    record: &mut Record,
    policy: &mut ContentPolicy,
    buffer_size: usize,
) -> Result<()> {
    let size = record.size;

    match policy {
        ContentPolicy::Skip => stream.skip(size)?,
        ContentPolicy::Buffer => {
            let mut contents = Vec::new();
            let mut remaining = size;
            while remaining > 0 {
                let n = chunk_len(remaining, buffer_size);
                let start = contents.len();
                grow_zeroed(&mut contents, n)?;
                stream.read_exact(&mut contents[start..])?;
                remaining -= n as u64;
            }
            record.contents = Some(contents);
        }
        ContentPolicy::Push(handler) => {
            if size == 0 {
                handler
                    .handle(record, &[], 0, 0)
                    .map_err(ArchiveError::Handler)?;
            } else {
                let mut chunk = Vec::new();
                grow_zeroed(&mut chunk, chunk_len(size, buffer_size))?;
                let mut remaining = size;
                while remaining > 0 {
                    let n = chunk_len(remaining, buffer_size);
                    stream.read_exact(&mut chunk[..n])?;
                    remaining -= n as u64;
                    trace!("chunk of {n} bytes, {remaining} remaining");
                    handler
                        .handle(record, &chunk[..n], remaining, n)
                        .map_err(ArchiveError::Handler)?;
                }
            }
        }
    }

    let pad = padding(size);
    if pad > 0 {
        stream.skip(pad)?;
    }
    Ok(())
}
