//! Forward-only cursor over the records of an archive.
//!
//! [`ArchiveReader`] ties the other pieces together: it picks the codec from
//! the filename, opens a [`StreamHandle`], and on each
//! [`advance`](ArchiveReader::advance) reads one header block, decodes it into
//! a [`Record`] and consumes the record's content under the configured
//! [`ContentPolicy`].
//!
//! # Example
//!
//! ```no_run
//! use ustar_reader::{ArchiveReader, ContentPolicy};
//!
//! let mut reader = ArchiveReader::open("backup.tar.gz")?;
//! reader.set_content_policy(ContentPolicy::Skip);
//!
//! while let Some(record) = reader.advance()? {
//!     println!("{} ({} bytes)", record.filename_lossy(), record.size);
//! }
//! # Ok::<(), ustar_reader::ArchiveError>(())
//! ```
//!
//! # States
//!
//! A reader starts [`Open`](ReaderState::Open). It becomes
//! [`Exhausted`](ReaderState::Exhausted) when a header's checksum field
//! decodes to zero or the stream ends cleanly at a block boundary, and
//! [`Closed`](ReaderState::Closed) after [`close`](ArchiveReader::close).
//! [`restart`](ArchiveReader::restart) brings an exhausted reader back to the
//! first record.

use std::path::Path;

use log::debug;

use crate::compression::Compression;
use crate::content::{self, ContentPolicy};
use crate::error::{ArchiveError, Result};
use crate::header::BLOCK_SIZE;
use crate::options::{validate_buffer_size, ReaderOptions};
use crate::record::Record;
use crate::stream::StreamHandle;

/// Where an [`ArchiveReader`] is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReaderState {
    /// More records may follow.
    Open,
    /// The terminator or the end of the stream was reached.
    Exhausted,
    /// The reader was closed; only [`ArchiveReader::close`] is still allowed.
    Closed,
}

/// Pull-based reader over one ustar archive, optionally gzip or bzip2
/// compressed.
#[derive(Debug)]
pub struct ArchiveReader {
    stream: StreamHandle,
    options: ReaderOptions,
    policy: ContentPolicy,
    record: Option<Record>,
    /// Index of the most recently produced record.
    index: Option<u64>,
    /// Whether the last advance produced a record.
    produced: bool,
    state: ReaderState,
    /// Buffer for the current header (reused across records)
    header_buf: [u8; BLOCK_SIZE],
}

impl ArchiveReader {
    /// Open the archive at `path` with default options.
    ///
    /// # Errors
    ///
    /// As for [`open_with`](ArchiveReader::open_with).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, ReaderOptions::default())
    }

    /// Open the archive at `path`.
    ///
    /// The codec is chosen from the filename suffix. No record is read until
    /// the first [`advance`](ArchiveReader::advance).
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::InvalidBufferSize`] if `options` are out of range.
    /// - [`ArchiveError::UnsupportedCompression`] for an unknown suffix.
    /// - [`ArchiveError::Open`] if the file cannot be opened or decoded.
    pub fn open_with(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Self> {
        options.validate()?;
        let path = path.as_ref();
        let compression = Compression::from_path(path)?;
        let stream = StreamHandle::open(path, compression)?;
        Ok(Self {
            stream,
            options,
            policy: ContentPolicy::default(),
            record: None,
            index: None,
            produced: false,
            state: ReaderState::Open,
            header_buf: [0u8; BLOCK_SIZE],
        })
    }

    /// Choose how the content of subsequent records is delivered.
    pub fn set_content_policy(&mut self, policy: ContentPolicy) {
        self.policy = policy;
    }

    /// Current content policy.
    #[must_use]
    pub fn content_policy(&self) -> &ContentPolicy {
        &self.policy
    }

    /// Set the chunk size used when reading content.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::InvalidBufferSize`] if `size` is zero or above
    /// [`MAX_BUFFER_SIZE`](crate::options::MAX_BUFFER_SIZE); the previous
    /// size is kept.
    pub fn set_buffer_size(&mut self, size: usize) -> Result<()> {
        validate_buffer_size(size)?;
        self.options.buffer_size = size;
        Ok(())
    }

    /// Chunk size used when reading content.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.options.buffer_size
    }

    /// Codec chosen for this archive.
    #[must_use]
    pub fn compression(&self) -> Compression {
        self.stream.compression()
    }

    /// Path the archive was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.stream.path()
    }

    /// Offset in the decompressed stream.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// The most recently produced record, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// Take ownership of the current record.
    ///
    /// Afterwards [`current`](ArchiveReader::current) is `None`, but the
    /// cursor still counts as positioned on that record:
    /// [`is_valid`](ArchiveReader::is_valid) and
    /// [`index`](ArchiveReader::index) are unchanged.
    pub fn take_current(&mut self) -> Option<Record> {
        self.record.take()
    }

    /// 0-based index of the most recently produced record.
    ///
    /// `Some` exactly when [`is_valid`](ArchiveReader::is_valid) is true.
    #[must_use]
    pub fn index(&self) -> Option<u64> {
        self.index.filter(|_| self.produced)
    }

    /// Whether the last [`advance`](ArchiveReader::advance) or
    /// [`restart`](ArchiveReader::restart) produced a record.
    ///
    /// False before the first advance, after exhaustion, after a failed
    /// advance and after close.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.produced
    }

    /// Move to the next record.
    ///
    /// Returns `Ok(None)` once the archive is exhausted, and keeps doing so
    /// on further calls.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::Closed`] after [`close`](ArchiveReader::close), or any
    /// decode, transport or handler error. After an error the stream position
    /// is unspecified; [`restart`](ArchiveReader::restart) or drop the reader.
    pub fn advance(&mut self) -> Result<Option<&Record>> {
        match self.state {
            ReaderState::Closed => return Err(ArchiveError::Closed),
            ReaderState::Exhausted => return Ok(None),
            ReaderState::Open => {}
        }
        self.record = None;
        self.produced = false;

        let offset = self.stream.position();
        if !self.stream.read_block(&mut self.header_buf)? {
            debug!("end of stream at {offset} without terminator");
            self.state = ReaderState::Exhausted;
            return Ok(None);
        }

        let Some(mut record) = Record::decode(&self.header_buf, offset)? else {
            debug!("terminator at {offset}");
            self.state = ReaderState::Exhausted;
            return Ok(None);
        };

        content::consume(
            &mut self.stream,
            &mut record,
            &mut self.policy,
            self.options.buffer_size,
        )?;

        self.index = Some(self.index.map_or(0, |i| i + 1));
        self.produced = true;
        Ok(Some(self.record.insert(record)))
    }

    /// Go back to the start of the archive and read the first record again.
    ///
    /// The index restarts at 0.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::Closed`] after [`close`](ArchiveReader::close), or any
    /// error [`advance`](ArchiveReader::advance) can return.
    pub fn restart(&mut self) -> Result<Option<&Record>> {
        if self.state == ReaderState::Closed {
            return Err(ArchiveError::Closed);
        }
        self.record = None;
        self.produced = false;
        self.stream.rewind()?;
        self.index = None;
        self.state = ReaderState::Open;
        self.advance()
    }

    /// Close the underlying stream. Closing twice does nothing.
    pub fn close(&mut self) {
        self.stream.close();
        self.record = None;
        self.produced = false;
        self.state = ReaderState::Closed;
    }
}
