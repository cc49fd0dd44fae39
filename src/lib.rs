//! Streaming reader for POSIX ustar archives.
//!
//! Archives may be plain (`.tar`), gzip (`.tar.gz`, `.tgz`) or bzip2
//! (`.tar.bz2`, `.tbz`, `.tb2`) compressed; the codec is picked from the
//! filename. Records are produced one at a time by [`ArchiveReader`], and each
//! record's content is skipped, buffered into the record, or pushed to a
//! caller-supplied handler in chunks, as chosen by [`ContentPolicy`].
//!
//! # Block Layout
//!
//! Everything in the decompressed stream is a sequence of 512-byte blocks:
//!
//! | Region  | Length                         |
//! |---------|--------------------------------|
//! | header  | 512                            |
//! | content | `size`                         |
//! | padding | `(512 - size % 512) % 512`     |
//!
//! The archive ends at the first header block whose checksum field decodes
//! to zero, or where the stream ends cleanly at a block boundary.
//!
//! # Example
//!
//! ```no_run
//! use ustar_reader::{ArchiveReader, ContentPolicy, Record};
//!
//! let mut reader = ArchiveReader::open("logs.tar.bz2")?;
//! reader.set_buffer_size(64 * 1024)?;
//! reader.set_content_policy(ContentPolicy::push(
//!     |record: &Record, chunk: &[u8], remaining: u64, _read: usize| -> anyhow::Result<()> {
//!         println!("{}: {} bytes, {remaining} to go", record.filename_lossy(), chunk.len());
//!         Ok(())
//!     },
//! ));
//!
//! while let Some(record) = reader.advance()? {
//!     println!("{:?} {}", record.entry_type(), record.filename_lossy());
//! }
//! # Ok::<(), ustar_reader::ArchiveError>(())
//! ```
//!
//! # Limitations
//!
//! GNU base-256 numeric fields are rejected rather than decoded. PAX and GNU
//! extension records (`'x'`, `'g'`, `'K'`) are yielded as ordinary records;
//! their contents are not applied to the records that follow.

pub mod compression;
pub mod content;
pub mod error;
pub mod header;
pub mod options;
pub mod reader;
pub mod record;
pub mod stream;

#[cfg(test)]
mod test;

pub use compression::Compression;
pub use content::{padding, ContentHandler, ContentPolicy, DEFAULT_BUFFER_SIZE};
pub use error::{ArchiveError, Result, UnsupportedArchive};
pub use header::{EntryType, BLOCK_SIZE};
pub use options::{ReaderOptions, MAX_BUFFER_SIZE};
pub use reader::{ArchiveReader, ReaderState};
pub use record::Record;
pub use stream::StreamHandle;
