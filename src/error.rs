//! Error types for archive reading.
//!
//! Every fallible operation returns [`Result<T>`], an alias for
//! `Result<T, ArchiveError>`. None of these errors is recoverable for the
//! current pass over the archive: once a header fails to decode, the offsets
//! of everything after it are untrustworthy.
//!
//! # Error Categories
//!
//! - **Setup**: [`UnsupportedCompression`], [`Open`], [`InvalidBufferSize`]
//! - **Format**: [`UnsupportedArchive`], [`CorruptArchive`]
//! - **Transport**: [`Io`], [`UnexpectedEof`], [`Closed`]
//! - **Caller**: [`Handler`]
//!
//! [`UnsupportedCompression`]: ArchiveError::UnsupportedCompression
//! [`Open`]: ArchiveError::Open
//! [`InvalidBufferSize`]: ArchiveError::InvalidBufferSize
//! [`UnsupportedArchive`]: ArchiveError::UnsupportedArchive
//! [`CorruptArchive`]: ArchiveError::CorruptArchive
//! [`Io`]: ArchiveError::Io
//! [`UnexpectedEof`]: ArchiveError::UnexpectedEof
//! [`Closed`]: ArchiveError::Closed
//! [`Handler`]: ArchiveError::Handler

use std::path::PathBuf;

use thiserror::Error;

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors that can occur while opening or reading an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The filename does not end in a recognized archive suffix.
    #[error("unsupported compression for '{}'", .0.display())]
    UnsupportedCompression(PathBuf),

    /// The archive file could not be opened, or its codec rejected the data.
    #[error("cannot open '{}': {source}", path.display())]
    Open {
        /// Path that was being opened.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The header is well-formed but uses something this reader cannot decode.
    #[error("unsupported archive: {0}")]
    UnsupportedArchive(#[from] UnsupportedArchive),

    /// The header checksum does not match the header bytes.
    #[error("archive is corrupted at offset {offset}: checksum {expected}, computed {computed}")]
    CorruptArchive {
        /// Offset of the header block in the decompressed stream.
        offset: u64,
        /// The checksum value stored in the header.
        expected: u64,
        /// The checksum computed from the header bytes.
        computed: u64,
    },

    /// The configured buffer size is zero or exceeds the addressable maximum.
    #[error("invalid buffer size {size}: must be between 1 and {max}")]
    InvalidBufferSize {
        /// Requested size.
        size: usize,
        /// Largest accepted size.
        max: usize,
    },

    /// The stream was used after it had been closed.
    #[error("stream is closed")]
    Closed,

    /// I/O error from the underlying file or codec.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended inside a header or content region.
    #[error("unexpected EOF at position {pos}")]
    UnexpectedEof {
        /// Decompressed position where the data ran out.
        pos: u64,
    },

    /// A push-mode content handler failed.
    #[error("content handler failed: {0:#}")]
    Handler(anyhow::Error),
}

/// Reasons a header cannot be decoded even though it is not corrupt.
#[derive(Debug, Error)]
pub enum UnsupportedArchive {
    /// The magic field does not start with "ustar".
    #[error("bad magic {0:?}, expected \"ustar\"")]
    Magic([u8; 6]),

    /// A numeric field contains characters other than octal digits and padding.
    #[error("invalid octal in {field} field: {bytes:?}")]
    InvalidOctal {
        /// Header field name.
        field: &'static str,
        /// Raw field bytes.
        bytes: Vec<u8>,
    },

    /// A numeric field does not fit the integer type it is decoded into.
    #[error("{field} field does not fit in {bits} bits")]
    Overflow {
        /// Header field name.
        field: &'static str,
        /// Width of the target integer.
        bits: u32,
    },

    /// A numeric field uses the GNU base-256 binary encoding.
    #[error("binary-encoded {field} field is not supported")]
    BinaryNumeric {
        /// Header field name.
        field: &'static str,
    },
}
