//! Codec-aware byte stream with open/read/seek/eof/close.
//!
//! [`StreamHandle`] hides the difference between a plain file and a
//! decompressing reader. Positions are always offsets into the
//! *decompressed* stream. Plain files seek natively; compressed streams
//! seek forward by decoding and discarding, and backward by reopening the
//! file and starting the codec over.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use log::debug;

use crate::compression::Compression;
use crate::error::{ArchiveError, Result};

/// The open reader behind a [`StreamHandle`], one variant per codec.
enum Decoder {
    None {
        reader: BufReader<File>,
        /// File length, for detecting seeks past the end.
        len: u64,
    },
    Gzip(BufReader<MultiGzDecoder<File>>),
    Bzip2(BufReader<MultiBzDecoder<File>>),
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decoder::None { len, .. } => f.debug_struct("None").field("len", len).finish(),
            Decoder::Gzip(_) => f.write_str("Gzip"),
            Decoder::Bzip2(_) => f.write_str("Bzip2"),
        }
    }
}

impl Decoder {
    fn open(path: &Path, compression: Compression) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(match compression {
            Compression::None => {
                let len = file.metadata()?.len();
                Decoder::None {
                    reader: BufReader::new(file),
                    len,
                }
            }
            Compression::Gzip => Decoder::Gzip(BufReader::new(MultiGzDecoder::new(file))),
            Compression::Bzip2 => Decoder::Bzip2(BufReader::new(MultiBzDecoder::new(file))),
        })
    }

    fn reader(&mut self) -> &mut dyn BufRead {
        match self {
            Decoder::None { reader, .. } => reader,
            Decoder::Gzip(reader) => reader,
            Decoder::Bzip2(reader) => reader,
        }
    }
}

/// A byte stream over one archive file.
///
/// The handle is closed by [`close`](StreamHandle::close) or on drop; closing
/// twice is harmless. Every other operation on a closed handle fails with
/// [`ArchiveError::Closed`].
#[derive(Debug)]
pub struct StreamHandle {
    path: PathBuf,
    compression: Compression,
    decoder: Option<Decoder>,
    pos: u64,
}

impl StreamHandle {
    /// Open `path` with the given codec.
    ///
    /// The first bytes are decoded eagerly, so a file that is not valid for
    /// the codec is rejected here rather than on the first read.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Open`] if the file cannot be opened or the
    /// codec rejects its data.
    pub fn open(path: impl AsRef<Path>, compression: Compression) -> Result<Self> {
        let path = path.as_ref();
        let open_error = |source| ArchiveError::Open {
            path: path.to_path_buf(),
            source,
        };

        let mut decoder = Decoder::open(path, compression).map_err(open_error)?;
        decoder.reader().fill_buf().map_err(open_error)?;

        debug!("opened {} ({compression})", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            compression,
            decoder: Some(decoder),
            pos: 0,
        })
    }

    /// Path this stream was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Codec in use.
    #[must_use]
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Current offset in the decompressed stream.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Whether [`close`](StreamHandle::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.decoder.is_none()
    }

    fn decoder(&mut self) -> Result<&mut Decoder> {
        self.decoder.as_mut().ok_or(ArchiveError::Closed)
    }

    /// Read up to `buf.len()` bytes, stopping early only at end of stream.
    ///
    /// Returns the number of bytes read.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::Closed`] or an I/O error from the file or codec.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let reader = self.decoder()?.reader();
        let mut total = 0;
        while total < buf.len() {
            match reader.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.pos += total as u64;
        Ok(total)
    }

    /// Fill `buf` completely.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::UnexpectedEof`] if the stream ends first.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let n = self.read(buf)?;
        if n < buf.len() {
            return Err(ArchiveError::UnexpectedEof { pos: self.pos });
        }
        Ok(())
    }

    /// Read one block, returning `false` if the stream ends before any byte
    /// of it.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::UnexpectedEof`] if the stream ends inside the block.
    pub fn read_block(&mut self, buf: &mut [u8]) -> Result<bool> {
        match self.read(buf)? {
            0 => Ok(false),
            n if n == buf.len() => Ok(true),
            _ => Err(ArchiveError::UnexpectedEof { pos: self.pos }),
        }
    }

    /// Move to an absolute offset in the decompressed stream.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::UnexpectedEof`] if `offset` is past the end of the
    /// stream, [`ArchiveError::Closed`], or an I/O error.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        let pos = self.pos;
        let Some(decoder) = self.decoder.as_mut() else {
            return Err(ArchiveError::Closed);
        };

        match decoder {
            Decoder::None { reader, len } => {
                if offset > *len {
                    return Err(ArchiveError::UnexpectedEof { pos: *len });
                }
                match (i64::try_from(offset), i64::try_from(pos)) {
                    (Ok(to), Ok(from)) => reader.seek_relative(to - from)?,
                    _ => {
                        reader.seek(SeekFrom::Start(offset))?;
                    }
                }
                self.pos = offset;
            }
            _ => {
                if offset < pos {
                    debug!("rewinding {} ({})", self.path.display(), self.compression);
                    *decoder = Decoder::open(&self.path, self.compression)?;
                    self.pos = 0;
                }
                let wanted = offset - self.pos;
                let skipped = io::copy(&mut decoder.reader().take(wanted), &mut io::sink())?;
                self.pos += skipped;
                if skipped < wanted {
                    return Err(ArchiveError::UnexpectedEof { pos: self.pos });
                }
            }
        }
        Ok(())
    }

    /// Move forward by `len` bytes.
    ///
    /// # Errors
    ///
    /// As for [`seek`](StreamHandle::seek).
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let target = self
            .pos
            .checked_add(len)
            .ok_or(ArchiveError::UnexpectedEof { pos: u64::MAX })?;
        self.seek(target)
    }

    /// Move back to the start of the stream.
    ///
    /// # Errors
    ///
    /// As for [`seek`](StreamHandle::seek).
    pub fn rewind(&mut self) -> Result<()> {
        self.seek(0)
    }

    /// Whether no decompressed bytes remain.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::Closed`] or an I/O error while peeking.
    pub fn eof(&mut self) -> Result<bool> {
        Ok(self.decoder()?.reader().fill_buf()?.is_empty())
    }

    /// Release the underlying file. Closing an already closed handle does
    /// nothing.
    pub fn close(&mut self) {
        if self.decoder.take().is_some() {
            debug!("closed {}", self.path.display());
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{bzip2, gzip, write_file};

    fn payload() -> Vec<u8> {
        (0..5000u32).map(|i| (i % 251) as u8).collect()
    }

    fn open_all(dir: &Path) -> Vec<StreamHandle> {
        let data = payload();
        [
            (write_file(dir, "plain.tar", &data), Compression::None),
            (write_file(dir, "packed.tar.gz", &gzip(&data)), Compression::Gzip),
            (write_file(dir, "packed.tar.bz2", &bzip2(&data)), Compression::Bzip2),
        ]
        .into_iter()
        .map(|(path, compression)| StreamHandle::open(path, compression).unwrap())
        .collect()
    }

    #[test]
    fn test_read_matches_payload() {
        let dir = tempfile::tempdir().unwrap();
        for mut stream in open_all(dir.path()) {
            let mut buf = vec![0u8; 6000];
            let n = stream.read(&mut buf).unwrap();
            assert_eq!(n, 5000, "{}", stream.compression());
            assert_eq!(&buf[..n], &payload()[..]);
            assert_eq!(stream.position(), 5000);
            assert!(stream.eof().unwrap());
        }
    }

    #[test]
    fn test_seek_forward_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let data = payload();
        for mut stream in open_all(dir.path()) {
            stream.seek(1000).unwrap();
            let mut buf = [0u8; 10];
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf[..], &data[1000..1010]);

            stream.seek(20).unwrap();
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf[..], &data[20..30]);
            assert_eq!(stream.position(), 30);

            stream.skip(70).unwrap();
            assert_eq!(stream.position(), 100);
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf[..], &data[100..110]);

            stream.rewind().unwrap();
            assert_eq!(stream.position(), 0);
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf[..], &data[..10]);
        }
    }

    #[test]
    fn test_seek_past_end() {
        let dir = tempfile::tempdir().unwrap();
        for mut stream in open_all(dir.path()) {
            let err = stream.seek(5001).unwrap_err();
            assert!(
                matches!(err, ArchiveError::UnexpectedEof { pos: 5000 }),
                "{}: {err}",
                stream.compression()
            );
        }
    }

    #[test]
    fn test_read_exact_short() {
        let dir = tempfile::tempdir().unwrap();
        for mut stream in open_all(dir.path()) {
            stream.seek(4990).unwrap();
            let mut buf = [0u8; 20];
            let err = stream.read_exact(&mut buf).unwrap_err();
            assert!(matches!(err, ArchiveError::UnexpectedEof { pos: 5000 }));
        }
    }

    #[test]
    fn test_read_block() {
        let dir = tempfile::tempdir().unwrap();
        for mut stream in open_all(dir.path()) {
            let mut block = [0u8; 512];
            // 5000 = 9 * 512 + 392
            for _ in 0..9 {
                assert!(stream.read_block(&mut block).unwrap());
            }
            let err = stream.read_block(&mut block).unwrap_err();
            assert!(matches!(err, ArchiveError::UnexpectedEof { .. }));
            assert!(!stream.read_block(&mut block).unwrap());
        }
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        for mut stream in open_all(dir.path()) {
            assert!(!stream.is_closed());
            stream.close();
            stream.close();
            assert!(stream.is_closed());

            let mut buf = [0u8; 4];
            assert!(matches!(stream.read(&mut buf), Err(ArchiveError::Closed)));
            assert!(matches!(stream.seek(0), Err(ArchiveError::Closed)));
            assert!(matches!(stream.eof(), Err(ArchiveError::Closed)));
        }
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.tar");
        let err = StreamHandle::open(&path, Compression::None).unwrap_err();
        match err {
            ArchiveError::Open { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_open_rejects_bad_codec_data() {
        let dir = tempfile::tempdir().unwrap();
        let junk = b"this is certainly not compressed data, just text".repeat(20);
        let gz = write_file(dir.path(), "junk.tar.gz", &junk);
        let bz = write_file(dir.path(), "junk.tar.bz2", &junk);
        assert!(matches!(
            StreamHandle::open(gz, Compression::Gzip),
            Err(ArchiveError::Open { .. })
        ));
        assert!(matches!(
            StreamHandle::open(bz, Compression::Bzip2),
            Err(ArchiveError::Open { .. })
        ));
    }

    #[test]
    fn test_empty_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "empty.tar", b"");
        let mut stream = StreamHandle::open(path, Compression::None).unwrap();
        assert!(stream.eof().unwrap());
        let mut block = [0u8; 512];
        assert!(!stream.read_block(&mut block).unwrap());
    }
}
