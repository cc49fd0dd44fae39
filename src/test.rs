//! Fixture builders for unit tests.
//!
//! [`HeaderBuilder`] writes ustar blocks field by field so tests can produce
//! archives the `tar` crate refuses to write (bad magic, odd padding, bare
//! terminators).

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::header::{UstarHeader, BLOCK_SIZE, CHECKSUM_RANGE};

/// Builds a single ustar header block with a valid checksum.
#[derive(Debug, Clone)]
pub(crate) struct HeaderBuilder {
    block: [u8; BLOCK_SIZE],
}

impl HeaderBuilder {
    /// A regular file header with mode 0644 and everything else zeroed.
    pub(crate) fn new(name: &str) -> Self {
        let mut builder = Self {
            block: [0u8; BLOCK_SIZE],
        };
        builder.put_bytes(0..100, name.as_bytes());
        builder.block[257..263].copy_from_slice(b"ustar\0");
        builder.block[263..265].copy_from_slice(b"00");
        builder.block[156] = b'0';
        builder
            .mode(0o644)
            .uid(0)
            .gid(0)
            .size(0)
            .mtime(0)
            .devices(0, 0)
    }

    pub(crate) fn mode(mut self, mode: u32) -> Self {
        self.put_octal(100..108, u64::from(mode));
        self
    }

    pub(crate) fn uid(mut self, uid: u64) -> Self {
        self.put_octal(108..116, uid);
        self
    }

    pub(crate) fn gid(mut self, gid: u64) -> Self {
        self.put_octal(116..124, gid);
        self
    }

    pub(crate) fn size(mut self, size: u64) -> Self {
        self.put_octal(124..136, size);
        self
    }

    pub(crate) fn mtime(mut self, mtime: u64) -> Self {
        self.put_octal(136..148, mtime);
        self
    }

    pub(crate) fn typeflag(mut self, flag: u8) -> Self {
        self.block[156] = flag;
        self
    }

    pub(crate) fn linkname(mut self, target: &str) -> Self {
        self.put_bytes(157..257, target.as_bytes());
        self
    }

    pub(crate) fn magic(mut self, magic: &[u8; 6], version: &[u8; 2]) -> Self {
        self.block[257..263].copy_from_slice(magic);
        self.block[263..265].copy_from_slice(version);
        self
    }

    pub(crate) fn owner(mut self, owner: &str) -> Self {
        self.put_bytes(265..297, owner.as_bytes());
        self
    }

    pub(crate) fn group(mut self, group: &str) -> Self {
        self.put_bytes(297..329, group.as_bytes());
        self
    }

    pub(crate) fn devices(mut self, major: u32, minor: u32) -> Self {
        self.put_octal(329..337, u64::from(major));
        self.put_octal(337..345, u64::from(minor));
        self
    }

    pub(crate) fn prefix(mut self, prefix: &str) -> Self {
        self.put_bytes(345..500, prefix.as_bytes());
        self
    }

    /// Finish the block, filling in the checksum.
    pub(crate) fn build(self) -> [u8; BLOCK_SIZE] {
        Self::reseal(self.block)
    }

    /// Recompute the checksum of an already edited block.
    pub(crate) fn reseal(mut block: [u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
        let sum = UstarHeader::from_block(&block).compute_checksum();
        // GNU tar style: six digits, NUL, space
        let field = format!("{sum:06o}\0 ");
        block[CHECKSUM_RANGE].copy_from_slice(field.as_bytes());
        block
    }

    fn put_bytes(&mut self, range: std::ops::Range<usize>, value: &[u8]) {
        assert!(value.len() <= range.len(), "field overflow");
        self.block[range.clone()].fill(0);
        self.block[range.start..range.start + value.len()].copy_from_slice(value);
    }

    fn put_octal(&mut self, range: std::ops::Range<usize>, value: u64) {
        let width = range.len() - 1;
        let field = format!("{value:0width$o}\0");
        assert_eq!(field.len(), range.len(), "octal value too wide");
        self.block[range].copy_from_slice(field.as_bytes());
    }
}

/// Assembles header blocks and content into an archive image.
#[derive(Debug, Default)]
pub(crate) struct ArchiveBuilder {
    data: Vec<u8>,
}

impl ArchiveBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a raw block, unpadded content, and the padding.
    pub(crate) fn entry(mut self, header: [u8; BLOCK_SIZE], content: &[u8]) -> Self {
        self.data.extend_from_slice(&header);
        self.data.extend_from_slice(content);
        let padded = content.len().next_multiple_of(BLOCK_SIZE);
        self.data.resize(self.data.len() + padded - content.len(), 0);
        self
    }

    /// Append a regular file.
    pub(crate) fn file(self, name: &str, content: &[u8]) -> Self {
        let header = HeaderBuilder::new(name).size(content.len() as u64).build();
        self.entry(header, content)
    }

    /// Append the usual two zero blocks and return the image.
    pub(crate) fn finish(mut self) -> Vec<u8> {
        self.data.resize(self.data.len() + 2 * BLOCK_SIZE, 0);
        self.data
    }

    /// Return the image without any terminator.
    pub(crate) fn unterminated(self) -> Vec<u8> {
        self.data
    }
}

/// Write `data` to `dir/name` and return the path.
pub(crate) fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Gzip-compress `data`.
pub(crate) fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Bzip2-compress `data`.
pub(crate) fn bzip2(data: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}
