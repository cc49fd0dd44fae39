//! Decoded archive records.

use std::borrow::Cow;

use log::trace;

use crate::content::padding;
use crate::error::{ArchiveError, Result, UnsupportedArchive};
use crate::header::{truncate_null, EntryType, UstarHeader, BLOCK_SIZE};

/// One archive entry: the decoded header plus, under the Buffer policy, its
/// content.
///
/// Byte fields are copied out of the header with trailing NULs removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Offset of the header block in the decompressed stream.
    pub offset: u64,

    /// The `name` field.
    pub name: Vec<u8>,

    /// The `prefix` field.
    pub prefix: Vec<u8>,

    /// The `prefix` field followed directly by the `name` field.
    ///
    /// Writers that split a path usually leave the separating `/` at the end
    /// of the prefix; see [`Record::path`] for a joined form that adds one
    /// when it is missing.
    pub filename: Vec<u8>,

    /// File mode/permissions.
    pub mode: u32,

    /// Owner user ID.
    pub uid: u64,

    /// Owner group ID.
    pub gid: u64,

    /// Content size in bytes.
    pub size: u64,

    /// Modification time as Unix timestamp.
    pub mtime: u64,

    /// Checksum stored in the header (already verified).
    pub checksum: u64,

    /// Raw type flag byte.
    pub typeflag: u8,

    /// Link target for hard and symbolic links.
    pub linkname: Vec<u8>,

    /// Raw magic field, "ustar\0" or "ustar ".
    pub magic: [u8; 6],

    /// Raw version field.
    pub version: [u8; 2],

    /// Owner user name.
    pub owner: Vec<u8>,

    /// Owner group name.
    pub group: Vec<u8>,

    /// Device major number.
    pub device_major: u32,

    /// Device minor number.
    pub device_minor: u32,

    /// Entry content, present only under [`ContentPolicy::Buffer`].
    ///
    /// [`ContentPolicy::Buffer`]: crate::ContentPolicy::Buffer
    pub contents: Option<Vec<u8>>,
}

impl Record {
    /// Decode a header block found at `offset`.
    ///
    /// Returns `Ok(None)` for the archive terminator, i.e. a block whose
    /// checksum field decodes to zero. The checksum is verified before the
    /// magic and the other numeric fields, so any damage to the block outside
    /// the checksum field is reported as [`ArchiveError::CorruptArchive`].
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::CorruptArchive`] on a checksum mismatch.
    /// - [`ArchiveError::UnsupportedArchive`] for a non-ustar magic or an
    ///   undecodable numeric field.
    pub fn decode(block: &[u8; BLOCK_SIZE], offset: u64) -> Result<Option<Record>> {
        let header = UstarHeader::from_block(block);

        let checksum = header.stored_checksum()?;
        if checksum == 0 {
            return Ok(None);
        }

        let computed = header.compute_checksum();
        if checksum != computed {
            return Err(ArchiveError::CorruptArchive {
                offset,
                expected: checksum,
                computed,
            });
        }

        if !header.is_ustar() {
            return Err(UnsupportedArchive::Magic(header.magic).into());
        }

        let name = truncate_null(&header.name).to_vec();
        let prefix = truncate_null(&header.prefix).to_vec();
        let mut filename = Vec::with_capacity(prefix.len() + name.len());
        filename.extend_from_slice(&prefix);
        filename.extend_from_slice(&name);

        let record = Record {
            offset,
            name,
            prefix,
            filename,
            mode: header.mode()?,
            uid: header.uid()?,
            gid: header.gid()?,
            size: header.entry_size()?,
            mtime: header.mtime()?,
            checksum,
            typeflag: header.typeflag,
            linkname: truncate_null(&header.linkname).to_vec(),
            magic: header.magic,
            version: header.version,
            owner: truncate_null(&header.owner).to_vec(),
            group: truncate_null(&header.group).to_vec(),
            device_major: header.device_major()?,
            device_minor: header.device_minor()?,
            contents: None,
        };
        trace!(
            "decoded {:?} at {offset}: type {:?}, {} bytes",
            record.filename_lossy(),
            record.entry_type(),
            record.size
        );
        Ok(Some(record))
    }

    /// Get the entry type.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        EntryType::from_byte(self.typeflag)
    }

    /// Get the path with prefix and name joined by exactly one `/`.
    ///
    /// Equal to [`filename`](Record::filename) unless the prefix is
    /// non-empty and does not already end in `/`.
    #[must_use]
    pub fn path(&self) -> Cow<'_, [u8]> {
        if self.prefix.is_empty() || self.prefix.ends_with(b"/") {
            return Cow::Borrowed(&self.filename);
        }
        let mut full_path = Vec::with_capacity(self.prefix.len() + 1 + self.name.len());
        full_path.extend_from_slice(&self.prefix);
        full_path.push(b'/');
        full_path.extend_from_slice(&self.name);
        Cow::Owned(full_path)
    }

    /// Get the filename as a lossy UTF-8 string.
    #[must_use]
    pub fn filename_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.filename)
    }

    /// Get the link target as a lossy UTF-8 string, if present.
    #[must_use]
    pub fn linkname_lossy(&self) -> Option<Cow<'_, str>> {
        (!self.linkname.is_empty()).then(|| String::from_utf8_lossy(&self.linkname))
    }

    /// Check if this is a regular file entry.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.entry_type() == EntryType::Regular
    }

    /// Check if this is a hard link entry.
    #[must_use]
    pub fn is_hard_link(&self) -> bool {
        self.entry_type() == EntryType::HardLink
    }

    /// Check if this is a symbolic link entry (see [`EntryType`] for the
    /// other type flags that share this classification).
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.entry_type() == EntryType::Symlink
    }

    /// Check if this is a 'g', 'x' or 'K' extension record.
    #[must_use]
    pub fn is_extension(&self) -> bool {
        self.entry_type().is_extension()
    }

    /// Number of padding bytes after the content.
    #[must_use]
    pub fn padding(&self) -> u64 {
        padding(self.size)
    }

    /// Size of the content region: content plus padding.
    #[must_use]
    pub fn content_region(&self) -> u64 {
        self.size + self.padding()
    }
}
