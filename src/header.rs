//! Zerocopy view of a ustar header block.
//!
//! # Header Field Layout
//!
//! | Offset | Size | Field     | Description                              |
//! |--------|------|-----------|------------------------------------------|
//! | 0      | 100  | name      | File path (null-terminated if < 100)     |
//! | 100    | 8    | mode      | File mode in octal ASCII                 |
//! | 108    | 8    | uid       | Owner user ID in octal ASCII             |
//! | 116    | 8    | gid       | Owner group ID in octal ASCII            |
//! | 124    | 12   | size      | File size in octal ASCII                 |
//! | 136    | 12   | mtime     | Modification time (Unix epoch, octal)    |
//! | 148    | 8    | checksum  | Header checksum in octal ASCII           |
//! | 156    | 1    | typeflag  | Entry type (see [`EntryType`])           |
//! | 157    | 100  | linkname  | Link target for hard/symbolic links      |
//! | 257    | 6    | magic     | "ustar\0" (GNU writes "ustar ")          |
//! | 263    | 2    | version   | "00"                                     |
//! | 265    | 32   | owner     | Owner user name                          |
//! | 297    | 32   | group     | Owner group name                         |
//! | 329    | 8    | devmajor  | Device major number                      |
//! | 337    | 8    | devminor  | Device minor number                      |
//! | 345    | 155  | prefix    | Path prefix for long names               |
//! | 500    | 12   | pad       | Unused                                   |
//!
//! Numeric fields are decoded strictly as octal ASCII. The GNU base-256
//! encoding (high bit of the first byte set) is recognized and rejected
//! rather than misread as octal.

use std::fmt;
use std::ops::Range;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::UnsupportedArchive;

/// Size of a tar block, and therefore of a header, in bytes.
pub const BLOCK_SIZE: usize = 512;

/// Prefix every accepted magic field starts with.
pub const USTAR_MAGIC_PREFIX: &[u8; 5] = b"ustar";

/// Byte range of the checksum field within the block.
pub const CHECKSUM_RANGE: Range<usize> = 148..156;

/// A 512-byte ustar header block with named fields.
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct UstarHeader {
    /// File path name (null-terminated if shorter than 100 bytes).
    pub name: [u8; 100],
    /// File mode in octal ASCII.
    pub mode: [u8; 8],
    /// Owner user ID in octal ASCII.
    pub uid: [u8; 8],
    /// Owner group ID in octal ASCII.
    pub gid: [u8; 8],
    /// File size in octal ASCII.
    pub size: [u8; 12],
    /// Modification time as Unix timestamp in octal ASCII.
    pub mtime: [u8; 12],
    /// Header checksum in octal ASCII.
    pub checksum: [u8; 8],
    /// Entry type flag.
    pub typeflag: u8,
    /// Link target name for hard/symbolic links.
    pub linkname: [u8; 100],
    /// Magic string identifying the format.
    pub magic: [u8; 6],
    /// Format version.
    pub version: [u8; 2],
    /// Owner user name (null-terminated).
    pub owner: [u8; 32],
    /// Owner group name (null-terminated).
    pub group: [u8; 32],
    /// Device major number in octal ASCII.
    pub devmajor: [u8; 8],
    /// Device minor number in octal ASCII.
    pub devminor: [u8; 8],
    /// Path prefix for names longer than 100 bytes.
    pub prefix: [u8; 155],
    /// Padding to fill the 512-byte block.
    pub pad: [u8; 12],
}

impl UstarHeader {
    /// View a block as a header.
    #[must_use]
    pub fn from_block(block: &[u8; BLOCK_SIZE]) -> &UstarHeader {
        zerocopy::transmute_ref!(block)
    }

    /// Whether the magic field starts with "ustar".
    ///
    /// Both POSIX ("ustar\0") and GNU ("ustar ") headers qualify.
    #[must_use]
    pub fn is_ustar(&self) -> bool {
        self.magic.starts_with(USTAR_MAGIC_PREFIX)
    }

    /// Get the checksum stored in the header.
    ///
    /// # Errors
    ///
    /// Fails if the field is not valid octal.
    pub fn stored_checksum(&self) -> Result<u64, UnsupportedArchive> {
        parse_octal("checksum", &self.checksum)
    }

    /// Compute the header checksum.
    ///
    /// This is the unsigned sum of all header bytes, treating the checksum
    /// field (bytes 148..156) as spaces (0x20).
    #[must_use]
    pub fn compute_checksum(&self) -> u64 {
        self.as_bytes()
            .iter()
            .enumerate()
            .map(|(i, &byte)| {
                if CHECKSUM_RANGE.contains(&i) {
                    u64::from(b' ')
                } else {
                    u64::from(byte)
                }
            })
            .sum()
    }

    /// Get the entry size (file content length) in bytes.
    ///
    /// # Errors
    ///
    /// Fails on invalid octal or binary encoding.
    pub fn entry_size(&self) -> Result<u64, UnsupportedArchive> {
        parse_octal("size", &self.size)
    }

    /// Get the file mode.
    ///
    /// # Errors
    ///
    /// Fails on invalid octal, binary encoding, or a value wider than 32 bits.
    pub fn mode(&self) -> Result<u32, UnsupportedArchive> {
        parse_octal_u32("mode", &self.mode)
    }

    /// Get the owner user ID.
    ///
    /// # Errors
    ///
    /// Fails on invalid octal or binary encoding.
    pub fn uid(&self) -> Result<u64, UnsupportedArchive> {
        parse_octal("uid", &self.uid)
    }

    /// Get the owner group ID.
    ///
    /// # Errors
    ///
    /// Fails on invalid octal or binary encoding.
    pub fn gid(&self) -> Result<u64, UnsupportedArchive> {
        parse_octal("gid", &self.gid)
    }

    /// Get the modification time as a Unix timestamp.
    ///
    /// # Errors
    ///
    /// Fails on invalid octal or binary encoding.
    pub fn mtime(&self) -> Result<u64, UnsupportedArchive> {
        parse_octal("mtime", &self.mtime)
    }

    /// Get the device major number.
    ///
    /// # Errors
    ///
    /// Fails on invalid octal, binary encoding, or a value wider than 32 bits.
    pub fn device_major(&self) -> Result<u32, UnsupportedArchive> {
        parse_octal_u32("devmajor", &self.devmajor)
    }

    /// Get the device minor number.
    ///
    /// # Errors
    ///
    /// Fails on invalid octal, binary encoding, or a value wider than 32 bits.
    pub fn device_minor(&self) -> Result<u32, UnsupportedArchive> {
        parse_octal_u32("devminor", &self.devminor)
    }

    /// Get the entry type.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        EntryType::from_byte(self.typeflag)
    }
}

impl fmt::Debug for UstarHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UstarHeader")
            .field("name", &String::from_utf8_lossy(truncate_null(&self.name)))
            .field("mode", &String::from_utf8_lossy(truncate_null(&self.mode)))
            .field("typeflag", &self.typeflag)
            .field("magic", &self.magic)
            .field(
                "prefix",
                &String::from_utf8_lossy(truncate_null(&self.prefix)),
            )
            .finish_non_exhaustive()
    }
}

/// Kind of archive entry, as seen through the reader's type-flag vocabulary.
///
/// Type flags '3' through '7' (character and block devices, directories,
/// FIFOs, contiguous files) all map to [`EntryType::Symlink`]. Use the raw
/// [`Record::typeflag`] byte to tell them apart.
///
/// [`Record::typeflag`]: crate::Record::typeflag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file (type '0' or '\0' for old tar compatibility).
    Regular,
    /// Hard link to another file in the archive (type '1').
    HardLink,
    /// Symbolic link (type '2'), and types '3' through '7'.
    Symlink,
    /// PAX global extended header (type 'g').
    GlobalHeader,
    /// PAX extended header for the next entry (type 'x').
    ExtendedHeader,
    /// GNU tar long link extension (type 'K').
    GnuLongLink,
    /// Any other type flag.
    Other(u8),
}

impl EntryType {
    /// Classify a raw type flag byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'0' | b'\0' => EntryType::Regular,
            b'1' => EntryType::HardLink,
            b'2'..=b'7' => EntryType::Symlink,
            b'g' => EntryType::GlobalHeader,
            b'x' => EntryType::ExtendedHeader,
            b'K' => EntryType::GnuLongLink,
            other => EntryType::Other(other),
        }
    }

    /// Returns true for the extension header kinds ('g', 'x', 'K').
    ///
    /// The reader hands these out as ordinary records; merging them into the
    /// following entry is left to the caller.
    #[must_use]
    pub fn is_extension(self) -> bool {
        matches!(
            self,
            EntryType::GlobalHeader | EntryType::ExtendedHeader | EntryType::GnuLongLink
        )
    }
}

impl From<u8> for EntryType {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

/// Parse an octal ASCII field into a u64.
///
/// Octal fields are ASCII strings with optional leading spaces and trailing
/// spaces or null bytes:
/// - `"0000644\0"` -> 420
/// - `"     123 "` -> 83
/// - all NUL -> 0
///
/// # Errors
///
/// - [`UnsupportedArchive::BinaryNumeric`] if the first byte has its high bit
///   set (GNU base-256).
/// - [`UnsupportedArchive::InvalidOctal`] for anything other than spaces,
///   digits 0-7 and null bytes.
/// - [`UnsupportedArchive::Overflow`] if the value does not fit in 64 bits.
pub fn parse_octal(field: &'static str, bytes: &[u8]) -> Result<u64, UnsupportedArchive> {
    if bytes.first().is_some_and(|&b| b & 0x80 != 0) {
        return Err(UnsupportedArchive::BinaryNumeric { field });
    }

    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let end = bytes[start..]
        .iter()
        .position(|&b| b == b' ' || b == b'\0')
        .map_or(bytes.len(), |i| start + i);

    let mut value: u64 = 0;
    for &byte in &bytes[start..end] {
        if !(b'0'..=b'7').contains(&byte) {
            return Err(UnsupportedArchive::InvalidOctal {
                field,
                bytes: bytes.to_vec(),
            });
        }
        value = value
            .checked_mul(8)
            .and_then(|v| v.checked_add(u64::from(byte - b'0')))
            .ok_or(UnsupportedArchive::Overflow { field, bits: 64 })?;
    }

    Ok(value)
}

fn parse_octal_u32(field: &'static str, bytes: &[u8]) -> Result<u32, UnsupportedArchive> {
    let value = parse_octal(field, bytes)?;
    u32::try_from(value).map_err(|_| UnsupportedArchive::Overflow { field, bits: 32 })
}

/// Truncate a byte slice at the first null byte.
///
/// ```
/// use ustar_reader::header::truncate_null;
///
/// assert_eq!(truncate_null(b"hello\0world"), b"hello");
/// assert_eq!(truncate_null(b"no null here"), b"no null here");
/// ```
#[must_use]
pub fn truncate_null(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}
