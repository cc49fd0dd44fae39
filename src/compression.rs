//! Codec selection from the archive filename.

use std::fmt;
use std::path::Path;

use crate::error::{ArchiveError, Result};

/// Byte-stream codec wrapped around the tar data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Compression {
    /// gzip (`.tar.gz`, `.tgz`).
    Gzip,
    /// bzip2 (`.tar.bz2`, `.tbz`, `.tb2`).
    Bzip2,
    /// Plain tar (`.tar`).
    None,
}

/// Recognized filename suffixes, checked in order.
const SUFFIXES: &[(&str, Compression)] = &[
    (".tar.gz", Compression::Gzip),
    (".tgz", Compression::Gzip),
    (".tar.bz2", Compression::Bzip2),
    (".tbz", Compression::Bzip2),
    (".tb2", Compression::Bzip2),
    (".tar", Compression::None),
];

impl Compression {
    /// Pick the codec for `path` by its suffix.
    ///
    /// Matching is case-sensitive and looks only at the name; the file is not
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::UnsupportedCompression`] if no suffix matches.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = path.as_os_str().as_encoded_bytes();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| bytes.ends_with(suffix.as_bytes()))
            .map(|&(_, compression)| compression)
            .ok_or_else(|| ArchiveError::UnsupportedCompression(path.to_path_buf()))
    }

    /// Short name of the codec.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
            Compression::None => "none",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
