//! Reader configuration.

use crate::content::DEFAULT_BUFFER_SIZE;
use crate::error::{ArchiveError, Result};

/// Largest accepted read buffer size.
pub const MAX_BUFFER_SIZE: usize = isize::MAX as usize;

/// Options for an [`ArchiveReader`](crate::ArchiveReader).
///
/// # Example
///
/// ```
/// use ustar_reader::ReaderOptions;
///
/// // Use defaults
/// let options = ReaderOptions::default();
/// assert_eq!(options.buffer_size, 8195);
///
/// // Read content in 64 KiB chunks
/// let options = ReaderOptions::new().with_buffer_size(64 * 1024);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Chunk size for reading content under the Buffer and Push policies.
    ///
    /// Must be between 1 and [`MAX_BUFFER_SIZE`].
    ///
    /// Default: 8195 bytes.
    pub buffer_size: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ReaderOptions {
    /// Create `ReaderOptions` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content chunk size.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Check that every option is in range.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::InvalidBufferSize`] if the buffer size is zero or
    /// above [`MAX_BUFFER_SIZE`].
    pub fn validate(&self) -> Result<()> {
        validate_buffer_size(self.buffer_size)
    }
}

pub(crate) fn validate_buffer_size(size: usize) -> Result<()> {
    if size == 0 || size > MAX_BUFFER_SIZE {
        return Err(ArchiveError::InvalidBufferSize {
            size,
            max: MAX_BUFFER_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ReaderOptions::default();
        assert_eq!(options.buffer_size, 8195);
        assert_eq!(options, ReaderOptions::new());
        options.validate().unwrap();
    }

    #[test]
    fn test_buffer_size_bounds() {
        ReaderOptions::new().with_buffer_size(1).validate().unwrap();
        ReaderOptions::new()
            .with_buffer_size(MAX_BUFFER_SIZE)
            .validate()
            .unwrap();

        for size in [0, MAX_BUFFER_SIZE + 1, usize::MAX] {
            let err = ReaderOptions::new()
                .with_buffer_size(size)
                .validate()
                .unwrap_err();
            assert!(
                matches!(err, ArchiveError::InvalidBufferSize { size: s, max } if s == size && max == MAX_BUFFER_SIZE),
                "{size}: {err}"
            );
        }
    }
}
