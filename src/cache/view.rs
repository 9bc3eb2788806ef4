//! Immutable byte payloads handed out by the cache.

use std::borrow::Cow;

use bytes::Bytes;

/// Read-only view over a cached value.
///
/// Cloning is cheap (reference-counted) and the underlying buffer is never
/// exposed mutably: [`ByteView::as_slice`] returns a fresh copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    /// Number of bytes in the value.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns a defensive copy of the value.
    ///
    /// Mutating the returned buffer has no effect on the cached value.
    pub fn as_slice(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Renders the value as text, replacing invalid UTF-8.
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(value: Vec<u8>) -> Self {
        Self {
            bytes: Bytes::from(value),
        }
    }
}

impl From<&[u8]> for ByteView {
    fn from(value: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(value),
        }
    }
}

impl From<&str> for ByteView {
    fn from(value: &str) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(value.as_bytes()),
        }
    }
}
