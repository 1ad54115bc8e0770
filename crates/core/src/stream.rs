//! Growable byte stream
//!
//! A small accumulation buffer for building strings and byte sequences
//! without repeated allocation: hot conversion paths (the binary-safe byte
//! codec, string substitution) keep one `Stream` around and `clear` it
//! between uses, so capacity is paid for once.
//!
//! The buffer is explicitly caller-owned (or pooled at the call site via a
//! thread-local) rather than hidden global state.

use std::fmt;

/// Growable byte accumulation buffer that retains capacity across uses.
#[derive(Debug)]
pub struct Stream {
    buf: Vec<u8>,
}

impl Stream {
    /// Create a stream with the given initial capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append a single byte.
    #[inline]
    pub fn add_byte(&mut self, b: u8) {
        self.buf.push(b);
    }

    /// Append a byte slice.
    #[inline]
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append the UTF-8 bytes of a string.
    #[inline]
    pub fn add_string(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Accumulated length in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the accumulated contents.
    pub fn contents(&self) -> &[u8] {
        &self.buf
    }

    /// Discard accumulated contents, keeping the buffer's capacity.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Take the accumulated contents as an owned vector.
    ///
    /// The stream is left empty. Unlike `clear`, capacity moves out with
    /// the contents; use this when handing off the final result rather
    /// than between reuses.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

impl fmt::Write for Stream {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.add_string(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    #[test]
    fn test_accumulate_and_clear() {
        let mut s = Stream::new(16);
        s.add_string("abc");
        s.add_byte(b'd');
        s.add_bytes(b"ef");
        assert_eq!(s.contents(), b"abcdef");
        assert_eq!(s.len(), 6);

        s.clear();
        assert!(s.is_empty());
        s.add_string("next");
        assert_eq!(s.contents(), b"next");
    }

    #[test]
    fn test_clear_retains_capacity() {
        let mut s = Stream::new(4);
        s.add_bytes(&[0u8; 256]);
        let cap = s.buf.capacity();
        s.clear();
        assert_eq!(s.buf.capacity(), cap);
    }

    #[test]
    fn test_fmt_write() {
        let mut s = Stream::new(8);
        write!(s, "~{:02X}", 0x0Au8).unwrap();
        assert_eq!(s.contents(), b"~0A");
    }

    #[test]
    fn test_take_leaves_empty() {
        let mut s = Stream::new(8);
        s.add_string("payload");
        assert_eq!(s.take(), b"payload");
        assert!(s.is_empty());
    }
}
