//! Binary-safe byte codec
//!
//! Network and database layers exchange raw byte buffers as "binary
//! strings": printable ASCII and space pass through unchanged, every other
//! byte (and the escape marker itself) becomes `~` followed by two
//! uppercase hex digits. Decoding accepts hex digits of either case and
//! refuses the whole input on a truncated or malformed escape. The clean
//! transform is the lossy sibling: it keeps the pass-through subset and
//! drops everything else, for display paths that never decode.

use hearth_core::Stream;
use std::fmt::Write;

fn passes_through(b: u8) -> bool {
    b != b'~' && (b.is_ascii_graphic() || b == b' ')
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Append only the clean subset of `bytes` (printable ASCII and space) to
/// a caller-owned stream, dropping everything else.
pub fn stream_add_clean_bytes(s: &mut Stream, bytes: &[u8]) {
    for &b in bytes {
        if b.is_ascii_graphic() || b == b' ' {
            s.add_byte(b);
        }
    }
}

/// Strip `bytes` down to its clean subset.
pub fn clean_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut s = Stream::new(bytes.len());
    stream_add_clean_bytes(&mut s, bytes);
    s.take()
}

/// Append the binary-string encoding of `bytes` to a caller-owned stream.
pub fn stream_add_raw_bytes_to_binary(s: &mut Stream, bytes: &[u8]) {
    for &b in bytes {
        if passes_through(b) {
            s.add_byte(b);
        } else {
            // Stream's fmt::Write never fails.
            let _ = write!(s, "~{b:02X}");
        }
    }
}

/// Encode `bytes` as a binary string.
pub fn raw_bytes_to_binary(bytes: &[u8]) -> String {
    let mut s = Stream::new(bytes.len());
    stream_add_raw_bytes_to_binary(&mut s, bytes);
    String::from_utf8(s.take()).expect("binary encoding is pure ASCII")
}

/// Decode a binary string back to raw bytes.
///
/// Returns `None` without partial output if any escape is truncated or
/// contains a non-hex digit. Unescaped bytes pass through unchecked.
pub fn binary_to_raw_bytes(binary: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(binary.len());
    let mut i = 0;
    while i < binary.len() {
        let b = binary[i];
        if b != b'~' {
            out.push(b);
            i += 1;
        } else {
            let hi = hex_digit(*binary.get(i + 1)?)?;
            let lo = hex_digit(*binary.get(i + 2)?)?;
            out.push((hi << 4) | lo);
            i += 3;
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_passes_through() {
        assert_eq!(raw_bytes_to_binary(b"foo bar!"), "foo bar!");
    }

    #[test]
    fn test_marker_and_controls_escape_uppercase() {
        assert_eq!(raw_bytes_to_binary(b"~"), "~7E");
        assert_eq!(raw_bytes_to_binary(b"a\nb\x00"), "a~0Ab~00");
    }

    #[test]
    fn test_decode_accepts_either_case() {
        assert_eq!(binary_to_raw_bytes(b"~0a~0A").as_deref(), Some(&b"\n\n"[..]));
    }

    #[test]
    fn test_round_trip_every_byte() {
        let all: Vec<u8> = (0u8..=255).collect();
        let encoded = raw_bytes_to_binary(&all);
        assert_eq!(binary_to_raw_bytes(encoded.as_bytes()).as_deref(), Some(&all[..]));
    }

    #[test]
    fn test_truncated_escape_fails_with_no_output() {
        assert_eq!(binary_to_raw_bytes(b"abc~"), None);
        assert_eq!(binary_to_raw_bytes(b"abc~4"), None);
    }

    #[test]
    fn test_bad_hex_digit_fails() {
        assert_eq!(binary_to_raw_bytes(b"~4g"), None);
        assert_eq!(binary_to_raw_bytes(b"~zz"), None);
    }

    #[test]
    fn test_clean_drops_unprintables() {
        assert_eq!(clean_bytes(b"a\x01b c\xffd"), b"ab cd");
    }

    #[test]
    fn test_stream_variant_appends() {
        let mut s = Stream::new(8);
        s.add_string("prefix:");
        stream_add_raw_bytes_to_binary(&mut s, b"\x7f");
        assert_eq!(s.contents(), b"prefix:~7F");
    }
}
