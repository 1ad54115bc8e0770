//! Case-folded string utilities
//!
//! Comparison, hashing, and substring search over byte strings with an
//! ASCII case-folding table. The fold table maps each byte to its
//! canonical case independent of locale; everything outside `A-Z` maps to
//! itself, so the functions are binary-safe.
//!
//! Index results follow the scripting language's 1-based convention:
//! 0 means "not found".

use hearth_core::Stream;
use std::cmp::Ordering;

/// ASCII case-fold table: maps each byte to its canonical (lower) case.
pub const CASE_FOLD: [u8; 256] = build_fold_table();

const fn build_fold_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        table[i] = if b.is_ascii_uppercase() {
            b.to_ascii_lowercase()
        } else {
            b
        };
        i += 1;
    }
    table
}

/// Fold a single byte to canonical case.
#[inline]
pub fn fold(b: u8) -> u8 {
    CASE_FOLD[b as usize]
}

/// Case-folded byte-string comparison.
pub fn casecmp(a: &[u8], b: &[u8]) -> Ordering {
    let n = a.len().min(b.len());
    for i in 0..n {
        match fold(a[i]).cmp(&fold(b[i])) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Case-folded comparison of at most the first `n` bytes.
pub fn ncasecmp(a: &[u8], b: &[u8], n: usize) -> Ordering {
    casecmp(&a[..a.len().min(n)], &b[..b.len().min(n)])
}

/// Case-folded equality of byte strings.
#[inline]
pub fn caseeq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && casecmp(a, b) == Ordering::Equal
}

/// Case-insensitive string hash over the fold table.
pub fn str_hash(s: &str) -> u32 {
    let mut ans: u32 = 0;
    for &b in s.as_bytes() {
        ans = ans
            .wrapping_shl(3)
            .wrapping_add(ans.wrapping_shr(28))
            .wrapping_add(u32::from(fold(b)));
    }
    ans
}

#[inline]
fn matches_at(source: &[u8], at: usize, what: &[u8], case_matters: bool) -> bool {
    let window = &source[at..at + what.len()];
    if case_matters {
        window == what
    } else {
        caseeq(window, what)
    }
}

/// 1-based index of the first occurrence of `what` in `source`, 0 if absent.
///
/// An empty pattern matches at position 1, like the original search.
pub fn strindex(source: &str, what: &str, case_matters: bool) -> usize {
    let (src, w) = (source.as_bytes(), what.as_bytes());
    if w.len() > src.len() {
        return 0;
    }
    for at in 0..=(src.len() - w.len()) {
        if matches_at(src, at, w, case_matters) {
            return at + 1;
        }
    }
    0
}

/// 1-based index of the last occurrence of `what` in `source`, 0 if absent.
pub fn strrindex(source: &str, what: &str, case_matters: bool) -> usize {
    let (src, w) = (source.as_bytes(), what.as_bytes());
    if w.len() > src.len() {
        return 0;
    }
    for at in (0..=(src.len() - w.len())).rev() {
        if matches_at(src, at, w, case_matters) {
            return at + 1;
        }
    }
    0
}

/// Append `source` to `stream` with every occurrence of `what` replaced by
/// `with`.
pub fn stream_add_strsub(
    stream: &mut Stream,
    source: &str,
    what: &str,
    with: &str,
    case_matters: bool,
) {
    // An empty pattern never advances the scan; pass the source through.
    if what.is_empty() {
        stream.add_string(source);
        return;
    }
    let src = source.as_bytes();
    let w = what.as_bytes();
    let mut at = 0;
    while at < src.len() {
        if at + w.len() <= src.len() && matches_at(src, at, w, case_matters) {
            stream.add_string(with);
            at += w.len();
        } else {
            stream.add_byte(src[at]);
            at += 1;
        }
    }
}

/// Substitute every occurrence of `what` in `source` with `with`.
pub fn strsub(source: &str, what: &str, with: &str, case_matters: bool) -> String {
    let mut stream = Stream::new(source.len());
    stream_add_strsub(&mut stream, source, what, with, case_matters);
    String::from_utf8(stream.take()).expect("substitution of UTF-8 inputs is UTF-8")
}

/// Match a `word` against a verb-name pattern.
///
/// The pattern is a space-separated list of names, each optionally
/// containing one `*`: characters before the star must match exactly
/// (case-folded), characters after it are optional. A trailing star
/// matches any completion.
pub fn verbcasecmp(verb: &str, word: &str) -> bool {
    #[derive(PartialEq)]
    enum Star {
        None,
        Inner,
        End,
    }

    let verb = verb.as_bytes();
    let word = word.as_bytes();
    let mut v = 0;

    while v < verb.len() {
        let mut w = 0;
        let mut star = Star::None;
        loop {
            while v < verb.len() && verb[v] == b'*' {
                v += 1;
                star = if v >= verb.len() || verb[v] == b' ' {
                    Star::End
                } else {
                    Star::Inner
                };
            }
            if v >= verb.len() || verb[v] == b' ' || w >= word.len() || fold(word[w]) != fold(verb[v])
            {
                break;
            }
            w += 1;
            v += 1;
        }
        let matched = if w >= word.len() {
            star != Star::None || v >= verb.len() || verb[v] == b' '
        } else {
            star == Star::End
        };
        if matched {
            return true;
        }
        while v < verb.len() && verb[v] != b' ' {
            v += 1;
        }
        while v < verb.len() && verb[v] == b' ' {
            v += 1;
        }
    }
    false
}
