//! Unicode-normalized string equality.
//!
//! E-book metadata comes from many sources (file headers, OPF metadata,
//! user input) that may carry the same text in different Unicode forms,
//! e.g. a precomposed "é" versus "e" plus a combining acute accent.
//! Plain `==` on such strings reports a difference where a reader sees
//! none. The functions here compare values after canonical composition
//! (NFC), optionally case-insensitively, so equivalent spellings match.
//!
//! # Examples
//!
//! ```
//! use ebook_utils::compare::{str_eq, unicode_eq};
//!
//! // Precomposed vs. decomposed accented characters compare equal
//! assert!(str_eq("café", "cafe\u{301}", false));
//!
//! // Case folding is applied before normalization when requested
//! assert!(str_eq("CAFÉ", "cafe\u{301}", true));
//!
//! // Non-string values are coerced to their textual representation
//! assert!(unicode_eq(123, "123", false).unwrap());
//! ```

use std::fmt::{Display, Write};

use unicode_normalization::UnicodeNormalization;

use crate::Result;

/// Compares two strings for equality after NFC normalization.
///
/// If `caseless` is true, both strings are lower-cased before they are
/// normalized, so `"ABC"` matches `"abc"`. With `caseless` false the
/// NFC forms are compared directly and letter case is significant.
///
/// This never allocates intermediate `String`s in the case-sensitive
/// path; the normalized character streams are compared directly.
///
/// # Examples
///
/// ```
/// use ebook_utils::compare::str_eq;
///
/// let cases = [
///     // (s1, s2, caseless, expected)
///     ("café", "cafe\u{301}", false, true),
///     ("ABC", "abc", true, true),
///     ("ABC", "abc", false, false),
///     ("", "", false, true),
/// ];
/// for (s1, s2, caseless, expected) in cases {
///     assert_eq!(str_eq(s1, s2, caseless), expected);
/// }
/// ```
pub fn str_eq(s1: &str, s2: &str, caseless: bool) -> bool {
    if caseless {
        // Lower-case first, then normalize, so case pairs that compose
        // differently still line up
        s1.to_lowercase().nfc().eq(s2.to_lowercase().nfc())
    } else {
        s1.nfc().eq(s2.nfc())
    }
}

/// Compares two values of any displayable type for textual equality
/// after NFC normalization.
///
/// Values that are not already strings are coerced through their
/// [`Display`] representation before comparison, so `unicode_eq(123,
/// "123", false)` holds. A `Display` implementation that fails surfaces
/// as [`UtilError::Format`](crate::UtilError::Format); the error is
/// propagated to the caller, not caught here.
///
/// # Errors
///
/// Returns an error if either value's textual conversion fails.
pub fn unicode_eq<A: Display, B: Display>(s1: A, s2: B, caseless: bool) -> Result<bool> {
    let str1 = text_of(&s1)?;
    let str2 = text_of(&s2)?;
    Ok(str_eq(&str1, &str2, caseless))
}

/// Captures a value's `Display` output, surfacing a failed conversion
/// as an error instead of panicking the way `ToString` would.
fn text_of(value: &dyn Display) -> Result<String> {
    let mut buf = String::new();
    write!(buf, "{}", value)?;
    Ok(buf)
}
