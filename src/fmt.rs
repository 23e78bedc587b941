//! Debug formatting helpers used by generated code.

use core::fmt;

/// String slots longer than this render as `(N chars)`.
const MAX_DEBUG_STRING_CHARS: usize = 10_000;

/// Byte slots longer than this render as `(N bytes)`.
const MAX_DEBUG_BYTES: usize = 100;

/// Debug wrapper for string slots; abbreviates pathologically long values.
pub struct TruncatedStr<'a>(pub &'a str);

impl fmt::Debug for TruncatedStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chars = self.0.chars().count();
        if chars > MAX_DEBUG_STRING_CHARS {
            write!(f, "({} chars)", chars)
        } else {
            fmt::Debug::fmt(self.0, f)
        }
    }
}

/// Debug wrapper for byte slots; abbreviates pathologically long values.
pub struct TruncatedBytes<'a>(pub &'a [u8]);

impl fmt::Debug for TruncatedBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() > MAX_DEBUG_BYTES {
            return write!(f, "({} bytes)", self.0.len());
        }
        f.write_str("b\"")?;
        for &byte in self.0 {
            for escaped in core::ascii::escape_default(byte) {
                fmt::Write::write_char(f, escaped as char)?;
            }
        }
        f.write_str("\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_values_print_in_full() {
        assert_eq!(format!("{:?}", TruncatedStr("hi")), "\"hi\"");
        assert_eq!(format!("{:?}", TruncatedBytes(&[0x68, 0x00])), "b\"h\\x00\"");
    }

    #[test]
    fn long_values_abbreviate() {
        let s = "x".repeat(10_001);
        assert_eq!(format!("{:?}", TruncatedStr(&s)), "(10001 chars)");

        let b = vec![0u8; 101];
        assert_eq!(format!("{:?}", TruncatedBytes(&b)), "(101 bytes)");
    }
}
