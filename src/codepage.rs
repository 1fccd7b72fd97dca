//! Mapping between the on-disk code page byte (header offset 29) and a
//! concrete text encoding, grounded in `QDbfTable::setCodepage`/`codepage()`.

use crate::encoding::{DynEncoding, Encoding, UnicodeLossy};
use crate::error::{DecodeError, EncodeError};
use std::borrow::Cow;

/// The code pages this engine recognizes.
///
/// Each variant maps to exactly one on-disk byte; there is no fall-through
/// between variants (the source's `setCodepage` switch falls through from
/// `CodepageNotSet` into `IBM866`, which is specified here as a bug: a
/// not-set table must write back byte `0x00`, not `0x26`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Codepage {
    NotSet,
    IBM437,
    IBM850,
    Windows1252,
    IBM866,
    GB18030,
    Windows1250,
    Windows1251,
    /// A recognized-but-unsupported byte: best-effort (lossy UTF-8) decode,
    /// encoding is refused.
    Unsupported(u8),
}

impl Codepage {
    /// Parses the header's code page byte into a tag, per the byte↔tag table.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Codepage::NotSet,
            0x01 => Codepage::IBM437,
            0x02 => Codepage::IBM850,
            0x03 => Codepage::Windows1252,
            0x26 | 0x65 => Codepage::IBM866,
            0x7A => Codepage::GB18030,
            0xC8 => Codepage::Windows1250,
            0xC9 => Codepage::Windows1251,
            other => Codepage::Unsupported(other),
        }
    }

    /// Returns the canonical byte to persist for this tag.
    ///
    /// `IBM866` always canonicalizes to `0x26` on write, even if the table
    /// was opened with the `0x65` alias.
    pub fn to_byte(self) -> u8 {
        match self {
            Codepage::NotSet => 0x00,
            Codepage::IBM437 => 0x01,
            Codepage::IBM850 => 0x02,
            Codepage::Windows1252 => 0x03,
            Codepage::IBM866 => 0x26,
            Codepage::GB18030 => 0x7A,
            Codepage::Windows1250 => 0xC8,
            Codepage::Windows1251 => 0xC9,
            Codepage::Unsupported(byte) => byte,
        }
    }

    /// Builds the concrete bidirectional translator for this tag.
    ///
    /// `NotSet` falls back to `default_codepage` when one was configured at
    /// open time (`Options::default_codepage`, ported from
    /// `QDbfTable::setDefaultCodepage`), and to a lossy-Unicode translator
    /// otherwise.
    pub(crate) fn encoding(self, default_codepage: Option<Codepage>) -> DynEncoding {
        match self {
            Codepage::NotSet => match default_codepage {
                Some(cp) if cp != Codepage::NotSet => cp.encoding(None),
                _ => DynEncoding::new(UnicodeLossy),
            },
            #[cfg(feature = "yore")]
            Codepage::IBM437 => {
                DynEncoding::new(crate::encoding::LossyCodePage(yore::code_pages::CP437))
            }
            #[cfg(feature = "yore")]
            Codepage::IBM850 => {
                DynEncoding::new(crate::encoding::LossyCodePage(yore::code_pages::CP850))
            }
            #[cfg(feature = "yore")]
            Codepage::IBM866 => {
                DynEncoding::new(crate::encoding::LossyCodePage(yore::code_pages::CP866))
            }
            #[cfg(not(feature = "yore"))]
            Codepage::IBM437 | Codepage::IBM850 | Codepage::IBM866 => {
                DynEncoding::new(UnicodeLossy)
            }
            #[cfg(feature = "encoding_rs")]
            Codepage::Windows1252 => DynEncoding::new(crate::encoding::EncodingRs::from(
                encoding_rs::WINDOWS_1252,
            )),
            #[cfg(feature = "encoding_rs")]
            Codepage::Windows1250 => DynEncoding::new(crate::encoding::EncodingRs::from(
                encoding_rs::WINDOWS_1250,
            )),
            #[cfg(feature = "encoding_rs")]
            Codepage::Windows1251 => DynEncoding::new(crate::encoding::EncodingRs::from(
                encoding_rs::WINDOWS_1251,
            )),
            #[cfg(feature = "encoding_rs")]
            Codepage::GB18030 => {
                DynEncoding::new(crate::encoding::EncodingRs::from(encoding_rs::GB18030))
            }
            #[cfg(not(feature = "encoding_rs"))]
            Codepage::Windows1252
            | Codepage::Windows1250
            | Codepage::Windows1251
            | Codepage::GB18030 => DynEncoding::new(UnicodeLossy),
            Codepage::Unsupported(_) => DynEncoding::new(UnsupportedCodepageEncoding),
        }
    }
}

/// Best-effort decode for a byte that matched no known code page; encoding
/// through it is refused rather than silently mis-encoded.
#[derive(Copy, Clone)]
struct UnsupportedCodepageEncoding;

impl crate::encoding::AsCodePageMark for UnsupportedCodepageEncoding {
    fn code_page_mark(&self) -> crate::CodePageMark {
        crate::CodePageMark::Utf8
    }
}

impl Encoding for UnsupportedCodepageEncoding {
    fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>, DecodeError> {
        Ok(String::from_utf8_lossy(bytes))
    }

    fn encode<'a>(&self, _s: &'a str) -> Result<Cow<'a, [u8]>, EncodeError> {
        Err(EncodeError::NotPermitted)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn byte_tag_round_trip_canonical_bytes() {
        let canonical = [
            (0x00, Codepage::NotSet),
            (0x01, Codepage::IBM437),
            (0x02, Codepage::IBM850),
            (0x03, Codepage::Windows1252),
            (0x26, Codepage::IBM866),
            (0x7A, Codepage::GB18030),
            (0xC8, Codepage::Windows1250),
            (0xC9, Codepage::Windows1251),
        ];
        for (byte, tag) in canonical {
            assert_eq!(Codepage::from_byte(byte), tag);
            assert_eq!(tag.to_byte(), byte);
        }
    }

    #[test]
    fn ibm866_alias_reads_but_does_not_round_trip_to_itself() {
        assert_eq!(Codepage::from_byte(0x65), Codepage::IBM866);
        assert_eq!(Codepage::IBM866.to_byte(), 0x26);
    }

    #[test]
    fn not_set_never_falls_through_to_ibm866() {
        assert_eq!(Codepage::NotSet.to_byte(), 0x00);
    }

    #[test]
    fn unrecognized_byte_is_unsupported() {
        assert_eq!(Codepage::from_byte(0xFF), Codepage::Unsupported(0xFF));
    }
}
