//! Per-type field codec: fixed-width byte slice <-> [`Value`].
//!
//! Grounded in `QDbfTable::record()` (decode) and `QDbfTable::setValue()`
//! (encode) from the original implementation, and in the teacher's
//! `FieldValue::read_from` / `WritableAsDbaseField` split.

use crate::encoding::Encoding;
use crate::error::ErrorKind;
use crate::field::{FieldDescriptor, FieldType};
use crate::memo::MemoStore;
use crate::value::{Date, DateTime, MemoValue, Value};
use std::io::{Read, Seek};
use std::str::FromStr;

fn trim_spaces(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != b' ').unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| *b != b' ')
        .map(|i| i + 1)
        .unwrap_or(0);
    if start >= end {
        &[]
    } else {
        &bytes[start..end]
    }
}

/// Decodes one field's fixed-width bytes into a [`Value`].
///
/// `memo` is `None` when no companion memo file is open; encountering a
/// non-blank Memo field in that situation is an [`ErrorKind::UnsupportedFile`],
/// matching `isValueValid`'s requirement that a memo file be open.
pub(crate) fn decode<T: Read + Seek, E: Encoding>(
    bytes: &[u8],
    descriptor: &FieldDescriptor,
    encoding: &E,
    memo: &mut Option<MemoStore<T>>,
) -> Result<Value, ErrorKind> {
    debug_assert_eq!(bytes.len(), descriptor.length as usize);
    match descriptor.field_type {
        FieldType::Character => {
            let trimmed = trim_trailing_spaces(bytes);
            if trimmed.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Character(encoding.decode(trimmed)?.into_owned()))
            }
        }
        FieldType::Date => {
            let trimmed = trim_spaces(bytes);
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            let text = encoding.decode(trimmed)?;
            match Date::from_str(&text) {
                Ok(date) => Ok(Value::Date(date)),
                Err(_) => Ok(Value::Null),
            }
        }
        FieldType::DateTime => match descriptor.length {
            8 => {
                let mut cursor = std::io::Cursor::new(bytes);
                DateTime::read_binary(&mut cursor)
                    .map(Value::DateTime)
                    .map_err(ErrorKind::FileReadError)
            }
            14 => {
                let trimmed = trim_spaces(bytes);
                if trimmed.len() != 14 {
                    return Ok(Value::Null);
                }
                let text = encoding.decode(trimmed)?;
                match parse_datetime_text(&text) {
                    Some(dt) => Ok(Value::DateTime(dt)),
                    None => Ok(Value::Null),
                }
            }
            _ => Err(ErrorKind::UnsupportedFile),
        },
        FieldType::FloatingPoint | FieldType::Number => {
            let trimmed = trim_spaces(bytes);
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            let text = encoding.decode(trimmed)?;
            if descriptor.precision == 0 {
                match text.trim().parse::<i64>() {
                    Ok(n) => Ok(Value::Number(n as f64)),
                    Err(_) => Ok(Value::Null),
                }
            } else {
                match text.trim().parse::<f64>() {
                    Ok(n) => Ok(Value::Number(n)),
                    Err(_) => Ok(Value::Null),
                }
            }
        }
        FieldType::Logical => {
            let value = match bytes.first().copied().unwrap_or(b' ') as char {
                'T' | 't' | 'Y' | 'y' => Some(true),
                'F' | 'f' | 'N' | 'n' => Some(false),
                _ => None,
            };
            Ok(value.map(Value::Logical).unwrap_or(Value::Null))
        }
        FieldType::Integer => {
            let mut array = [0u8; 4];
            array.copy_from_slice(&bytes[..4]);
            Ok(Value::Integer(i32::from_le_bytes(array)))
        }
        FieldType::Memo => {
            let index = match descriptor.length {
                10 => {
                    let trimmed = trim_spaces(bytes);
                    if trimmed.is_empty() {
                        return Ok(Value::Memo(MemoValue::Text(String::new())));
                    }
                    let text = encoding.decode(trimmed)?;
                    text.trim()
                        .parse::<u32>()
                        .map_err(|_| ErrorKind::InvalidValue)?
                }
                4 => {
                    let mut array = [0u8; 4];
                    array.copy_from_slice(&bytes[..4]);
                    let index = u32::from_le_bytes(array);
                    if index == 0 {
                        return Ok(Value::Memo(MemoValue::Text(String::new())));
                    }
                    index
                }
                _ => return Err(ErrorKind::UnsupportedFile),
            };
            match memo {
                Some(store) => Ok(Value::Memo(store.read_blob(index, encoding)?)),
                None => Err(ErrorKind::UnsupportedFile),
            }
        }
        FieldType::Undefined => Ok(Value::Null),
    }
}

/// Encodes a [`Value`] into a field's fixed-width byte slice (already
/// correctly sized); returns the memo index/bytes to write back to the
/// in-record slot separately for Memo fields, via `memo_write`.
pub(crate) fn encode<T: Read + Seek, E: Encoding>(
    value: &Value,
    descriptor: &FieldDescriptor,
    encoding: &E,
    dst: &mut [u8],
    memo: &mut Option<MemoStore<T>>,
) -> Result<(), ErrorKind> {
    // Binary-wire fields (4-byte Integer, 8-byte DateTime, 4-byte Memo
    // index) must default to zero: a space-filled slot decodes as a
    // bogus nonzero value rather than the type's empty value (e.g. a
    // Memo field reading a phantom block index of `0x20202020`).
    let fill = if descriptor.is_binary_wire() { 0u8 } else { b' ' };
    for b in dst.iter_mut() {
        *b = fill;
    }

    match (descriptor.field_type, value) {
        (FieldType::Character, Value::Character(s)) => write_text(dst, s, encoding),
        (FieldType::Character, Value::Null) => Ok(()),
        (FieldType::Date, Value::Date(date)) => write_text(dst, &date.to_string(), encoding),
        (FieldType::Date, Value::Null) => Ok(()),
        (FieldType::DateTime, Value::DateTime(dt)) => match descriptor.length {
            8 => {
                let mut cursor: &mut [u8] = dst;
                dt.write_binary(&mut cursor).map_err(ErrorKind::FileWriteError)
            }
            14 => write_text(dst, &format_datetime_text(dt), encoding),
            _ => Err(ErrorKind::UnsupportedFile),
        },
        (FieldType::DateTime, Value::Null) => Ok(()),
        (FieldType::FloatingPoint | FieldType::Number, Value::Number(n)) => {
            let text = format!(
                "{value:.precision$}",
                value = n,
                precision = descriptor.precision as usize
            );
            write_text_right_justified(dst, &text, encoding)
        }
        (FieldType::FloatingPoint | FieldType::Number, Value::Integer(n)) => {
            let text = format!(
                "{value:.precision$}",
                value = *n as f64,
                precision = descriptor.precision as usize
            );
            write_text_right_justified(dst, &text, encoding)
        }
        (FieldType::FloatingPoint | FieldType::Number, Value::Null) => Ok(()),
        (FieldType::Logical, Value::Logical(b)) => {
            dst[0] = if *b { b'T' } else { b'F' };
            Ok(())
        }
        (FieldType::Logical, Value::Null) => {
            dst[0] = b'?';
            Ok(())
        }
        (FieldType::Integer, Value::Integer(n)) => {
            dst.copy_from_slice(&n.to_le_bytes());
            Ok(())
        }
        (FieldType::Memo, Value::Memo(payload)) => {
            let store = memo.as_mut().ok_or(ErrorKind::UnsupportedFile)?;
            let raw = match payload {
                MemoValue::Text(text) => encoding.encode(text)?.into_owned(),
                MemoValue::Bytes(bytes) => bytes.clone(),
            };
            if raw.is_empty() {
                return Ok(());
            }
            let index = store.write_blob(&raw)?;
            match descriptor.length {
                10 => write_text_right_justified(dst, &index.to_string(), encoding),
                4 => {
                    dst.copy_from_slice(&index.to_le_bytes());
                    Ok(())
                }
                _ => Err(ErrorKind::UnsupportedFile),
            }
        }
        (FieldType::Memo, Value::Null) => Ok(()),
        (FieldType::Undefined, _) => Ok(()),
        _ => Err(ErrorKind::InvalidTypeError),
    }
}

fn trim_trailing_spaces(bytes: &[u8]) -> &[u8] {
    match bytes.iter().rposition(|b| *b != b' ') {
        Some(pos) => &bytes[..=pos],
        None => &[],
    }
}

fn write_text<E: Encoding>(dst: &mut [u8], text: &str, encoding: &E) -> Result<(), ErrorKind> {
    let encoded = encoding.encode(text)?;
    let n = encoded.len().min(dst.len());
    dst[..n].copy_from_slice(&encoded[..n]);
    for b in dst[n..].iter_mut() {
        *b = b' ';
    }
    Ok(())
}

fn write_text_right_justified<E: Encoding>(
    dst: &mut [u8],
    text: &str,
    encoding: &E,
) -> Result<(), ErrorKind> {
    let encoded = encoding.encode(text)?;
    if encoded.len() > dst.len() {
        // Too wide to fit the declared field length: fill with the
        // conventional overflow marker rather than truncating silently.
        for b in dst.iter_mut() {
            *b = b'*';
        }
        return Ok(());
    }
    let pad = dst.len() - encoded.len();
    for b in dst[..pad].iter_mut() {
        *b = b' ';
    }
    dst[pad..].copy_from_slice(&encoded);
    Ok(())
}

fn parse_datetime_text(text: &str) -> Option<DateTime> {
    if text.len() != 14 {
        return None;
    }
    let date = Date::from_str(&text[0..8]).ok()?;
    let hours = text[8..10].parse::<u32>().ok()?;
    let minutes = text[10..12].parse::<u32>().ok()?;
    let seconds = text[12..14].parse::<u32>().ok()?;
    if hours > 24 || minutes > 60 || seconds > 60 {
        return None;
    }
    Some(DateTime::new(date, crate::value::Time::new(hours, minutes, seconds)))
}

fn format_datetime_text(dt: &DateTime) -> String {
    format!(
        "{}{:02}{:02}{:02}",
        dt.date(),
        dt.time().hours(),
        dt.time().minutes(),
        dt.time().seconds()
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encoding::UnicodeLossy;

    fn field(field_type: FieldType, length: u8, precision: u8) -> FieldDescriptor {
        crate::field::FieldDescriptor::new(
            crate::field::FieldName::try_from("F").unwrap(),
            field_type,
            length,
            precision,
        )
    }

    fn no_memo() -> Option<MemoStore<std::io::Cursor<Vec<u8>>>> {
        None
    }

    #[test]
    fn character_round_trip_and_blank_is_null() {
        let descriptor = field(FieldType::Character, 10, 0);
        let mut bytes = [0u8; 10];
        encode(
            &Value::Character("ALICE".into()),
            &descriptor,
            &UnicodeLossy,
            &mut bytes,
            &mut no_memo(),
        )
        .unwrap();
        assert_eq!(&bytes, b"ALICE     ");
        let decoded = decode(&bytes, &descriptor, &UnicodeLossy, &mut no_memo()).unwrap();
        assert_eq!(decoded, Value::Character("ALICE".to_string()));

        let blank = [b' '; 10];
        assert_eq!(
            decode(&blank, &descriptor, &UnicodeLossy, &mut no_memo()).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn date_blank_decodes_to_null() {
        let descriptor = field(FieldType::Date, 8, 0);
        let blank = [b' '; 8];
        assert_eq!(
            decode(&blank, &descriptor, &UnicodeLossy, &mut no_memo()).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn logical_question_mark_is_null_other_byte_is_also_null() {
        let descriptor = field(FieldType::Logical, 1, 0);
        assert_eq!(
            decode(b"?", &descriptor, &UnicodeLossy, &mut no_memo()).unwrap(),
            Value::Null
        );
        assert_eq!(
            decode(b"t", &descriptor, &UnicodeLossy, &mut no_memo()).unwrap(),
            Value::Logical(true)
        );
        assert_eq!(
            decode(b"z", &descriptor, &UnicodeLossy, &mut no_memo()).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn number_with_zero_precision_parses_as_integer() {
        let descriptor = field(FieldType::Number, 5, 0);
        let mut bytes = [b' '; 5];
        bytes[2..].copy_from_slice(b"123");
        let decoded = decode(&bytes, &descriptor, &UnicodeLossy, &mut no_memo()).unwrap();
        assert_eq!(decoded, Value::Number(123.0));
    }

    #[test]
    fn memo_blank_length_four_zero_fills_rather_than_space_fills() {
        let descriptor = field(FieldType::Memo, 4, 0);
        let mut bytes = [0xFFu8; 4];
        encode(
            &Value::Memo(MemoValue::Text(String::new())),
            &descriptor,
            &UnicodeLossy,
            &mut bytes,
            &mut no_memo(),
        )
        .unwrap();
        assert_eq!(bytes, [0, 0, 0, 0]);
        assert_eq!(
            decode(&bytes, &descriptor, &UnicodeLossy, &mut no_memo()).unwrap(),
            Value::Memo(MemoValue::Text(String::new()))
        );
    }

    #[test]
    fn memo_blank_length_ten_is_empty_text_not_index() {
        let descriptor = field(FieldType::Memo, 10, 0);
        let blank = [b' '; 10];
        assert_eq!(
            decode(&blank, &descriptor, &UnicodeLossy, &mut no_memo()).unwrap(),
            Value::Memo(MemoValue::Text(String::new()))
        );
    }

    #[test]
    fn datetime_14_byte_text_form_round_trips() {
        let descriptor = field(FieldType::DateTime, 14, 0);
        let dt = DateTime::new(Date::new(2024, 3, 15), crate::value::Time::new(12, 34, 56));
        let mut bytes = [0u8; 14];
        encode(
            &Value::DateTime(dt),
            &descriptor,
            &UnicodeLossy,
            &mut bytes,
            &mut no_memo(),
        )
        .unwrap();
        assert_eq!(&bytes, b"20240315123456");
        let decoded = decode(&bytes, &descriptor, &UnicodeLossy, &mut no_memo()).unwrap();
        assert_eq!(decoded, Value::DateTime(dt));
    }
}
