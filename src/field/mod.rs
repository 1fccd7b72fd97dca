//! Field descriptors: the declared shape of one column, read once at open.

use crate::encoding::Encoding;
use crate::error::ErrorKind;
use crate::value::Value;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::convert::TryFrom;
use std::io::{Read, Write};

const FIELD_NAME_LENGTH: usize = 11;
pub(crate) const FIELD_DESCRIPTOR_SIZE: usize = 32;

/// A value type a field can hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldType {
    Character,
    Date,
    FloatingPoint,
    Number,
    Logical,
    Memo,
    Integer,
    DateTime,
    /// A type character this engine does not recognize; reads decode to
    /// [`Value::Null`], writes encode to spaces, per the specification's
    /// Undefined fallback.
    Undefined,
}

impl FieldType {
    fn from_char(c: char) -> Self {
        match c {
            'C' => FieldType::Character,
            'D' => FieldType::Date,
            'F' => FieldType::FloatingPoint,
            'N' => FieldType::Number,
            'L' => FieldType::Logical,
            'M' => FieldType::Memo,
            'I' => FieldType::Integer,
            'T' => FieldType::DateTime,
            _ => FieldType::Undefined,
        }
    }

    fn to_char(self) -> char {
        match self {
            FieldType::Character => 'C',
            FieldType::Date => 'D',
            FieldType::FloatingPoint => 'F',
            FieldType::Number => 'N',
            FieldType::Logical => 'L',
            FieldType::Memo => 'M',
            FieldType::Integer => 'I',
            FieldType::DateTime => 'T',
            FieldType::Undefined => ' ',
        }
    }

    /// The declared default value for a freshly-templated field of this type.
    pub(crate) fn default_value(self) -> Value {
        match self {
            FieldType::Character => Value::Character(String::new()),
            FieldType::Memo => Value::Memo(crate::value::MemoValue::Text(String::new())),
            FieldType::Integer => Value::Integer(0),
            _ => Value::Null,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A field name: up to 10 significant bytes, uppercase-insensitive for
/// lookup purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldName(String);

impl FieldName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for FieldName {
    type Error = &'static str;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        if name.as_bytes().len() > FIELD_NAME_LENGTH - 1 {
            Err("field names cannot exceed 10 bytes")
        } else {
            Ok(Self(name.to_string()))
        }
    }
}

/// One column's declared shape: type, length/precision, and the byte
/// offset of its slot within a record body.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) field_type: FieldType,
    pub(crate) length: u8,
    pub(crate) precision: u8,
    pub(crate) offset: u16,
    pub(crate) read_only: bool,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn default_value(&self) -> Value {
        self.field_type.default_value()
    }

    /// Whether this field's on-disk slot is a raw binary value (4-byte
    /// Integer, 8-byte binary DateTime, 4-byte binary Memo index) rather
    /// than space-padded text. A blank/default slot for these must be
    /// zero-filled: space-filling it decodes as a bogus nonzero value
    /// (e.g. a Memo index of `0x20202020`) instead of the type's empty
    /// value.
    pub(crate) fn is_binary_wire(&self) -> bool {
        matches!(self.field_type, FieldType::Integer)
            || (self.field_type == FieldType::DateTime && self.length == 8)
            || (self.field_type == FieldType::Memo && self.length == 4)
    }

    pub(crate) fn new(name: FieldName, field_type: FieldType, length: u8, precision: u8) -> Self {
        Self {
            name: name.0,
            field_type,
            length,
            precision,
            offset: 0,
            read_only: false,
        }
    }

    /// Reads a 32-byte field descriptor: `name[11], type[1], reserved[4],
    /// length[1], precision[1], reserved[14]`.
    pub(crate) fn read_from<T: Read, E: Encoding>(
        source: &mut T,
        encoding: &E,
    ) -> Result<Self, ErrorKind> {
        let mut name_bytes = [0u8; FIELD_NAME_LENGTH];
        source.read_exact(&mut name_bytes)?;
        let zero_pos = name_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(name_bytes.len());
        let name = encoding.decode(&name_bytes[..zero_pos])?.into_owned();

        let type_char = source.read_u8()? as char;
        let field_type = FieldType::from_char(type_char);

        let mut reserved = [0u8; 4];
        source.read_exact(&mut reserved)?;

        let length = source.read_u8()?;
        let precision = source.read_u8()?;

        let mut reserved = [0u8; 14];
        source.read_exact(&mut reserved)?;

        Ok(Self {
            name,
            field_type,
            length,
            precision,
            offset: 0,
            read_only: false,
        })
    }

    pub(crate) fn write_to<T: Write, E: Encoding>(
        &self,
        dest: &mut T,
        encoding: &E,
    ) -> Result<(), ErrorKind> {
        let mut name_bytes = [0u8; FIELD_NAME_LENGTH];
        let encoded_name = encoding.encode(&self.name)?;
        let n = encoded_name.len().min(FIELD_NAME_LENGTH);
        name_bytes[..n].copy_from_slice(&encoded_name[..n]);

        (|| -> std::io::Result<()> {
            dest.write_all(&name_bytes)?;
            dest.write_u8(self.field_type.to_char() as u8)?;
            dest.write_all(&[0u8; 4])?;
            dest.write_u8(self.length)?;
            dest.write_u8(self.precision)?;
            dest.write_all(&[0u8; 14])?;
            Ok(())
        })()
        .map_err(ErrorKind::FileWriteError)?;
        Ok(())
    }
}

impl std::fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FieldDescriptor {{ name: {}, type: {}, length: {} }}",
            self.name, self.field_type, self.length
        )
    }
}

/// Byte 0 of a record body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum DeletionFlag {
    Live,
    Deleted,
}

impl DeletionFlag {
    pub(crate) fn read_from<T: Read>(source: &mut T) -> std::io::Result<Self> {
        let byte = source.read_u8()?;
        match byte {
            0x2A => Ok(Self::Deleted),
            // 0x20 is the canonical "live" byte; any other byte is treated
            // as live too (writes always normalize to one of the two).
            _ => Ok(Self::Live),
        }
    }

    pub(crate) fn write_to<T: Write>(self, dst: &mut T) -> std::io::Result<()> {
        match self {
            Self::Live => dst.write_u8(0x20),
            Self::Deleted => dst.write_u8(0x2A),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encoding::Ascii;
    use std::io::Cursor;

    #[test]
    fn write_read_field_descriptor() {
        let descriptor = FieldDescriptor::new(
            FieldName::try_from("NAME").unwrap(),
            FieldType::Character,
            30,
            0,
        );
        let mut cursor = Cursor::new(Vec::<u8>::with_capacity(FIELD_DESCRIPTOR_SIZE));
        descriptor.write_to(&mut cursor, &Ascii).unwrap();
        assert_eq!(cursor.get_ref().len(), FIELD_DESCRIPTOR_SIZE);

        cursor.set_position(0);
        let read_back = FieldDescriptor::read_from(&mut cursor, &Ascii).unwrap();
        assert_eq!(read_back.name, descriptor.name);
        assert_eq!(read_back.field_type, descriptor.field_type);
        assert_eq!(read_back.length, descriptor.length);
    }

    #[test]
    fn unknown_type_char_is_undefined() {
        assert_eq!(FieldType::from_char('Z'), FieldType::Undefined);
        assert_eq!(FieldType::Undefined.default_value(), Value::Null);
    }
}
