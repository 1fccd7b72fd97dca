//! The table header: version byte, last-update stamp, record/header
//! lengths, codepage byte, and the field descriptor region.

use crate::codepage::Codepage;
use crate::encoding::Encoding;
use crate::error::ErrorKind;
use crate::field::{FieldDescriptor, FIELD_DESCRIPTOR_SIZE};
use crate::memo::MemoFileType;
use crate::value::Date;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};

const FIXED_PREAMBLE_SIZE: u16 = 32;
const TERMINATOR: u8 = 0x0D;
const DBC_REGION_SIZE: u16 = 263;

/// The fixed 32-byte preamble plus the derived dialect facts, shared by
/// every record in the table.
#[derive(Debug, Clone)]
pub(crate) struct TableHeader {
    pub(crate) version_byte: u8,
    pub(crate) last_update: Date,
    pub(crate) record_count: u32,
    pub(crate) header_length: u16,
    pub(crate) record_length: u16,
    pub(crate) codepage: Codepage,
    pub(crate) has_dbc: bool,
    pub(crate) memo_flavor: Option<MemoFileType>,
}

impl TableHeader {
    /// Maps a version byte to `(has_dbc, memo_flavor)`, or
    /// [`ErrorKind::UnsupportedFile`] if the byte names no known dialect.
    fn dialect_for_version(byte: u8) -> Result<(bool, Option<MemoFileType>), ErrorKind> {
        match byte {
            0x02 | 0x03 | 0x04 => Ok((false, None)),
            0x30 | 0x31 => Ok((true, Some(MemoFileType::FoxBaseMemo))),
            0x83 => Ok((false, Some(MemoFileType::DbaseMemo))),
            0x8B | 0x8C => Ok((false, Some(MemoFileType::DbaseMemo4))),
            0xF5 => Ok((false, Some(MemoFileType::FoxBaseMemo))),
            _ => Err(ErrorKind::UnsupportedFile),
        }
    }

    fn year_from_byte(byte: u8) -> u32 {
        if byte < 80 {
            2000 + u32::from(byte)
        } else {
            1900 + u32::from(byte)
        }
    }

    fn year_to_byte(year: u32) -> u8 {
        if year >= 2000 {
            (year - 2000) as u8
        } else {
            (year - 1900) as u8
        }
    }

    /// The number of field descriptors implied by `header_length`, per the
    /// invariant `header_length = 32 + 32*field_count + 1 (+263 if has_dbc)`.
    fn field_count(&self) -> Result<u16, ErrorKind> {
        let dbc = if self.has_dbc { DBC_REGION_SIZE } else { 0 };
        let descriptors_region = self
            .header_length
            .checked_sub(FIXED_PREAMBLE_SIZE + 1 + dbc)
            .ok_or(ErrorKind::UnsupportedFile)?;
        if descriptors_region % FIELD_DESCRIPTOR_SIZE as u16 != 0 {
            return Err(ErrorKind::UnsupportedFile);
        }
        Ok(descriptors_region / FIELD_DESCRIPTOR_SIZE as u16)
    }

    fn read_preamble<R: Read>(source: &mut R) -> Result<Self, ErrorKind> {
        let version_byte = source.read_u8()?;
        let (has_dbc, memo_flavor) = Self::dialect_for_version(version_byte)?;

        let year_byte = source.read_u8()?;
        let month = source.read_u8()?;
        let day = source.read_u8()?;
        let last_update = Date::new(
            Self::year_from_byte(year_byte),
            u32::from(month),
            u32::from(day),
        );

        let record_count = source.read_u32::<LittleEndian>()?;
        let header_length = source.read_u16::<LittleEndian>()?;
        let record_length = source.read_u16::<LittleEndian>()?;

        let mut reserved = [0u8; 17];
        source.read_exact(&mut reserved)?;

        let codepage = Codepage::from_byte(source.read_u8()?);

        let mut reserved = [0u8; 2];
        source.read_exact(&mut reserved)?;

        Ok(Self {
            version_byte,
            last_update,
            record_count,
            header_length,
            record_length,
            codepage,
            has_dbc,
            memo_flavor,
        })
    }

    /// Rewrites just the three last-update bytes at offset 1, leaving the
    /// rest of the header untouched, and restores the stream position.
    pub(crate) fn persist_last_update<S: Write + Seek>(&self, dest: &mut S) -> std::io::Result<()> {
        let saved = dest.stream_position()?;
        dest.seek(SeekFrom::Start(1))?;
        dest.write_u8(Self::year_to_byte(self.last_update.year()))?;
        dest.write_u8(self.last_update.month() as u8)?;
        dest.write_u8(self.last_update.day() as u8)?;
        dest.seek(SeekFrom::Start(saved))?;
        Ok(())
    }

    /// Rewrites the 4-byte little-endian record count at offset 4.
    pub(crate) fn persist_record_count<S: Write + Seek>(&self, dest: &mut S) -> std::io::Result<()> {
        let saved = dest.stream_position()?;
        dest.seek(SeekFrom::Start(4))?;
        dest.write_u32::<LittleEndian>(self.record_count)?;
        dest.seek(SeekFrom::Start(saved))?;
        Ok(())
    }

    /// Rewrites the codepage byte at offset 29.
    pub(crate) fn persist_codepage<S: Write + Seek>(&self, dest: &mut S) -> std::io::Result<()> {
        let saved = dest.stream_position()?;
        dest.seek(SeekFrom::Start(29))?;
        dest.write_u8(self.codepage.to_byte())?;
        dest.seek(SeekFrom::Start(saved))?;
        Ok(())
    }

    /// The file offset of record `index`'s body (including its deletion flag byte).
    pub(crate) fn record_position(&self, index: i64) -> u64 {
        u64::from(self.header_length) + u64::from(self.record_length) * index as u64
    }

    fn write_preamble<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        dest.write_u8(self.version_byte)?;
        dest.write_u8(Self::year_to_byte(self.last_update.year()))?;
        dest.write_u8(self.last_update.month() as u8)?;
        dest.write_u8(self.last_update.day() as u8)?;
        dest.write_u32::<LittleEndian>(self.record_count)?;
        dest.write_u16::<LittleEndian>(self.header_length)?;
        dest.write_u16::<LittleEndian>(self.record_length)?;
        dest.write_all(&[0u8; 17])?;
        dest.write_u8(self.codepage.to_byte())?;
        dest.write_all(&[0u8; 2])?;
        Ok(())
    }
}

/// Reads the header, the field descriptor region, and the `0x0D`
/// terminator; assigns sequential byte offsets (starting at 1, after the
/// deletion flag byte) to each descriptor.
pub(crate) fn read_header_and_fields<R: Read, E: Encoding>(
    source: &mut R,
    encoding: &E,
) -> Result<(TableHeader, Vec<FieldDescriptor>), ErrorKind> {
    let header = TableHeader::read_preamble(source)?;
    let field_count = header.field_count()?;

    let mut fields = Vec::with_capacity(field_count as usize);
    let mut offset: u16 = 1;
    for _ in 0..field_count {
        let mut descriptor = FieldDescriptor::read_from(source, encoding)?;
        descriptor.offset = offset;
        offset = offset
            .checked_add(u16::from(descriptor.length))
            .ok_or(ErrorKind::UnsupportedFile)?;
        fields.push(descriptor);
    }

    let terminator = source.read_u8()?;
    if terminator != TERMINATOR {
        return Err(ErrorKind::UnsupportedFile);
    }

    if header.has_dbc {
        let mut dbc = [0u8; DBC_REGION_SIZE as usize];
        source.read_exact(&mut dbc)?;
    }

    Ok((header, fields))
}

/// Writes the header, the field descriptor region, the terminator, and (if
/// `has_dbc`) a zeroed DBC region.
pub(crate) fn write_header_and_fields<W: Write, E: Encoding>(
    header: &TableHeader,
    fields: &[FieldDescriptor],
    dest: &mut W,
    encoding: &E,
) -> Result<(), ErrorKind> {
    header
        .write_preamble(dest)
        .map_err(ErrorKind::FileWriteError)?;
    for field in fields {
        field.write_to(dest, encoding)?;
    }
    dest.write_u8(TERMINATOR).map_err(ErrorKind::FileWriteError)?;
    if header.has_dbc {
        dest.write_all(&[0u8; DBC_REGION_SIZE as usize])
            .map_err(ErrorKind::FileWriteError)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encoding::Ascii;
    use crate::field::{FieldName, FieldType};
    use std::convert::TryFrom;
    use std::io::Cursor;

    fn sample_fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::new(
            FieldName::try_from("NAME").unwrap(),
            FieldType::Character,
            10,
            0,
        )]
    }

    #[test]
    fn write_then_read_round_trip() {
        let fields = sample_fields();
        let header = TableHeader {
            version_byte: 0x03,
            last_update: Date::new(2024, 3, 15),
            record_count: 2,
            header_length: FIXED_PREAMBLE_SIZE + FIELD_DESCRIPTOR_SIZE as u16 * fields.len() as u16 + 1,
            record_length: 11,
            codepage: Codepage::Windows1252,
            has_dbc: false,
            memo_flavor: None,
        };

        let mut buffer = Vec::new();
        write_header_and_fields(&header, &fields, &mut buffer, &Ascii).unwrap();

        let mut cursor = Cursor::new(buffer);
        let (read_header, read_fields) = read_header_and_fields(&mut cursor, &Ascii).unwrap();
        assert_eq!(read_header.version_byte, 0x03);
        assert_eq!(read_header.record_count, 2);
        assert_eq!(read_header.last_update, Date::new(2024, 3, 15));
        assert_eq!(read_fields.len(), 1);
        assert_eq!(read_fields[0].offset(), 1);
    }

    #[test]
    fn unrecognized_version_byte_is_unsupported() {
        let mut cursor = Cursor::new(vec![0xFFu8; 32]);
        assert!(matches!(
            read_header_and_fields(&mut cursor, &Ascii),
            Err(ErrorKind::UnsupportedFile)
        ));
    }

    #[test]
    fn dbase_iii_memo_version_selects_dbase_memo_dialect() {
        assert_eq!(
            TableHeader::dialect_for_version(0x83).unwrap(),
            (false, Some(MemoFileType::DbaseMemo))
        );
        assert_eq!(
            TableHeader::dialect_for_version(0x30).unwrap(),
            (true, Some(MemoFileType::FoxBaseMemo))
        );
    }

    #[test]
    fn year_pivot_at_eighty() {
        assert_eq!(TableHeader::year_from_byte(79), 2079);
        assert_eq!(TableHeader::year_from_byte(80), 1980);
    }
}
