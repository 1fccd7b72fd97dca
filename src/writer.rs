//! Building a brand-new table from scratch.
//!
//! The original QDbf implementation only ever opens a `.dbf` that already
//! exists; this supplements it with a creation path, grounded in the
//! teacher's `TableWriterBuilder`/`File::create_new` (`src/writing.rs`,
//! `src/file.rs`).

use crate::codepage::Codepage;
use crate::error::Error;
use crate::field::{FieldDescriptor, FieldName, FieldType};
use crate::header::{self, TableHeader};
use crate::memo::MemoFileType;
use crate::table::{Options, Table};
use crate::value::Date;
use std::io::{Read, Seek, Write};

const FIXED_PREAMBLE_SIZE: u16 = 32;
const FIELD_DESCRIPTOR_SIZE: u16 = 32;

/// Accumulates field declarations and builds a fresh table header.
///
/// Fields are declared in the order they should appear on disk; offsets are
/// assigned sequentially, starting at 1, exactly as they are on open.
pub struct TableWriterBuilder {
    version_byte: u8,
    codepage: Codepage,
    memo_flavor: Option<MemoFileType>,
    fields: Vec<FieldDescriptor>,
}

impl Default for TableWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableWriterBuilder {
    /// Starts a plain dBASE III builder (version `0x03`, no memo dialect).
    pub fn new() -> Self {
        Self {
            version_byte: 0x03,
            codepage: Codepage::NotSet,
            memo_flavor: None,
            fields: Vec::new(),
        }
    }

    pub fn with_codepage(mut self, codepage: Codepage) -> Self {
        self.codepage = codepage;
        self
    }

    fn push(mut self, name: &str, field_type: FieldType, length: u8, precision: u8) -> Self {
        let name = FieldName::try_from(name).expect("field name must fit in 10 bytes");
        self.fields
            .push(FieldDescriptor::new(name, field_type, length, precision));
        self
    }

    pub fn add_character_field(self, name: &str, length: u8) -> Self {
        self.push(name, FieldType::Character, length, 0)
    }

    pub fn add_date_field(self, name: &str) -> Self {
        self.push(name, FieldType::Date, 8, 0)
    }

    /// `length` must be 8 (binary Julian-day form) or 14 (ASCII text form).
    pub fn add_datetime_field(self, name: &str, length: u8) -> Self {
        self.push(name, FieldType::DateTime, length, 0)
    }

    pub fn add_numeric_field(self, name: &str, length: u8, precision: u8) -> Self {
        self.push(name, FieldType::Number, length, precision)
    }

    pub fn add_float_field(self, name: &str, length: u8, precision: u8) -> Self {
        self.push(name, FieldType::FloatingPoint, length, precision)
    }

    pub fn add_logical_field(self, name: &str) -> Self {
        self.push(name, FieldType::Logical, 1, 0)
    }

    pub fn add_integer_field(self, name: &str) -> Self {
        self.push(name, FieldType::Integer, 4, 0)
    }

    /// `length` must be 4 (binary block index) or 10 (ASCII decimal block
    /// index). Picks the version byte whose dialect carries `memo_flavor`
    /// (`0x83` for `DbaseMemo`, `0x8B` for `DbaseMemo4`, `0xF5` for
    /// `FoxBaseMemo`), per `header::TableHeader::dialect_for_version`'s
    /// table; use [`Self::with_version_byte`] to pick a different one (e.g.
    /// the FoxPro-with-container `0x30`).
    pub fn add_memo_field(self, name: &str, length: u8, memo_flavor: MemoFileType) -> Self {
        let version_byte = match memo_flavor {
            MemoFileType::DbaseMemo => 0x83,
            MemoFileType::DbaseMemo4 => 0x8B,
            MemoFileType::FoxBaseMemo => 0xF5,
        };
        let builder = Self {
            memo_flavor: Some(memo_flavor),
            version_byte,
            ..self
        };
        builder.push(name, FieldType::Memo, length, 0)
    }

    /// Overrides the version byte picked by [`Self::new`]/
    /// [`Self::add_memo_field`]; must name a dialect
    /// `header::TableHeader::dialect_for_version` recognizes.
    pub fn with_version_byte(mut self, version_byte: u8) -> Self {
        self.version_byte = version_byte;
        self
    }

    /// Finalizes the header and field descriptors and writes them to `dest`,
    /// returning a freshly opened [`Table`] with zero records.
    pub fn build<T: Read + Write + Seek>(self, dest: T) -> Result<Table<T>, Error> {
        self.build_with_memo(dest, None)
    }

    pub fn build_with_memo<T: Read + Write + Seek>(
        self,
        mut dest: T,
        memo: Option<T>,
    ) -> Result<Table<T>, Error> {
        let has_dbc = matches!(self.version_byte, 0x30 | 0x31);
        let mut offset: u16 = 1;
        let mut fields = self.fields;
        for field in fields.iter_mut() {
            field.offset = offset;
            offset += u16::from(field.length());
        }
        let record_length = offset;
        let dbc_region = if has_dbc { 263 } else { 0 };
        let header_length =
            FIXED_PREAMBLE_SIZE + FIELD_DESCRIPTOR_SIZE * fields.len() as u16 + 1 + dbc_region;

        let table_header = TableHeader {
            version_byte: self.version_byte,
            last_update: Date::today(),
            record_count: 0,
            header_length,
            record_length,
            codepage: self.codepage,
            has_dbc,
            memo_flavor: self.memo_flavor,
        };

        let encoding = self.codepage.encoding(None);
        header::write_header_and_fields(&table_header, &fields, &mut dest, &encoding)
            .map_err(Error::from)?;
        dest.write_all(&[0x1A]).map_err(|e| {
            Error::from(crate::error::ErrorKind::FileWriteError(e))
        })?;

        let options = Options {
            read_only: false,
            default_codepage: None,
        };
        match memo {
            Some(mut memo_dest) => {
                let flavor = self
                    .memo_flavor
                    .expect("a memo destination was supplied without a memo field");
                crate::memo::initialize_new_memo_file(flavor, &mut memo_dest)
                    .map_err(|e| Error::from(crate::error::ErrorKind::FileWriteError(e)))?;
                Table::open_with_memo(dest, Some(memo_dest), options)
            }
            None => Table::open(dest, options),
        }
    }
}
