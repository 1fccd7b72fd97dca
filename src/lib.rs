//! Reading and writing xBase-family `.dbf` table files: dBASE III/IV and
//! Visual FoxPro, with their respective memo (`.dbt`/`.fpt`) companions.
//!
//! The entry point is [`Table`], opened from a path (`Table::open_read_only`,
//! `Table::open_read_write`) or from any seekable byte source
//! (`Table::open`). [`writer::TableWriterBuilder`] creates a brand-new table
//! from a declared field list.

mod codec;
mod codepage;
mod encoding;
mod error;
mod field;
mod header;
mod memo;
mod record;
mod table;
mod value;
pub mod writer;

pub use codepage::Codepage;
pub use error::{DecodeError, EncodeError, Error, ErrorKind, ErrorTag};
pub use field::{FieldDescriptor, FieldName, FieldType};
pub use memo::MemoFileType;
pub use record::Record;
pub use table::{OpenMode, Options, Table};
pub use value::{Date, DateTime, MemoValue, Time, Value};
pub use writer::TableWriterBuilder;

/// Identifies the concrete text encoding behind an [`encoding::Encoding`]
/// implementor, mirroring `QDbfTable`'s reliance on a single well-known
/// code page identifier rather than an opaque codec object.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CodePageMark {
    Utf8,
    CP437,
    CP850,
    CP852,
    CP861,
    CP865,
    CP866,
    CP874,
    CP932,
    CP936,
    CP949,
    CP950,
    CP1250,
    CP1251,
    CP1252,
    CP1253,
    CP1254,
    CP1255,
    CP1256,
}
