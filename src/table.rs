//! The table core: header/descriptor ownership, the cursor and single-record
//! buffer, and every public mutation operation.
//!
//! Grounded in `QDbfTable` (`open`/`close`/`seek`/`record`/`setValue`/
//! `addRecord`/`removeRecord`/`setCodepage`) from the original implementation,
//! and in the teacher's `File<T>` for the "own a seekable handle, hand back
//! record/field references" shape (`src/file.rs`).

use crate::codec;
use crate::codepage::Codepage;
use crate::encoding::DynEncoding;
use crate::error::{Error, ErrorKind, ErrorTag};
use crate::field::{DeletionFlag, FieldDescriptor, FieldType};
use crate::header::{self, TableHeader};
use crate::memo::MemoStore;
use crate::record::Record;
use crate::value::{Date, Value};
use byteorder::ReadBytesExt;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The cursor position before the first record, matching the specification's
/// `BeforeFirst` state.
const BEFORE_FIRST: i64 = -1;

/// Read-only vs. read-write, and the fallback codepage applied when a
/// table's own header byte reads as [`Codepage::NotSet`].
///
/// Ported from `QDbfTable::OpenMode` and `QDbfTable::setDefaultCodepage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub read_only: bool,
    pub default_codepage: Option<Codepage>,
}

fn clamp_position(index: i64, record_count: u32) -> i64 {
    if record_count == 0 {
        return BEFORE_FIRST;
    }
    index.clamp(BEFORE_FIRST, record_count as i64 - 1)
}

/// Builds a blank record body (everything after the deletion flag byte):
/// space-padded, except for fields whose wire form is binary rather than
/// text (4-byte Integer, 8-byte binary DateTime, 4-byte binary Memo), which
/// are zero-filled instead. A space-filled slot decodes as garbage for those
/// types — e.g. a 4-byte Memo field reads `0x20202020` as a non-zero block
/// index and tries to fetch a blob that doesn't exist — so the blank row
/// `add_record` writes before applying field values must already use each
/// field's correct "empty" wire representation.
fn blank_row_body(fields: &[FieldDescriptor], record_length: usize) -> Vec<u8> {
    let mut body = vec![b' '; record_length - 1];
    for field in fields {
        if field.is_binary_wire() {
            let start = field.offset() as usize - 1;
            let end = start + field.length() as usize;
            for b in &mut body[start..end] {
                *b = 0;
            }
        }
    }
    body
}

/// An opaque handle over one xBase table and (if the dialect needs one) its
/// companion memo file.
///
/// Internals (the byte source, the field codec, the memo store) are owned by
/// this single struct; there is no further pointer graph, matching the
/// source's "private implementation" design.
pub struct Table<T> {
    inner: T,
    header: TableHeader,
    fields: Arc<Vec<FieldDescriptor>>,
    encoding: DynEncoding,
    default_codepage: Option<Codepage>,
    memo: Option<MemoStore<T>>,
    position: i64,
    buffered: bool,
    current: Record,
    last_error: ErrorTag,
    writable: bool,
    path: Option<PathBuf>,
}

impl<T> Table<T> {
    /// The table's declared field set, in on-disk order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// The number of records the header declares.
    pub fn size(&self) -> u32 {
        self.header.record_count
    }

    /// The current cursor position, or `-1` at `BeforeFirst`.
    pub fn at(&self) -> i64 {
        self.position
    }

    pub fn last_update(&self) -> Date {
        self.header.last_update
    }

    pub fn codepage(&self) -> Codepage {
        self.header.codepage
    }

    /// The flat error tag from the last public operation; `NoError` after
    /// every successful call. Mirrors the original's `error()` accessor for
    /// callers that prefer query-after-call over `Result`.
    pub fn last_error(&self) -> ErrorTag {
        self.last_error
    }

    pub fn open_mode(&self) -> OpenMode {
        if self.writable {
            OpenMode::ReadWrite
        } else {
            OpenMode::ReadOnly
        }
    }

    /// The path the table was opened from, if opened via a path-based
    /// constructor.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Clamps `index` into `{-1} ∪ [0, size())` and moves the cursor there,
    /// invalidating the record buffer if the position changed. Always
    /// succeeds, per the specification.
    pub fn seek(&mut self, index: i64) -> bool {
        let clamped = clamp_position(index, self.header.record_count);
        if clamped != self.position {
            self.position = clamped;
            self.buffered = false;
        }
        true
    }

    pub fn first(&mut self) -> bool {
        if self.header.record_count == 0 {
            false
        } else {
            self.seek(0);
            true
        }
    }

    pub fn last(&mut self) -> bool {
        if self.header.record_count == 0 {
            false
        } else {
            self.seek(self.header.record_count as i64 - 1);
            true
        }
    }

    pub fn next(&mut self) -> bool {
        let candidate = self.position + 1;
        if candidate >= self.header.record_count as i64 {
            false
        } else {
            self.seek(candidate);
            true
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.position > self.header.record_count as i64 - 1 {
            return self.last();
        }
        if self.position <= 0 {
            false
        } else {
            self.seek(self.position - 1);
            true
        }
    }

    /// Releases the table (and memo file, if any). Equivalent to dropping
    /// the handle; provided for callers porting an explicit `close()` call.
    pub fn close(self) {}

    fn clear_error(&mut self) {
        self.last_error = ErrorTag::NoError;
    }

    fn fail(&mut self, kind: ErrorKind) -> Error {
        self.last_error = ErrorTag::from(&kind);
        Error::from(kind)
    }
}

impl<T: Read + Seek> Table<T> {
    /// Opens a table from a seekable byte source, with no companion memo
    /// file. Fails with [`ErrorKind::UnsupportedFile`] if a Memo field is
    /// declared.
    pub fn open(source: T, options: Options) -> Result<Self, Error> {
        Self::open_with_memo(source, None, options)
    }

    /// Opens a table together with an already-open memo byte source.
    pub fn open_with_memo(mut source: T, memo_source: Option<T>, options: Options) -> Result<Self, Error> {
        let (header, fields, encoding) = Self::parse_header(&mut source, &options)?;
        let needs_memo = fields.iter().any(|f| f.field_type() == FieldType::Memo);
        let memo = match (needs_memo, memo_source) {
            (true, Some(memo_src)) => {
                let flavor = header.memo_flavor.ok_or(ErrorKind::UnsupportedFile)?;
                Some(MemoStore::open(flavor, memo_src).map_err(ErrorKind::FileOpenError)?)
            }
            (true, None) => return Err(ErrorKind::UnsupportedFile.into()),
            (false, _) => None,
        };

        let fields = Arc::new(fields);
        let current = Record::template(fields.clone());
        Ok(Self {
            inner: source,
            header,
            fields,
            encoding,
            default_codepage: options.default_codepage,
            memo,
            position: BEFORE_FIRST,
            buffered: false,
            current,
            last_error: ErrorTag::NoError,
            writable: !options.read_only,
            path: None,
        })
    }

    fn parse_header(source: &mut T, options: &Options) -> Result<(TableHeader, Vec<FieldDescriptor>, DynEncoding), Error> {
        const CODEPAGE_OFFSET: u64 = 29;
        source
            .seek(SeekFrom::Start(CODEPAGE_OFFSET))
            .map_err(|e| Error::from(ErrorKind::FileOpenError(e)))?;
        let codepage_byte = source
            .read_u8()
            .map_err(|e| Error::from(ErrorKind::FileOpenError(e)))?;
        source
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::from(ErrorKind::FileOpenError(e)))?;

        let codepage = Codepage::from_byte(codepage_byte);
        let encoding = codepage.encoding(options.default_codepage);
        let (header, fields) = header::read_header_and_fields(source, &encoding)?;
        Ok((header, fields, encoding))
    }

    /// Returns the current record, materializing it from the file if the
    /// buffer is stale. At `BeforeFirst`, returns the template record
    /// (declared fields at their default values) without touching the
    /// buffer. On a read failure the template is returned and
    /// [`Table::last_error`] is set.
    pub fn record(&mut self) -> &Record {
        if self.position == BEFORE_FIRST {
            self.current = Record::template(self.fields.clone());
            return &self.current;
        }
        if !self.buffered {
            match self.materialize(self.position) {
                Ok(record) => {
                    self.current = record;
                    self.buffered = true;
                    self.last_error = ErrorTag::NoError;
                }
                Err(kind) => {
                    self.last_error = ErrorTag::from(&kind);
                    self.current = Record::template(self.fields.clone());
                    self.buffered = false;
                }
            }
        }
        &self.current
    }

    pub fn value(&mut self, index: usize) -> Option<Value> {
        self.record().value(index).cloned()
    }

    pub fn value_by_name(&mut self, name: &str) -> Option<Value> {
        self.record().value_by_name(name).cloned()
    }

    fn materialize(&mut self, index: i64) -> Result<Record, ErrorKind> {
        let record_length = self.header.record_length as usize;
        let mut buffer = vec![0u8; record_length];
        self.inner
            .seek(SeekFrom::Start(self.header.record_position(index)))
            .map_err(ErrorKind::FileReadError)?;
        self.inner
            .read_exact(&mut buffer)
            .map_err(ErrorKind::FileReadError)?;

        let deleted = buffer[0] == 0x2A;
        let mut values = Vec::with_capacity(self.fields.len());
        for field in self.fields.iter() {
            let start = field.offset() as usize;
            let end = start + field.length() as usize;
            let value = codec::decode(&buffer[start..end], field, &self.encoding, &mut self.memo)?;
            values.push(value);
        }
        let mut record = Record::new(self.fields.clone(), values, index);
        record.set_deleted(deleted);
        Ok(record)
    }
}

impl<T: Read + Write + Seek> Table<T> {
    /// Writes one field's byte slice in place, updates the buffered record,
    /// and stamps `last_update`.
    pub fn set_value(&mut self, index: usize, value: Value) -> Result<(), Error> {
        self.clear_error();
        self.set_value_checked(index, value)
            .map_err(|kind| self.fail(kind))
    }

    pub fn set_value_by_name(&mut self, name: &str, value: Value) -> Result<(), Error> {
        let index = self
            .field_index(name)
            .ok_or(ErrorKind::InvalidIndexError)
            .map_err(|kind| self.fail(kind))?;
        self.set_value(index, value)
    }

    fn set_value_checked(&mut self, index: usize, value: Value) -> Result<(), ErrorKind> {
        if self.position == BEFORE_FIRST {
            return Err(ErrorKind::InvalidIndexError);
        }
        let field = self
            .fields
            .get(index)
            .cloned()
            .ok_or(ErrorKind::InvalidIndexError)?;

        let mut bytes = vec![0u8; field.length() as usize];
        codec::encode(&value, &field, &self.encoding, &mut bytes, &mut self.memo)?;

        let position = self.header.record_position(self.position) + field.offset() as u64;
        self.inner
            .seek(SeekFrom::Start(position))
            .map_err(ErrorKind::FileWriteError)?;
        self.inner
            .write_all(&bytes)
            .map_err(ErrorKind::FileWriteError)?;

        if !self.buffered {
            self.current = self.materialize(self.position)?;
        }
        self.current.set_value(index, value);
        self.buffered = true;

        self.stamp_last_update()
    }

    /// Applies every field of `record` via [`Table::set_value`]; if `record`
    /// is marked deleted, also deletes the current row first. Not
    /// transactional: on the first failing field this returns early, leaving
    /// the partial write on disk (documented limitation, matching the
    /// source).
    pub fn set_record(&mut self, record: &Record) -> Result<(), Error> {
        self.clear_error();
        if self.position == BEFORE_FIRST {
            return Err(self.fail(ErrorKind::InvalidIndexError));
        }
        if record.is_deleted() {
            self.remove_record(self.position)?;
        }
        for (index, value) in record.values().iter().enumerate() {
            self.set_value_checked(index, value.clone())
                .map_err(|kind| self.fail(kind))?;
        }
        Ok(())
    }

    /// Clones the template record (every field cleared) and appends it.
    pub fn add_record(&mut self) -> Result<(), Error> {
        let template = Record::template(self.fields.clone());
        self.add_record_with(template)
    }

    /// Grows the header's record count, writes a blank row and a trailing
    /// EOF marker, moves the cursor onto the new row, and writes `record`'s
    /// field values. A record marked deleted is deleted *after* its fields
    /// are written (the source calls `remove_record` on the then-current
    /// cursor before `add_record` has moved it; the only tenable reading is
    /// "delete the newly appended row once its fields land").
    pub fn add_record_with(&mut self, record: Record) -> Result<(), Error> {
        self.clear_error();
        self.add_record_inner(&record).map_err(|kind| self.fail(kind))
    }

    fn add_record_inner(&mut self, record: &Record) -> Result<(), ErrorKind> {
        let new_index = self.header.record_count as i64;
        let new_count = self
            .header
            .record_count
            .checked_add(1)
            .ok_or(ErrorKind::InvalidValue)?;

        let row_start = self.header.record_position(new_index);
        let record_length = self.header.record_length as usize;
        self.inner
            .seek(SeekFrom::Start(row_start))
            .map_err(ErrorKind::FileWriteError)?;
        DeletionFlag::Live
            .write_to(&mut self.inner)
            .map_err(ErrorKind::FileWriteError)?;
        self.inner
            .write_all(&blank_row_body(&self.fields, record_length))
            .map_err(ErrorKind::FileWriteError)?;
        self.inner
            .write_all(&[0x1Au8])
            .map_err(ErrorKind::FileWriteError)?;

        self.header.record_count = new_count;
        self.header
            .persist_record_count(&mut self.inner)
            .map_err(ErrorKind::FileWriteError)?;

        self.position = new_index;
        self.buffered = false;

        for (index, value) in record.values().iter().enumerate() {
            self.set_value_checked(index, value.clone())?;
        }
        if record.is_deleted() {
            self.remove_record_inner(new_index)?;
        }
        self.stamp_last_update()
    }

    /// Writes the deletion marker (`0x2A`) at record `index`'s byte 0. If
    /// `index` is the current cursor, also marks the buffered record
    /// deleted.
    pub fn remove_record(&mut self, index: i64) -> Result<(), Error> {
        self.clear_error();
        self.remove_record_inner(index)
            .map_err(|kind| self.fail(kind))
    }

    fn remove_record_inner(&mut self, index: i64) -> Result<(), ErrorKind> {
        let position = self.header.record_position(index);
        self.inner
            .seek(SeekFrom::Start(position))
            .map_err(ErrorKind::FileWriteError)?;
        DeletionFlag::Deleted
            .write_to(&mut self.inner)
            .map_err(ErrorKind::FileWriteError)?;

        if index == self.position {
            if !self.buffered {
                self.current = self.materialize(index)?;
                self.buffered = true;
            }
            self.current.set_deleted(true);
        }
        self.stamp_last_update()
    }

    /// Writes the codepage byte at header offset 29 and atomically swaps the
    /// active codec. Each tag maps to exactly one byte; there is no
    /// fall-through from `NotSet` into another codepage.
    pub fn set_codepage(&mut self, codepage: Codepage) -> Result<(), Error> {
        self.clear_error();
        self.set_codepage_inner(codepage)
            .map_err(|kind| self.fail(kind))
    }

    fn set_codepage_inner(&mut self, codepage: Codepage) -> Result<(), ErrorKind> {
        if matches!(codepage, Codepage::Unsupported(_)) {
            return Err(ErrorKind::UnsupportedCodePage(codepage.to_byte()));
        }
        self.header.codepage = codepage;
        self.header
            .persist_codepage(&mut self.inner)
            .map_err(ErrorKind::FileWriteError)?;
        self.encoding = codepage.encoding(self.default_codepage);
        self.buffered = false;
        Ok(())
    }

    fn stamp_last_update(&mut self) -> Result<(), ErrorKind> {
        self.header.last_update = Date::today();
        self.header
            .persist_last_update(&mut self.inner)
            .map_err(ErrorKind::FileWriteError)
    }
}

impl Table<std::fs::File> {
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::open_path(
            path.as_ref(),
            Options {
                read_only: true,
                default_codepage: None,
            },
        )
    }

    pub fn open_read_write<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::open_path(
            path.as_ref(),
            Options {
                read_only: false,
                default_codepage: None,
            },
        )
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P, options: Options) -> Result<Self, Error> {
        Self::open_path(path.as_ref(), options)
    }

    fn open_path(path: &Path, options: Options) -> Result<Self, Error> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(!options.read_only)
            .open(path)
            .map_err(|e| Error::from(ErrorKind::FileOpenError(e)))?;

        let mut source = file;
        let (header, fields, encoding) = Self::parse_header(&mut source, &options)?;
        let needs_memo = fields.iter().any(|f| f.field_type() == FieldType::Memo);

        let memo = if needs_memo {
            let flavor = header
                .memo_flavor
                .ok_or_else(|| Error::from(ErrorKind::UnsupportedFile))?;
            let memo_path = resolve_companion_file(path, memo_extension_for(flavor))
                .ok_or_else(|| Error::from(ErrorKind::UnsupportedFile))?;
            let memo_file = std::fs::OpenOptions::new()
                .read(true)
                .write(!options.read_only)
                .open(memo_path)
                .map_err(|e| Error::from(ErrorKind::FileOpenError(e)))?;
            Some(MemoStore::open(flavor, memo_file).map_err(|e| Error::from(ErrorKind::FileOpenError(e)))?)
        } else {
            None
        };

        let fields = Arc::new(fields);
        let current = Record::template(fields.clone());
        Ok(Self {
            inner: source,
            header,
            fields,
            encoding,
            default_codepage: options.default_codepage,
            memo,
            position: BEFORE_FIRST,
            buffered: false,
            current,
            last_error: ErrorTag::NoError,
            writable: !options.read_only,
            path: Some(path.to_path_buf()),
        })
    }
}

fn memo_extension_for(flavor: crate::memo::MemoFileType) -> &'static str {
    use crate::memo::MemoFileType;
    match flavor {
        MemoFileType::FoxBaseMemo => "fpt",
        MemoFileType::DbaseMemo | MemoFileType::DbaseMemo4 => "dbt",
    }
}

/// A case-insensitive sibling-directory scan for the companion memo file,
/// matched by base name (also case-insensitively) and expected extension.
fn resolve_companion_file(table_path: &Path, expected_ext: &str) -> Option<PathBuf> {
    let stem = table_path.file_stem()?.to_str()?;
    let dir = table_path.parent().filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::read_dir(&dir).ok()?.flatten().find_map(|entry| {
        let candidate = entry.path();
        let matches_stem = candidate
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.eq_ignore_ascii_case(stem))
            .unwrap_or(false);
        let matches_ext = candidate
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(expected_ext))
            .unwrap_or(false);
        (matches_stem && matches_ext).then_some(candidate)
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::field::FieldName;
    use crate::memo::MemoFileType;
    use byteorder::{LittleEndian, WriteBytesExt};
    use std::convert::TryFrom;
    use std::io::Cursor;

    fn build_simple_dbase_iii(records: &[&str]) -> Vec<u8> {
        let name_field = FieldDescriptor::new(
            FieldName::try_from("NAME").unwrap(),
            FieldType::Character,
            10,
            0,
        );
        let header = TableHeader {
            version_byte: 0x03,
            last_update: Date::new(2024, 1, 1),
            record_count: records.len() as u32,
            header_length: 32 + 32 + 1,
            record_length: 11,
            codepage: Codepage::NotSet,
            has_dbc: false,
            memo_flavor: None,
        };
        let mut buffer = Vec::new();
        header::write_header_and_fields(&header, &[name_field], &mut buffer, &crate::encoding::UnicodeLossy)
            .unwrap();
        for record in records {
            buffer.push(b' ');
            let mut bytes = record.as_bytes().to_vec();
            bytes.resize(10, b' ');
            buffer.extend_from_slice(&bytes);
        }
        buffer.push(0x1A);
        buffer
    }

    #[test]
    fn scenario_1_simple_dbase_iii_read() {
        let bytes = build_simple_dbase_iii(&["ALICE", "BOB"]);
        let mut table = Table::open(Cursor::new(bytes), Options::default()).unwrap();
        assert_eq!(table.size(), 2);

        assert!(table.next());
        assert_eq!(table.value(0), Some(Value::Character("ALICE".to_string())));
        assert!(table.next());
        assert_eq!(table.value(0), Some(Value::Character("BOB".to_string())));
        assert!(!table.next());
    }

    #[test]
    fn scenario_2_delete_then_reopen() {
        let bytes = build_simple_dbase_iii(&["ALICE", "BOB"]);
        let mut table = Table::open(Cursor::new(bytes), Options::default()).unwrap();
        table.seek(0);
        table.remove_record(table.at()).unwrap();

        let reopened_bytes = table.inner.into_inner();
        let mut reopened = Table::open(Cursor::new(reopened_bytes), Options::default()).unwrap();
        reopened.seek(0);
        assert!(reopened.record().is_deleted());
        assert_eq!(reopened.size(), 2);
    }

    #[test]
    fn scenario_3_append() {
        let bytes = build_simple_dbase_iii(&["ALICE", "BOB"]);
        let mut table = Table::open(Cursor::new(bytes), Options::default()).unwrap();
        table.add_record().unwrap();
        table.set_value(0, Value::Character("CARL".to_string())).unwrap();

        assert_eq!(table.size(), 3);
        table.seek(2);
        assert_eq!(table.value(0), Some(Value::Character("CARL".to_string())));

        let eof_position = table.header.record_position(3);
        let buffer = table.inner.get_ref();
        assert_eq!(buffer[eof_position as usize], 0x1A);
    }

    #[test]
    fn scenario_4_codepage_switch() {
        let name_field = FieldDescriptor::new(
            FieldName::try_from("NAME").unwrap(),
            FieldType::Character,
            10,
            0,
        );
        let header = TableHeader {
            version_byte: 0x03,
            last_update: Date::new(2024, 1, 1),
            record_count: 0,
            header_length: 32 + 32 + 1,
            record_length: 11,
            codepage: Codepage::Windows1251,
            has_dbc: false,
            memo_flavor: None,
        };
        let mut buffer = Vec::new();
        header::write_header_and_fields(&header, &[name_field], &mut buffer, &crate::encoding::UnicodeLossy)
            .unwrap();
        buffer.push(0x1A);

        let mut table = Table::open(Cursor::new(buffer), Options::default()).unwrap();
        table.set_codepage(Codepage::IBM866).unwrap();

        let bytes = table.inner.into_inner();
        assert_eq!(bytes[29], Codepage::IBM866.to_byte());

        let reopened = Table::open(Cursor::new(bytes), Options::default()).unwrap();
        assert_eq!(reopened.codepage(), Codepage::IBM866);
    }

    #[test]
    fn empty_table_boundary_behaviors() {
        let bytes = build_simple_dbase_iii(&[]);
        let mut table = Table::open(Cursor::new(bytes), Options::default()).unwrap();
        assert!(!table.first());
        assert!(!table.next());
        assert_eq!(table.record().record_index(), -1);
    }

    #[test]
    fn seek_clamps_out_of_range_positions() {
        let bytes = build_simple_dbase_iii(&["ALICE", "BOB"]);
        let mut table = Table::open(Cursor::new(bytes), Options::default()).unwrap();
        table.seek(-5);
        assert_eq!(table.at(), -1);
        table.seek(99);
        assert_eq!(table.at(), 1);
    }

    #[test]
    fn scenario_6_foxpro_memo_read_and_append() {
        let memo_field = FieldDescriptor::new(
            FieldName::try_from("NOTES").unwrap(),
            FieldType::Memo,
            4,
            0,
        );
        let header = TableHeader {
            version_byte: 0xF5,
            last_update: Date::new(2024, 1, 1),
            record_count: 1,
            header_length: 32 + 32 + 1,
            record_length: 5,
            codepage: Codepage::NotSet,
            has_dbc: false,
            memo_flavor: Some(MemoFileType::FoxBaseMemo),
        };
        let mut table_bytes = Vec::new();
        header::write_header_and_fields(&header, &[memo_field], &mut table_bytes, &crate::encoding::UnicodeLossy)
            .unwrap();
        table_bytes.push(b' ');
        table_bytes.write_u32::<LittleEndian>(1).unwrap();
        table_bytes.push(0x1A);

        let mut memo_bytes = Vec::new();
        memo_bytes.write_u32::<byteorder::BigEndian>(1).unwrap();
        memo_bytes.write_u16::<byteorder::BigEndian>(0).unwrap();
        memo_bytes.write_u16::<byteorder::BigEndian>(64).unwrap();
        memo_bytes.resize(64, 0);
        memo_bytes.write_u32::<byteorder::BigEndian>(1).unwrap();
        memo_bytes.write_u32::<byteorder::BigEndian>(11).unwrap();
        memo_bytes.extend_from_slice(b"hello world");

        let mut table = Table::open_with_memo(
            Cursor::new(table_bytes),
            Some(Cursor::new(memo_bytes)),
            Options::default(),
        )
        .unwrap();
        table.seek(0);
        assert_eq!(
            table.value(0),
            Some(Value::Memo(crate::value::MemoValue::Text("hello world".to_string())))
        );

        let before = table.memo.as_ref().unwrap().next_free_block();
        table.set_value(0, Value::Memo(crate::value::MemoValue::Text("xy".to_string()))).unwrap();
        let after = table.memo.as_ref().unwrap().next_free_block();
        assert_eq!(after - before, (8u64 + 2).div_ceil(64) as u32);
    }

    #[test]
    fn add_record_with_binary_memo_field_does_not_read_a_blank_index() {
        // The blank row `add_record` writes before applying field values
        // must zero-fill a 4-byte (binary) Memo slot rather than space-fill
        // it: a space-filled slot decodes as block index 0x20202020 and
        // `set_value_checked`'s re-materialize step would try (and fail) to
        // fetch that nonexistent blob.
        let memo_field = FieldDescriptor::new(
            FieldName::try_from("NOTES").unwrap(),
            FieldType::Memo,
            4,
            0,
        );
        let header = TableHeader {
            version_byte: 0xF5,
            last_update: Date::new(2024, 1, 1),
            record_count: 0,
            header_length: 32 + 32 + 1,
            record_length: 5,
            codepage: Codepage::NotSet,
            has_dbc: false,
            memo_flavor: Some(MemoFileType::FoxBaseMemo),
        };
        let mut table_bytes = Vec::new();
        header::write_header_and_fields(&header, &[memo_field], &mut table_bytes, &crate::encoding::UnicodeLossy)
            .unwrap();
        table_bytes.push(0x1A);

        let mut memo_bytes = Vec::new();
        memo_bytes.write_u32::<byteorder::BigEndian>(1).unwrap();
        memo_bytes.write_u16::<byteorder::BigEndian>(0).unwrap();
        memo_bytes.write_u16::<byteorder::BigEndian>(64).unwrap();
        memo_bytes.resize(64, 0);

        let mut table = Table::open_with_memo(
            Cursor::new(table_bytes),
            Some(Cursor::new(memo_bytes)),
            Options::default(),
        )
        .unwrap();

        table.add_record().unwrap();
        assert_eq!(
            table.value(0),
            Some(Value::Memo(crate::value::MemoValue::Text(String::new())))
        );
    }
}
