use std::string::FromUtf8Error;

/// The kinds of failure the engine can report.
///
/// Mirrors the table's error taxonomy: every failing operation is
/// classified into exactly one of these kinds.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The byte source could not be opened.
    FileOpenError(std::io::Error),
    /// A short read, a seek past the end, or missing descriptor bytes.
    FileReadError(std::io::Error),
    /// A short write, a non-writable handle, or a write attempted in read-only mode.
    FileWriteError(std::io::Error),
    /// A value has no valid representation (e.g. an out-of-range Julian day).
    InvalidValue,
    /// A field index (or name) falls outside the table's declared fields.
    InvalidIndexError,
    /// The value being written is not convertible to the field's declared type.
    InvalidTypeError,
    /// An unrecognized version byte, an unsupported memo field length, or a
    /// missing companion memo file.
    UnsupportedFile,
    /// A code page byte has no known mapping.
    UnsupportedCodePage(u8),
    /// A string from the file could not be decoded with the active code page.
    StringDecodeError(DecodeError),
    /// A string destined for the file could not be encoded with the active code page.
    StringEncodeError(EncodeError),
    /// A numeric field's text payload failed to parse.
    ParseFloatError(std::num::ParseFloatError),
    ParseIntError(std::num::ParseIntError),
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::FileOpenError(err) => write!(f, "could not open the table file: {err}"),
            ErrorKind::FileReadError(err) => write!(f, "short or failed read: {err}"),
            ErrorKind::FileWriteError(err) => write!(f, "short or failed write: {err}"),
            ErrorKind::InvalidValue => write!(f, "the value has no valid representation"),
            ErrorKind::InvalidIndexError => write!(f, "field index out of range"),
            ErrorKind::InvalidTypeError => {
                write!(f, "the value is not convertible to the field's type")
            }
            ErrorKind::UnsupportedFile => write!(f, "unrecognized or unsupported table file"),
            ErrorKind::UnsupportedCodePage(byte) => {
                write!(f, "code page byte 0x{byte:02X} has no known mapping")
            }
            ErrorKind::StringDecodeError(err) => write!(f, "could not decode string: {err}"),
            ErrorKind::StringEncodeError(err) => write!(f, "could not encode string: {err}"),
            ErrorKind::ParseFloatError(err) => write!(f, "could not parse a float value: {err}"),
            ErrorKind::ParseIntError(err) => write!(f, "could not parse an integer value: {err}"),
        }
    }
}

impl std::error::Error for ErrorKind {}

/// The error type returned by every fallible operation of this crate.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    /// Returns the kind of error that happened.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// The flat error taxonomy from the original `error()` accessor, with no
/// payload carried along. [`Error`]/[`ErrorKind`] are the idiomatic `Result`
/// type for this crate; `ErrorTag` exists only for [`crate::Table::last_error`],
/// for callers migrating from a query-after-call style.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorTag {
    NoError,
    FileOpenError,
    FileReadError,
    FileWriteError,
    InvalidValue,
    InvalidIndexError,
    InvalidTypeError,
    UnsupportedFile,
    UnsupportedCodePage,
    StringDecodeError,
    StringEncodeError,
    ParseFloatError,
    ParseIntError,
}

impl Default for ErrorTag {
    fn default() -> Self {
        ErrorTag::NoError
    }
}

impl From<&ErrorKind> for ErrorTag {
    fn from(kind: &ErrorKind) -> Self {
        match kind {
            ErrorKind::FileOpenError(_) => ErrorTag::FileOpenError,
            ErrorKind::FileReadError(_) => ErrorTag::FileReadError,
            ErrorKind::FileWriteError(_) => ErrorTag::FileWriteError,
            ErrorKind::InvalidValue => ErrorTag::InvalidValue,
            ErrorKind::InvalidIndexError => ErrorTag::InvalidIndexError,
            ErrorKind::InvalidTypeError => ErrorTag::InvalidTypeError,
            ErrorKind::UnsupportedFile => ErrorTag::UnsupportedFile,
            ErrorKind::UnsupportedCodePage(_) => ErrorTag::UnsupportedCodePage,
            ErrorKind::StringDecodeError(_) => ErrorTag::StringDecodeError,
            ErrorKind::StringEncodeError(_) => ErrorTag::StringEncodeError,
            ErrorKind::ParseFloatError(_) => ErrorTag::ParseFloatError,
            ErrorKind::ParseIntError(_) => ErrorTag::ParseIntError,
        }
    }
}

/// The default conversion for a bare `?` on an I/O operation is a read
/// failure; call sites that write instead map explicitly to
/// [`ErrorKind::FileWriteError`].
impl From<std::io::Error> for ErrorKind {
    fn from(e: std::io::Error) -> Self {
        ErrorKind::FileReadError(e)
    }
}

impl From<std::num::ParseFloatError> for ErrorKind {
    fn from(e: std::num::ParseFloatError) -> Self {
        ErrorKind::ParseFloatError(e)
    }
}

impl From<std::num::ParseIntError> for ErrorKind {
    fn from(e: std::num::ParseIntError) -> Self {
        ErrorKind::ParseIntError(e)
    }
}

impl From<DecodeError> for ErrorKind {
    fn from(e: DecodeError) -> Self {
        ErrorKind::StringDecodeError(e)
    }
}

impl From<EncodeError> for ErrorKind {
    fn from(e: EncodeError) -> Self {
        ErrorKind::StringEncodeError(e)
    }
}

/// A string read from a table or memo file could not be decoded.
#[derive(Debug)]
#[non_exhaustive]
pub enum DecodeError {
    Message(String),
    FromUtf8(FromUtf8Error),
    NotAscii,
    #[cfg(feature = "yore")]
    Yore(yore::DecodeError),
}

impl From<String> for DecodeError {
    fn from(msg: String) -> Self {
        Self::Message(msg)
    }
}

#[cfg(feature = "yore")]
impl From<yore::DecodeError> for DecodeError {
    fn from(e: yore::DecodeError) -> Self {
        DecodeError::Yore(e)
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for DecodeError {}

/// A string could not be encoded with the active code page.
#[derive(Debug)]
#[non_exhaustive]
pub enum EncodeError {
    Message(String),
    NotPermitted,
    #[cfg(feature = "yore")]
    Yore(yore::EncodeError),
}

impl From<String> for EncodeError {
    fn from(msg: String) -> Self {
        Self::Message(msg)
    }
}

#[cfg(feature = "yore")]
impl From<yore::EncodeError> for EncodeError {
    fn from(e: yore::EncodeError) -> Self {
        EncodeError::Yore(e)
    }
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for EncodeError {}
