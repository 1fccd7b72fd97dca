//! Typed values stored in a record's fields.

use crate::error::ErrorKind;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::str::FromStr;

/// A single field's value.
///
/// `Null` stands in for every flavor of "no value" the wire formats can
/// produce: a blank Date, a blank Logical (`?`), a pad-only Character, or an
/// unparsable payload on any type. The original keeps these as distinct
/// "null" vs. "invalid" outcomes; this engine folds them into one variant,
/// matching how the specification itself lists "null/invalid" as a single
/// case of the value union.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Character(String),
    Date(Date),
    DateTime(DateTime),
    Number(f64),
    Integer(i32),
    Logical(bool),
    Memo(MemoValue),
    Null,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Character(s) => Some(s),
            Value::Memo(MemoValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Logical(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The payload of a Memo field: text decoded with the active code page, or
/// raw bytes for a non-text memo block (signature != text in the
/// dBASE IV / FoxPro dialects).
#[derive(Debug, Clone, PartialEq)]
pub enum MemoValue {
    Text(String),
    Bytes(Vec<u8>),
}

/// A calendar date, with no timezone concept, matching the wire format's
/// own lack of one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Date {
    pub(crate) year: u32,
    pub(crate) month: u32,
    pub(crate) day: u32,
}

impl Date {
    /// # Panics
    /// Panics if the year exceeds 4 digits, the month exceeds 12, or the day
    /// exceeds 31.
    pub const fn new(year: u32, month: u32, day: u32) -> Self {
        if year > 9999 {
            panic!("year cannot have more than 4 digits");
        }
        if month > 12 {
            panic!("month cannot be greater than 12");
        }
        if day > 31 {
            panic!("day cannot be greater than 31");
        }
        Self { year, month, day }
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Converts to the day count since the Unix epoch.
    pub fn to_unix_days(&self) -> i32 {
        self.to_julian_day_number() - 2_440_588
    }

    /// The current UTC calendar date, used to stamp `last_update` on every
    /// mutating table operation.
    pub(crate) fn today() -> Self {
        let today = time::OffsetDateTime::now_utc().date();
        Self::new(
            today.year() as u32,
            u32::from(u8::from(today.month())),
            u32::from(today.day()),
        )
    }

    // https://en.wikipedia.org/wiki/Julian_day , "Julian or Gregorian
    // calendar from Julian day number".
    pub(crate) fn from_julian_day_number(jdn: i32) -> Self {
        const Y: i32 = 4716;
        const J: i32 = 1401;
        const M: i32 = 2;
        const N: i32 = 12;
        const R: i32 = 4;
        const P: i32 = 1461;
        const V: i32 = 3;
        const U: i32 = 5;
        const S: i32 = 153;
        const W: i32 = 2;
        const B: i32 = 274_277;
        const C: i32 = -38;

        let f = jdn + J + ((4 * jdn + B) / 146_097 * 3) / 4 + C;
        let e = R * f + V;
        let g = (e % P) / R;
        let h = U * g + W;

        let day = (h % S) / U + 1;
        let month = ((h / S + M) % N) + 1;
        let year = (e / P) - Y + (N + M - month) / N;

        Date {
            year: year as u32,
            month: month as u32,
            day: day as u32,
        }
    }

    pub(crate) fn to_julian_day_number(&self) -> i32 {
        let (month, year) = if self.month > 2 {
            (self.month - 3, self.year)
        } else {
            (self.month + 9, self.year.wrapping_sub(1))
        };

        let century = year / 100;
        let decade = year - 100 * century;

        ((146_097 * century) / 4
            + (1461 * decade) / 4
            + (153 * month + 2) / 5
            + self.day
            + 1_721_119) as i32
    }
}

impl FromStr for Date {
    type Err = ErrorKind;

    /// Parses `YYYYMMDD`. Any non-numeric substring is reported as
    /// [`ErrorKind::InvalidValue`] rather than propagated as a parse error,
    /// per the field codec's contract that a malformed Date decodes to
    /// [`Value::Null`] rather than failing the whole record.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 {
            return Err(ErrorKind::InvalidValue);
        }
        let year = s[0..4].parse::<u32>().map_err(|_| ErrorKind::InvalidValue)?;
        let month = s[4..6].parse::<u32>().map_err(|_| ErrorKind::InvalidValue)?;
        let day = s[6..8].parse::<u32>().map_err(|_| ErrorKind::InvalidValue)?;
        Ok(Self { year, month, day })
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

/// A time of day at second resolution, as stored alongside a [`Date`] in a
/// DateTime field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Time {
    pub(crate) hours: u32,
    pub(crate) minutes: u32,
    pub(crate) seconds: u32,
}

impl Time {
    const HOURS_FACTOR: i64 = 3_600_000;
    const MINUTES_FACTOR: i64 = 60_000;
    const SECONDS_FACTOR: i64 = 1_000;

    /// # Panics
    /// Panics if hours exceeds 24 or minutes/seconds exceed 60.
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        if hours > 24 || minutes > 60 || seconds > 60 {
            panic!("invalid time of day");
        }
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub(crate) fn from_ms_since_midnight(ms: i32) -> Self {
        let mut ms = ms as i64;
        let hours = (ms / Self::HOURS_FACTOR) as u32;
        ms -= hours as i64 * Self::HOURS_FACTOR;
        let minutes = (ms / Self::MINUTES_FACTOR) as u32;
        ms -= minutes as i64 * Self::MINUTES_FACTOR;
        let seconds = (ms / Self::SECONDS_FACTOR) as u32;
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    pub(crate) fn to_ms_since_midnight(&self) -> i32 {
        (self.hours as i64 * Self::HOURS_FACTOR
            + self.minutes as i64 * Self::MINUTES_FACTOR
            + self.seconds as i64 * Self::SECONDS_FACTOR) as i32
    }
}

/// A combined date and time, with two distinct wire encodings (see
/// [`crate::codec`]).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DateTime {
    pub(crate) date: Date,
    pub(crate) time: Time,
}

impl DateTime {
    pub fn new(date: Date, time: Time) -> Self {
        Self { date, time }
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn time(&self) -> Time {
        self.time
    }

    pub fn to_unix_timestamp(&self) -> i64 {
        self.date.to_unix_days() as i64 * 86_400
            + self.time.hours as i64 * 3600
            + self.time.minutes as i64 * 60
            + self.time.seconds as i64
    }

    /// Reads the 8-byte `[i32 julian_day][i32 ms_since_midnight]` wire form.
    pub(crate) fn read_binary<R: std::io::Read>(src: &mut R) -> std::io::Result<Self> {
        let julian_day = src.read_i32::<LittleEndian>()?;
        let ms = src.read_i32::<LittleEndian>()?;
        Ok(Self {
            date: Date::from_julian_day_number(julian_day),
            time: Time::from_ms_since_midnight(ms),
        })
    }

    /// Writes the 8-byte `[i32 julian_day][i32 ms_since_midnight]` wire form.
    pub(crate) fn write_binary<W: std::io::Write>(&self, dst: &mut W) -> std::io::Result<()> {
        dst.write_i32::<LittleEndian>(self.date.to_julian_day_number())?;
        dst.write_i32::<LittleEndian>(self.time.to_ms_since_midnight())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn julian_day_round_trip() {
        let date = Date {
            year: 2019,
            month: 7,
            day: 20,
        };
        let jdn = date.to_julian_day_number();
        assert_eq!(jdn, 2_458_685);
        assert_eq!(Date::from_julian_day_number(jdn), date);
    }

    #[test]
    fn unix_epoch_is_day_zero() {
        let date = Date::new(1970, 1, 1);
        assert_eq!(date.to_unix_days(), 0);
    }

    #[test]
    fn datetime_scenario_5_byte_exact() {
        // 2024-03-15T12:34:56 from the specification's named scenario.
        let date = Date::new(2024, 3, 15);
        let time = Time::new(12, 34, 56);
        let datetime = DateTime::new(date, time);

        let mut bytes = Vec::new();
        datetime.write_binary(&mut bytes).unwrap();

        let jdn = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let ms = i32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(jdn, 2_460_385);
        assert_eq!(ms, 45_296_000);

        let mut cursor = std::io::Cursor::new(bytes);
        let read_back = DateTime::read_binary(&mut cursor).unwrap();
        assert_eq!(read_back.to_unix_timestamp(), datetime.to_unix_timestamp());
    }

    #[test]
    fn date_parses_from_digits_only() {
        assert_eq!("20190101".parse::<Date>().unwrap(), Date::new(2019, 1, 1));
        assert!("  eeeeee".parse::<Date>().is_err());
    }
}
