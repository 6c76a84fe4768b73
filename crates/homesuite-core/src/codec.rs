//! Binary record codec shared by every homesuite tool.
//!
//! A record is a fixed sequence of little-endian primitives with no version
//! tag and no checksum. Strings and byte blobs carry a `u32` length prefix,
//! repeated records an `i32` count prefix. Readers must consume fields in
//! exactly the order writers produced them.

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;

/// Errors raised while encoding or decoding records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("length prefix {length} exceeds the {remaining} remaining bytes")]
    LengthOutOfBounds { length: usize, remaining: usize },

    #[error("negative record count: {0}")]
    NegativeCount(i32),

    #[error("invalid boolean byte: {0:#04x}")]
    InvalidBool(u8),

    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    #[error("timestamp out of range: {0} ms")]
    TimestampOutOfRange(i64),

    #[error("{0} trailing bytes after the last record")]
    TrailingBytes(usize),

    #[error("{what} too long to encode ({len})")]
    TooLong { what: &'static str, len: usize },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Current time at the millisecond precision timestamps are stored with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A value with a fixed binary layout.
pub trait Record: Sized {
    /// Append this record's fields to `w`.
    fn encode(&self, w: &mut RecordWriter) -> Result<()>;

    /// Read one record from `r`, in the same field order as [`Record::encode`].
    fn decode(r: &mut RecordReader<'_>) -> Result<Self>;
}

/// A record that lives in a profile's entity list and is addressed by id.
pub trait Entity: Record {
    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
}

/// Growable output buffer for record encoding.
#[derive(Debug, Default, Clone)]
pub struct RecordWriter {
    buf: Vec<u8>,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write an `i32` record count.
    pub fn write_count(&mut self, n: usize) -> Result<()> {
        let n = i32::try_from(n).map_err(|_| CodecError::TooLong {
            what: "record list",
            len: n,
        })?;
        self.write_i32(n);
        Ok(())
    }

    /// Write a `u32` length prefix followed by the raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| CodecError::TooLong {
            what: "byte field",
            len: bytes.len(),
        })?;
        self.write_u32(len);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Write a length-prefixed UTF-8 string. Empty strings are a zero prefix.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Timestamps are stored as signed milliseconds since the Unix epoch.
    pub fn write_timestamp(&mut self, t: &DateTime<Utc>) {
        self.write_i64(t.timestamp_millis());
    }

    /// Presence flag, then the timestamp only when present.
    pub fn write_opt_timestamp(&mut self, t: Option<&DateTime<Utc>>) {
        match t {
            Some(t) => {
                self.write_bool(true);
                self.write_timestamp(t);
            }
            None => self.write_bool(false),
        }
    }

    pub fn write_str_list(&mut self, items: &[String]) -> Result<()> {
        self.write_count(items.len())?;
        for item in items {
            self.write_str(item)?;
        }
        Ok(())
    }

    pub fn write_record<R: Record>(&mut self, record: &R) -> Result<()> {
        record.encode(self)
    }
}

/// Cursor over an in-memory byte slice. Every read is bounds-checked.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fail if any bytes are left unread.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(CodecError::UnexpectedEof {
                needed: n,
                remaining,
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_array().map(i64::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    pub fn read_count(&mut self) -> Result<usize> {
        let n = self.read_i32()?;
        usize::try_from(n).map_err(|_| CodecError::NegativeCount(n))
    }

    /// Read a `u32`-prefixed byte blob, checking the prefix against what is left.
    pub fn read_byte_slice(&mut self) -> Result<&'a [u8]> {
        let length = self.read_u32()? as usize;
        let remaining = self.remaining();
        if length > remaining {
            return Err(CodecError::LengthOutOfBounds { length, remaining });
        }
        self.take(length)
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.read_byte_slice().map(<[u8]>::to_vec)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_byte_slice()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn read_timestamp(&mut self) -> Result<DateTime<Utc>> {
        let ms = self.read_i64()?;
        DateTime::<Utc>::from_timestamp_millis(ms).ok_or(CodecError::TimestampOutOfRange(ms))
    }

    pub fn read_opt_timestamp(&mut self) -> Result<Option<DateTime<Utc>>> {
        if self.read_bool()? {
            self.read_timestamp().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn read_str_list(&mut self) -> Result<Vec<String>> {
        let count = self.read_count()?;
        // Each string needs at least its 4-byte prefix.
        let mut items = Vec::with_capacity(count.min(self.remaining() / 4));
        for _ in 0..count {
            items.push(self.read_string()?);
        }
        Ok(items)
    }

    pub fn read_record<R: Record>(&mut self) -> Result<R> {
        R::decode(self)
    }
}

/// Write a count followed by every record.
pub fn encode_list<R: Record>(records: &[R], w: &mut RecordWriter) -> Result<()> {
    w.write_count(records.len())?;
    for record in records {
        record.encode(w)?;
    }
    Ok(())
}

/// Read a count and that many records. A short stream is an error; no partial
/// list is ever returned.
pub fn decode_list<R: Record>(r: &mut RecordReader<'_>) -> Result<Vec<R>> {
    let count = r.read_count()?;
    let mut records = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        records.push(R::decode(r)?);
    }
    Ok(records)
}

pub fn encode_to_vec<R: Record>(record: &R) -> Result<Vec<u8>> {
    let mut w = RecordWriter::new();
    record.encode(&mut w)?;
    Ok(w.into_bytes())
}

/// Decode a single record that must span the whole slice.
pub fn decode_from_slice<R: Record>(data: &[u8]) -> Result<R> {
    let mut r = RecordReader::new(data);
    let record = R::decode(&mut r)?;
    r.finish()?;
    Ok(record)
}

pub fn encode_list_to_vec<R: Record>(records: &[R]) -> Result<Vec<u8>> {
    let mut w = RecordWriter::new();
    encode_list(records, &mut w)?;
    Ok(w.into_bytes())
}

/// Decode a counted list that must span the whole slice.
pub fn decode_list_from_slice<R: Record>(data: &[u8]) -> Result<Vec<R>> {
    let mut r = RecordReader::new(data);
    let records = decode_list(&mut r)?;
    r.finish()?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, PartialEq)]
    struct Sample {
        id: u64,
        label: String,
        flag: bool,
        when: Option<DateTime<Utc>>,
    }

    impl Record for Sample {
        fn encode(&self, w: &mut RecordWriter) -> Result<()> {
            w.write_u64(self.id);
            w.write_str(&self.label)?;
            w.write_bool(self.flag);
            w.write_opt_timestamp(self.when.as_ref());
            Ok(())
        }

        fn decode(r: &mut RecordReader<'_>) -> Result<Self> {
            Ok(Self {
                id: r.read_u64()?,
                label: r.read_string()?,
                flag: r.read_bool()?,
                when: r.read_opt_timestamp()?,
            })
        }
    }

    fn sample() -> Sample {
        Sample {
            id: 7,
            label: "groceries".into(),
            flag: true,
            when: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn primitives_are_little_endian() {
        let mut w = RecordWriter::new();
        w.write_i32(1);
        w.write_u64(0x0102);
        w.write_str("ab").unwrap();
        assert_eq!(
            w.as_bytes(),
            &[1, 0, 0, 0, 0x02, 0x01, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, b'a', b'b']
        );
    }

    #[test]
    fn empty_string_is_zero_length_prefix() {
        let mut w = RecordWriter::new();
        w.write_str("").unwrap();
        assert_eq!(w.as_bytes(), &[0, 0, 0, 0]);
        let mut r = RecordReader::new(w.as_bytes());
        assert_eq!(r.read_string().unwrap(), "");
        assert!(r.is_empty());
    }

    #[test]
    fn boundary_integers_round_trip() {
        let mut w = RecordWriter::new();
        w.write_u64(0);
        w.write_u64(u64::MAX);
        w.write_i64(i64::MIN);
        w.write_i64(i64::MAX);
        w.write_i32(i32::MAX);
        let bytes = w.into_bytes();
        let mut r = RecordReader::new(&bytes);
        assert_eq!(r.read_u64().unwrap(), 0);
        assert_eq!(r.read_u64().unwrap(), u64::MAX);
        assert_eq!(r.read_i64().unwrap(), i64::MIN);
        assert_eq!(r.read_i64().unwrap(), i64::MAX);
        assert_eq!(r.read_i32().unwrap(), i32::MAX);
        r.finish().unwrap();
    }

    #[test]
    fn record_round_trip() {
        let original = sample();
        let bytes = encode_to_vec(&original).unwrap();
        assert_eq!(decode_from_slice::<Sample>(&bytes).unwrap(), original);
    }

    #[test]
    fn current_time_round_trips_exactly() {
        let mut when = sample();
        when.when = Some(now());
        let back: Sample = decode_from_slice(&encode_to_vec(&when).unwrap()).unwrap();
        assert_eq!(back, when);
    }

    #[test]
    fn absent_date_differs_from_epoch() {
        let mut absent = sample();
        absent.when = None;
        let mut epoch = sample();
        epoch.when = Some(Utc.timestamp_millis_opt(0).unwrap());

        let absent_back: Sample = decode_from_slice(&encode_to_vec(&absent).unwrap()).unwrap();
        let epoch_back: Sample = decode_from_slice(&encode_to_vec(&epoch).unwrap()).unwrap();
        assert_eq!(absent_back.when, None);
        assert_eq!(epoch_back.when, epoch.when);
    }

    #[test]
    fn empty_list_round_trip() {
        let bytes = encode_list_to_vec::<Sample>(&[]).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        assert!(decode_list_from_slice::<Sample>(&bytes).unwrap().is_empty());
    }

    #[test]
    fn truncated_record_fails() {
        let bytes = encode_to_vec(&sample()).unwrap();
        for cut in 0..bytes.len() {
            assert!(
                decode_from_slice::<Sample>(&bytes[..cut]).is_err(),
                "decoding {cut} of {} bytes should fail",
                bytes.len()
            );
        }
    }

    #[test]
    fn truncated_list_discards_partial_result() {
        let records = vec![sample(), sample(), sample()];
        let bytes = encode_list_to_vec(&records).unwrap();
        let err = decode_list_from_slice::<Sample>(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEof { .. }));
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let mut w = RecordWriter::new();
        w.write_u32(1_000);
        w.write_u8(b'x');
        let bytes = w.into_bytes();
        let err = RecordReader::new(&bytes).read_string().unwrap_err();
        assert_eq!(
            err,
            CodecError::LengthOutOfBounds {
                length: 1_000,
                remaining: 1
            }
        );
    }

    #[test]
    fn negative_count_is_rejected() {
        let bytes = (-1i32).to_le_bytes();
        let err = decode_list_from_slice::<Sample>(&bytes).unwrap_err();
        assert_eq!(err, CodecError::NegativeCount(-1));
    }

    #[test]
    fn invalid_bool_is_rejected() {
        let err = RecordReader::new(&[2]).read_bool().unwrap_err();
        assert_eq!(err, CodecError::InvalidBool(2));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let bytes = [2, 0, 0, 0, 0xff, 0xfe];
        let err = RecordReader::new(&bytes).read_string().unwrap_err();
        assert_eq!(err, CodecError::InvalidUtf8);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = encode_to_vec(&sample()).unwrap();
        bytes.push(0);
        assert_eq!(
            decode_from_slice::<Sample>(&bytes).unwrap_err(),
            CodecError::TrailingBytes(1)
        );
    }

    #[test]
    fn string_list_round_trip() {
        let items = vec!["oil change".to_string(), String::new(), "filter".to_string()];
        let mut w = RecordWriter::new();
        w.write_str_list(&items).unwrap();
        let bytes = w.into_bytes();
        let mut r = RecordReader::new(&bytes);
        assert_eq!(r.read_str_list().unwrap(), items);
        r.finish().unwrap();
    }
}
