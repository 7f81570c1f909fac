//! Primitive readers the grammar walker composes into the full document
//! grammar: fixed literals, bounded text, hex, unsigned integers, and
//! the one RFC 3339-ish timestamp format the documents use.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::byte_source::ByteSource;
use crate::tee::TeeReader;

/// A structural grammar violation: the byte stream did not match the
/// fixed production expected at this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub(crate) String);

impl ParseError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub(crate) fn from_source<E: core::fmt::Debug>(e: &E) -> Self {
        Self(format!("byte source error: {e:?}"))
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Longest fixed literal the grammar ever matches in one call.
const MAX_LITERAL: usize = 48;

/// Consume and verify an exact byte sequence (punctuation, field-name
/// prefixes). Never used for values that require a semantic comparison;
/// those go through [`text`] or [`hex`] so a mismatch can be classified
/// as a semantic outcome rather than a grammar error.
pub(crate) fn literal<S: ByteSource, const N: usize>(
    tee: &mut TeeReader<S, N>,
    expected: &[u8],
) -> Result<(), ParseError> {
    if expected.len() > MAX_LITERAL {
        return Err(ParseError::new("internal: literal exceeds MAX_LITERAL"));
    }
    let mut buf = [0u8; MAX_LITERAL];
    tee.read(&mut buf[..expected.len()])?;
    if &buf[..expected.len()] != expected {
        return Err(ParseError::new(format!(
            "expected {:?}, got {:?}",
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(&buf[..expected.len()]),
        )));
    }
    Ok(())
}

/// Read a quoted string (no escape processing, matching the documents'
/// restricted charset) into `out`, returning the number of bytes written.
pub(crate) fn text<S: ByteSource, const N: usize>(
    tee: &mut TeeReader<S, N>,
    out: &mut [u8],
) -> Result<usize, ParseError> {
    literal(tee, b"\"")?;
    let mut n = 0;
    loop {
        let c = tee.peek()?;
        if c == b'"' {
            let mut q = [0u8; 1];
            tee.read(&mut q)?;
            return Ok(n);
        }
        if n >= out.len() {
            return Err(ParseError::new("text value exceeds buffer"));
        }
        let mut b = [0u8; 1];
        tee.read(&mut b)?;
        out[n] = b[0];
        n += 1;
    }
}

/// Read and discard a quoted string without storing its content.
pub(crate) fn skip_text<S: ByteSource, const N: usize>(tee: &mut TeeReader<S, N>) -> Result<(), ParseError> {
    literal(tee, b"\"")?;
    loop {
        let mut b = [0u8; 1];
        tee.read(&mut b)?;
        if b[0] == b'"' {
            return Ok(());
        }
    }
}

fn hex_nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Read a quoted hex string, decoding nibble pairs MSB-first (`hi << 4 | lo`)
/// into `out`. Returns the number of decoded bytes. Rejects odd-length
/// hex, since an unmatched trailing nibble pairs with the closing quote
/// and fails the nibble check.
pub(crate) fn hex<S: ByteSource, const N: usize>(
    tee: &mut TeeReader<S, N>,
    out: &mut [u8],
) -> Result<usize, ParseError> {
    literal(tee, b"\"")?;
    let mut n = 0;
    loop {
        let c = tee.peek()?;
        if c == b'"' {
            let mut q = [0u8; 1];
            tee.read(&mut q)?;
            return Ok(n);
        }
        if n >= out.len() {
            return Err(ParseError::new("hex value exceeds buffer"));
        }
        let mut pair = [0u8; 2];
        tee.read(&mut pair)?;
        let hi = hex_nibble(pair[0]).ok_or_else(|| ParseError::new("invalid hex digit"))?;
        let lo = hex_nibble(pair[1]).ok_or_else(|| ParseError::new("invalid hex digit"))?;
        out[n] = (hi << 4) | lo;
        n += 1;
    }
}

/// Read one or more ASCII digits as an unsigned integer. Requires at
/// least one digit; stops at the first non-digit without consuming it.
pub(crate) fn uint<S: ByteSource, const N: usize>(tee: &mut TeeReader<S, N>) -> Result<u32, ParseError> {
    let mut v: u32 = 0;
    let mut count = 0u32;
    loop {
        let c = tee.peek()?;
        if !c.is_ascii_digit() {
            break;
        }
        let mut b = [0u8; 1];
        tee.read(&mut b)?;
        v = v.wrapping_mul(10).wrapping_add(u32::from(b[0] - b'0'));
        count += 1;
    }
    if count == 0 {
        return Err(ParseError::new("expected at least one digit"));
    }
    Ok(v)
}

fn fixed_digits<S: ByteSource, const N: usize>(
    tee: &mut TeeReader<S, N>,
    count: usize,
) -> Result<u32, ParseError> {
    debug_assert!(count <= 4);
    let mut buf = [0u8; 4];
    tee.read(&mut buf[..count])?;
    let mut v = 0u32;
    for &b in &buf[..count] {
        if !b.is_ascii_digit() {
            return Err(ParseError::new("expected digit"));
        }
        v = v * 10 + u32::from(b - b'0');
    }
    Ok(v)
}

/// Read a quoted `"YYYY-MM-DDTHH:MM:SSZ"` timestamp. The trailing `Z"`
/// is matched as a single literal so a malformed closing quote can never
/// be mistaken for a time-zone designator, or vice versa.
pub(crate) fn time<S: ByteSource, const N: usize>(tee: &mut TeeReader<S, N>) -> Result<DateTime<Utc>, ParseError> {
    literal(tee, b"\"")?;
    let year = fixed_digits(tee, 4)?;
    literal(tee, b"-")?;
    let month = fixed_digits(tee, 2)?;
    literal(tee, b"-")?;
    let day = fixed_digits(tee, 2)?;
    literal(tee, b"T")?;
    let hour = fixed_digits(tee, 2)?;
    literal(tee, b":")?;
    let minute = fixed_digits(tee, 2)?;
    literal(tee, b":")?;
    let second = fixed_digits(tee, 2)?;
    literal(tee, b"Z\"")?;

    if month > 12 || day > 31 || hour > 23 || minute > 59 || second > 59 {
        return Err(ParseError::new("timestamp component out of range"));
    }

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| ParseError::new("invalid calendar date"))?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| ParseError::new("invalid time of day"))?;
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::SliceSource;
    use crate::tee::SigSlot;
    use pretty_assertions::assert_eq;

    fn tee_over(data: &'static [u8]) -> (SliceSource<'static>, [SigSlot; 0]) {
        (SliceSource::new(data), [])
    }

    #[test]
    fn literal_matches_exact_bytes() {
        let (mut src, mut slots) = tee_over(b"{\"a\":1}");
        let mut tee = TeeReader::new(&mut src, &mut slots);
        literal(&mut tee, b"{\"a\":").unwrap();
    }

    #[test]
    fn literal_rejects_mismatch() {
        let (mut src, mut slots) = tee_over(b"nope");
        let mut tee = TeeReader::new(&mut src, &mut slots);
        assert!(literal(&mut tee, b"yes!").is_err());
    }

    #[test]
    fn text_reads_until_closing_quote() {
        let (mut src, mut slots) = tee_over(b"\"hello\"tail");
        let mut tee = TeeReader::new(&mut src, &mut slots);
        let mut buf = [0u8; 16];
        let n = text(&mut tee, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[test]
    fn text_rejects_buffer_overflow() {
        let (mut src, mut slots) = tee_over(b"\"toolong\"");
        let mut tee = TeeReader::new(&mut src, &mut slots);
        let mut buf = [0u8; 3];
        assert!(text(&mut tee, &mut buf).is_err());
    }

    #[test]
    fn hex_decodes_msb_first() {
        let (mut src, mut slots) = tee_over(b"\"0a1f\"");
        let mut tee = TeeReader::new(&mut src, &mut slots);
        let mut buf = [0u8; 2];
        let n = hex(&mut tee, &mut buf).unwrap();
        assert_eq!(&buf[..n], &[0x0a, 0x1f]);
    }

    #[test]
    fn hex_rejects_odd_length() {
        let (mut src, mut slots) = tee_over(b"\"abc\"");
        let mut tee = TeeReader::new(&mut src, &mut slots);
        let mut buf = [0u8; 2];
        assert!(hex(&mut tee, &mut buf).is_err());
    }

    #[test]
    fn uint_requires_at_least_one_digit() {
        let (mut src, mut slots) = tee_over(b",");
        let mut tee = TeeReader::new(&mut src, &mut slots);
        assert!(uint(&mut tee).is_err());
    }

    #[test]
    fn uint_parses_and_stops_at_non_digit() {
        let (mut src, mut slots) = tee_over(b"1234,");
        let mut tee = TeeReader::new(&mut src, &mut slots);
        assert_eq!(uint(&mut tee).unwrap(), 1234);
        assert_eq!(tee.peek().unwrap(), b',');
    }

    #[test]
    fn time_parses_absorbing_trailing_quote() {
        let (mut src, mut slots) = tee_over(b"\"2024-01-02T03:04:05Z\",");
        let mut tee = TeeReader::new(&mut src, &mut slots);
        let t = time(&mut tee).unwrap();
        assert_eq!(t.to_string(), "2024-01-02 03:04:05 UTC");
        assert_eq!(tee.peek().unwrap(), b',');
    }

    #[test]
    fn time_rejects_impossible_date() {
        let (mut src, mut slots) = tee_over(b"\"2024-02-30T00:00:00Z\"");
        let mut tee = TeeReader::new(&mut src, &mut slots);
        assert!(time(&mut tee).is_err());
    }
}
