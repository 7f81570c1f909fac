//! The byte source adapter: the only interface through which the verifier
//! touches the outside world.
//!
//! A [`ByteSource`] exposes exactly two operations, matching a transport
//! that may only ever look one byte ahead: `peek` to decide which grammar
//! production applies next, and `read` to consume bytes once that decision
//! is made. Implementors are free to back this with a socket, a UART, or
//! (for tests) an in-memory slice.

/// A one-byte-lookahead byte stream.
///
/// `Error` is associated rather than a fixed type so embedded callers can
/// report transport failures (`nb::Error`, a UART status register, ...)
/// without the core crate committing to `std::io::Error`.
pub trait ByteSource {
    type Error: core::fmt::Debug;

    /// Fill `buf` completely, consuming exactly `buf.len()` bytes.
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Return the next byte without consuming it.
    fn peek(&mut self) -> Result<u8, Self::Error>;
}

/// Error produced when a [`SliceSource`] runs past the end of its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("slice source exhausted")]
pub struct SliceExhausted;

/// A [`ByteSource`] backed by an in-memory byte slice.
///
/// Used by the test suite and by callers (such as the CLI) that have
/// already buffered a whole document and just want to hand it to the
/// verifier without implementing `Read` plumbing.
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> ByteSource for SliceSource<'a> {
    type Error = SliceExhausted;

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        let end = self.pos + buf.len();
        let chunk = self.data.get(self.pos..end).ok_or(SliceExhausted)?;
        buf.copy_from_slice(chunk);
        self.pos = end;
        Ok(())
    }

    fn peek(&mut self) -> Result<u8, Self::Error> {
        self.data.get(self.pos).copied().ok_or(SliceExhausted)
    }
}

/// A [`ByteSource`] adapting any [`std::io::Read`], for the CLI reading
/// from a file or standard input.
pub struct ReaderSource<R> {
    inner: R,
    peeked: Option<u8>,
}

impl<R: std::io::Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, peeked: None }
    }
}

impl<R: std::io::Read> ByteSource for ReaderSource<R> {
    type Error = std::io::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        if buf.is_empty() {
            return Ok(());
        }
        let mut start = 0;
        if let Some(b) = self.peeked.take() {
            buf[0] = b;
            start = 1;
        }
        if start < buf.len() {
            self.inner.read_exact(&mut buf[start..])?;
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<u8, Self::Error> {
        if let Some(b) = self.peeked {
            return Ok(b);
        }
        let mut byte = [0u8; 1];
        self.inner.read_exact(&mut byte)?;
        self.peeked = Some(byte[0]);
        Ok(byte[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn slice_source_reads_and_peeks() {
        let mut src = SliceSource::new(b"ab");
        assert_eq!(src.peek().unwrap(), b'a');
        let mut buf = [0u8; 1];
        src.read(&mut buf).unwrap();
        assert_eq!(buf[0], b'a');
        assert_eq!(src.peek().unwrap(), b'b');
    }

    #[test]
    fn slice_source_exhaustion() {
        let mut src = SliceSource::new(b"a");
        let mut buf = [0u8; 2];
        assert!(src.read(&mut buf).is_err());
    }

    #[test]
    fn reader_source_peek_then_read_is_consistent() {
        let mut src = ReaderSource::new(std::io::Cursor::new(b"xy".to_vec()));
        assert_eq!(src.peek().unwrap(), b'x');
        let mut buf = [0u8; 2];
        src.read(&mut buf).unwrap();
        assert_eq!(&buf, b"xy");
    }
}
