//! The tee reader: forwards consumed bytes to live signature contexts
//! while inside the `signed` subobject, enabling incremental hashing
//! without ever buffering the whole document.

use sha2::Sha512;

use crate::byte_source::ByteSource;
use crate::key::SIG_LEN;
use crate::parse::ParseError;

/// Per-slot verification state, one per trusted key.
///
/// A slot becomes `present` only once a signature array entry matches
/// both a roster `keyid` and a supported `method`; from that point its
/// hasher is live and receives every byte the tee forwards.
#[derive(Default)]
pub(crate) struct SigSlot {
    pub(crate) signature: Option<[u8; SIG_LEN]>,
    pub(crate) hasher: Option<Sha512>,
    pub(crate) present: bool,
}

impl SigSlot {
    pub(crate) fn empty() -> Self {
        Self::default()
    }
}

/// Wraps a [`ByteSource`], forwarding every byte consumed while
/// [`TeeReader::enter_signed`] is in effect to each live slot's hasher.
pub(crate) struct TeeReader<'b, S: ByteSource, const MAX_SIGS: usize> {
    source: &'b mut S,
    slots: &'b mut [SigSlot; MAX_SIGS],
    in_signed: bool,
}

impl<'b, S: ByteSource, const MAX_SIGS: usize> TeeReader<'b, S, MAX_SIGS> {
    pub(crate) fn new(source: &'b mut S, slots: &'b mut [SigSlot; MAX_SIGS]) -> Self {
        Self {
            source,
            slots,
            in_signed: false,
        }
    }

    pub(crate) fn read(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        self.source
            .read(buf)
            .map_err(|e| ParseError::from_source(&e))?;
        if self.in_signed {
            for slot in self.slots.iter_mut() {
                if let Some(h) = slot.hasher.as_mut() {
                    sha2::Digest::update(h, &*buf);
                }
            }
        }
        Ok(())
    }

    pub(crate) fn peek(&mut self) -> Result<u8, ParseError> {
        self.source.peek().map_err(|e| ParseError::from_source(&e))
    }

    /// Begin forwarding bytes. Must be called immediately before the
    /// opening `{` of the `signed` value is read, so that brace is fed too.
    pub(crate) fn enter_signed(&mut self) {
        self.in_signed = true;
    }

    /// Stop forwarding bytes. Must be called immediately after the
    /// matching closing `}` of the `signed` value has been read.
    pub(crate) fn exit_signed(&mut self) {
        self.in_signed = false;
    }

    pub(crate) fn slot_present(&self, idx: usize) -> bool {
        self.slots[idx].present
    }

    /// Mark slot `idx` live: store its signature and start a fresh hasher.
    pub(crate) fn activate_slot(&mut self, idx: usize, signature: [u8; SIG_LEN]) {
        self.slots[idx].signature = Some(signature);
        self.slots[idx].hasher = Some(Sha512::default());
        self.slots[idx].present = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::SliceSource;
    use pretty_assertions::assert_eq;
    use sha2::Digest;

    #[test]
    fn tee_forwards_only_while_in_signed() {
        let mut src = SliceSource::new(b"abcdef");
        let mut slots: [SigSlot; 1] = std::array::from_fn(|_| SigSlot::empty());
        slots[0].present = true;
        slots[0].hasher = Some(Sha512::default());

        let mut tee = TeeReader::new(&mut src, &mut slots);
        let mut buf = [0u8; 3];
        tee.read(&mut buf).unwrap(); // "abc", not forwarded
        tee.enter_signed();
        tee.read(&mut buf).unwrap(); // "def", forwarded
        tee.exit_signed();

        let expected = Sha512::digest(b"def");
        let got = tee.slots[0].hasher.clone().unwrap().finalize();
        assert_eq!(got.as_slice(), expected.as_slice());
    }
}
