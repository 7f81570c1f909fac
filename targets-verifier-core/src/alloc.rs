//! Context allocation strategies.
//!
//! A [`VerifierContext`] is not reusable across documents: one is built,
//! `process()`-ed once, and dropped. How the backing storage for that
//! single use is obtained is a separate, build-time choice between two
//! modes, matching resource-constrained callers that cannot assume a
//! general-purpose allocator.

use crate::byte_source::ByteSource;
use crate::context::{ContextInit, VerifierContext};
use crate::error::{ContextError, Outcome};

/// Acquires a fresh heap allocation per context and frees it on release.
/// The straightforward choice when a general-purpose allocator is available.
#[derive(Default)]
pub struct HeapContextPool;

impl HeapContextPool {
    pub fn new() -> Self {
        Self
    }

    /// Build a boxed context. Fails only if `init` itself is invalid;
    /// heap exhaustion is not modelled since `std` offers no fallible
    /// `Box::try_new` stable outside nightly.
    pub fn acquire<'a, S: ByteSource, const MAX_SIGS: usize, const BUF_SIZE: usize>(
        &mut self,
        init: ContextInit<'a, S>,
    ) -> Result<Box<VerifierContext<'a, S, MAX_SIGS, BUF_SIZE>>, ContextError> {
        VerifierContext::new(init).map(Box::new)
    }

    pub fn release<'a, S: ByteSource, const MAX_SIGS: usize, const BUF_SIZE: usize>(
        &mut self,
        ctx: Box<VerifierContext<'a, S, MAX_SIGS, BUF_SIZE>>,
    ) {
        drop(ctx);
    }
}

/// A fixed array of `N` context slots with a busy bitmap, for callers
/// with no heap at all. Acquiring past capacity is a legal outcome: it
/// surfaces as [`Outcome::NoMemory`], the same resource-class result a
/// verify-context allocation failure would produce mid-document.
pub struct PooledContextPool<'a, S: ByteSource, const MAX_SIGS: usize, const BUF_SIZE: usize, const N: usize> {
    slots: [Option<VerifierContext<'a, S, MAX_SIGS, BUF_SIZE>>; N],
    busy: [bool; N],
}

impl<'a, S: ByteSource, const MAX_SIGS: usize, const BUF_SIZE: usize, const N: usize>
    PooledContextPool<'a, S, MAX_SIGS, BUF_SIZE, N>
{
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            busy: [false; N],
        }
    }

    /// Linear scan for the first free slot. Returns `NoMemory` when the
    /// pool is full, `Ok` carrying the slot index otherwise.
    pub fn acquire(&mut self, init: ContextInit<'a, S>) -> Result<usize, Outcome> {
        let ctx = VerifierContext::new(init).map_err(|_| Outcome::NoMemory)?;
        for (i, busy) in self.busy.iter_mut().enumerate() {
            if !*busy {
                self.slots[i] = Some(ctx);
                *busy = true;
                return Ok(i);
            }
        }
        Err(Outcome::NoMemory)
    }

    pub fn take(&mut self, handle: usize) -> Option<VerifierContext<'a, S, MAX_SIGS, BUF_SIZE>> {
        self.slots[handle].take()
    }

    /// Release a slot without having taken its context out, e.g. after a
    /// caller decided not to process a just-acquired context.
    pub fn release(&mut self, handle: usize) {
        self.slots[handle] = None;
        self.busy[handle] = false;
    }

    pub fn in_use(&self) -> usize {
        self.busy.iter().filter(|b| **b).count()
    }
}

impl<'a, S: ByteSource, const MAX_SIGS: usize, const BUF_SIZE: usize, const N: usize> Default
    for PooledContextPool<'a, S, MAX_SIGS, BUF_SIZE, N>
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::SliceSource;
    use crate::key::{Key, SignatureAlgorithm, KEYID_LEN, PUBLIC_KEY_LEN};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn dummy_keys() -> [Key; 1] {
        [Key::new(
            [0u8; KEYID_LEN],
            SignatureAlgorithm::Ed25519,
            [0u8; PUBLIC_KEY_LEN],
        )]
    }

    fn init(keys: &[Key]) -> ContextInit<'_, SliceSource<'static>> {
        ContextInit {
            source: SliceSource::new(b""),
            now: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            version_prev: 0,
            ecu_id: b"ecu",
            hardware_id: b"hw",
            trusted_keys: keys,
            threshold: 1,
        }
    }

    #[test]
    fn pool_exhaustion_yields_no_memory() {
        let keys = dummy_keys();
        let mut pool: PooledContextPool<'_, SliceSource<'static>, 4, 32, 1> = PooledContextPool::new();
        let first = pool.acquire(init(&keys));
        assert!(first.is_ok());
        let second = pool.acquire(init(&keys));
        assert_eq!(second.unwrap_err(), Outcome::NoMemory);
    }

    #[test]
    fn releasing_a_slot_frees_it_for_reuse() {
        let keys = dummy_keys();
        let mut pool: PooledContextPool<'_, SliceSource<'static>, 4, 32, 1> = PooledContextPool::new();
        let handle = pool.acquire(init(&keys)).unwrap();
        assert_eq!(pool.in_use(), 1);
        pool.release(handle);
        assert_eq!(pool.in_use(), 0);
        assert!(pool.acquire(init(&keys)).is_ok());
    }
}
