use crate::util::BITS_PER_WORD;

/// A fixed-capacity slab divided into `BITS_PER_WORD` equal-size chunks,
/// with a single-word occupancy bitmap. Bit set = chunk allocated.
///
/// The slab does not own its backing memory; the registry slot holding the
/// record does, and releases it at teardown.
pub struct BitmapSlab {
    /// Bytes per chunk, uniform within the slab.
    chunk_size: usize,
    /// Occupancy bitmap, one bit per chunk.
    occupied: usize,
    /// Base of the backing region, `chunk_size * BITS_PER_WORD` bytes.
    memory: *mut u8,
}

impl BitmapSlab {
    /// Create a slab record over an existing backing region with all
    /// chunks free.
    ///
    /// # Safety
    /// `memory` must point to `region_size(chunk_size)` bytes of valid,
    /// writable memory not managed by any other slab.
    pub unsafe fn new(memory: *mut u8, chunk_size: usize) -> Self {
        debug_assert!(chunk_size > 0);
        BitmapSlab {
            chunk_size,
            occupied: 0,
            memory,
        }
    }

    /// Bytes of backing memory a slab with the given chunk size manages.
    pub const fn region_size(chunk_size: usize) -> usize {
        chunk_size * BITS_PER_WORD
    }

    /// Claim the lowest-index free chunk. Returns its base address, or
    /// `None` when every chunk is taken -- an expected condition, not an
    /// error.
    pub fn take(&mut self) -> Option<*mut u8> {
        let free = !self.occupied;
        if free == 0 {
            return None;
        }
        let index = free.trailing_zeros() as usize;
        self.occupied |= 1 << index;
        Some(unsafe { self.memory.add(index * self.chunk_size) })
    }

    /// Return a chunk to the slab. Out-of-range, misaligned, and
    /// already-free pointers are silent no-ops; `occupied` is only touched
    /// when `ptr` names a currently taken chunk. Returns whether a bit was
    /// cleared, so callers know if the slab gained a free chunk.
    pub fn give(&mut self, ptr: *mut u8) -> bool {
        let base = self.memory as usize;
        let addr = ptr as usize;
        if addr < base {
            return false;
        }
        let dist = addr - base;
        if dist >= Self::region_size(self.chunk_size) {
            return false;
        }
        if dist % self.chunk_size != 0 {
            return false;
        }
        let mask = 1 << (dist / self.chunk_size);
        if self.occupied & mask == 0 {
            return false;
        }
        self.occupied &= !mask;
        true
    }

    /// Whether `ptr` falls inside this slab's backing region.
    #[inline]
    pub fn contains(&self, ptr: *mut u8) -> bool {
        let start = self.memory as usize;
        let end = start + Self::region_size(self.chunk_size);
        (start..end).contains(&(ptr as usize))
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.occupied == usize::MAX
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[inline]
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    #[inline]
    pub fn memory(&self) -> *mut u8 {
        self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::alloc::{alloc, dealloc, Layout};

    fn backing_layout(chunk_size: usize) -> Layout {
        Layout::from_size_align(BitmapSlab::region_size(chunk_size), chunk_size).unwrap()
    }

    fn make_slab(chunk_size: usize) -> (BitmapSlab, *mut u8) {
        let storage = unsafe { alloc(backing_layout(chunk_size)) };
        assert!(!storage.is_null());
        let slab = unsafe { BitmapSlab::new(storage, chunk_size) };
        (slab, storage)
    }

    fn free_slab(storage: *mut u8, chunk_size: usize) {
        unsafe { dealloc(storage, backing_layout(chunk_size)) };
    }

    #[test]
    fn take_returns_ascending_disjoint_chunks() {
        let (mut slab, storage) = make_slab(32);

        let mut prev: Option<usize> = None;
        for i in 0..BITS_PER_WORD {
            let p = slab.take().unwrap();
            assert_eq!(p as usize, storage as usize + i * 32);
            if let Some(last) = prev {
                assert_eq!(p as usize - last, 32);
            }
            prev = Some(p as usize);
        }
        assert!(slab.is_full());
        assert_eq!(slab.occupied(), usize::MAX);

        free_slab(storage, 32);
    }

    #[test]
    fn take_on_full_slab_fails() {
        let (mut slab, storage) = make_slab(16);
        for _ in 0..BITS_PER_WORD {
            assert!(slab.take().is_some());
        }
        assert!(slab.take().is_none());
        assert!(slab.is_full());
        free_slab(storage, 16);
    }

    #[test]
    fn give_frees_exactly_the_lowest_bit_for_reuse() {
        let (mut slab, storage) = make_slab(64);
        let mut chunks = Vec::new();
        for _ in 0..8 {
            chunks.push(slab.take().unwrap());
        }

        // Freeing one chunk makes the very next take return that address:
        // lowest-free-bit selection.
        assert!(slab.give(chunks[3]));
        let again = slab.take().unwrap();
        assert_eq!(again, chunks[3]);

        free_slab(storage, 64);
    }

    #[test]
    fn give_out_of_range_is_noop() {
        let (mut slab, storage) = make_slab(32);
        for _ in 0..4 {
            slab.take().unwrap();
        }
        let before = slab.occupied();

        // Below the region.
        assert!(!slab.give(storage.wrapping_sub(32)));
        assert_eq!(slab.occupied(), before);

        // At and past the end of the region.
        let end = storage.wrapping_add(BitmapSlab::region_size(32));
        assert!(!slab.give(end));
        assert!(!slab.give(end.wrapping_add(32)));
        assert_eq!(slab.occupied(), before);

        free_slab(storage, 32);
    }

    #[test]
    fn give_misaligned_is_noop() {
        let (mut slab, storage) = make_slab(32);
        let p = slab.take().unwrap();
        let before = slab.occupied();

        assert!(!slab.give(unsafe { p.add(1) }));
        assert!(!slab.give(unsafe { p.add(31) }));
        assert_eq!(slab.occupied(), before);

        free_slab(storage, 32);
    }

    #[test]
    fn give_already_free_is_noop() {
        let (mut slab, storage) = make_slab(32);
        let p = slab.take().unwrap();

        assert!(slab.give(p));
        let before = slab.occupied();
        assert!(!slab.give(p));
        assert_eq!(slab.occupied(), before);
        assert!(slab.is_empty());

        free_slab(storage, 32);
    }

    #[test]
    fn contains_tracks_region_bounds() {
        let (slab, storage) = make_slab(16);
        assert!(slab.contains(storage));
        assert!(slab.contains(unsafe { storage.add(BitmapSlab::region_size(16) - 1) }));
        assert!(!slab.contains(unsafe { storage.add(BitmapSlab::region_size(16)) }));
        free_slab(storage, 16);
    }
}
