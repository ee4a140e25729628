use crate::platform;
use crate::slab::registry::SlabRegistry;
use crate::slab::size_class::{self, NUM_SIZE_CLASSES};
use crate::util::page_size;
use core::mem;
use core::ptr;

/// A growable stack of registry slots, backed by platform-mapped storage
/// that doubles on overflow.
///
/// Entries are hints, not truth: a slot may have filled up since it was
/// pushed. Stale entries are discarded lazily at lookup time against the
/// slab's live bitmap.
struct FreeStack {
    slots: *mut usize,
    len: usize,
    backing_bytes: usize,
}

impl FreeStack {
    const fn new() -> Self {
        FreeStack {
            slots: ptr::null_mut(),
            len: 0,
            backing_bytes: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.backing_bytes / mem::size_of::<usize>()
    }

    /// Push a slot, growing the backing storage if needed. Returns false
    /// when the OS refuses memory; the hint is then simply dropped.
    fn push(&mut self, slot: usize) -> bool {
        if self.len == self.capacity() && !self.grow() {
            return false;
        }
        unsafe { self.slots.add(self.len).write(slot) };
        self.len += 1;
        true
    }

    fn peek(&self) -> Option<usize> {
        if self.len == 0 {
            None
        } else {
            Some(unsafe { self.slots.add(self.len - 1).read() })
        }
    }

    fn pop(&mut self) -> Option<usize> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            Some(unsafe { self.slots.add(self.len).read() })
        }
    }

    fn grow(&mut self) -> bool {
        let new_bytes = if self.backing_bytes == 0 {
            page_size()
        } else {
            self.backing_bytes * 2
        };
        let new_slots = unsafe { platform::map_anonymous(new_bytes) } as *mut usize;
        if new_slots.is_null() {
            return false;
        }
        if !self.slots.is_null() {
            unsafe {
                ptr::copy_nonoverlapping(self.slots, new_slots, self.len);
                platform::unmap(self.slots as *mut u8, self.backing_bytes);
            }
        }
        self.slots = new_slots;
        self.backing_bytes = new_bytes;
        true
    }

    fn release(&mut self) {
        if !self.slots.is_null() {
            unsafe { platform::unmap(self.slots as *mut u8, self.backing_bytes) };
        }
        self.slots = ptr::null_mut();
        self.len = 0;
        self.backing_bytes = 0;
    }
}

/// Per-size-class stacks of slots known (or last known) to have a free
/// chunk, so the hot allocation path never scans the whole registry.
pub struct FreeIndex {
    stacks: [FreeStack; NUM_SIZE_CLASSES],
}

impl FreeIndex {
    pub const fn new() -> Self {
        const EMPTY: FreeStack = FreeStack::new();
        FreeIndex {
            stacks: [EMPTY; NUM_SIZE_CLASSES],
        }
    }

    /// Find a slab of the given class with at least one free chunk,
    /// creating one through the registry when no usable hint remains.
    ///
    /// A usable hint stays on the stack; it only leaves when a lookup
    /// observes the slab full. Returns `None` on OS memory exhaustion.
    pub fn find_or_create(
        &mut self,
        class: usize,
        registry: &mut SlabRegistry,
    ) -> Option<usize> {
        let stack = &mut self.stacks[class];
        while let Some(slot) = stack.peek() {
            match registry.get(slot) {
                Some(slab) if !slab.is_full() => return Some(slot),
                _ => {
                    stack.pop();
                }
            }
        }

        let slot = registry.add_slab(size_class::chunk_size(class))?;
        // A push failure only loses the hint; the slab itself is live.
        stack.push(slot);
        Some(slot)
    }

    /// Record that a slab of this class regained a free chunk. Called on
    /// the full -> non-full transition; non-full slabs are already on
    /// their stack, so pushing again would only pile up duplicates.
    pub fn note_free(&mut self, class: usize, slot: usize) {
        self.stacks[class].push(slot);
    }

    /// Release every stack's backing storage.
    pub fn release_all(&mut self) {
        for stack in &mut self.stacks {
            stack.release();
        }
    }

    /// Bytes currently requested from the OS for stack storage.
    pub fn mapped_bytes(&self) -> usize {
        self.stacks.iter().map(|s| s.backing_bytes).sum()
    }
}
