use crate::hat::{Hat, HAT_SIZE};
use crate::platform;
use crate::slab::size_class;
use crate::slab::{FreeIndex, SlabRegistry};
use crate::util;
use core::ptr;

/// The allocator context: size-class router over a slab registry and its
/// free-slab index, with a direct OS path for oversized requests.
///
/// One context is one logical owner. It is deliberately single-threaded --
/// every operation takes `&mut self` and nothing is locked. Teardown (or
/// drop) returns every mapped byte to the OS; touching an allocation after
/// that faults, by design.
pub struct BitmapAlloc {
    registry: SlabRegistry,
    free_index: FreeIndex,
}

impl BitmapAlloc {
    /// Create an empty context. Nothing is mapped until the first
    /// allocation, so a fresh context and a torn-down one are
    /// indistinguishable from the outside.
    pub fn new() -> Self {
        util::init_page_size();
        BitmapAlloc {
            registry: SlabRegistry::new(),
            free_index: FreeIndex::new(),
        }
    }

    /// Allocate at least `size` bytes, aligned to `MIN_ALIGN`. Returns
    /// null when `size` is zero or the OS refuses memory -- null is the
    /// only failure signal.
    pub fn alloc(&mut self, size: usize) -> *mut u8 {
        if size == 0 {
            return ptr::null_mut();
        }
        let total = match size.checked_add(HAT_SIZE) {
            // mmap itself rejects anything above isize::MAX, and the hat
            // needs the top bit for its OS flag.
            Some(total) if total <= isize::MAX as usize => total,
            _ => return ptr::null_mut(),
        };

        match size_class::class_index(total) {
            Some(class) => self.alloc_from_slab(class),
            None => Self::alloc_from_os(total),
        }
    }

    fn alloc_from_slab(&mut self, class: usize) -> *mut u8 {
        let slot = match self.free_index.find_or_create(class, &mut self.registry) {
            Some(slot) => slot,
            None => return ptr::null_mut(),
        };
        // find_or_create only returns slots whose slab has a free chunk.
        match self.registry.get_mut(slot).and_then(|slab| slab.take()) {
            Some(block) => unsafe { Hat::Slab { slot }.write(block) },
            None => ptr::null_mut(),
        }
    }

    fn alloc_from_os(total: usize) -> *mut u8 {
        let block = unsafe { platform::map_anonymous(total) };
        if block.is_null() {
            return ptr::null_mut();
        }
        unsafe { Hat::Os { total }.write(block) }
    }

    /// Free a block returned by `alloc`. Null is a no-op. Slab-backed
    /// double frees and pointers whose hat names a slot this context never
    /// issued are silent no-ops as well.
    ///
    /// # Safety
    /// `ptr` must be null or a pointer obtained from `alloc` on this
    /// context whose backing memory is still mapped. An OS-backed block
    /// must not be freed twice.
    pub unsafe fn dealloc(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        match Hat::read(ptr) {
            Hat::Os { total } => platform::unmap(ptr.sub(HAT_SIZE), total),
            Hat::Slab { slot } => {
                let slab = match self.registry.get_mut(slot) {
                    Some(slab) => slab,
                    None => return,
                };
                let was_full = slab.is_full();
                let class = size_class::class_of_chunk(slab.chunk_size());
                if slab.give(ptr.sub(HAT_SIZE)) && was_full {
                    // Full -> non-full is the one transition that can take
                    // a slab off its class stack for good, so restore the
                    // hint here.
                    self.free_index.note_free(class, slot);
                }
            }
        }
    }

    /// Capacity of the block behind `ptr`, net of the hat: the chunk size
    /// for slab-backed blocks, the mapped total for OS-backed ones.
    /// Always at least the requested size. Null yields 0.
    ///
    /// # Safety
    /// Same contract as `dealloc`, except the block stays live.
    pub unsafe fn usable_size(&self, ptr: *mut u8) -> usize {
        if ptr.is_null() {
            return 0;
        }
        match Hat::read(ptr) {
            Hat::Os { total } => total - HAT_SIZE,
            Hat::Slab { slot } => match self.registry.get(slot) {
                Some(slab) => slab.chunk_size() - HAT_SIZE,
                None => 0,
            },
        }
    }

    /// Release every mapped region -- all slab memory, the registry's
    /// record storage, the free-index stacks -- and reset to the exact
    /// state `new` produces. Safe to call repeatedly.
    ///
    /// Outstanding slab-backed allocations die with their slabs;
    /// OS-backed blocks belong to the caller until `dealloc` and are not
    /// tracked here.
    pub fn teardown(&mut self) {
        self.free_index.release_all();
        self.registry.release_all();
    }

    /// Number of slabs currently installed in the registry.
    pub fn slab_count(&self) -> usize {
        self.registry.len()
    }

    /// Bytes currently requested from the OS for bookkeeping and slab
    /// regions. Returns to 0 after teardown.
    pub fn mapped_bytes(&self) -> usize {
        self.registry.mapped_bytes() + self.free_index.mapped_bytes()
    }

    pub fn registry(&self) -> &SlabRegistry {
        &self.registry
    }
}

impl Default for BitmapAlloc {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BitmapAlloc {
    fn drop(&mut self) {
        self.teardown();
    }
}
