use crate::platform;
use crate::slab::bitmap::BitmapSlab;
use crate::util::page_size;
use core::mem;
use core::ptr;

/// A growable collection of slab records, indexed by slot.
///
/// Records live in a platform-mapped backing region that doubles when full.
/// Growth copies the records, never the slabs themselves, so a slot index
/// stays valid for the registry's whole lifetime -- the property the hat
/// encoding depends on.
pub struct SlabRegistry {
    /// Backing storage for the records. Null until the first slab.
    records: *mut BitmapSlab,
    /// Records in use.
    count: usize,
    /// Size of the backing region in bytes.
    backing_bytes: usize,
}

impl SlabRegistry {
    pub const fn new() -> Self {
        SlabRegistry {
            records: ptr::null_mut(),
            count: 0,
            backing_bytes: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether any backing storage is currently mapped. After teardown this
    /// reads false again, exactly as before the first slab.
    #[inline]
    pub fn has_backing(&self) -> bool {
        !self.records.is_null()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.backing_bytes / mem::size_of::<BitmapSlab>()
    }

    pub fn get(&self, slot: usize) -> Option<&BitmapSlab> {
        if slot < self.count {
            Some(unsafe { &*self.records.add(slot) })
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut BitmapSlab> {
        if slot < self.count {
            Some(unsafe { &mut *self.records.add(slot) })
        } else {
            None
        }
    }

    /// Install a fresh slab for the given chunk size and return its slot.
    /// Grows the record storage first if needed. Returns `None` when the OS
    /// refuses memory for either the records or the slab region.
    pub fn add_slab(&mut self, chunk_size: usize) -> Option<usize> {
        if self.count == self.capacity() && !self.grow() {
            return None;
        }

        let region = unsafe { platform::map_anonymous(BitmapSlab::region_size(chunk_size)) };
        if region.is_null() {
            return None;
        }

        let slot = self.count;
        unsafe {
            self.records
                .add(slot)
                .write(BitmapSlab::new(region, chunk_size));
        }
        self.count += 1;
        Some(slot)
    }

    /// Double the record storage: map a fresh region, copy the live
    /// records, release the old region. Slot numbering is unchanged.
    fn grow(&mut self) -> bool {
        let new_bytes = if self.backing_bytes == 0 {
            page_size()
        } else {
            self.backing_bytes * 2
        };

        let new_records = unsafe { platform::map_anonymous(new_bytes) } as *mut BitmapSlab;
        if new_records.is_null() {
            return false;
        }

        if !self.records.is_null() {
            unsafe {
                ptr::copy_nonoverlapping(self.records, new_records, self.count);
                platform::unmap(self.records as *mut u8, self.backing_bytes);
            }
        }

        self.records = new_records;
        self.backing_bytes = new_bytes;
        true
    }

    /// Release every slab region and the record storage itself, resetting
    /// the registry to its never-used configuration.
    pub fn release_all(&mut self) {
        for slot in 0..self.count {
            unsafe {
                let slab = &*self.records.add(slot);
                platform::unmap(slab.memory(), BitmapSlab::region_size(slab.chunk_size()));
            }
        }
        if !self.records.is_null() {
            unsafe { platform::unmap(self.records as *mut u8, self.backing_bytes) };
        }
        self.records = ptr::null_mut();
        self.count = 0;
        self.backing_bytes = 0;
    }

    /// Bytes currently requested from the OS on the registry's behalf:
    /// record storage plus every slab region.
    pub fn mapped_bytes(&self) -> usize {
        let mut total = self.backing_bytes;
        for slot in 0..self.count {
            let slab = unsafe { &*self.records.add(slot) };
            total += BitmapSlab::region_size(slab.chunk_size());
        }
        total
    }
}
