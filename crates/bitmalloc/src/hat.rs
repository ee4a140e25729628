//! The hidden metadata word ("hat") written immediately ahead of every
//! pointer the allocator hands out. It records everything `dealloc` needs:
//! either the owning registry slot, or the exact mapped size of a direct
//! OS allocation.

/// Bytes the hat occupies at the front of every block.
pub const HAT_SIZE: usize = core::mem::size_of::<usize>();

/// High bit marks a direct OS allocation; the remaining bits carry the
/// total mapped size. With the bit clear they carry a registry slot.
const OS_FLAG: usize = 1 << (usize::BITS - 1);

/// How to free a block, as a typed value. Serialized into a single word
/// only at the read/write boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hat {
    /// Mapped straight from the OS; `total` is the exact size to unmap,
    /// hat included.
    Os { total: usize },
    /// Served by the slab at this registry slot.
    Slab { slot: usize },
}

impl Hat {
    pub fn encode(self) -> usize {
        match self {
            Hat::Os { total } => {
                debug_assert!(total & OS_FLAG == 0);
                total | OS_FLAG
            }
            Hat::Slab { slot } => {
                debug_assert!(slot & OS_FLAG == 0);
                slot
            }
        }
    }

    pub fn decode(word: usize) -> Self {
        if word & OS_FLAG != 0 {
            Hat::Os {
                total: word & !OS_FLAG,
            }
        } else {
            Hat::Slab { slot: word }
        }
    }

    /// Write this hat at the start of `block` and return the user pointer
    /// just past it.
    ///
    /// # Safety
    /// `block` must point to at least `HAT_SIZE` writable bytes and be
    /// aligned to `HAT_SIZE`.
    pub unsafe fn write(self, block: *mut u8) -> *mut u8 {
        (block as *mut usize).write(self.encode());
        block.add(HAT_SIZE)
    }

    /// Read back the hat preceding a user pointer returned by `write`.
    ///
    /// # Safety
    /// `user_ptr` must have been produced by `write` on a block that is
    /// still mapped.
    pub unsafe fn read(user_ptr: *mut u8) -> Self {
        Hat::decode((user_ptr.sub(HAT_SIZE) as *const usize).read())
    }
}
