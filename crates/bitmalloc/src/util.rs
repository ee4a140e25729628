/// Align `value` up to the next multiple of `align`.
/// `align` must be a power of two.
#[inline(always)]
pub const fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

/// Check if `value` is aligned to `align`.
/// `align` must be a power of two.
#[inline(always)]
pub const fn is_aligned(value: usize, align: usize) -> bool {
    value & (align - 1) == 0
}

/// Minimum alignment guaranteed for every pointer the allocator returns.
pub const MIN_ALIGN: usize = 8;

/// Bits in a machine word. One bitmap slab manages exactly this many chunks.
pub const BITS_PER_WORD: usize = usize::BITS as usize;

/// Default slab-region granularity, also the fallback page size.
pub const PAGE_SIZE: usize = 4096;

/// Runtime page size, cached from sysconf(_SC_PAGESIZE).
/// Initialized to 4096 (the universal default) so reads before the first
/// `init_page_size` call still return a valid value.
static PAGE_SIZE_CACHED: core::sync::atomic::AtomicUsize =
    core::sync::atomic::AtomicUsize::new(PAGE_SIZE);

/// Read the page size from the OS and cache it. Called once per allocator
/// construction; repeated calls store the same value.
pub fn init_page_size() {
    let ps = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    let ps = if ps > 0 { ps as usize } else { PAGE_SIZE };
    PAGE_SIZE_CACHED.store(ps, core::sync::atomic::Ordering::Relaxed);
}

/// Get the system page size (4096 until `init_page_size` has run).
#[inline(always)]
pub fn page_size() -> usize {
    PAGE_SIZE_CACHED.load(core::sync::atomic::Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_basics() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 8), 16);
        assert_eq!(align_up(4095, 4096), 4096);
    }

    #[test]
    fn is_aligned_basics() {
        assert!(is_aligned(0, 8));
        assert!(is_aligned(16, 8));
        assert!(!is_aligned(12, 8));
    }

    #[test]
    fn page_size_is_sane() {
        init_page_size();
        let ps = page_size();
        assert!(ps >= 4096);
        assert!(ps.is_power_of_two());
    }
}
