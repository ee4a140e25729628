#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "linux")]
pub use linux as sys;

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "macos")]
pub use macos as sys;

/// Map anonymous private read-write memory of at least `size` bytes.
/// The kernel rounds the region up to whole pages. Returns null on failure;
/// a mapping never partially succeeds.
///
/// # Safety
/// `size` must be non-zero.
#[inline]
pub unsafe fn map_anonymous(size: usize) -> *mut u8 {
    sys::map_anonymous(size)
}

/// Unmap a previously mapped region.
///
/// # Safety
/// `ptr` must have been returned by `map_anonymous` and `size` must match
/// the size passed at mapping time.
#[inline]
pub unsafe fn unmap(ptr: *mut u8, size: usize) {
    sys::unmap(ptr, size);
}
