//! A bitmap-slab memory allocator.
//!
//! Small and medium requests are served from fixed-size slabs, each a
//! single machine word's worth of equal-size chunks tracked by a one-word
//! occupancy bitmap. Oversized requests go straight to the OS. A hidden
//! metadata word ahead of every returned pointer records how to free it.

extern crate libc;

pub mod allocator;
pub mod hat;
pub mod platform;
pub mod slab;
pub mod util;

pub use allocator::BitmapAlloc;
