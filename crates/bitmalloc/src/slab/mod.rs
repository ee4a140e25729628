pub mod bitmap;
pub mod free_index;
pub mod registry;
pub mod size_class;

pub use bitmap::BitmapSlab;
pub use free_index::FreeIndex;
pub use registry::SlabRegistry;
