use crate::util::MIN_ALIGN;

/// Largest chunk size served out of slabs. Padded totals above this go
/// straight to the OS memory source.
pub const LARGE_THRESHOLD: usize = 4096;

/// Smallest chunk size. Keeps the hat plus at least `MIN_ALIGN` bytes of
/// payload in every chunk.
pub const MIN_CHUNK: usize = 16;

/// Number of size classes: powers of two from 16 through 4096.
pub const NUM_SIZE_CLASSES: usize = 9;

/// The size class table, sorted ascending.
pub static SIZE_CLASSES: [usize; NUM_SIZE_CLASSES] = {
    let mut table = [0usize; NUM_SIZE_CLASSES];
    let mut i = 0;
    let mut size = MIN_CHUNK;
    while i < NUM_SIZE_CLASSES {
        table[i] = size;
        size *= 2;
        i += 1;
    }
    table
};

/// Look up the size class index for a padded total size (request plus hat).
/// Returns `None` if the total exceeds the largest size class.
#[inline]
pub fn class_index(total: usize) -> Option<usize> {
    let needed = if total < MIN_CHUNK { MIN_CHUNK } else { total };
    if needed > LARGE_THRESHOLD {
        return None;
    }
    // Classes are powers of two, so the smallest class >= needed is its
    // power-of-two round-up.
    let rounded = needed.next_power_of_two();
    Some((rounded.trailing_zeros() - MIN_CHUNK.trailing_zeros()) as usize)
}

/// Chunk size for a given size class index.
#[inline]
pub fn chunk_size(class: usize) -> usize {
    SIZE_CLASSES[class]
}

/// Inverse of `chunk_size` for a valid class chunk size.
#[inline]
pub fn class_of_chunk(chunk: usize) -> usize {
    debug_assert!(chunk.is_power_of_two() && chunk >= MIN_CHUNK);
    (chunk.trailing_zeros() - MIN_CHUNK.trailing_zeros()) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_are_sorted_ascending() {
        for i in 1..NUM_SIZE_CLASSES {
            assert!(
                SIZE_CLASSES[i] > SIZE_CLASSES[i - 1],
                "class {} ({}) <= class {} ({})",
                i,
                SIZE_CLASSES[i],
                i - 1,
                SIZE_CLASSES[i - 1]
            );
        }
    }

    #[test]
    fn class_bounds() {
        assert_eq!(SIZE_CLASSES[0], MIN_CHUNK);
        assert_eq!(SIZE_CLASSES[NUM_SIZE_CLASSES - 1], LARGE_THRESHOLD);
    }

    #[test]
    fn all_classes_aligned() {
        for &size in &SIZE_CLASSES {
            assert!(size % MIN_ALIGN == 0, "class {} not aligned", size);
        }
    }

    #[test]
    fn lookup_boundary_sizes() {
        assert_eq!(class_index(1), Some(0));
        assert_eq!(class_index(16), Some(0));
        assert_eq!(class_index(17), Some(1));
        assert_eq!(class_index(32), Some(1));
        assert_eq!(class_index(33), Some(2));
        assert_eq!(class_index(4096), Some(NUM_SIZE_CLASSES - 1));
        assert_eq!(class_index(4097), None);
        assert_eq!(class_index(usize::MAX), None);
    }

    #[test]
    fn lookup_returns_smallest_sufficient_class() {
        for total in 1..=LARGE_THRESHOLD {
            let class = class_index(total).unwrap();
            assert!(chunk_size(class) >= total);
            if class > 0 {
                assert!(chunk_size(class - 1) < total.max(MIN_CHUNK + 1));
            }
        }
    }

    #[test]
    fn class_of_chunk_inverts_chunk_size() {
        for class in 0..NUM_SIZE_CLASSES {
            assert_eq!(class_of_chunk(chunk_size(class)), class);
        }
    }
}
