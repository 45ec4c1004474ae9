use log::trace;

use crate::block::Block;

/// Returns the index of the [`Block`] that should serve a request of `size`
/// bytes, or None if no free block is big enough.
///
/// This uses the first-fit algorithm: blocks are checked in creation order and
/// the first free one that can hold `size` wins, even if a later block would be
/// an exact match.
///
/// ```text
///              size = 15
///
/// +---------+    +---------+    +---------+    +---------+
/// | used 10 | -> | free 40 | -> | free 15 | -> | used 30 |
/// +---------+    +---------+    +---------+    +---------+
///                     ^
///                     +-- picked, 25 bytes are wasted
/// ```
pub(crate) fn find_free_block(blocks: &[Block], size: usize) -> Option<usize> {
    let found = blocks.iter().position(|block| block.fits(size));

    match found {
        Some(index) => trace!("first fit for {size} bytes at block {index}"),
        None => trace!("no free block fits {size} bytes, scanned {}", blocks.len()),
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr::NonNull;

    fn blocks(layout: &[(usize, bool)]) -> Vec<Block> {
        layout
            .iter()
            .map(|&(size, is_free)| {
                let mut block = Block::new(NonNull::dangling(), size);
                block.is_free = is_free;
                block
            })
            .collect()
    }

    #[test]
    fn empty_list_has_no_fit() {
        assert_eq!(find_free_block(&[], 8), None);
    }

    #[test]
    fn earlier_larger_block_wins_over_exact_match() {
        let list = blocks(&[(10, false), (40, true), (15, true)]);

        assert_eq!(find_free_block(&list, 15), Some(1));
    }

    #[test]
    fn used_and_small_blocks_are_skipped() {
        let list = blocks(&[(64, false), (8, true), (16, true)]);

        assert_eq!(find_free_block(&list, 12), Some(2));
        assert_eq!(find_free_block(&list, 17), None);
    }
}
