//! Direct-mapped cache of decompressed blocks.
//!
//! Block `n` may only live in slot `n % capacity`; inserting into an
//! occupied slot evicts whatever was there. A capacity of zero disables
//! caching entirely.

/// One decompressed block and the index it belongs to.
#[derive(Debug, Clone)]
struct CachedBlock {
    index: u64,
    data: Vec<u8>,
}

/// Fixed-capacity, direct-mapped block cache.
#[derive(Debug, Clone, Default)]
pub struct BlockCache {
    slots: Vec<Option<CachedBlock>>,
}

impl BlockCache {
    /// Create a cache with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether no block is cached.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    fn slot_of(&self, index: u64) -> Option<usize> {
        let capacity = self.slots.len() as u64;
        if capacity == 0 {
            None
        } else {
            Some((index % capacity) as usize)
        }
    }

    /// Cached bytes of block `index`.
    pub fn get(&self, index: u64) -> Option<&[u8]> {
        let slot = self.slot_of(index)?;
        match &self.slots[slot] {
            Some(block) if block.index == index => Some(&block.data),
            _ => None,
        }
    }

    /// Whether block `index` is cached.
    pub fn contains(&self, index: u64) -> bool {
        self.get(index).is_some()
    }

    /// Copy bytes of block `index` starting at `offset` into `out`.
    ///
    /// Returns `None` on a miss, otherwise the number of bytes copied.
    pub fn copy_out(&self, index: u64, offset: usize, out: &mut [u8]) -> Option<usize> {
        let data = self.get(index)?;
        let available = data.get(offset..).unwrap_or_default();
        let n = out.len().min(available.len());
        out[..n].copy_from_slice(&available[..n]);
        Some(n)
    }

    /// Store block `index`, returning the index of the evicted block if the
    /// slot held a different one. Does nothing when caching is disabled.
    pub fn insert(&mut self, index: u64, data: Vec<u8>) -> Option<u64> {
        let slot = self.slot_of(index)?;
        let previous = self.slots[slot].replace(CachedBlock { index, data });
        previous.map(|block| block.index).filter(|&old| old != index)
    }

    /// Change the number of slots, keeping what fits.
    ///
    /// Blocks move to `index % capacity`; on a collision the block already
    /// placed stays and the later one is dropped.
    pub fn resize(&mut self, capacity: usize) {
        if capacity == self.slots.len() {
            return;
        }

        let mut slots: Vec<Option<CachedBlock>> = vec![None; capacity];
        if capacity > 0 {
            for block in self.slots.drain(..).flatten() {
                let slot = (block.index % capacity as u64) as usize;
                if slots[slot].is_none() {
                    slots[slot] = Some(block);
                }
            }
        }
        self.slots = slots;
    }

    /// Drop every cached block, keeping the capacity.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Indices of cached blocks in slot order.
    pub fn cached_blocks(&self) -> Vec<u64> {
        self.slots.iter().flatten().map(|block| block.index).collect()
    }
}
