//! Set-associative tag array (spec.md §3 `CacheLine`), grounded on the
//! teacher's `cache::data::Data` tag-probe/replacement logic in
//! `cache/data.rs`, simplified to plain LRU with no sector sub-blocking
//! (Coyote has no sector cache mode).

use crate::address::Address;
use crate::config::CacheGeometry;

#[derive(Copy, Clone, Debug, Default)]
pub struct CacheLine {
    pub tag: Address,
    pub valid: bool,
    pub dirty: bool,
    pub accessed_by_vector: bool,
    pub accessed_by_non_vector: bool,
}

pub enum Probe {
    Hit { way: usize },
    Miss,
}

/// One set-associative slice, addressed by `(set, way)`. `ways[set]` is
/// ordered most-recently-used first so eviction always picks `ways.last()`.
pub struct TagArray {
    geometry: CacheGeometry,
    sets: Vec<Vec<(CacheLine, usize)>>,
    set_bits: u32,
    offset_bits: u32,
}

impl TagArray {
    #[must_use]
    pub fn new(geometry: CacheGeometry) -> Self {
        let set_bits = crate::address::log2(u64::from(geometry.sets));
        let offset_bits = crate::address::log2(u64::from(geometry.line_size));
        let sets = (0..geometry.sets)
            .map(|_| {
                (0..geometry.associativity)
                    .map(|way| (CacheLine::default(), way as usize))
                    .collect()
            })
            .collect();
        Self {
            geometry,
            sets,
            set_bits,
            offset_bits,
        }
    }

    fn set_index(&self, line_address: Address) -> usize {
        crate::address::extract_bits(line_address, self.offset_bits, self.set_bits) as usize
    }

    fn tag(&self, line_address: Address) -> Address {
        line_address >> (self.offset_bits + self.set_bits)
    }

    #[must_use]
    pub fn probe(&self, line_address: Address) -> Probe {
        let set = &self.sets[self.set_index(line_address)];
        let tag = self.tag(line_address);
        for (position, (line, _)) in set.iter().enumerate() {
            if line.valid && line.tag == tag {
                return Probe::Hit { way: position };
            }
        }
        Probe::Miss
    }

    /// Moves the hit way to the MRU position (spec.md §4.2 "mark the line
    /// MRU").
    pub fn touch(&mut self, line_address: Address, way: usize) {
        let set_index = self.set_index(line_address);
        let entry = self.sets[set_index].remove(way);
        self.sets[set_index].insert(0, entry);
    }

    pub fn set_dirty(&mut self, line_address: Address, way: usize, dirty: bool) {
        let set_index = self.set_index(line_address);
        self.sets[set_index][way].0.dirty = dirty;
    }

    /// Allocates `line_address` into the LRU way of its set, returning the
    /// evicted line if it was valid (the caller decides whether a dirty
    /// eviction needs a writeback).
    pub fn allocate(&mut self, line_address: Address) -> CacheLine {
        let set_index = self.set_index(line_address);
        let set = &mut self.sets[set_index];
        let lru_position = set.len() - 1;
        let (victim, _) = set.remove(lru_position);
        let tag = self.tag(line_address);
        set.insert(
            0,
            (
                CacheLine {
                    tag,
                    valid: true,
                    dirty: false,
                    accessed_by_vector: false,
                    accessed_by_non_vector: false,
                },
                0,
            ),
        );
        victim
    }

    #[must_use]
    pub fn geometry(&self) -> CacheGeometry {
        self.geometry
    }

    /// Rebuilds the full address of an evicted line given the address that
    /// triggered the allocation into its set (the set index is shared; only
    /// the tag differs) and the victim's own tag.
    #[must_use]
    pub fn victim_address(&self, installing_line_address: Address, victim_tag: Address) -> Address {
        let set_index = self.set_index(installing_line_address) as Address;
        (victim_tag << (self.offset_bits + self.set_bits)) | (set_index << self.offset_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_allocate_then_hit() {
        let mut array = TagArray::new(CacheGeometry {
            sets: 4,
            associativity: 2,
            line_size: 64,
        });
        let line = 0x1000;
        assert!(matches!(array.probe(line), Probe::Miss));
        array.allocate(line);
        assert!(matches!(array.probe(line), Probe::Hit { way: 0 }));
    }

    #[test]
    fn lru_evicts_least_recently_touched_way() {
        let mut array = TagArray::new(CacheGeometry {
            sets: 1,
            associativity: 2,
            line_size: 64,
        });
        array.allocate(0x0000);
        array.allocate(0x0040);
        // 0x0000 was pushed to LRU position by the second allocate and
        // should now be evicted.
        assert!(matches!(array.probe(0x0000), Probe::Miss));
        assert!(matches!(array.probe(0x0040), Probe::Hit { .. }));
    }
}
