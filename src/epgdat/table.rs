use std::collections::{BTreeMap, btree_map::Entry};

use bytes::BufMut;

use super::{WritableLen, descriptor::Descriptor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub descriptor: Descriptor,
    pub ref_count: u32,
}

/// Result of registering a block in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    New,
    Shared,
    /// The CRC is taken by a block with different bytes. The reference is
    /// counted against the stored block.
    Collision,
}

/// Deduplicated description blocks keyed by reference CRC.
///
/// Iteration is in ascending CRC order, the order receivers expect in the
/// description section.
#[derive(Debug, Clone)]
pub struct DescriptionTable {
    entries: BTreeMap<u32, TableEntry>,
    check_collisions: bool,
}

impl DescriptionTable {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            check_collisions: true,
        }
    }

    pub fn with_collision_check(mut self, enabled: bool) -> Self {
        self.check_collisions = enabled;
        self
    }

    pub fn register(&mut self, desc: &Descriptor) -> Registered {
        match self.entries.entry(desc.crc) {
            Entry::Vacant(entry) => {
                entry.insert(TableEntry {
                    descriptor: desc.clone(),
                    ref_count: 1,
                });

                Registered::New
            }
            Entry::Occupied(mut entry) => {
                let entry = entry.get_mut();
                entry.ref_count += 1;

                if self.check_collisions && entry.descriptor != *desc {
                    Registered::Collision
                } else {
                    Registered::Shared
                }
            }
        }
    }

    pub fn get(&self, crc: u32) -> Option<&TableEntry> {
        self.entries.get(&crc)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Writes the description section: block count, then per block its CRC,
    /// reference count and stored bytes.
    pub fn write_to(&self, output: &mut impl BufMut) {
        output.put_u32_le(self.entries.len() as u32);

        for (crc, entry) in &self.entries {
            output.put_u32_le(*crc);
            output.put_u32_le(entry.ref_count);
            entry.descriptor.write_to(output);
        }
    }
}

impl Default for DescriptionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl WritableLen for DescriptionTable {
    fn writable_len(&self) -> usize {
        4 + self
            .iter()
            .map(|entry| 8 + entry.descriptor.writable_len())
            .sum::<usize>()
    }
}
