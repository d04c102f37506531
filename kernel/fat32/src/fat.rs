//! In-memory mirror of the on-disk cluster map.
//!
//! Every entry is one of `FAT32_FAT_EMPTY_ENTRY`, the number of the next
//! cluster in a chain, or `FAT32_FAT_END_OF_FILE`. Entries 0 and 1 hold fixed
//! reserved values and are never handed out.

use heapless::Vec;

use crate::block::{BlockDevice, DiskError};
use crate::cluster::{read_clusters, write_clusters};
use crate::consts::*;
use crate::error::FsError;

/// Clusters picked for one allocation, in chain order.
pub type ClusterList = Vec<u32, CLUSTER_MAP_SIZE>;

/// First entry the allocator may consider.
const FIRST_ALLOCATABLE: u32 = 2;

#[derive(Clone, PartialEq, Eq)]
pub struct AllocationTable {
    map: [u32; CLUSTER_MAP_SIZE],
}

impl AllocationTable {
    /// Table of a freshly formatted volume: reserved entries, the root
    /// directory's single cluster, everything else free.
    pub fn formatted() -> Self {
        let mut map = [FAT32_FAT_EMPTY_ENTRY; CLUSTER_MAP_SIZE];
        map[0] = CLUSTER_0_VALUE;
        map[1] = CLUSTER_1_VALUE;
        map[ROOT_CLUSTER_NUMBER as usize] = FAT32_FAT_END_OF_FILE;
        Self { map }
    }

    pub fn load<D: BlockDevice + ?Sized>(disk: &mut D) -> Result<Self, DiskError> {
        let mut raw = [0u8; CLUSTER_SIZE];
        read_clusters(disk, &mut raw, FAT_CLUSTER_NUMBER, 1)?;
        let mut map = [FAT32_FAT_EMPTY_ENTRY; CLUSTER_MAP_SIZE];
        for (entry, bytes) in map.iter_mut().zip(raw.chunks_exact(4)) {
            *entry = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        Ok(Self { map })
    }

    pub fn persist<D: BlockDevice + ?Sized>(&self, disk: &mut D) -> Result<(), DiskError> {
        let mut raw = [0u8; CLUSTER_SIZE];
        for (entry, bytes) in self.map.iter().zip(raw.chunks_exact_mut(4)) {
            bytes.copy_from_slice(&entry.to_le_bytes());
        }
        write_clusters(disk, &raw, FAT_CLUSTER_NUMBER, 1)
    }

    /// Raw entry, or `None` past the end of the map.
    pub fn get(&self, cluster: u32) -> Option<u32> {
        self.map.get(cluster as usize).copied()
    }

    pub(crate) fn set(&mut self, cluster: u32, value: u32) {
        self.map[cluster as usize] = value;
    }

    /// A directory table always occupies exactly one cluster, so only a
    /// non-reserved cluster whose entry terminates its chain can be a parent.
    pub fn is_directory_cluster(&self, cluster: u32) -> bool {
        cluster >= ROOT_CLUSTER_NUMBER && self.get(cluster) == Some(FAT32_FAT_END_OF_FILE)
    }

    pub fn free_count(&self) -> usize {
        self.map[FIRST_ALLOCATABLE as usize..]
            .iter()
            .filter(|&&e| e == FAT32_FAT_EMPTY_ENTRY)
            .count()
    }

    /// Pick the first `count` free clusters in table order.
    ///
    /// Nothing is reserved here; the table is untouched until the caller
    /// links the returned clusters, so a failed search leaves no trace.
    pub fn find_free(&self, count: usize) -> Result<ClusterList, FsError> {
        if count > CLUSTER_MAP_SIZE {
            return Err(FsError::InsufficientSpace);
        }
        let mut found = ClusterList::new();
        for cluster in FIRST_ALLOCATABLE..CLUSTER_MAP_SIZE as u32 {
            if found.len() == count {
                break;
            }
            if self.map[cluster as usize] == FAT32_FAT_EMPTY_ENTRY {
                // Capacity was checked against `count` above.
                let _ = found.push(cluster);
            }
        }
        if found.len() < count {
            return Err(FsError::InsufficientSpace);
        }
        Ok(found)
    }

    /// Walk the chain starting at `start`.
    pub fn chain(&self, start: u32) -> Chain<'_> {
        Chain { fat: self, next: Some(start), steps: 0 }
    }

    /// Zero every entry of the chain starting at `start`, including the
    /// terminating one. Returns the number of clusters released.
    pub fn free_chain(&mut self, start: u32) -> usize {
        let mut freed = 0;
        let mut cluster = start;
        while is_data_cluster(cluster) {
            let next = self.map[cluster as usize];
            if next == FAT32_FAT_EMPTY_ENTRY {
                break;
            }
            self.map[cluster as usize] = FAT32_FAT_EMPTY_ENTRY;
            freed += 1;
            if next == FAT32_FAT_END_OF_FILE {
                break;
            }
            cluster = next;
        }
        freed
    }
}

fn is_data_cluster(cluster: u32) -> bool {
    (FIRST_ALLOCATABLE..CLUSTER_MAP_SIZE as u32).contains(&cluster)
}

/// Iterator over the clusters of one chain.
///
/// Stops at END_OF_FILE, and also on a link that points at a free or
/// reserved entry or that would revisit more clusters than the map holds.
pub struct Chain<'a> {
    fat:   &'a AllocationTable,
    next:  Option<u32>,
    steps: usize,
}

impl Iterator for Chain<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let cluster = self.next.take()?;
        if !is_data_cluster(cluster) || self.steps >= CLUSTER_MAP_SIZE {
            return None;
        }
        let entry = self.fat.map[cluster as usize];
        if entry == FAT32_FAT_EMPTY_ENTRY {
            return None;
        }
        self.steps += 1;
        if entry != FAT32_FAT_END_OF_FILE {
            self.next = Some(entry);
        }
        Some(cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemDisk;
    use std::vec::Vec as StdVec;

    fn link(fat: &mut AllocationTable, clusters: &[u32]) {
        for (i, &c) in clusters.iter().enumerate() {
            let next = clusters.get(i + 1).copied().unwrap_or(FAT32_FAT_END_OF_FILE);
            fat.set(c, next);
        }
    }

    #[test]
    fn formatted_reserves_first_entries_and_root() {
        let fat = AllocationTable::formatted();
        assert_eq!(fat.get(0), Some(CLUSTER_0_VALUE));
        assert_eq!(fat.get(1), Some(CLUSTER_1_VALUE));
        assert_eq!(fat.get(2), Some(FAT32_FAT_END_OF_FILE));
        assert_eq!(fat.free_count(), CLUSTER_MAP_SIZE - 3);
        assert_eq!(fat.get(CLUSTER_MAP_SIZE as u32), None);
    }

    #[test]
    fn only_terminal_data_clusters_are_parents() {
        let mut fat = AllocationTable::formatted();
        assert!(fat.is_directory_cluster(ROOT_CLUSTER_NUMBER));
        // Entry 1 holds the same value as END_OF_FILE but is the table itself.
        assert!(!fat.is_directory_cluster(FAT_CLUSTER_NUMBER));
        assert!(!fat.is_directory_cluster(3));

        link(&mut fat, &[3, 4]);
        assert!(!fat.is_directory_cluster(3));
        assert!(fat.is_directory_cluster(4));
        assert!(!fat.is_directory_cluster(CLUSTER_MAP_SIZE as u32));
    }

    #[test]
    fn find_free_scans_in_order_and_skips_used() {
        let mut fat = AllocationTable::formatted();
        link(&mut fat, &[3, 5]);
        let got = fat.find_free(3).unwrap();
        assert_eq!(&got[..], &[4, 6, 7]);
    }

    #[test]
    fn find_free_fails_without_touching_the_table() {
        let mut fat = AllocationTable::formatted();
        let all: StdVec<u32> = (3..CLUSTER_MAP_SIZE as u32 - 1).collect();
        link(&mut fat, &all);
        assert_eq!(fat.free_count(), 1);

        let before = fat.clone();
        assert_eq!(fat.find_free(2), Err(FsError::InsufficientSpace));
        assert!(fat == before);
        assert_eq!(&fat.find_free(1).unwrap()[..], &[CLUSTER_MAP_SIZE as u32 - 1]);
    }

    #[test]
    fn find_free_rejects_more_than_the_map_holds() {
        let fat = AllocationTable::formatted();
        assert_eq!(fat.find_free(CLUSTER_MAP_SIZE + 1), Err(FsError::InsufficientSpace));
    }

    #[test]
    fn chain_follows_links_to_end_of_file() {
        let mut fat = AllocationTable::formatted();
        link(&mut fat, &[7, 3, 9]);
        assert_eq!(fat.chain(7).collect::<StdVec<_>>(), [7, 3, 9]);
        assert_eq!(fat.chain(ROOT_CLUSTER_NUMBER).collect::<StdVec<_>>(), [2]);
        assert_eq!(fat.chain(10).count(), 0);
        assert_eq!(fat.chain(0).count(), 0);
    }

    #[test]
    fn chain_stops_on_a_cycle() {
        let mut fat = AllocationTable::formatted();
        fat.set(3, 4);
        fat.set(4, 3);
        assert_eq!(fat.chain(3).count(), CLUSTER_MAP_SIZE);
    }

    #[test]
    fn free_chain_zeroes_every_link() {
        let mut fat = AllocationTable::formatted();
        link(&mut fat, &[4, 8, 6]);
        let free_before = fat.free_count();

        assert_eq!(fat.free_chain(4), 3);
        for c in [4, 8, 6] {
            assert_eq!(fat.get(c), Some(FAT32_FAT_EMPTY_ENTRY));
        }
        assert_eq!(fat.free_count(), free_before + 3);
        assert_eq!(fat.get(ROOT_CLUSTER_NUMBER), Some(FAT32_FAT_END_OF_FILE));
    }

    #[test]
    fn free_chain_ignores_reserved_start() {
        let mut fat = AllocationTable::formatted();
        assert_eq!(fat.free_chain(1), 0);
        assert_eq!(fat.get(1), Some(CLUSTER_1_VALUE));
    }

    #[test]
    fn persist_writes_little_endian_map_at_fat_cluster() {
        let mut disk = MemDisk::full_size();
        let mut fat = AllocationTable::formatted();
        link(&mut fat, &[3, 0x1FF]);
        fat.persist(&mut disk).unwrap();

        let base = CLUSTER_SIZE; // cluster 1
        assert_eq!(&disk.bytes()[base..base + 4], &CLUSTER_0_VALUE.to_le_bytes());
        assert_eq!(&disk.bytes()[base + 12..base + 16], &0x1FFu32.to_le_bytes());

        let loaded = AllocationTable::load(&mut disk).unwrap();
        assert!(loaded == fat);
    }
}
