//! One-cluster directory tables.
//!
//! On disk a table is 64 consecutive 32-byte entries. Slot 0 describes the
//! table itself, slot 1 is reserved and carried through unchanged, and slots
//! 2..63 hold children. Tables are read for one call and written back before
//! it returns; nothing here is cached.

use num_enum::IntoPrimitive;

use kernel_api_types::fs::{DIR_ENTRY_SIZE, UATTR_NOT_EMPTY};

use crate::block::{BlockDevice, DiskError};
use crate::cluster::{read_clusters, write_clusters};
use crate::consts::{CLUSTER_SIZE, DIR_TABLE_SLOTS, FIRST_CHILD_SLOT};
use crate::error::FsError;
use crate::{DirectoryEntry, ShortName};

pub const CHILD_SLOTS: usize = DIR_TABLE_SLOTS - FIRST_CHILD_SLOT;

/// Value of the attribute byte.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive)]
pub enum EntryKind {
    File      = 0x00,
    Directory = kernel_api_types::fs::ATTR_SUBDIRECTORY,
}

impl EntryKind {
    pub fn of(entry: &DirectoryEntry) -> Self {
        if entry.is_dir() { EntryKind::Directory } else { EntryKind::File }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryTable {
    /// Slot 0: the table's own name and cluster.
    pub this:     DirectoryEntry,
    /// Slot 1.
    pub reserved: DirectoryEntry,
    /// Slots 2..63.
    pub children: [DirectoryEntry; CHILD_SLOTS],
}

impl DirectoryTable {
    /// Empty table whose self descriptor names it `name` at `cluster`.
    pub fn new(name: ShortName, cluster: u32) -> Self {
        let mut this = DirectoryEntry::EMPTY;
        this.name = name;
        this.attribute = EntryKind::Directory.into();
        this.user_attribute = UATTR_NOT_EMPTY;
        this.set_cluster(cluster);
        Self {
            this,
            reserved: DirectoryEntry::EMPTY,
            children: [DirectoryEntry::EMPTY; CHILD_SLOTS],
        }
    }

    pub fn from_bytes(raw: &[u8; CLUSTER_SIZE]) -> Self {
        let entry = |slot: usize| {
            let off = slot * DIR_ENTRY_SIZE;
            let mut bytes = [0u8; DIR_ENTRY_SIZE];
            bytes.copy_from_slice(&raw[off..off + DIR_ENTRY_SIZE]);
            DirectoryEntry::from_bytes(&bytes)
        };
        Self {
            this:     entry(0),
            reserved: entry(1),
            children: core::array::from_fn(|i| entry(FIRST_CHILD_SLOT + i)),
        }
    }

    pub fn to_bytes(&self) -> [u8; CLUSTER_SIZE] {
        let mut raw = [0u8; CLUSTER_SIZE];
        let all = [&self.this, &self.reserved].into_iter().chain(self.children.iter());
        for (entry, chunk) in all.zip(raw.chunks_exact_mut(DIR_ENTRY_SIZE)) {
            chunk.copy_from_slice(&entry.to_bytes());
        }
        raw
    }

    pub fn load<D: BlockDevice + ?Sized>(disk: &mut D, cluster: u32) -> Result<Self, DiskError> {
        let mut raw = [0u8; CLUSTER_SIZE];
        read_clusters(disk, &mut raw, cluster, 1)?;
        Ok(Self::from_bytes(&raw))
    }

    pub fn store<D: BlockDevice + ?Sized>(&self, disk: &mut D, cluster: u32) -> Result<(), DiskError> {
        write_clusters(disk, &self.to_bytes(), cluster, 1)
    }

    /// Index into `children` of the used entry named exactly `name`.
    pub fn lookup(&self, name: &ShortName) -> Option<usize> {
        self.children.iter().position(|e| e.is_used() && e.name == *name)
    }

    /// Index into `children` of the first unused slot.
    pub fn find_insertion_slot(&self) -> Result<usize, FsError> {
        self.children
            .iter()
            .position(|e| !e.is_used())
            .ok_or(FsError::DirectoryFull)
    }

    /// Whether slot 0 marks this as the directory stored at `cluster`.
    pub fn describes(&self, cluster: u32) -> bool {
        self.this.is_used() && self.this.is_dir() && self.this.cluster() == cluster
    }

    pub fn used_count(&self) -> usize {
        self.children.iter().filter(|e| e.is_used()).count()
    }

    /// On-disk slot number of `children[index]`.
    pub const fn slot_of(index: usize) -> usize {
        FIRST_CHILD_SLOT + index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemDisk;

    fn used(name: &str) -> DirectoryEntry {
        let mut e = DirectoryEntry::EMPTY;
        e.name = ShortName::parse(name);
        e.user_attribute = UATTR_NOT_EMPTY;
        e
    }

    #[test]
    fn new_table_describes_itself() {
        let t = DirectoryTable::new(ShortName::parse("ROOT"), 2);
        assert_eq!(t.this.cluster(), 2);
        assert_eq!(EntryKind::of(&t.this), EntryKind::Directory);
        assert_eq!(t.reserved, DirectoryEntry::EMPTY);
        assert_eq!(t.used_count(), 0);
    }

    #[test]
    fn describes_only_its_own_cluster() {
        let t = DirectoryTable::new(ShortName::parse("docs"), 9);
        assert!(t.describes(9));
        assert!(!t.describes(10));

        // File data decoded as a table has no directory self entry.
        let data = [0x41u8; CLUSTER_SIZE];
        assert!(!DirectoryTable::from_bytes(&data).describes(9));
        assert!(!DirectoryTable::from_bytes(&[0u8; CLUSTER_SIZE]).describes(0));
    }

    #[test]
    fn byte_layout_keeps_self_and_reserved_slots() {
        let mut t = DirectoryTable::new(ShortName::parse("docs"), 9);
        t.reserved.undelete = 0x42;
        t.children[0] = used("a.txt");
        t.children[CHILD_SLOTS - 1] = used("z.txt");

        let raw = t.to_bytes();
        assert_eq!(&raw[0..4], b"docs");
        assert_eq!(raw[DIR_ENTRY_SIZE + 13], 0x42);
        assert_eq!(&raw[2 * DIR_ENTRY_SIZE..2 * DIR_ENTRY_SIZE + 1], b"a");
        assert_eq!(&raw[63 * DIR_ENTRY_SIZE..63 * DIR_ENTRY_SIZE + 1], b"z");

        assert_eq!(DirectoryTable::from_bytes(&raw), t);
    }

    #[test]
    fn lookup_matches_name_and_extension_exactly() {
        let mut t = DirectoryTable::new(ShortName::parse("ROOT"), 2);
        t.children[3] = used("memo.txt");
        t.children[5] = used("memo");

        assert_eq!(t.lookup(&ShortName::parse("memo.txt")), Some(3));
        assert_eq!(t.lookup(&ShortName::parse("memo")), Some(5));
        assert_eq!(t.lookup(&ShortName::parse("memo.bin")), None);
        assert_eq!(t.lookup(&ShortName::parse("MEMO.TXT")), None);
    }

    #[test]
    fn lookup_ignores_unused_slots_and_self() {
        let mut t = DirectoryTable::new(ShortName::parse("docs"), 9);
        let mut stale = used("old.txt");
        stale.user_attribute = 0;
        t.children[0] = stale;

        assert_eq!(t.lookup(&ShortName::parse("old.txt")), None);
        assert_eq!(t.lookup(&ShortName::parse("docs")), None);
    }

    #[test]
    fn insertion_takes_first_unused_slot() {
        let mut t = DirectoryTable::new(ShortName::parse("ROOT"), 2);
        t.children[0] = used("a");
        t.children[2] = used("c");
        assert_eq!(t.find_insertion_slot(), Ok(1));
        assert_eq!(DirectoryTable::slot_of(1), 3);
    }

    #[test]
    fn full_table_has_no_slot() {
        let mut t = DirectoryTable::new(ShortName::parse("ROOT"), 2);
        for (i, child) in t.children.iter_mut().enumerate() {
            *child = used(&std::format!("f{i}"));
        }
        assert_eq!(t.used_count(), 62);
        assert_eq!(t.find_insertion_slot(), Err(FsError::DirectoryFull));
    }

    #[test]
    fn store_and_load_use_the_given_cluster() {
        let mut disk = MemDisk::new(8);
        let mut t = DirectoryTable::new(ShortName::parse("docs"), 5);
        t.children[0] = used("x.bin");
        t.store(&mut disk, 5).unwrap();

        assert_eq!(&disk.bytes()[5 * CLUSTER_SIZE..5 * CLUSTER_SIZE + 4], b"docs");
        assert_eq!(DirectoryTable::load(&mut disk, 5).unwrap(), t);
    }
}
