//! Mount, read, read_directory, write and delete over a block device.
//!
//! The driver owns the device and the allocation table. Every operation loads
//! the directory table it needs, works on a local copy and writes the copy back
//! before returning.

use crate::block::{BlockDevice, DiskError};
use crate::cluster::{read_clusters, write_clusters};
use crate::consts::*;
use crate::dir::{DirectoryTable, EntryKind};
use crate::error::FsError;
use crate::fat::AllocationTable;
use crate::{DirectoryEntry, ShortName};

use kernel_api_types::fs::UATTR_NOT_EMPTY;

/// One filesystem call: the target name, the cluster of the directory that
/// contains it, and the caller's buffer.
///
/// `B` is `&[u8]` for write (its length is the file size; empty creates a
/// directory), `&mut [u8]` for read and read_directory (its length is the
/// capacity), and `()` for delete.
#[derive(Debug)]
pub struct DriverRequest<B> {
    pub name:           ShortName,
    pub parent_cluster: u32,
    pub buf:            B,
}

impl<B> DriverRequest<B> {
    pub fn new(name: ShortName, parent_cluster: u32, buf: B) -> Self {
        Self { name, parent_cluster, buf }
    }
}

/// Clusters needed to store `size` bytes. A zero-byte write creates a
/// directory, which always takes exactly one cluster.
pub const fn required_clusters(size: usize) -> usize {
    if size == 0 { 1 } else { size.div_ceil(CLUSTER_SIZE) }
}

pub struct FilesystemDriver<D> {
    disk: D,
    fat:  AllocationTable,
}

impl<D: BlockDevice> FilesystemDriver<D> {
    /// Mount the volume on `disk`, formatting it first if sector 0 does not
    /// carry the filesystem signature.
    pub fn mount(mut disk: D) -> Result<Self, DiskError> {
        let mut boot = [0u8; BLOCK_SIZE];
        disk.read_blocks(&mut boot, BOOT_SECTOR, 1)?;

        if boot != FS_SIGNATURE {
            log::info!("fat32: no signature in sector 0, formatting");
            return Self::format(disk);
        }

        let fat = AllocationTable::load(&mut disk)?;
        log::info!("fat32: mounted, {} free clusters", fat.free_count());
        Ok(Self { disk, fat })
    }

    /// Write a fresh signature, allocation table and empty root directory.
    pub fn format(mut disk: D) -> Result<Self, DiskError> {
        disk.write_blocks(&FS_SIGNATURE, BOOT_SECTOR, 1)?;

        let fat = AllocationTable::formatted();
        fat.persist(&mut disk)?;

        DirectoryTable::new(ShortName::new(b"ROOT", b""), ROOT_CLUSTER_NUMBER)
            .store(&mut disk, ROOT_CLUSTER_NUMBER)?;

        log::info!("fat32: formatted, {} free clusters", fat.free_count());
        Ok(Self { disk, fat })
    }

    pub fn fat(&self) -> &AllocationTable { &self.fat }
    pub fn disk(&self) -> &D { &self.disk }
    pub fn into_disk(self) -> D { self.disk }

    /// Read the file `req.name` into `req.buf`. Returns the file size.
    ///
    /// Whole clusters are copied, so the buffer must hold the file rounded up
    /// to a multiple of `CLUSTER_SIZE`.
    pub fn read(&mut self, req: DriverRequest<&mut [u8]>) -> Result<u32, FsError> {
        let parent = self.load_parent(req.parent_cluster)?;
        let entry = self.find(&parent, &req.name)?;
        if entry.is_dir() {
            return Err(FsError::WrongType);
        }

        let needed = entry.filesize.div_ceil(CLUSTER_SIZE as u32) as usize;
        if req.buf.len() / CLUSTER_SIZE < needed {
            return Err(FsError::BufferTooSmall);
        }

        log::debug!("fat32: read {} ({} bytes) from cluster {}", req.name, entry.filesize, entry.cluster());
        for (hop, cluster) in self.fat.chain(entry.cluster()).enumerate() {
            let Some(dst) = req.buf.get_mut(hop * CLUSTER_SIZE..(hop + 1) * CLUSTER_SIZE) else {
                log::warn!("fat32: chain of {} is longer than its size", req.name);
                break;
            };
            read_clusters(&mut self.disk, dst, cluster, 1)?;
        }
        Ok(entry.filesize)
    }

    /// Copy the raw table cluster of subdirectory `req.name` into `req.buf`.
    pub fn read_directory(&mut self, req: DriverRequest<&mut [u8]>) -> Result<(), FsError> {
        let parent = self.load_parent(req.parent_cluster)?;
        let entry = self.find(&parent, &req.name)?;
        if !entry.is_dir() {
            return Err(FsError::WrongType);
        }
        if req.buf.len() < CLUSTER_SIZE {
            return Err(FsError::BufferTooSmall);
        }

        log::debug!("fat32: read_directory {} at cluster {}", req.name, entry.cluster());
        read_clusters(&mut self.disk, &mut req.buf[..CLUSTER_SIZE], entry.cluster(), 1)?;
        Ok(())
    }

    /// Create file or directory `req.name` in the parent directory. Returns
    /// its starting cluster.
    ///
    /// An empty buffer creates a subdirectory. Otherwise the buffer becomes
    /// the file contents, spread over `ceil(len / CLUSTER_SIZE)` clusters.
    ///
    /// The steps are persisted one after another without a journal: if the
    /// device fails after the allocation table is written but before the
    /// parent table is, the new clusters stay allocated with no entry
    /// pointing at them.
    pub fn write(&mut self, req: DriverRequest<&[u8]>) -> Result<u32, FsError> {
        let mut parent = self.load_parent(req.parent_cluster)?;
        if parent.lookup(&req.name).is_some() {
            return Err(FsError::AlreadyExists);
        }
        let slot = parent.find_insertion_slot()?;

        let size = u32::try_from(req.buf.len()).map_err(|_| FsError::InsufficientSpace)?;
        let kind = if size == 0 { EntryKind::Directory } else { EntryKind::File };
        let clusters = self.fat.find_free(required_clusters(req.buf.len()))?;
        let first = clusters[0];

        match kind {
            EntryKind::Directory => {
                DirectoryTable::new(req.name, first).store(&mut self.disk, first)?;
                self.fat.set(first, FAT32_FAT_END_OF_FILE);
                self.fat.persist(&mut self.disk)?;
            }
            EntryKind::File => {
                for (i, (&cluster, chunk)) in clusters.iter().zip(req.buf.chunks(CLUSTER_SIZE)).enumerate() {
                    let next = clusters.get(i + 1).copied().unwrap_or(FAT32_FAT_END_OF_FILE);
                    self.fat.set(cluster, next);
                    self.fat.persist(&mut self.disk)?;

                    if chunk.len() == CLUSTER_SIZE {
                        write_clusters(&mut self.disk, chunk, cluster, 1)?;
                    } else {
                        let mut tail = [0u8; CLUSTER_SIZE];
                        tail[..chunk.len()].copy_from_slice(chunk);
                        write_clusters(&mut self.disk, &tail, cluster, 1)?;
                    }
                }
            }
        }

        let mut entry = DirectoryEntry::EMPTY;
        entry.name = req.name;
        entry.attribute = kind.into();
        entry.user_attribute = UATTR_NOT_EMPTY;
        entry.filesize = size;
        entry.set_cluster(first);
        parent.children[slot] = entry;
        parent.store(&mut self.disk, req.parent_cluster)?;

        log::debug!(
            "fat32: wrote {:?} {} ({} bytes, {} clusters from {}) in slot {}",
            kind, req.name, size, clusters.len(), first, DirectoryTable::slot_of(slot),
        );
        Ok(first)
    }

    /// Remove `req.name` from the parent directory and release its clusters.
    ///
    /// A subdirectory is removed without looking inside it; anything it
    /// contained keeps its clusters but can no longer be reached.
    pub fn delete(&mut self, req: DriverRequest<()>) -> Result<(), FsError> {
        let mut parent = self.load_parent(req.parent_cluster)?;
        let index = parent.lookup(&req.name).ok_or(FsError::NotFound)?;
        let entry = parent.children[index];

        if entry.is_dir() {
            let orphans = DirectoryTable::load(&mut self.disk, entry.cluster())?.used_count();
            if orphans > 0 {
                log::warn!("fat32: deleting {} orphans {} entries", req.name, orphans);
            }
        }

        let freed = self.fat.free_chain(entry.cluster());
        parent.children[index] = DirectoryEntry::EMPTY;
        parent.store(&mut self.disk, req.parent_cluster)?;
        self.fat.persist(&mut self.disk)?;

        log::debug!("fat32: deleted {} ({} clusters)", req.name, freed);
        Ok(())
    }

    /// Entry `name` in the directory at `parent_cluster`.
    pub fn stat(&mut self, parent_cluster: u32, name: &ShortName) -> Result<DirectoryEntry, FsError> {
        let parent = self.load_parent(parent_cluster)?;
        self.find(&parent, name)
    }

    // ─── Private helpers ───────────────────────────────────────────────────────

    /// The table at `cluster`. A one-cluster file also ends its chain there,
    /// so the table's self descriptor must name `cluster` as a directory too.
    fn load_parent(&mut self, cluster: u32) -> Result<DirectoryTable, FsError> {
        if !self.fat.is_directory_cluster(cluster) {
            return Err(FsError::InvalidParent);
        }
        let table = DirectoryTable::load(&mut self.disk, cluster)?;
        if !table.describes(cluster) {
            return Err(FsError::InvalidParent);
        }
        Ok(table)
    }

    fn find(&self, parent: &DirectoryTable, name: &ShortName) -> Result<DirectoryEntry, FsError> {
        parent
            .lookup(name)
            .map(|i| parent.children[i])
            .ok_or(FsError::NotFound)
    }
}
