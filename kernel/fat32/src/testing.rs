// Test-only in-memory block device.

extern crate std;

use std::vec;
use std::vec::Vec;

use crate::block::{BlockDevice, DiskError};
use crate::consts::{BLOCK_SIZE, CLUSTER_MAP_SIZE, CLUSTER_SIZE};

/// Vec-backed disk. Counts writes and can be told to fail from the n-th
/// write onwards to simulate a drive fault mid-operation.
pub struct MemDisk {
    data:       Vec<u8>,
    writes:     usize,
    fail_after: Option<usize>,
}

impl MemDisk {
    /// A disk of `clusters` clusters.
    pub fn new(clusters: usize) -> Self {
        Self { data: vec![0u8; clusters * CLUSTER_SIZE], writes: 0, fail_after: None }
    }

    /// A disk exactly as large as the allocation table can address.
    pub fn full_size() -> Self {
        Self::new(CLUSTER_MAP_SIZE)
    }

    pub fn bytes(&self) -> &[u8] { &self.data }
    pub fn bytes_mut(&mut self) -> &mut [u8] { &mut self.data }
    pub fn writes(&self) -> usize { self.writes }

    /// Let `n` more writes succeed, then fail every following one.
    pub fn fail_after(&mut self, n: usize) {
        self.fail_after = Some(self.writes + n);
    }

    fn range(&self, buf_len: usize, lba: u64, count: u32) -> Result<core::ops::Range<usize>, DiskError> {
        let len = count as usize * BLOCK_SIZE;
        if buf_len < len {
            return Err(DiskError::ShortBuffer);
        }
        let start = lba as usize * BLOCK_SIZE;
        if start + len > self.data.len() {
            return Err(DiskError::OutOfRange);
        }
        Ok(start..start + len)
    }
}

impl BlockDevice for MemDisk {
    fn read_blocks(&mut self, buf: &mut [u8], lba: u64, count: u32) -> Result<(), DiskError> {
        let r = self.range(buf.len(), lba, count)?;
        let len = r.len();
        buf[..len].copy_from_slice(&self.data[r]);
        Ok(())
    }

    fn write_blocks(&mut self, buf: &[u8], lba: u64, count: u32) -> Result<(), DiskError> {
        if self.fail_after.is_some_and(|n| self.writes >= n) {
            return Err(DiskError::Fault);
        }
        let r = self.range(buf.len(), lba, count)?;
        let len = r.len();
        self.data[r].copy_from_slice(&buf[..len]);
        self.writes += 1;
        Ok(())
    }
}
