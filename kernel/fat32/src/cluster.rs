use crate::block::{BlockDevice, DiskError};
use crate::consts::CLUSTER_BLOCK_COUNT;

pub const fn cluster_to_lba(cluster: u32) -> u64 {
    cluster as u64 * CLUSTER_BLOCK_COUNT as u64
}

pub fn read_clusters<D: BlockDevice + ?Sized>(
    disk: &mut D,
    buf: &mut [u8],
    cluster: u32,
    count: u32,
) -> Result<(), DiskError> {
    disk.read_blocks(buf, cluster_to_lba(cluster), count * CLUSTER_BLOCK_COUNT as u32)
}

pub fn write_clusters<D: BlockDevice + ?Sized>(
    disk: &mut D,
    buf: &[u8],
    cluster: u32,
    count: u32,
) -> Result<(), DiskError> {
    disk.write_blocks(buf, cluster_to_lba(cluster), count * CLUSTER_BLOCK_COUNT as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{BLOCK_SIZE, CLUSTER_SIZE};
    use crate::testing::MemDisk;

    #[test]
    fn stride_is_four_sectors() {
        assert_eq!(cluster_to_lba(0), 0);
        assert_eq!(cluster_to_lba(1), 4);
        assert_eq!(cluster_to_lba(2), 8);
        assert_eq!(cluster_to_lba(511), 2044);
    }

    #[test]
    fn write_lands_on_translated_sectors() {
        let mut disk = MemDisk::new(16);
        let data = [0x5Au8; CLUSTER_SIZE];
        write_clusters(&mut disk, &data, 3, 1).unwrap();

        let start = cluster_to_lba(3) as usize * BLOCK_SIZE;
        assert!(disk.bytes()[start..start + CLUSTER_SIZE].iter().all(|&b| b == 0x5A));
        assert!(disk.bytes()[..start].iter().all(|&b| b == 0));

        let mut back = [0u8; CLUSTER_SIZE];
        read_clusters(&mut disk, &mut back, 3, 1).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn past_end_is_rejected() {
        let mut disk = MemDisk::new(4);
        let mut buf = [0u8; CLUSTER_SIZE];
        assert_eq!(read_clusters(&mut disk, &mut buf, 4, 1), Err(DiskError::OutOfRange));
    }
}
