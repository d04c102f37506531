/// Sector-level storage beneath the cluster layer.
///
/// Implementations are blocking: a call returns once the device has finished
/// the transfer. `buf` must hold at least `count * BLOCK_SIZE` bytes.
pub trait BlockDevice {
    fn read_blocks(&mut self, buf: &mut [u8], lba: u64, count: u32) -> Result<(), DiskError>;
    fn write_blocks(&mut self, buf: &[u8], lba: u64, count: u32) -> Result<(), DiskError>;
}

impl<D: BlockDevice + ?Sized> BlockDevice for &mut D {
    fn read_blocks(&mut self, buf: &mut [u8], lba: u64, count: u32) -> Result<(), DiskError> {
        (**self).read_blocks(buf, lba, count)
    }
    fn write_blocks(&mut self, buf: &[u8], lba: u64, count: u32) -> Result<(), DiskError> {
        (**self).write_blocks(buf, lba, count)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiskError {
    /// Transfer extends past the end of the device.
    OutOfRange,
    /// Caller buffer shorter than `count` sectors.
    ShortBuffer,
    /// The drive raised its error bit.
    Fault,
}
