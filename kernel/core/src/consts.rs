/// Last canonical address in the lower half (inclusive).
/// In 48-bit virtual addressing: bits 63:47 must all be 0 for the lower half.
pub const LOWER_HALF_END: u64 = 0x7FFF_FFFF_FFFF;

pub const USER_MIN: u64 = 0x1000;
pub const USER_MAX: u64 = LOWER_HALF_END;

/// Sectors moved per ATA command. The sector-count register is one byte and
/// 0 means 256, so one cluster (4 sectors) always fits.
pub const ATA_MAX_SECTORS_PER_COMMAND: u32 = 255;
