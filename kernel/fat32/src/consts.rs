pub use kernel_api_types::fs::{
    BLOCK_SIZE, CLUSTER_BLOCK_COUNT, CLUSTER_SIZE, DIR_TABLE_SLOTS, FIRST_CHILD_SLOT,
    ROOT_CLUSTER_NUMBER,
};

pub const BOOT_SECTOR:        u64 = 0;
pub const FAT_CLUSTER_NUMBER: u32 = 1;

/// The whole cluster map fits in one cluster of 32-bit entries.
pub const CLUSTER_MAP_SIZE: usize = CLUSTER_SIZE / 4;

pub const CLUSTER_0_VALUE:       u32 = 0x0FFF_FFF0;
pub const CLUSTER_1_VALUE:       u32 = 0x0FFF_FFFF;
pub const FAT32_FAT_END_OF_FILE: u32 = 0x0FFF_FFFF;
pub const FAT32_FAT_EMPTY_ENTRY: u32 = 0x0000_0000;

/// Boot-sector signature. Any other content in sector 0 means "unformatted".
pub const FS_SIGNATURE: [u8; BLOCK_SIZE] = signature();

const fn signature() -> [u8; BLOCK_SIZE] {
    const TEXT: &[u8] =
        b"Course          Designed by     Lab Sister ITB  Made with <3    -----------2024\n";
    let mut out = [0u8; BLOCK_SIZE];
    let mut i = 0;
    while i < TEXT.len() {
        out[i] = TEXT[i];
        i += 1;
    }
    out[BLOCK_SIZE - 2] = b'O';
    out[BLOCK_SIZE - 1] = b'k';
    out
}
