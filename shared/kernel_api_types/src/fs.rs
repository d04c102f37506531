/// On-disk layout and call surface of the cluster filesystem.
///
/// The directory-entry layout lives here rather than in the driver because
/// `read_directory` hands a raw table cluster back to user space, so callers
/// decode the same bytes the driver writes.

use core::fmt;

// ─── Geometry ──────────────────────────────────────────────────────────────────

pub const BLOCK_SIZE:          usize = 512;
pub const CLUSTER_BLOCK_COUNT: usize = 4;
pub const CLUSTER_SIZE:        usize = BLOCK_SIZE * CLUSTER_BLOCK_COUNT;

pub const ROOT_CLUSTER_NUMBER: u32 = 2;

pub const DIR_ENTRY_SIZE:   usize = 32;
pub const DIR_TABLE_SLOTS:  usize = CLUSTER_SIZE / DIR_ENTRY_SIZE;
/// Slot 0 describes the table itself and slot 1 is reserved; children start here.
pub const FIRST_CHILD_SLOT: usize = 2;

pub const ATTR_SUBDIRECTORY: u8 = 0x10;
pub const UATTR_NOT_EMPTY:   u8 = 0xAA;

// ─── Results ───────────────────────────────────────────────────────────────────

/// Result codes returned by the filesystem syscalls.
#[repr(i64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsResult {
    Ok                = 0,
    AlreadyExists     = 1,
    InvalidParent     = 2,
    NotFound          = 3,
    WrongType         = 4,
    BufferTooSmall    = -1,
    DirectoryFull     = -2,
    InsufficientSpace = -3,
    DeviceError       = -4,
    InvalidRequest    = -5,
}

impl FsResult {
    pub fn from_i64(v: i64) -> Self {
        match v {
            0  => FsResult::Ok,
            1  => FsResult::AlreadyExists,
            2  => FsResult::InvalidParent,
            3  => FsResult::NotFound,
            4  => FsResult::WrongType,
            -1 => FsResult::BufferTooSmall,
            -2 => FsResult::DirectoryFull,
            -3 => FsResult::InsufficientSpace,
            -4 => FsResult::DeviceError,
            _  => FsResult::InvalidRequest,
        }
    }

    /// Reinterpret the raw `rax` value of a syscall return.
    pub fn from_u64(v: u64) -> Self {
        Self::from_i64(v as i64)
    }

    pub fn as_u64(self) -> u64 {
        self as i64 as u64
    }
}

// ─── Names ─────────────────────────────────────────────────────────────────────

/// Fixed-width 8.3 name.
///
/// Unused bytes are zero. Two names are equal only if all eleven bytes are
/// equal; there is no case folding and no trimming.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShortName {
    pub name: [u8; 8],
    pub ext:  [u8; 3],
}

impl ShortName {
    /// Build a name from raw parts, truncating to 8 and 3 bytes.
    pub fn new(name: &[u8], ext: &[u8]) -> Self {
        let mut out = Self::default();
        let n = name.len().min(8);
        let e = ext.len().min(3);
        out.name[..n].copy_from_slice(&name[..n]);
        out.ext[..e].copy_from_slice(&ext[..e]);
        out
    }

    /// Split `"memo.txt"` at the last dot. A name without a dot has an empty extension.
    pub fn parse(s: &str) -> Self {
        match s.rfind('.') {
            Some(i) => Self::new(s[..i].as_bytes(), s[i + 1..].as_bytes()),
            None    => Self::new(s.as_bytes(), &[]),
        }
    }
}

impl fmt::Display for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_end = self.name.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        let ext_end  = self.ext.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        for &b in &self.name[..name_end] {
            write!(f, "{}", b as char)?;
        }
        if ext_end > 0 {
            f.write_str(".")?;
            for &b in &self.ext[..ext_end] {
                write!(f, "{}", b as char)?;
            }
        }
        Ok(())
    }
}

// ─── Directory entries ─────────────────────────────────────────────────────────

/// One 32-byte directory-table slot, decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name:           ShortName,
    pub attribute:      u8,
    pub user_attribute: u8,
    pub undelete:       u8,
    pub create_time:    u16,
    pub create_date:    u16,
    pub access_date:    u16,
    pub cluster_high:   u16,
    pub modified_time:  u16,
    pub modified_date:  u16,
    pub cluster_low:    u16,
    pub filesize:       u32,
}

impl DirectoryEntry {
    pub const EMPTY: Self = Self {
        name: ShortName { name: [0; 8], ext: [0; 3] },
        attribute: 0, user_attribute: 0, undelete: 0,
        create_time: 0, create_date: 0, access_date: 0,
        cluster_high: 0, modified_time: 0, modified_date: 0,
        cluster_low: 0, filesize: 0,
    };

    pub fn from_bytes(raw: &[u8; DIR_ENTRY_SIZE]) -> Self {
        let u16_at = |off: usize| u16::from_le_bytes([raw[off], raw[off + 1]]);
        let mut name = ShortName::default();
        name.name.copy_from_slice(&raw[0..8]);
        name.ext.copy_from_slice(&raw[8..11]);
        Self {
            name,
            attribute:      raw[11],
            user_attribute: raw[12],
            undelete:       raw[13],
            create_time:    u16_at(14),
            create_date:    u16_at(16),
            access_date:    u16_at(18),
            cluster_high:   u16_at(20),
            modified_time:  u16_at(22),
            modified_date:  u16_at(24),
            cluster_low:    u16_at(26),
            filesize:       u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        raw[0..8].copy_from_slice(&self.name.name);
        raw[8..11].copy_from_slice(&self.name.ext);
        raw[11] = self.attribute;
        raw[12] = self.user_attribute;
        raw[13] = self.undelete;
        raw[14..16].copy_from_slice(&self.create_time.to_le_bytes());
        raw[16..18].copy_from_slice(&self.create_date.to_le_bytes());
        raw[18..20].copy_from_slice(&self.access_date.to_le_bytes());
        raw[20..22].copy_from_slice(&self.cluster_high.to_le_bytes());
        raw[22..24].copy_from_slice(&self.modified_time.to_le_bytes());
        raw[24..26].copy_from_slice(&self.modified_date.to_le_bytes());
        raw[26..28].copy_from_slice(&self.cluster_low.to_le_bytes());
        raw[28..32].copy_from_slice(&self.filesize.to_le_bytes());
        raw
    }

    pub fn cluster(&self) -> u32 {
        ((self.cluster_high as u32) << 16) | self.cluster_low as u32
    }

    pub fn set_cluster(&mut self, cluster: u32) {
        self.cluster_high = (cluster >> 16) as u16;
        self.cluster_low  = cluster as u16;
    }

    pub fn is_used(&self) -> bool { self.user_attribute == UATTR_NOT_EMPTY }
    pub fn is_dir(&self) -> bool  { self.attribute & ATTR_SUBDIRECTORY != 0 }

    /// Iterate the used child slots of a raw directory-table cluster, as
    /// returned by `read_directory`. Yields `(slot, entry)`.
    pub fn children(table: &[u8]) -> impl Iterator<Item = (usize, DirectoryEntry)> + '_ {
        table
            .chunks_exact(DIR_ENTRY_SIZE)
            .take(DIR_TABLE_SLOTS)
            .enumerate()
            .skip(FIRST_CHILD_SLOT)
            .filter_map(|(slot, chunk)| {
                let raw: &[u8; DIR_ENTRY_SIZE] = chunk.try_into().ok()?;
                let entry = DirectoryEntry::from_bytes(raw);
                entry.is_used().then_some((slot, entry))
            })
    }
}

// ─── Requests ──────────────────────────────────────────────────────────────────

/// Raw request passed by pointer in `rsi` for every filesystem syscall.
///
/// `buf` is a user virtual address; `buffer_size` is the capacity for reads
/// and the byte count for writes (0 creates a directory). Delete ignores both.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct FsRequest {
    pub buf:                   u64,
    pub name:                  [u8; 8],
    pub ext:                   [u8; 3],
    pub _pad:                  u8,
    pub parent_cluster_number: u32,
    pub buffer_size:           u32,
    pub _pad2:                 [u8; 4],
}

impl FsRequest {
    pub fn new(name: ShortName, parent_cluster_number: u32, buf: u64, buffer_size: u32) -> Self {
        Self {
            buf,
            name: name.name,
            ext: name.ext,
            _pad: 0,
            parent_cluster_number,
            buffer_size,
            _pad2: [0; 4],
        }
    }

    pub fn short_name(&self) -> ShortName {
        ShortName { name: self.name, ext: self.ext }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    #[test]
    fn parse_splits_at_last_dot() {
        let n = ShortName::parse("memo.txt");
        assert_eq!(&n.name, b"memo\0\0\0\0");
        assert_eq!(&n.ext, b"txt");

        let n = ShortName::parse("a.b.c");
        assert_eq!(&n.name, b"a.b\0\0\0\0\0");
        assert_eq!(&n.ext, b"c\0\0");
    }

    #[test]
    fn parse_without_extension() {
        let n = ShortName::parse("docs");
        assert_eq!(&n.name, b"docs\0\0\0\0");
        assert_eq!(n.ext, [0; 3]);
    }

    #[test]
    fn new_truncates_long_parts() {
        let n = ShortName::new(b"toolongname", b"rust");
        assert_eq!(&n.name, b"toolongn");
        assert_eq!(&n.ext, b"rus");
    }

    #[test]
    fn names_compare_full_width() {
        // "memo" and "memo\0" are the same 8-byte field; "memo " is not.
        assert_eq!(ShortName::new(b"memo", b"txt"), ShortName::new(b"memo\0", b"txt"));
        assert_ne!(ShortName::new(b"memo", b"txt"), ShortName::new(b"memo ", b"txt"));
        assert_ne!(ShortName::new(b"memo", b"txt"), ShortName::new(b"memo", b"TXT"));
    }

    #[test]
    fn display_drops_padding() {
        assert_eq!(format!("{}", ShortName::parse("memo.txt")), "memo.txt");
        assert_eq!(format!("{}", ShortName::parse("docs")), "docs");
    }

    #[test]
    fn entry_layout_offsets() {
        let mut e = DirectoryEntry::EMPTY;
        e.name = ShortName::parse("kano.bin");
        e.attribute = ATTR_SUBDIRECTORY;
        e.user_attribute = UATTR_NOT_EMPTY;
        e.filesize = 0x1234_5678;
        e.set_cluster(0x0003_0005);

        let raw = e.to_bytes();
        assert_eq!(&raw[0..4], b"kano");
        assert_eq!(&raw[8..11], b"bin");
        assert_eq!(raw[11], 0x10);
        assert_eq!(raw[12], 0xAA);
        assert_eq!(&raw[20..22], &[0x03, 0x00]);
        assert_eq!(&raw[26..28], &[0x05, 0x00]);
        assert_eq!(&raw[28..32], &[0x78, 0x56, 0x34, 0x12]);

        let back = DirectoryEntry::from_bytes(&raw);
        assert_eq!(back.cluster(), 0x0003_0005);
        assert!(back.is_dir());
        assert!(back.is_used());
    }

    #[test]
    fn children_skips_self_reserved_and_empty_slots() {
        let mut table = [0u8; CLUSTER_SIZE];
        let mut used = DirectoryEntry::EMPTY;
        used.user_attribute = UATTR_NOT_EMPTY;

        // Slots 0 and 1 look used but are never children.
        for slot in [0usize, 1, 5, 63] {
            used.name = ShortName::new(&[b'a' + slot as u8], b"");
            let off = slot * DIR_ENTRY_SIZE;
            table[off..off + DIR_ENTRY_SIZE].copy_from_slice(&used.to_bytes());
        }

        let slots: std::vec::Vec<usize> = DirectoryEntry::children(&table).map(|(s, _)| s).collect();
        assert_eq!(slots, [5, 63]);
    }

    #[test]
    fn result_codes_are_signed() {
        assert_eq!(FsResult::BufferTooSmall.as_u64(), u64::MAX);
        assert_eq!(FsResult::from_u64(u64::MAX), FsResult::BufferTooSmall);
        assert_eq!(FsResult::from_i64(42), FsResult::InvalidRequest);
    }
}
