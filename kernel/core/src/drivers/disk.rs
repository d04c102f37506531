//! ATA PIO driver: primary channel, master drive, LBA28.
//!
//! No IRQs are used; every command polls BSY/DRQ. The filesystem issues one
//! request at a time, so the caller simply spins until the drive answers.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use fat32::consts::BLOCK_SIZE;
use fat32::{BlockDevice, DiskError};
use x86_64::instructions::port::{Port, PortReadOnly};

use crate::consts::ATA_MAX_SECTORS_PER_COMMAND;

// Primary channel I/O ports
const DATA:         u16 = 0x1F0;
const SECTOR_COUNT: u16 = 0x1F2;
const LBA_LO:       u16 = 0x1F3;
const LBA_MID:      u16 = 0x1F4;
const LBA_HI:       u16 = 0x1F5;
const DRIVE_HEAD:   u16 = 0x1F6;
const STATUS_CMD:   u16 = 0x1F7; // write = command, read = status
const ALT_STATUS:   u16 = 0x3F6; // read = alternate status (doesn't clear IRQ)

// Status bits
const BSY: u8 = 0x80;
const DRQ: u8 = 0x08;
const ERR: u8 = 0x01;

const CMD_IDENTIFY:      u8 = 0xEC;
const CMD_READ_SECTORS:  u8 = 0x20;
const CMD_WRITE_SECTORS: u8 = 0x30;
const CMD_CACHE_FLUSH:   u8 = 0xE7;

/// Highest sector reachable with 28-bit addressing.
const LBA28_LIMIT: u64 = 1 << 28;

static DISK_PRESENT:      AtomicBool = AtomicBool::new(false);
static DISK_SECTOR_COUNT: AtomicU64  = AtomicU64::new(0);

/// Spin until BSY clears, then return the status byte.
#[inline(always)]
unsafe fn wait_not_busy() -> u8 {
    let mut port: PortReadOnly<u8> = PortReadOnly::new(STATUS_CMD);
    loop {
        let s = unsafe { port.read() };
        if s & BSY == 0 {
            return s;
        }
        core::hint::spin_loop();
    }
}

/// Spin until the drive wants data (DRQ) or reports an error.
#[inline(always)]
unsafe fn wait_data_request() -> Result<(), DiskError> {
    loop {
        let s = unsafe { wait_not_busy() };
        if s & ERR != 0 {
            return Err(DiskError::Fault);
        }
        if s & DRQ != 0 {
            return Ok(());
        }
    }
}

/// Read the alternate status 4 times (≈ 400 ns delay).
#[inline(always)]
unsafe fn io_delay() {
    let mut port: PortReadOnly<u8> = PortReadOnly::new(ALT_STATUS);
    for _ in 0..4 {
        unsafe { let _ = port.read(); }
    }
}

/// Probe the master drive with IDENTIFY and record its size.
pub fn init() {
    unsafe {
        Port::<u8>::new(DRIVE_HEAD).write(0xA0);
        io_delay();

        Port::<u8>::new(SECTOR_COUNT).write(0);
        Port::<u8>::new(LBA_LO).write(0);
        Port::<u8>::new(LBA_MID).write(0);
        Port::<u8>::new(LBA_HI).write(0);
        Port::<u8>::new(STATUS_CMD).write(CMD_IDENTIFY);
        io_delay();

        if PortReadOnly::<u8>::new(STATUS_CMD).read() == 0 {
            log::info!("disk::init: no ATA drive detected");
            return;
        }
        if wait_data_request().is_err() {
            log::warn!("disk::init: IDENTIFY returned ERR, not a plain ATA drive");
            return;
        }

        let mut words = [0u16; 256];
        let mut data_port: Port<u16> = Port::new(DATA);
        for w in words.iter_mut() {
            *w = data_port.read();
        }

        // Words 60-61: 28-bit LBA sector count
        let total = ((words[61] as u64) << 16) | (words[60] as u64);

        DISK_SECTOR_COUNT.store(total, Ordering::Relaxed);
        DISK_PRESENT.store(true, Ordering::Release);
        log::info!("disk::init: ATA drive found, {} sectors ({} KiB)", total, total / 2);
    }
}

pub fn is_present() -> bool {
    DISK_PRESENT.load(Ordering::Acquire)
}

/// Handle to the probed drive. Only one exists, owned by the mounted
/// filesystem.
pub struct AtaDisk {
    sectors: u64,
}

impl AtaDisk {
    /// The drive found by [`init`], or `None` if there is none.
    pub fn open() -> Option<Self> {
        is_present().then(|| AtaDisk { sectors: DISK_SECTOR_COUNT.load(Ordering::Relaxed) })
    }

    pub fn sectors(&self) -> u64 {
        self.sectors
    }

    fn check(&self, buf_len: usize, lba: u64, count: u32) -> Result<(), DiskError> {
        if buf_len < count as usize * BLOCK_SIZE {
            return Err(DiskError::ShortBuffer);
        }
        let end = lba.checked_add(count as u64).ok_or(DiskError::OutOfRange)?;
        if end > self.sectors || end > LBA28_LIMIT {
            return Err(DiskError::OutOfRange);
        }
        Ok(())
    }

    /// Select the drive and issue `command` for `count` sectors at `lba`.
    unsafe fn start(lba: u64, count: u32, command: u8) {
        unsafe {
            Port::<u8>::new(DRIVE_HEAD).write(0xE0 | (((lba >> 24) & 0x0F) as u8));
            io_delay();
            wait_not_busy();

            Port::<u8>::new(SECTOR_COUNT).write(count as u8);
            Port::<u8>::new(LBA_LO).write( (lba        & 0xFF) as u8);
            Port::<u8>::new(LBA_MID).write(((lba >> 8)  & 0xFF) as u8);
            Port::<u8>::new(LBA_HI).write( ((lba >> 16) & 0xFF) as u8);
            Port::<u8>::new(STATUS_CMD).write(command);
        }
    }
}

impl BlockDevice for AtaDisk {
    fn read_blocks(&mut self, buf: &mut [u8], lba: u64, count: u32) -> Result<(), DiskError> {
        self.check(buf.len(), lba, count)?;

        let mut data_port: Port<u16> = Port::new(DATA);
        let mut done = 0u32;
        while done < count {
            let batch = (count - done).min(ATA_MAX_SECTORS_PER_COMMAND);
            unsafe { Self::start(lba + done as u64, batch, CMD_READ_SECTORS) };

            for sector in done..done + batch {
                unsafe { wait_data_request()? };
                let offset = sector as usize * BLOCK_SIZE;
                for pair in buf[offset..offset + BLOCK_SIZE].chunks_exact_mut(2) {
                    let word = unsafe { data_port.read() };
                    pair.copy_from_slice(&word.to_le_bytes());
                }
            }
            done += batch;
        }
        Ok(())
    }

    fn write_blocks(&mut self, buf: &[u8], lba: u64, count: u32) -> Result<(), DiskError> {
        self.check(buf.len(), lba, count)?;

        let mut data_port: Port<u16> = Port::new(DATA);
        let mut done = 0u32;
        while done < count {
            let batch = (count - done).min(ATA_MAX_SECTORS_PER_COMMAND);
            unsafe { Self::start(lba + done as u64, batch, CMD_WRITE_SECTORS) };

            for sector in done..done + batch {
                unsafe { wait_data_request()? };
                let offset = sector as usize * BLOCK_SIZE;
                for pair in buf[offset..offset + BLOCK_SIZE].chunks_exact(2) {
                    unsafe { data_port.write(u16::from_le_bytes([pair[0], pair[1]])) };
                }
            }
            done += batch;
        }

        unsafe {
            Port::<u8>::new(STATUS_CMD).write(CMD_CACHE_FLUSH);
            if wait_not_busy() & ERR != 0 {
                return Err(DiskError::Fault);
            }
        }
        Ok(())
    }
}
