//! The kernel's single mounted volume.

use core::fmt::Debug;

use fat32::FilesystemDriver;
use spin::Mutex;

use crate::drivers::disk::AtaDisk;

static FILESYSTEM: Mutex<Option<FilesystemDriver<AtaDisk>>> = Mutex::new(None);

/// Mount (formatting if needed) the drive found by `drivers::disk::init`.
/// Without a drive the filesystem syscalls report a device error.
pub fn init() {
    let Some(disk) = AtaDisk::open() else {
        log::warn!("filesystem::init: no disk, filesystem calls will fail");
        return;
    };
    log::info!("filesystem::init: mounting {} sectors", disk.sectors());

    match FilesystemDriver::mount(disk) {
        Ok(fs) => *FILESYSTEM.lock() = Some(fs),
        Err(e) => {
            log::error!("filesystem::init: {:?}", e);
            fatal("mount")
        }
    }
}

/// Run `f` against the mounted volume. `None` if nothing is mounted.
pub fn with<R>(f: impl FnOnce(&mut FilesystemDriver<AtaDisk>) -> R) -> Option<R> {
    FILESYSTEM.lock().as_mut().map(f)
}

/// A device fault under the driver leaves the volume in an unknown state.
pub fn fatal(during: impl Debug) -> ! {
    log::error!("filesystem: device error during {:?}, halting", during);
    crate::hlt_loop()
}
