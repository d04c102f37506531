#![cfg_attr(not(test), no_std)]

pub mod consts;
pub mod drivers;
pub mod filesystem;
pub mod logger;
pub mod syscall_handlers;

/// Bring up the serial log, probe the disk, mount the volume and install the
/// syscall table. Everything after this runs through `syscall_handlers::dispatch_syscall`.
pub fn init() {
    if logger::init().is_err() {
        // A logger is already installed; keep using it.
        log::warn!("logger already initialized");
    }
    log::info!("kernel v{}", project_version());

    drivers::disk::init();
    filesystem::init();
    syscall_handlers::init();
}

pub fn project_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn hlt_loop() -> ! {
    loop {
        x86_64::instructions::hlt();
    }
}
