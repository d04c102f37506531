//! Translation between the raw filesystem syscall and the driver.
//!
//! The kernel validates the user pointers and builds `buffer` from
//! `FsRequest::buf` and `FsRequest::buffer_size`; everything after that is
//! here so it can be tested against an in-memory disk.

use kernel_api_types::SysCallNumber;
use kernel_api_types::fs::{FsRequest, FsResult};

use crate::block::BlockDevice;
use crate::driver::{DriverRequest, FilesystemDriver};
use crate::error::FsError;

pub fn handle<D: BlockDevice>(
    fs: &mut FilesystemDriver<D>,
    call: SysCallNumber,
    request: &FsRequest,
    buffer: &mut [u8],
) -> FsResult {
    let name = request.short_name();
    let parent = request.parent_cluster_number;

    let outcome: Result<(), FsError> = match call {
        SysCallNumber::FsRead => fs.read(DriverRequest::new(name, parent, buffer)).map(|_| ()),
        SysCallNumber::FsReadDirectory => fs.read_directory(DriverRequest::new(name, parent, buffer)),
        SysCallNumber::FsWrite => fs.write(DriverRequest::new(name, parent, &*buffer)).map(|_| ()),
        SysCallNumber::FsDelete => fs.delete(DriverRequest::new(name, parent, ())),
    };

    match outcome {
        Ok(()) => FsResult::Ok,
        Err(e) => {
            log::debug!("fat32: {:?} {} in cluster {} -> {:?}", call, name, parent, e);
            e.into()
        }
    }
}
