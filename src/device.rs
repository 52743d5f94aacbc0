//! Scoped acquisition of the MTD character device file.
//!
//! Production wires [`OsDeviceOpener`] to the real `open(2)`/`flock(2)`/`ioctl(2)` syscalls.
//! Tests wire a fake (see `crate::fake`) that reproduces the same trait surface without a real
//! MTD node. This split is what lets the orchestrator in `flashcp.rs` stay generic: it never
//! calls into `nix` or `std::fs` directly.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::os::fd::{AsRawFd, FromRawFd, RawFd};

use nix::fcntl::{flock, open, FlockArg, OFlag};
use nix::sys::stat::Mode;

use crate::abi::{memerase, memgetinfo, EraseInfo, MtdInfo};

/// Distinguishes "couldn't open the file" from "opened it, but another holder has it locked";
/// the two outcomes the error taxonomy (`FlashError::Open` vs. `FlashError::Locked`) needs to
/// tell apart.
#[derive(Debug)]
pub enum OpenError {
    Open(io::Error),
    Locked,
}

/// The two ioctls the core needs. Kept separate from [`DeviceHandle`] so its signature reads as
/// "this thing can be probed and erased," independent of how it is opened, seeked, or closed.
pub trait Ioctl {
    fn get_info(&self) -> io::Result<MtdInfo>;
    fn erase(&self, info: &EraseInfo) -> io::Result<()>;
}

/// A scoped handle over an open MTD character device.
pub trait DeviceHandle: Ioctl {
    /// The path this handle was opened from (needed for error messages and for deriving the
    /// block-device path).
    fn path(&self) -> &str;

    /// Seek to the start of the device, ahead of a sequential write pass.
    fn seek_to_start(&mut self) -> io::Result<()>;

    /// Write one erase-block-sized (or shorter, for the final block) chunk. The device is opened
    /// with synchronous-write semantics, so this call does not return until the data has been
    /// committed.
    fn write_block(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Release the lock and close the descriptor. Idempotent.
    fn close(self) -> io::Result<()>;
}

/// Opens device files by path, producing a [`DeviceHandle`].
pub trait DeviceOpener {
    type Handle: DeviceHandle;

    fn open(&self, path: &str) -> Result<Self::Handle, OpenError>;
}

/// The real implementation: opens the path for read+write with `O_SYNC`, takes an advisory
/// exclusive `flock`, and issues real ioctls against the resulting descriptor.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsDeviceOpener;

impl DeviceOpener for OsDeviceOpener {
    type Handle = OsDeviceHandle;

    fn open(&self, path: &str) -> Result<Self::Handle, OpenError> {
        let fd = open(path, OFlag::O_RDWR | OFlag::O_SYNC, Mode::empty())
            .map_err(|errno| OpenError::Open(io::Error::from_raw_os_error(errno as i32)))?;

        // Safety: `fd` was just returned by `open` above and is not owned anywhere else yet.
        let file = unsafe { File::from_raw_fd(fd) };

        if let Err(errno) = flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
            return Err(match errno {
                nix::errno::Errno::EWOULDBLOCK => OpenError::Locked,
                other => OpenError::Open(io::Error::from_raw_os_error(other as i32)),
            });
        }

        Ok(OsDeviceHandle {
            file: Some(file),
            path: path.to_owned(),
        })
    }
}

/// Owns the open file for an open `/dev/mtdN`. The descriptor (and its lock) is released on
/// [`DeviceHandle::close`], and also on drop if `close` was never called, so an early `?` never
/// leaks the lock.
#[derive(Debug)]
pub struct OsDeviceHandle {
    file: Option<File>,
    path: String,
}

impl OsDeviceHandle {
    fn file(&self) -> &File {
        self.file.as_ref().expect("device handle used after close")
    }

    fn file_mut(&mut self) -> &mut File {
        self.file.as_mut().expect("device handle used after close")
    }
}

impl Ioctl for OsDeviceHandle {
    fn get_info(&self) -> io::Result<MtdInfo> {
        let mut info = MtdInfo::default();
        unsafe { memgetinfo(self.file().as_raw_fd(), &mut info) }
            .map_err(|errno| io::Error::from_raw_os_error(errno as i32))?;
        Ok(info)
    }

    fn erase(&self, info: &EraseInfo) -> io::Result<()> {
        unsafe { memerase(self.file().as_raw_fd(), info) }
            .map_err(|errno| io::Error::from_raw_os_error(errno as i32))?;
        Ok(())
    }
}

impl DeviceHandle for OsDeviceHandle {
    fn path(&self) -> &str {
        &self.path
    }

    fn seek_to_start(&mut self) -> io::Result<()> {
        self.file_mut().seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn write_block(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file_mut().write_all(buf)
    }

    fn close(mut self) -> io::Result<()> {
        self.close_inner()
    }
}

impl OsDeviceHandle {
    fn close_inner(&mut self) -> io::Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };

        let unlock_result = flock(file.as_raw_fd(), FlockArg::Unlock);
        drop(file);

        unlock_result.map_err(|errno| io::Error::from_raw_os_error(errno as i32))
    }
}

impl Drop for OsDeviceHandle {
    fn drop(&mut self) {
        let _ = self.close_inner();
    }
}

impl AsRawFd for OsDeviceHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.file().as_raw_fd()
    }
}
