//! Binary layout of the Linux MTD ioctl ABI.
//!
//! See `linux/include/uapi/mtd/mtd-abi.h`. Field order and integer widths below must match the
//! kernel exactly; the `const _: () = assert!(...)` checks below catch an accidental layout
//! change at compile time rather than at `ioctl()` time.

use std::mem::size_of;

use nix::{ioctl_read, ioctl_write_ptr};

const MTD_IOC_MAGIC: u8 = b'M';

/// Mirrors the kernel's `mtd_info_user`. Populated once per run via `MEMGETINFO`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct MtdInfo {
    pub r#type: u8,
    pub flags: u32,
    pub size: u32,
    pub erasesize: u32,
    pub writesize: u32,
    pub oobsize: u32,
    /// Legacy field, unused by any caller in this crate.
    pub padding: u64,
}

const _: () = assert!(size_of::<MtdInfo>() == 32);

/// Mirrors the kernel's `erase_info_user`. A `MEMERASE` request body.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct EraseInfo {
    pub start: u32,
    pub length: u32,
}

const _: () = assert!(size_of::<EraseInfo>() == 8);

// `_IOR('M', 1, sizeof(mtd_info_user))` and `_IOW('M', 2, sizeof(erase_info_user))`.
ioctl_read!(memgetinfo, MTD_IOC_MAGIC, 1, MtdInfo);
ioctl_write_ptr!(memerase, MTD_IOC_MAGIC, 2, EraseInfo);
