//! The error taxonomy for the flashing core.
//!
//! No error is recovered locally: the first failure aborts the flow, scoped guards release
//! whatever they hold, and the error surfaces to the caller with enough context (path, offset) to
//! act on. There are no retries at this layer.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlashError {
    #[error("unable to open flash device file '{path}': {source}")]
    Open { path: String, source: io::Error },

    #[error("unable to acquire exclusive lock on '{path}'")]
    Locked { path: String },

    #[error("unable to close flash device file '{path}': {source}")]
    Close { path: String, source: io::Error },

    #[error("MEMGETINFO failed for '{path}', this may not be an MTD device: {source}")]
    Ioctl { path: String, source: io::Error },

    #[error("unable to mmap '{path}': {source}")]
    Map { path: String, source: io::Error },

    #[error("device file path '{path}' does not match required pattern '^/dev/mtd[0-9]+$'")]
    BadDevicePath { path: String },

    #[error("image size ({image_bytes}B) larger than flash device size ({device_bytes}B)")]
    ImageTooLarge { image_bytes: u64, device_bytes: u64 },

    #[error("invalid mtd device erasesize: 0")]
    InvalidErasesize,

    #[error("flash device erase failed at {at:#x}: {source}")]
    EraseFailed { at: u32, source: io::Error },

    #[error("flashing image onto flash device failed at {at:#x}: {source}")]
    WriteFailed { at: u32, source: io::Error },

    #[error("verification failed: flash and image data mismatch at {at:#x}")]
    VerifyFailed { at: u32 },
}
