//! `flashcp`-style erase/write/verify for Linux MTD character devices.
//!
//! The core is split so each concern can be tested without root or a real `/dev/mtdN` node:
//! [`abi`] mirrors the kernel ioctl ABI, [`device`] and [`image`] are the capability traits
//! production and tests wire differently, and [`healthcheck`]/[`erase`]/[`write`]/[`verify`] are
//! the four steps [`flashcp::flashcp`] composes into the full flow.

pub mod abi;
pub mod device;
pub mod erase;
pub mod error;
pub mod flashcp;
pub mod healthcheck;
pub mod image;
pub mod verify;
pub mod write;

#[cfg(test)]
mod fake;

pub use error::FlashError;
pub use flashcp::{flashcp, flashcp_with};
