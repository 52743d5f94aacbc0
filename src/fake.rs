//! An in-memory fake MTD chip, standing in for `crate::device`/`crate::image`'s real OS
//! implementations in tests.
//!
//! This plays the same role `crate::nand::SimNand` plays for the NAND/UBI code elsewhere in this
//! codebase: production logic is generic over the `DeviceOpener`/`DeviceHandle`/`Ioctl`/
//! `FileMapper` traits, and this module is the test-only wiring that lets the whole `flashcp`
//! flow run against a simulated chip with no root privileges and no real `/dev/mtdN` node.
//!
//! The fake models the character/block device duality explicitly: erases and writes mutate a
//! single backing buffer, but reads (`FileMapper::map_prefix`, used only by the verifier) refuse
//! to proceed while a character-device handle is still open, the same invariant the real kernel
//! interface subtly depends on.

#![cfg(test)]

use std::io;
use std::sync::{Arc, Mutex};

use crate::abi::{EraseInfo, MtdInfo};
use crate::device::{DeviceHandle, DeviceOpener, Ioctl, OpenError};
use crate::image::FileMapper;

struct State {
    size: u64,
    erasesize: u32,
    flash: Vec<u8>,
    char_open: bool,
    get_info_calls: u32,
    erase_starts: Vec<u32>,
    writes: Vec<(u32, Vec<u8>)>,
    fail_erase_at: Option<u32>,
    /// (offset, replacement byte), applied once, right after the write that covers `offset`
    /// completes. Simulates the flash lying about what it actually stored.
    corrupt_on_write: Option<(usize, u8)>,
}

/// A cloneable handle to a simulated MTD chip of `size` bytes with `erasesize`-byte erase blocks.
#[derive(Clone)]
pub struct FakeChip(Arc<Mutex<State>>);

impl FakeChip {
    pub fn new(size: u64, erasesize: u32) -> Self {
        FakeChip(Arc::new(Mutex::new(State {
            size,
            erasesize,
            flash: vec![0xFFu8; size as usize],
            char_open: false,
            get_info_calls: 0,
            erase_starts: Vec::new(),
            writes: Vec::new(),
            fail_erase_at: None,
            corrupt_on_write: None,
        })))
    }

    /// Open the character device directly, bypassing `DeviceOpener::open`'s `Result`. Convenience
    /// for unit tests that don't care about the locked/unlocked case.
    pub fn open_char(&self) -> FakeDeviceHandle {
        DeviceOpener::open(self, "/dev/mtd0").expect("chip not already open in this test")
    }

    pub fn fail_erase_at(&self, start: u32) {
        self.0.lock().unwrap().fail_erase_at = Some(start);
    }

    pub fn corrupt_byte_on_write(&self, offset: usize, value: u8) {
        self.0.lock().unwrap().corrupt_on_write = Some((offset, value));
    }

    pub fn erase_starts(&self) -> Vec<u32> {
        self.0.lock().unwrap().erase_starts.clone()
    }

    pub fn writes(&self) -> Vec<(u32, Vec<u8>)> {
        self.0.lock().unwrap().writes.clone()
    }

    pub fn get_info_calls(&self) -> u32 {
        self.0.lock().unwrap().get_info_calls
    }

    /// Snapshot of the block-device-visible flash contents, for assertions.
    pub fn flash_contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().flash.clone()
    }

    pub fn is_char_open(&self) -> bool {
        self.0.lock().unwrap().char_open
    }
}

impl DeviceOpener for FakeChip {
    type Handle = FakeDeviceHandle;

    fn open(&self, path: &str) -> Result<FakeDeviceHandle, OpenError> {
        let mut state = self.0.lock().unwrap();
        if state.char_open {
            return Err(OpenError::Locked);
        }
        state.char_open = true;
        drop(state);

        Ok(FakeDeviceHandle {
            chip: self.clone(),
            path: path.to_owned(),
            cursor: 0,
            closed: false,
        })
    }
}

impl FileMapper for FakeChip {
    type Mapping = Vec<u8>;

    /// Images are real files on disk in tests; only the derived block-device path is served from
    /// the simulated chip.
    fn map_whole(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn map_prefix(&self, _path: &str, len: usize) -> io::Result<Vec<u8>> {
        let state = self.0.lock().unwrap();
        if state.char_open {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "character device still open during block-device read",
            ));
        }
        let mut data = state.flash.clone();
        data.resize(len, 0xFF);
        Ok(data)
    }
}

/// A handle into a [`FakeChip`], implementing the same trait surface as
/// `crate::device::OsDeviceHandle`.
pub struct FakeDeviceHandle {
    chip: FakeChip,
    path: String,
    cursor: u64,
    closed: bool,
}

impl Ioctl for FakeDeviceHandle {
    fn get_info(&self) -> io::Result<MtdInfo> {
        let mut state = self.chip.0.lock().unwrap();
        state.get_info_calls += 1;
        Ok(MtdInfo {
            size: state.size as u32,
            erasesize: state.erasesize,
            ..MtdInfo::default()
        })
    }

    fn erase(&self, info: &EraseInfo) -> io::Result<()> {
        let mut state = self.chip.0.lock().unwrap();
        state.erase_starts.push(info.start);

        if state.fail_erase_at == Some(info.start) {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated erase failure"));
        }

        let start = info.start as usize;
        let end = std::cmp::min(start + info.length as usize, state.flash.len());
        state.flash[start..end].fill(0xFF);
        Ok(())
    }
}

impl DeviceHandle for FakeDeviceHandle {
    fn path(&self) -> &str {
        &self.path
    }

    fn seek_to_start(&mut self) -> io::Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn write_block(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut state = self.chip.0.lock().unwrap();
        let start = self.cursor as usize;
        let end = start + buf.len();

        state.writes.push((start as u32, buf.to_vec()));
        if end > state.flash.len() {
            state.flash.resize(end, 0xFF);
        }
        state.flash[start..end].copy_from_slice(buf);

        if let Some((offset, value)) = state.corrupt_on_write {
            if (start..end).contains(&offset) {
                state.flash[offset] = value;
                state.corrupt_on_write = None;
            }
        }

        self.cursor = end as u64;
        Ok(())
    }

    fn close(mut self) -> io::Result<()> {
        self.closed = true;
        self.chip.0.lock().unwrap().char_open = false;
        Ok(())
    }
}

impl Drop for FakeDeviceHandle {
    fn drop(&mut self) {
        if !self.closed {
            self.chip.0.lock().unwrap().char_open = false;
        }
    }
}
