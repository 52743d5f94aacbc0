//! Read-only, shared memory-mapping of the image file and (for verification) the sibling block
//! device.
//!
//! The returned mapping is an immutable, random-access byte slice; dropping it guarantees the
//! unmap. The core never copies the image into a heap buffer; it streams straight through the
//! mapping, so peak extra memory is O(1) on top of the two mappings (image + block device).

use std::fs::File;
use std::io;

use memmap2::{Mmap, MmapOptions};

/// Maps files into immutable byte slices. Production maps real files with `mmap(2)`; tests map a
/// fake chip's in-memory contents instead (see `crate::fake`).
pub trait FileMapper {
    type Mapping: AsRef<[u8]>;

    /// Map the whole file read-only, shared.
    fn map_whole(&self, path: &str) -> io::Result<Self::Mapping>;

    /// Map exactly the first `len` bytes of the file read-only, shared.
    fn map_prefix(&self, path: &str, len: usize) -> io::Result<Self::Mapping>;
}

/// The real implementation, backed by `memmap2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MmapFileMapper;

impl FileMapper for MmapFileMapper {
    type Mapping = Mmap;

    fn map_whole(&self, path: &str) -> io::Result<Mmap> {
        let file = File::open(path)?;
        // Safety: the mapping is read-only and the file is not modified by this process while it
        // is live; concurrent external modification is the same hazard mmap(2) always carries.
        unsafe { MmapOptions::new().map(&file) }
    }

    fn map_prefix(&self, path: &str, len: usize) -> io::Result<Mmap> {
        let file = File::open(path)?;
        unsafe { MmapOptions::new().len(len).map(&file) }
    }
}
