//! Erases the minimal whole-erase-block-aligned region covering the image.

use crate::device::Ioctl;
use crate::abi::EraseInfo;
use crate::error::FlashError;

/// Number of erase blocks needed to cover `image_len` bytes of `erasesize`-byte blocks.
pub fn num_blocks(image_len: u64, erasesize: u32) -> u32 {
    let erasesize = erasesize as u64;
    ((image_len + erasesize - 1) / erasesize) as u32
}

/// Erase every block from the start of the device up to (and including) the last block the image
/// needs. An empty image erases zero blocks (this is intentional, not an oversight).
pub fn erase<D: Ioctl>(device: &D, erasesize: u32, image_len: u64) -> Result<(), FlashError> {
    if erasesize == 0 {
        return Err(FlashError::InvalidErasesize);
    }

    let blocks = num_blocks(image_len, erasesize);

    let rpt = howudoin::new()
        .label("Erasing flash device")
        .set_len(u64::from(blocks));

    let mut info = EraseInfo {
        start: 0,
        length: erasesize,
    };
    for _ in 0..blocks {
        device
            .erase(&info)
            .map_err(|source| FlashError::EraseFailed {
                at: info.start,
                source,
            })?;
        rpt.inc();
        info.start += erasesize;
    }

    rpt.close();
    Ok(())
}
