//! Re-opens the medium via the block device and compares it against the image, per block.
//!
//! Precondition (enforced by the orchestrator, not here): the character-device handle has
//! already been closed. Keeping it open while reading back through the block device can hide
//! zero→one transitions on erased pages, producing a false verification pass.

use crate::erase::num_blocks;
use crate::error::FlashError;
use crate::image::FileMapper;

/// Derive `/dev/mtdblockN` from `/dev/mtdN` by inserting `block` after `mtd`. Purely textual; the
/// healthcheck's regex already guarantees the input has this shape.
pub fn block_device_path(char_device_path: &str) -> String {
    char_device_path.replacen("/mtd", "/mtdblock", 1)
}

/// Map the first `image.len()` bytes of the block device and compare it against `image`,
/// block-by-block, stopping at the first mismatch.
pub fn verify<M: FileMapper>(
    mapper: &M,
    char_device_path: &str,
    erasesize: u32,
    image: &[u8],
) -> Result<(), FlashError> {
    let image_len = image.len() as u64;
    let blocks = num_blocks(image_len, erasesize);

    let block_path = block_device_path(char_device_path);
    let flash = mapper
        .map_prefix(&block_path, image.len())
        .map_err(|source| FlashError::Map {
            path: block_path.clone(),
            source,
        })?;
    let flash = flash.as_ref();

    let rpt = howudoin::new()
        .label("Verifying flash device")
        .set_len(u64::from(blocks));

    for i in 0..blocks {
        let block_addr = i * erasesize;
        let end_addr = std::cmp::min(block_addr as u64 + erasesize as u64, image_len) as u32;
        let (lo, hi) = (block_addr as usize, end_addr as usize);

        if image[lo..hi] != flash[lo..hi] {
            return Err(FlashError::VerifyFailed { at: block_addr });
        }
        rpt.inc();
    }

    rpt.close();
    Ok(())
}
