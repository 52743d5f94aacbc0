//! Streams the image to the character device in erase-block-sized chunks from offset zero.

use crate::device::DeviceHandle;
use crate::erase::num_blocks;
use crate::error::FlashError;

/// Write `image` to `device`, `erasesize` bytes at a time (the last chunk may be shorter). The
/// device is seeked to offset zero first; synchronous-write semantics on the handle mean each
/// chunk is committed before the next is sent.
pub fn write<D: DeviceHandle>(
    device: &mut D,
    erasesize: u32,
    image: &[u8],
) -> Result<(), FlashError> {
    let image_len = image.len() as u64;
    let blocks = num_blocks(image_len, erasesize);

    device
        .seek_to_start()
        .map_err(|source| FlashError::WriteFailed { at: 0, source })?;

    let rpt = howudoin::new()
        .label("Writing image")
        .set_len(u64::from(blocks));

    for i in 0..blocks {
        let block_addr = i * erasesize;
        let end_addr = std::cmp::min(block_addr as u64 + erasesize as u64, image_len) as u32;
        let chunk = &image[block_addr as usize..end_addr as usize];

        device
            .write_block(chunk)
            .map_err(|source| FlashError::WriteFailed {
                at: block_addr,
                source,
            })?;
        rpt.inc();
    }

    rpt.close();
    Ok(())
}
