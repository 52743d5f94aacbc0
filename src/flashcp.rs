//! Composes [`crate::healthcheck`], [`crate::erase`], [`crate::write`], and [`crate::verify`]
//! into the fixed sequence:
//!
//! validate path → open (probe) → `MEMGETINFO` → close → map image → open → validate size →
//! erase → write → close → verify → unmap.
//!
//! The device path is checked before the device is ever opened, so a bad path never costs a
//! single ioctl; the image-size check waits until the probe has reported the device's capacity.
//! The double-open exists because probing wants the chip geometry before the image is mapped,
//! while verification requires the character device to be closed before the block device is
//! read. Every acquisition here (descriptor, lock, mapping) is scoped to this function and
//! released on every exit path, success or failure.

use crate::abi::MtdInfo;
use crate::device::{DeviceHandle, DeviceOpener, Ioctl, OpenError, OsDeviceOpener};
use crate::error::FlashError;
use crate::healthcheck::{validate_device_path, validate_image_size};
use crate::image::{FileMapper, MmapFileMapper};
use crate::{erase, verify, write};

fn open_device<O: DeviceOpener>(opener: &O, path: &str) -> Result<O::Handle, FlashError> {
    opener.open(path).map_err(|err| match err {
        OpenError::Open(source) => FlashError::Open {
            path: path.to_owned(),
            source,
        },
        OpenError::Locked => FlashError::Locked {
            path: path.to_owned(),
        },
    })
}

fn close_device<H: DeviceHandle>(handle: H) -> Result<(), FlashError> {
    let path = handle.path().to_owned();
    handle
        .close()
        .map_err(|source| FlashError::Close { path, source })
}

fn probe<H: Ioctl>(handle: &H, path: &str) -> Result<MtdInfo, FlashError> {
    handle.get_info().map_err(|source| FlashError::Ioctl {
        path: path.to_owned(),
        source,
    })
}

/// Copy `image_path` onto the MTD character device at `device_path`, erasing and verifying it
/// along the way.
pub fn flashcp(image_path: &str, device_path: &str) -> Result<(), FlashError> {
    flashcp_with(&OsDeviceOpener, &MmapFileMapper, image_path, device_path)
}

/// Same as [`flashcp`], generic over the device-opening and file-mapping capabilities so that
/// tests can substitute `crate::fake::FakeChip` for the real OS.
pub fn flashcp_with<O, M>(
    opener: &O,
    mapper: &M,
    image_path: &str,
    device_path: &str,
) -> Result<(), FlashError>
where
    O: DeviceOpener,
    M: FileMapper,
{
    // 0: reject a malformed path before it costs a single open or ioctl.
    validate_device_path(device_path)?;

    // 1-2: open solely to probe the chip geometry, then close.
    let probe_handle = open_device(opener, device_path)?;
    let info = probe(&probe_handle, device_path)?;
    close_device(probe_handle)?;

    // 3: map the image; it stays mapped across erase, write, and verify.
    let image_mapping = mapper
        .map_whole(image_path)
        .map_err(|source| FlashError::Map {
            path: image_path.to_owned(),
            source,
        })?;
    let image: &[u8] = image_mapping.as_ref();

    // 4-5: open again, then check the image fits before touching the flash.
    let mut device = open_device(opener, device_path)?;
    validate_image_size(image.len() as u64, u64::from(info.size))?;

    // 6-7: erase, then write.
    erase::erase(&device, info.erasesize, image.len() as u64)?;
    write::write(&mut device, info.erasesize, image)?;

    // 8: close before verify is attempted.
    close_device(device)?;

    // 9: verify via the block device.
    verify::verify(mapper, device_path, info.erasesize, image)?;

    // 10: `image_mapping` unmaps on drop, whichever branch above returned.
    Ok(())
}
