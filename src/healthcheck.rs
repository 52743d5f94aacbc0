//! Sanity checks run once the image is mapped and the device has been re-opened, before any
//! erase/write touches the flash.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::FlashError;

const MTD_FILE_PATTERN: &str = r"^/dev/mtd[0-9]+$";

fn mtd_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MTD_FILE_PATTERN).expect("pattern is a valid regex"))
}

/// Does `path` match `^/dev/mtd[0-9]+$`? No writes, no seeks (this is a pure string check).
pub fn is_mtd_char_device_path(path: &str) -> bool {
    mtd_file_regex().is_match(path)
}

/// Reject any path that doesn't match `^/dev/mtd[0-9]+$`. Run before the device is ever opened,
/// so a bad path never costs a single ioctl.
pub fn validate_device_path(path: &str) -> Result<(), FlashError> {
    if !is_mtd_char_device_path(path) {
        return Err(FlashError::BadDevicePath {
            path: path.to_owned(),
        });
    }
    Ok(())
}

/// Reject an image that doesn't fit the device. Run after the probe, once `device_size` is
/// known.
pub fn validate_image_size(image_len: u64, device_size: u64) -> Result<(), FlashError> {
    if image_len > device_size {
        return Err(FlashError::ImageTooLarge {
            image_bytes: image_len,
            device_bytes: device_size,
        });
    }
    Ok(())
}

/// Runs both checks in sequence; kept for callers (and tests) that don't care about the two
/// checks' different timing relative to the probe ioctl.
pub fn healthcheck(path: &str, image_len: u64, device_size: u64) -> Result<(), FlashError> {
    validate_device_path(path)?;
    validate_image_size(image_len, device_size)?;
    Ok(())
}
