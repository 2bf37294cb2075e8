//! Committing captured PNG bytes to disk

use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Read the pixel dimensions from a PNG header.
pub fn png_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = png::Decoder::new(bytes)
        .read_info()
        .map_err(|e| Error::CaptureError(format!("captured image is not a valid PNG: {}", e)))?;
    let info = reader.info();
    Ok((info.width, info.height))
}

/// Write `bytes` to `destination` atomically.
///
/// The data goes to a temporary file next to the destination and is renamed
/// over it once flushed, so `destination` holds either the previous content
/// or the complete new image. Missing parent directories are created.
pub fn commit_png(destination: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| Error::write(destination, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".iconshot-")
        .suffix(".part")
        .tempfile_in(&parent)
        .map_err(|e| Error::write(destination, e))?;
    tmp.write_all(bytes).map_err(|e| Error::write(destination, e))?;
    tmp.as_file().sync_all().map_err(|e| Error::write(destination, e))?;
    tmp.persist(destination)
        .map_err(|e| Error::write(destination, e.error))?;
    Ok(())
}
