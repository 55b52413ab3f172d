//! Zip fallback for packages whose direct upload failed.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::TransferError;

/// Wraps the file at `path` in a zip archive at `{path}.zip`.
///
/// The archive holds a single Stored entry carrying the original file's
/// bytes under its base name. The source file is left in place; removing it
/// is the caller's concern. Blocking; call through `spawn_blocking` from
/// async contexts.
pub fn zip_file(path: &Path) -> Result<PathBuf, TransferError> {
    let entry_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            TransferError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not an archivable file name: {}", path.display()),
            ))
        })?;

    let zip_path = PathBuf::from(format!("{}.zip", path.display()));
    let mut writer = ZipWriter::new(File::create(&zip_path)?);
    writer.start_file(
        entry_name,
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
    )?;

    let mut source = File::open(path)?;
    io::copy(&mut source, &mut writer)?;
    writer.finish()?;

    info!(archive = %zip_path.display(), "wrapped file for fallback upload");
    Ok(zip_path)
}
