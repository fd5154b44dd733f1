//! Atomic file copy implementation

use crate::types::SyncError;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Copy a file atomically using the write-then-rename strategy
///
/// 1. Create the destination's parent directories
/// 2. Stream into a hidden `.<name>.replisync.part` sibling
/// 3. Flush and sync to disk
/// 4. Preserve permissions and mtime from the source
/// 5. Rename over the final destination, replacing an empty directory there
///
/// # Returns
/// * `Ok(u64)` - Number of bytes copied
/// * `Err(SyncError::Read)` - The source vanished or could not be read
/// * `Err(SyncError::Write)` - The destination side failed
///
/// # Example
/// ```no_run
/// use replisync::executor::copy_file_atomic;
/// use std::path::Path;
///
/// let bytes = copy_file_atomic(Path::new("source.txt"), Path::new("dest.txt"))?;
/// # Ok::<(), replisync::types::SyncError>(())
/// ```
pub fn copy_file_atomic(src: &Path, dest: &Path) -> Result<u64, SyncError> {
    let mut src_file = File::open(src).map_err(|e| SyncError::read(src, e))?;
    let src_metadata = src_file.metadata().map_err(|e| SyncError::read(src, e))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::write(parent, e))?;
    }

    let part_path = part_path_for(dest);
    let result = write_part(&mut src_file, src, &src_metadata, &part_path)
        .and_then(|bytes| {
            clear_empty_dir(dest)?;
            fs::rename(&part_path, dest)
                .map(|_| bytes)
                .map_err(|e| SyncError::write(dest, e))
        });

    if result.is_err() {
        let _ = fs::remove_file(&part_path);
    }
    result
}

fn write_part(
    src_file: &mut File,
    src: &Path,
    src_metadata: &fs::Metadata,
    part_path: &Path,
) -> Result<u64, SyncError> {
    let mut part_file = File::create(part_path).map_err(|e| SyncError::write(part_path, e))?;

    let mut buffer = vec![0u8; 128 * 1024];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = src_file
            .read(&mut buffer)
            .map_err(|e| SyncError::read(src, e))?;

        if bytes_read == 0 {
            break;
        }

        part_file
            .write_all(&buffer[0..bytes_read])
            .map_err(|e| SyncError::write(part_path, e))?;
        total_bytes += bytes_read as u64;
    }

    part_file
        .sync_all()
        .map_err(|e| SyncError::write(part_path, e))?;

    // Drop the file handle before rename (required on Windows)
    drop(part_file);

    fs::set_permissions(part_path, src_metadata.permissions())
        .map_err(|e| SyncError::write(part_path, e))?;

    let mtime = src_metadata
        .modified()
        .map_err(|e| SyncError::read(src, e))?;
    filetime::set_file_mtime(part_path, filetime::FileTime::from_system_time(mtime))
        .map_err(|e| SyncError::write(part_path, e))?;

    Ok(total_bytes)
}

/// A directory left where a file now belongs blocks the rename; drop it if empty
fn clear_empty_dir(dest: &Path) -> Result<(), SyncError> {
    match fs::symlink_metadata(dest) {
        Ok(metadata) if metadata.is_dir() => {
            fs::remove_dir(dest).map_err(|e| SyncError::write(dest, e))
        }
        _ => Ok(()),
    }
}

/// Temporary sibling used while a copy is in flight
pub(crate) fn part_path_for(dest: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(dest.file_name().unwrap_or_default());
    name.push(".replisync.part");
    dest.with_file_name(name)
}
