//! Single-file move and copy primitives shared by quarantine and restore.

use std::fs;
use std::io;
use std::path::Path;

use filetime::FileTime;

/// Move `from` to `to`, falling back to copy + remove across devices.
///
/// On fallback failure neither a partial destination nor a second copy is
/// left behind: the source is only removed after the copy succeeded, and the
/// copy is discarded if the source cannot be removed.
pub(crate) fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!(
                "Cross-device move, copying {} -> {}",
                from.display(),
                to.display()
            );
            copy_preserving_mtime(from, to)?;
            if let Err(remove_err) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(remove_err);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Copy `from` to `to` and carry the modification time over.
///
/// A destination created by this call is removed again if the copy fails.
pub(crate) fn copy_preserving_mtime(from: &Path, to: &Path) -> io::Result<u64> {
    let existed = to.symlink_metadata().is_ok();
    let result = fs::copy(from, to).and_then(|bytes| {
        let metadata = fs::metadata(from)?;
        filetime::set_file_mtime(to, FileTime::from_last_modification_time(&metadata))?;
        Ok(bytes)
    });
    if result.is_err() && !existed {
        let _ = fs::remove_file(to);
    }
    result
}

/// Create the parent directory of `path` if it has one.
pub(crate) fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
