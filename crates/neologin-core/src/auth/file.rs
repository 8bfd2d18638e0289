use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Write `contents` to `path`, truncating any previous file.
///
/// On Unix the file ends up readable by the owner only. The open mode only
/// applies on create, so an existing regular file is chmodded to `0600`
/// before anything is written; that fails for a file owned by another user,
/// and the write is refused.
pub(crate) fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if file.metadata()?.is_file() {
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
    }
    file.write_all(contents.as_bytes())?;
    file.flush()
}

/// Remove `path`; a missing file is not an error.
pub(crate) fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
