//! Owner-only file helpers.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};

/// Creates `dir` and any missing parents. Newly created directories get `mode`;
/// existing ones are left untouched.
pub fn ensure_dir(dir: &Path, mode: u32) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(dir)
}

/// Writes `contents` to `path`, replacing any previous content, and forces the
/// permission bits to `mode` even when the file already existed.
pub fn write_with_mode(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(mode);

    let mut file = options.open(path)?;
    set_mode(path, mode)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Permission bits of `path`, or `None` if it does not exist.
#[cfg(unix)]
pub fn file_mode(path: &Path) -> io::Result<Option<u32>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.permissions().mode() & 0o777)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(not(unix))]
pub fn file_mode(path: &Path) -> io::Result<Option<u32>> {
    match fs::metadata(path) {
        Ok(meta) if meta.permissions().readonly() => Ok(Some(0o400)),
        Ok(_) => Ok(Some(0o600)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_write_tightens_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        fs::write(&path, b"old").unwrap();
        set_mode(&path, 0o644).unwrap();

        write_with_mode(&path, b"new", 0o600).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
        assert_eq!(file_mode(&path).unwrap(), Some(0o600));
    }

    #[test]
    fn test_missing_file_has_no_mode() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(file_mode(&dir.path().join("absent")).unwrap(), None);
    }

    #[test]
    fn test_ensure_dir_creates_private_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested, 0o700).unwrap();
        assert!(nested.is_dir());
        assert_eq!(file_mode(&nested).unwrap(), Some(0o700));
    }
}
