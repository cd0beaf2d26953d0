//! `Fs`: a narrow filesystem capability covering the three
//! operations the pipeline actually needs — stat-ing a module path before
//! deciding whether to download it, reading a source file's text, and
//! listing a directory's entries for local import resolution. Kept opaque
//! behind a trait so an embedder (or a test) can substitute an in-memory
//! tree without touching disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FileKind {
    File,
    Dir,
}

pub trait Fs {
    fn stat(&self, path: &Path) -> io::Result<FileKind>;
    fn read_file(&self, path: &Path) -> io::Result<String>;
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// The real filesystem, via `std::fs`.
pub struct OsFs;

impl Fs for OsFs {
    fn stat(&self, path: &Path) -> io::Result<FileKind> {
        let meta = fs::metadata(path)?;
        Ok(if meta.is_dir() { FileKind::Dir } else { FileKind::File })
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(path)?.map(|entry| entry.map(|e| e.path())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_fs_reads_back_what_it_wrote() {
        let dir = std::env::temp_dir().join(format!("mclc-fs-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("setup failed: {e}"));
        let file = dir.join("a.mcl");
        fs::write(&file, "bind x = 1").unwrap_or_else(|e| panic!("setup failed: {e}"));

        let os_fs = OsFs;
        assert_eq!(os_fs.stat(&dir).unwrap_or_else(|e| panic!("{e}")), FileKind::Dir);
        assert_eq!(os_fs.stat(&file).unwrap_or_else(|e| panic!("{e}")), FileKind::File);
        assert_eq!(os_fs.read_file(&file).unwrap_or_else(|e| panic!("{e}")), "bind x = 1");
        let entries = os_fs.read_dir(&dir).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(entries, vec![file]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_path_is_an_io_error() {
        let os_fs = OsFs;
        assert!(os_fs.stat(Path::new("/nonexistent/mclc-fs-probe")).is_err());
    }
}
