//! A `git`-shelling [`Downloader`]: clones a remote
//! import's URL into `modules_path/alias` if it isn't there yet, or pulls
//! it if it already is, then checks for a metadata file in the clone root.

use mcl_diagnostic::{Diagnostic, ErrorCode};
use mcl_scope::import::{Downloader, ImportData};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Name of the file every cloned module must carry at its root; its
/// absence after a clone/pull means the URL didn't point at a real module.
const METADATA_FILE: &str = "metadata.mcl";

pub struct GitDownloader;

impl GitDownloader {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<(), Diagnostic> {
        let output = Command::new("git").args(args).current_dir(dir).output().map_err(|e| {
            Diagnostic::new(ErrorCode::ImportInvalid, format!("failed to invoke git: {e}"), None)
        })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Diagnostic::new(
                ErrorCode::ImportInvalid,
                format!("git {args:?} failed: {}", String::from_utf8_lossy(&output.stderr)),
                None,
            ))
        }
    }
}

impl Downloader for GitDownloader {
    fn get(&self, data: &ImportData, modules_path: &Path) -> Result<(), Diagnostic> {
        let url = data.url.as_deref().ok_or_else(|| {
            Diagnostic::new(ErrorCode::ImportInvalid, format!("{} is not a remote import", data.path), None)
        })?;

        std::fs::create_dir_all(modules_path).map_err(|e| {
            Diagnostic::new(ErrorCode::ImportInvalid, format!("failed to create {modules_path:?}: {e}"), None)
        })?;

        let clone_dir: PathBuf = modules_path.join(&data.alias);
        if clone_dir.join(".git").exists() {
            self.run(&clone_dir, &["pull", "--ff-only"])?;
        } else {
            let clone_dir_str = clone_dir.to_string_lossy().into_owned();
            self.run(modules_path, &["clone", url, &clone_dir_str])?;
        }

        if !clone_dir.join(METADATA_FILE).exists() {
            return Err(Diagnostic::new(
                ErrorCode::ImportInvalid,
                format!("{url} has no {METADATA_FILE} at its root"),
                None,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcl_scope::import::parse_import_name;

    #[test]
    fn non_remote_import_is_rejected() {
        let data = parse_import_name("foo/bar").unwrap_or_else(|e| panic!("{e}"));
        let downloader = GitDownloader;
        let err = downloader.get(&data, Path::new("/tmp/mclc-modules")).expect_err("local import has no url");
        assert_eq!(err.code, ErrorCode::ImportInvalid);
    }
}
