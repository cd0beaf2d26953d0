//! Import name classification and the `Downloader` module-loader
//! collaborator.

use std::path::Path;
use std::time::Duration;

/// One classified `import "..."` directive.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportData {
    pub alias: String,
    pub is_system: bool,
    pub is_local: bool,
    pub is_file: bool,
    pub path: String,
    pub url: Option<String>,
}

/// Classifies raw import text per the module identifier grammar. Returns
/// the human-readable reason as a plain `String`; callers
/// (`set_scope`) wrap it into an `ImportInvalid` [`mcl_diagnostic::Diagnostic`]
/// with the statement's span attached.
pub fn parse_import_name(raw: &str) -> Result<ImportData, String> {
    if raw.is_empty() {
        return Err("import path must not be empty".to_string());
    }
    if raw.starts_with('/') {
        return Err(format!("absolute import path {raw:?} is invalid"));
    }
    if let Some(scheme_end) = raw.find("://") {
        let scheme = &raw[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
            return Err(format!("malformed scheme in import {raw:?}"));
        }
        let rest = &raw[scheme_end + 3..];
        if rest.starts_with('/') {
            return Err(format!("triple-slash root import {raw:?} is invalid"));
        }
        let trimmed = rest.trim_end_matches('/');
        let last_seg = trimmed.rsplit('/').next().unwrap_or(trimmed);
        let alias = derive_remote_alias(last_seg)?;
        return Ok(ImportData {
            alias,
            is_system: false,
            is_local: false,
            is_file: false,
            path: trimmed.to_string(),
            url: Some(raw.to_string()),
        });
    }

    if let Some(dir) = raw.strip_suffix('/') {
        let last_seg = dir.rsplit('/').next().unwrap_or(dir);
        if last_seg.is_empty() {
            return Err(format!("import {raw:?} has no directory name"));
        }
        return Ok(ImportData {
            alias: last_seg.to_string(),
            is_system: false,
            is_local: true,
            is_file: false,
            path: raw.to_string(),
            url: None,
        });
    }

    if let Some(stem) = raw.strip_suffix(".mcl") {
        let last_seg = stem.rsplit('/').next().unwrap_or(stem);
        if last_seg.is_empty() {
            return Err(format!("import {raw:?} has no file name"));
        }
        return Ok(ImportData {
            alias: last_seg.to_string(),
            is_system: false,
            is_local: true,
            is_file: true,
            path: raw.to_string(),
            url: None,
        });
    }

    // Bare `foo` or `foo/bar`: a system import, valid even when not
    // locally installed.
    let last_seg = raw.rsplit('/').next().unwrap_or(raw);
    if last_seg.is_empty() {
        return Err(format!("import {raw:?} has no trailing name"));
    }
    Ok(ImportData {
        alias: last_seg.to_string(),
        is_system: true,
        is_local: false,
        is_file: false,
        path: raw.to_string(),
        url: None,
    })
}

/// Derives a remote import's alias from its last path segment: strips a
/// leading `mgmt-` prefix, lowercases, and maps hyphens to underscores. A
/// result ending in `-`/`_` (after that mapping, so a *source* trailing
/// hyphen too) is invalid.
fn derive_remote_alias(segment: &str) -> Result<String, String> {
    if segment.is_empty() {
        return Err("remote import has no path segment to derive an alias from".to_string());
    }
    let stripped = segment.strip_prefix("mgmt-").unwrap_or(segment);
    let lower = stripped.to_lowercase().replace('-', "_");
    if lower.is_empty() || lower.ends_with('_') {
        return Err(format!("derived alias {lower:?} is invalid"));
    }
    Ok(lower)
}

/// The external module downloader: given a classified
/// remote [`ImportData`] and the absolute modules directory, clones or
/// pulls the referenced repository. Implementations must refuse
/// non-remote records, create the target directory if missing, clone (or
/// pull if already present), and verify a metadata file exists in the
/// clone root.
pub trait Downloader {
    fn get(&self, data: &ImportData, modules_path: &Path) -> Result<(), mcl_diagnostic::Diagnostic>;
}

/// Drives a [`Downloader`] with retry/backoff: retries up to `Retry`
/// times, with a configurable backoff separating attempts. Returns the
/// last error if every attempt fails.
pub fn fetch_with_retry(
    downloader: &dyn Downloader,
    data: &ImportData,
    modules_path: &Path,
    retry: u32,
    backoff: Duration,
) -> Result<(), mcl_diagnostic::Diagnostic> {
    let mut last_err = None;
    for attempt in 0..=retry {
        match downloader.get(data, modules_path) {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::debug!(attempt, error = %e, "module fetch attempt failed");
                last_err = Some(e);
                if attempt < retry && !backoff.is_zero() {
                    std::thread::sleep(backoff);
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        mcl_diagnostic::Diagnostic::new(
            mcl_diagnostic::ErrorCode::ImportInvalid,
            "no download attempt was made",
            None,
        )
    }))
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn url_like_import_is_remote() {
        let data = parse_import_name("git://example.com/mgmt-Foo-Bar").unwrap();
        assert!(!data.is_system);
        assert!(!data.is_local);
        assert_eq!(data.alias, "foo_bar");
        assert_eq!(data.url.as_deref(), Some("git://example.com/mgmt-Foo-Bar"));
    }

    #[test]
    fn triple_slash_root_is_invalid() {
        assert!(parse_import_name("git:////root").is_err());
    }

    #[test]
    fn absolute_path_is_invalid() {
        assert!(parse_import_name("/etc/foo").is_err());
    }

    #[test]
    fn relative_directory_import() {
        let data = parse_import_name("foo/").unwrap();
        assert!(data.is_local);
        assert!(!data.is_file);
        assert_eq!(data.alias, "foo");
    }

    #[test]
    fn file_import() {
        let data = parse_import_name("dir/foo.mcl").unwrap();
        assert!(data.is_local);
        assert!(data.is_file);
        assert_eq!(data.alias, "foo");
    }

    #[test]
    fn bare_name_is_system_import() {
        let data = parse_import_name("foo/bar").unwrap();
        assert!(data.is_system);
        assert_eq!(data.alias, "bar");
    }

    #[test]
    fn alias_with_trailing_hyphen_is_invalid() {
        assert!(parse_import_name("git://example.com/foo-").is_err());
    }

    struct FlakyDownloader {
        failures_left: Cell<u32>,
    }

    impl Downloader for FlakyDownloader {
        fn get(&self, _data: &ImportData, _modules_path: &Path) -> Result<(), mcl_diagnostic::Diagnostic> {
            let left = self.failures_left.get();
            if left > 0 {
                self.failures_left.set(left - 1);
                return Err(mcl_diagnostic::Diagnostic::new(
                    mcl_diagnostic::ErrorCode::ImportInvalid,
                    "transient failure",
                    None,
                ));
            }
            Ok(())
        }
    }

    #[test]
    fn fetch_with_retry_succeeds_after_transient_failures() {
        let downloader = FlakyDownloader { failures_left: Cell::new(2) };
        let data = parse_import_name("foo/bar").unwrap();
        let result = fetch_with_retry(&downloader, &data, Path::new("/tmp/modules"), 3, Duration::ZERO);
        assert!(result.is_ok());
    }

    #[test]
    fn fetch_with_retry_exhausts_attempts() {
        let downloader = FlakyDownloader { failures_left: Cell::new(10) };
        let data = parse_import_name("foo/bar").unwrap();
        let result = fetch_with_retry(&downloader, &data, Path::new("/tmp/modules"), 1, Duration::ZERO);
        assert!(result.is_err());
    }
}
