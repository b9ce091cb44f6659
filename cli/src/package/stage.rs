//! Staging an application into its scratch directory

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};
use zip::ZipArchive;

use crate::errors::CliError;

/// Extensions recognised as pre-built application archives
pub const ARCHIVE_EXTENSIONS: &[&str] = &["war", "zip", "jar"];

/// Extensions looked for inside an application directory, in priority order
const BUNDLED_ARCHIVE_EXTENSIONS: &[&str] = &["war", "zip"];

/// Where the application bits come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppSource {
    /// A plain directory tree
    Directory(PathBuf),

    /// A pre-built archive that is exploded before fingerprinting
    Archive(PathBuf),
}

fn has_archive_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Decide how to stage `path`.
///
/// A file must be a recognised archive. A directory holding a `*.war` (or,
/// failing that, a `*.zip`) at its top level is deployed from that archive.
pub fn detect_source(path: &Path) -> Result<AppSource, CliError> {
    let metadata = fs::metadata(path).map_err(|_| {
        CliError::NotFound(format!("Application path {}", path.display()))
    })?;

    if metadata.is_file() {
        if has_archive_extension(path, ARCHIVE_EXTENSIONS) {
            return Ok(AppSource::Archive(path.to_path_buf()));
        }
        return Err(CliError::PackageError(format!(
            "{} is neither a directory nor a recognised archive",
            path.display()
        )));
    }

    let mut top_level: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .collect();
    top_level.sort();

    for ext in BUNDLED_ARCHIVE_EXTENSIONS {
        if let Some(found) = top_level
            .iter()
            .find(|p| has_archive_extension(p, std::slice::from_ref(ext)))
        {
            return Ok(AppSource::Archive(found.clone()));
        }
    }

    Ok(AppSource::Directory(path.to_path_buf()))
}

/// Stage the application at `path` into `scratch`
pub fn stage_application(path: &Path, scratch: &Path) -> Result<AppSource, CliError> {
    let source = detect_source(path)?;
    match &source {
        AppSource::Archive(archive) => {
            info!("Exploding {} into {}", archive.display(), scratch.display());
            explode_archive(archive, scratch)?;
        }
        AppSource::Directory(dir) => {
            check_unreachable_links(dir)?;
            info!("Copying {} into {}", dir.display(), scratch.display());
            copy_tree(dir, scratch)?;
        }
    }
    Ok(source)
}

/// Extract a zip-compatible archive into `dest`
pub fn explode_archive(archive: &Path, dest: &Path) -> Result<(), CliError> {
    let file = fs::File::open(archive)?;
    let mut zip = ZipArchive::new(file)?;
    zip.extract(dest)?;
    debug!("Exploded {} entries from {}", zip.len(), archive.display());
    Ok(())
}

fn is_top_level_git(entry: &DirEntry) -> bool {
    entry.depth() == 1 && entry.file_name() == ".git"
}

/// Fail if any symlink under `root` resolves outside of it (or nowhere)
pub fn check_unreachable_links(root: &Path) -> Result<(), CliError> {
    let canonical_root = fs::canonicalize(root)?;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_top_level_git(e));

    for entry in walker {
        let entry = entry?;
        if !entry.path_is_symlink() {
            continue;
        }

        let link = entry.path().to_path_buf();
        match fs::canonicalize(&link) {
            Ok(target) if target.starts_with(&canonical_root) => {}
            Ok(target) => return Err(CliError::UnreachableLink { link, target }),
            Err(_) => {
                let target = fs::read_link(&link).unwrap_or_default();
                return Err(CliError::UnreachableLink { link, target });
            }
        }
    }

    Ok(())
}

/// Copy a directory tree, resolving symlinks and skipping the top-level
/// `.git` directory and anything that is not a regular file.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<(), CliError> {
    let walker = WalkDir::new(src)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_top_level_git(e));

    for entry in walker {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| CliError::Internal(e.to_string()))?;
        let target = dest.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        } else {
            debug!("Skipping special file {}", entry.path().display());
        }
    }

    Ok(())
}
