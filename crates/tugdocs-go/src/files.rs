//! Go file and package directory discovery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Directory names never descended into by `...` patterns.
const SKIPPED_DIRS: &[&str] = &["vendor", "testdata"];

/// True for a file the Go tool would consider for a build: `*.go`, not a
/// test file, not hidden.
pub fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('.')
        && !name.starts_with('_')
}

/// Go source files directly inside `dir`, sorted by name.
pub fn go_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && is_go_source(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Package directories under `root` for a `root/...` pattern.
///
/// Skips `vendor`, `testdata`, directories starting with `.` or `_`, and
/// directories holding a nested module (their own `go.mod`). `root` itself is
/// always considered. Only directories containing Go source files are
/// returned, in sorted order.
pub fn package_dirs(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !skip_dir(e.path()));
    for entry in walker {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if !go_files(entry.path())?.is_empty() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

fn skip_dir(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.starts_with('.')
        || name.starts_with('_')
        || SKIPPED_DIRS.contains(&name)
        || path.join("go.mod").is_file()
}

/// Nearest directory at or above `dir` that contains a `go.mod`.
pub fn find_module_root(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .find(|d| d.join("go.mod").is_file())
        .map(Path::to_path_buf)
}

/// Path of `path` relative to `base` with `/` separators, if it lies inside.
pub fn relative_slash_path(path: &Path, base: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

// ============================================================================
// Tests
// ============================================================================
