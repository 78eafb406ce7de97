//! Named keyword lists stored as plain text files

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory searched for keyword lists when none is configured
pub const DEFAULT_KEYWORD_DIR: &str = "keyword_list";

const LIST_EXTENSION: &str = "txt";

/// Names of the keyword lists in `dir`, sorted
///
/// A list is any `*.txt` file; its name is the file stem. A missing or
/// unreadable directory has no lists.
pub fn available_lists(dir: impl AsRef<Path>) -> Vec<String> {
    let dir = dir.as_ref();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(dir = %dir.display(), error = %e, "cannot read keyword directory");
            }
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == LIST_EXTENSION))
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();

    names.sort();
    names
}

/// Path of the list called `name` inside `dir`
pub fn list_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    dir.as_ref().join(format!("{name}.{LIST_EXTENSION}"))
}

/// Read one keyword per line, trimmed, skipping blank lines
pub fn load_keywords(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Keywords of a named list, empty when the list cannot be read
///
/// An unreadable list places no restriction on the view.
pub fn load_named(dir: impl AsRef<Path>, name: &str) -> Vec<String> {
    let path = list_path(dir, name);
    match load_keywords(&path) {
        Ok(keywords) => keywords,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read keyword list");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lists_sorted_by_stem() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("video.txt"), "dvdplayer\n").unwrap();
        fs::write(dir.path().join("addons.txt"), "addon\n").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        assert_eq!(available_lists(dir.path()), vec!["addons", "video"]);
    }

    #[test]
    fn test_missing_dir_has_no_lists() {
        let dir = TempDir::new().unwrap();
        assert!(available_lists(dir.path().join("nope")).is_empty());
    }

    #[test]
    fn test_load_trims_and_skips_blanks() {
        let dir = TempDir::new().unwrap();
        let path = list_path(dir.path(), "pvr");
        fs::write(&path, b"  pvr \n\n\t\nepg\r\nguide\xff\n").unwrap();

        let keywords = load_keywords(&path).unwrap();
        assert_eq!(keywords, vec!["pvr", "epg", "guide\u{fffd}"]);
    }

    #[test]
    fn test_unreadable_list_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load_named(dir.path(), "missing").is_empty());
        assert!(load_keywords(list_path(dir.path(), "missing")).is_err());
    }
}
