//! Corpus enumeration.
//!
//! The filesystem tree *is* the data structure: there is no manifest or
//! index, membership is decided by file extension alone. Every stage asks
//! this module for the files of one class and makes a complete pass over
//! them before the next stage starts.
//!
//! Enumeration is sorted so runs are deterministic regardless of directory
//! iteration order; unreadable entries are skipped rather than failing the
//! walk (a single bad inode must not abort the corpus).

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const HTML_EXTENSIONS: &[&str] = &["html", "htm"];
const STYLESHEET_EXTENSIONS: &[&str] = &["css"];
const SCRIPT_EXTENSIONS: &[&str] = &["js"];
const IMAGE_EXTENSIONS: &[&str] = &["webp", "jpg", "jpeg", "png"];

/// File classes the pipeline operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Html,
    Stylesheet,
    Script,
    Image,
}

impl FileClass {
    /// Extensions (lowercase, without dot) belonging to this class.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileClass::Html => HTML_EXTENSIONS,
            FileClass::Stylesheet => STYLESHEET_EXTENSIONS,
            FileClass::Script => SCRIPT_EXTENSIONS,
            FileClass::Image => IMAGE_EXTENSIONS,
        }
    }

    /// Classify a path by its extension, case-insensitively.
    pub fn of(path: &Path) -> Option<FileClass> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        for class in [
            FileClass::Html,
            FileClass::Stylesheet,
            FileClass::Script,
            FileClass::Image,
        ] {
            if class.extensions().contains(&ext.as_str()) {
                return Some(class);
            }
        }
        None
    }
}

/// All files of one class under `root`, sorted by path.
///
/// A missing or unreadable root yields an empty list; the caller decides
/// whether an empty corpus is an error (the pipeline validates the root
/// once up front).
pub fn files_of_class(root: &Path, class: FileClass) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| FileClass::of(path) == Some(class))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn classifies_by_extension() {
        assert_eq!(FileClass::of(Path::new("a/index.html")), Some(FileClass::Html));
        assert_eq!(FileClass::of(Path::new("style.css")), Some(FileClass::Stylesheet));
        assert_eq!(FileClass::of(Path::new("app.js")), Some(FileClass::Script));
        assert_eq!(FileClass::of(Path::new("pic.webp")), Some(FileClass::Image));
        assert_eq!(FileClass::of(Path::new("doc.pdf")), None);
        assert_eq!(FileClass::of(Path::new("Makefile")), None);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(FileClass::of(Path::new("PAGE.HTML")), Some(FileClass::Html));
        assert_eq!(FileClass::of(Path::new("photo.JPG")), Some(FileClass::Image));
    }

    #[test]
    fn walk_finds_only_requested_class() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("index.html"));
        touch(&tmp.path().join("posts/one/index.html"));
        touch(&tmp.path().join("assets/style.css"));
        touch(&tmp.path().join("uploads/a.webp"));

        let html = files_of_class(tmp.path(), FileClass::Html);
        assert_eq!(html.len(), 2);
        assert!(html.iter().all(|p| p.extension().unwrap() == "html"));

        let css = files_of_class(tmp.path(), FileClass::Stylesheet);
        assert_eq!(css.len(), 1);
    }

    #[test]
    fn walk_is_sorted() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("b.html"));
        touch(&tmp.path().join("a.html"));
        touch(&tmp.path().join("c/a.html"));

        let files = files_of_class(tmp.path(), FileClass::Html);
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[test]
    fn missing_root_yields_empty() {
        let tmp = TempDir::new().unwrap();
        let files = files_of_class(&tmp.path().join("nope"), FileClass::Image);
        assert!(files.is_empty());
    }
}
