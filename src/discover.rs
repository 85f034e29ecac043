//! Flat-directory file discovery shared by the pipeline stages.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::DetprepError;

/// Collect the direct children of `dir` whose extension matches `extensions`
/// (case-insensitive), sorted by file name for reproducible processing order.
pub(crate) fn collect_files(
    dir: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, DetprepError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|err| DetprepError::Io(err.into()))?;
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_by_key(|path| path.file_name().map(|name| name.to_os_string()));
    Ok(files)
}

pub(crate) fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn collects_sorted_matching_files_only() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(temp.path().join("b.jpg"), b"x").expect("write b");
        fs::write(temp.path().join("a.JPG"), b"x").expect("write a");
        fs::write(temp.path().join("c.txt"), b"x").expect("write c");
        fs::create_dir(temp.path().join("nested")).expect("create nested");
        fs::write(temp.path().join("nested/d.jpg"), b"x").expect("write d");

        let files = collect_files(temp.path(), &["jpg"]).expect("collect");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().and_then(|n| n.to_str()).unwrap_or(""))
            .collect();

        // Direct children only, extension case-insensitive, name-sorted.
        assert_eq!(names, vec!["a.JPG", "b.jpg"]);
    }

    #[test]
    fn has_extension_ignores_case_and_missing_extensions() {
        assert!(has_extension(Path::new("x.JPeG"), &["jpg", "jpeg"]));
        assert!(!has_extension(Path::new("x.png"), &["jpg", "jpeg"]));
        assert!(!has_extension(Path::new("noext"), &["jpg"]));
    }
}
