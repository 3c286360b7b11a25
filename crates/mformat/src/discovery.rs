//! Recursive discovery of `*.m` files.

use std::path::{Path, PathBuf};

/// Recursively collect all `.m` files under `root`.
///
/// The full list is sorted for deterministic processing order. Hidden
/// entries (names starting with `.`) are skipped.
pub fn discover_matlab_files(root: &Path) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    walk(root, &mut files)
        .map_err(|e| format!("failed to walk directory '{}': {}", root.display(), e))?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            walk(&path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("m") {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_nested_m_files_in_sorted_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("b.m"), "").unwrap();
        fs::write(root.join("a.m"), "").unwrap();
        fs::write(root.join("sub/c.m"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();

        let files = discover_matlab_files(root).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.m", "b.m", "sub/c.m"]);
    }

    #[test]
    fn hidden_entries_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git/config.m"), "").unwrap();
        fs::write(root.join(".hidden.m"), "").unwrap();
        fs::write(root.join("seen.m"), "").unwrap();

        let files = discover_matlab_files(root).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("seen.m"));
    }
}
