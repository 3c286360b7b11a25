//! Configuration-file discovery and loading.
//!
//! Each input file gets its own settings: starting at the directory that
//! contains it, every ancestor is searched for a `.mformat.json`, and the
//! first hit is decoded on top of the built-in defaults. Command-line
//! options are applied on top of that by the caller.

use std::path::{Path, PathBuf};

use mformat_common::settings::Settings;

const SETTINGS_FILE_NAME: &str = ".mformat.json";

/// Load the settings that apply to `source_path`.
///
/// Returns the built-in defaults when no configuration file exists in any
/// ancestor directory. A configuration file that cannot be read or decoded
/// is an error -- fatal for this input file only.
pub fn load_settings(source_path: &Path) -> Result<Settings, String> {
    let Some(settings_path) = find_settings_file(source_path) else {
        return Ok(Settings::default());
    };
    let contents = std::fs::read_to_string(&settings_path)
        .map_err(|e| format!("failed to read '{}': {}", settings_path.display(), e))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("invalid settings in '{}': {}", settings_path.display(), e))
}

/// Walk the ancestors of the file's directory for the nearest settings file.
fn find_settings_file(source_path: &Path) -> Option<PathBuf> {
    let absolute = source_path.canonicalize().ok()?;
    for dir in absolute.parent()?.ancestors() {
        let candidate = dir.join(SETTINGS_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_without_a_settings_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("script.m");
        fs::write(&file, "x = 1;\n").unwrap();
        assert_eq!(load_settings(&file).unwrap(), Settings::default());
    }

    #[test]
    fn nearest_ancestor_settings_file_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join(".mformat.json"), r#"{"indent": 8}"#).unwrap();
        fs::write(root.join("a/.mformat.json"), r#"{"indent": 3}"#).unwrap();
        let file = root.join("a/b/script.m");
        fs::write(&file, "x = 1;\n").unwrap();

        let settings = load_settings(&file).unwrap();
        assert_eq!(settings.indent, 3);
        // Unmentioned keys keep their defaults.
        assert!(settings.indent_nested_function);
    }

    #[test]
    fn malformed_settings_are_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join(".mformat.json"), "{ not json").unwrap();
        let file = root.join("script.m");
        fs::write(&file, "x = 1;\n").unwrap();

        let err = load_settings(&file).unwrap_err();
        assert!(err.contains("invalid settings"));
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join(".mformat.json"), r#"{"indent": true}"#).unwrap();
        let file = root.join("script.m");
        fs::write(&file, "x = 1;\n").unwrap();
        assert!(load_settings(&file).is_err());
    }
}
