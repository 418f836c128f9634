//! File name validation.
//!
//! Stored files are addressed by their name alone, so every name that
//! reaches the filesystem must be a single path segment.

use crate::{FileboxError, Result};

use super::MAX_FILENAME_BYTES;

/// Validate that `name` is a single, safe path segment.
///
/// Rejects empty names, `.` and `..`, path separators, NUL and other
/// control characters, and names longer than [`MAX_FILENAME_BYTES`].
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FileboxError::InvalidName("name is empty".to_string()));
    }
    if name.len() > MAX_FILENAME_BYTES {
        return Err(FileboxError::InvalidName(format!(
            "name exceeds {MAX_FILENAME_BYTES} bytes"
        )));
    }
    if name == "." || name == ".." {
        return Err(FileboxError::InvalidName(format!(
            "'{name}' is not a file name"
        )));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(FileboxError::InvalidName(
            "name must not contain path separators".to_string(),
        ));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(FileboxError::InvalidName(
            "name must not contain control characters".to_string(),
        ));
    }
    Ok(())
}

/// Extension of a file name, including the leading dot.
///
/// Returns an empty string when the name has no dot, or when its only dot
/// is the first character (`.profile`).
pub fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &name[idx..],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_file_name("a.txt").is_ok());
        assert!(validate_file_name("photo 2024.JPG").is_ok());
        assert!(validate_file_name(".hidden").is_ok());
        assert!(validate_file_name("archive.tar.gz").is_ok());
        assert!(validate_file_name("日本語ファイル.txt").is_ok());
        assert!(validate_file_name("..weird").is_ok());
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            validate_file_name(""),
            Err(FileboxError::InvalidName(_))
        ));
    }

    #[test]
    fn test_rejects_dot_segments() {
        assert!(validate_file_name(".").is_err());
        assert!(validate_file_name("..").is_err());
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(validate_file_name("../etc/passwd").is_err());
        assert!(validate_file_name("..\\secret.txt").is_err());
        assert!(validate_file_name("dir/file.txt").is_err());
        assert!(validate_file_name("/absolute").is_err());
    }

    #[test]
    fn test_rejects_control_characters() {
        assert!(validate_file_name("bad\0name").is_err());
        assert!(validate_file_name("line\nbreak.txt").is_err());
        assert!(validate_file_name("tab\tname").is_err());
    }

    #[test]
    fn test_rejects_long_names() {
        let name = "a".repeat(MAX_FILENAME_BYTES + 1);
        assert!(validate_file_name(&name).is_err());

        let name = "a".repeat(MAX_FILENAME_BYTES);
        assert!(validate_file_name(&name).is_ok());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.txt"), ".txt");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".profile"), "");
        assert_eq!(extension_of(".config.toml"), ".toml");
        assert_eq!(extension_of("trailing."), ".");
        assert_eq!(extension_of("IMAGE.PNG"), ".PNG");
    }
}
