use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating stored file names
    /// One to 255 characters, no path separator and no control characters
    /// - Valid: "doc.pdf", "Quarterly report (final).xlsx", "notes"
    /// - Invalid: "", "a/b.txt", "line\nbreak"
    pub static ref FILE_NAME_REGEX: Regex = Regex::new(r"^[^/\p{Cc}]{1,255}$").unwrap();
}

/// Names that collide with fixed segments under `/files/`
pub const RESERVED_FILE_NAMES: &[&str] = &[
    "storage",
    "metadata",
    "rename",
    "visibility",
    "status",
    "by-id",
];

/// True when `name` is usable as a file name and object key suffix
pub fn is_valid_file_name(name: &str) -> bool {
    name != "."
        && name != ".."
        && !RESERVED_FILE_NAMES.contains(&name)
        && FILE_NAME_REGEX.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_valid() {
        assert!(is_valid_file_name("doc.pdf"));
        assert!(is_valid_file_name("Quarterly report (final).xlsx"));
        assert!(is_valid_file_name("notes"));
        assert!(is_valid_file_name("résumé.txt"));
        assert!(is_valid_file_name(&"a".repeat(255)));
    }

    #[test]
    fn test_file_name_invalid() {
        assert!(!is_valid_file_name("")); // empty
        assert!(!is_valid_file_name("a/b.txt")); // path separator
        assert!(!is_valid_file_name("line\nbreak")); // control character
        assert!(!is_valid_file_name("tab\there"));
        assert!(!is_valid_file_name("..")); // parent directory
        assert!(!is_valid_file_name(&"a".repeat(256))); // too long
    }

    #[test]
    fn test_route_segments_are_reserved() {
        assert!(!is_valid_file_name("storage"));
        assert!(!is_valid_file_name("by-id"));
        assert!(is_valid_file_name("storage.txt"));
    }
}
