use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating stored file names
    /// No path separators or control characters, and not made of dots only
    /// - Valid: "report.pdf", "photo (1).jpg", ".env.example", "résumé.docx"
    /// - Invalid: "../secret", "a/b", "a\\b", ".", "..", "line\nbreak"
    pub static ref FILE_NAME_REGEX: Regex =
        Regex::new(r"^[^/\\\p{Cc}]*[^/\\\p{Cc}.][^/\\\p{Cc}]*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_regex_valid() {
        assert!(FILE_NAME_REGEX.is_match("report.pdf"));
        assert!(FILE_NAME_REGEX.is_match("photo (1).jpg"));
        assert!(FILE_NAME_REGEX.is_match(".env.example"));
        assert!(FILE_NAME_REGEX.is_match("résumé.docx"));
        assert!(FILE_NAME_REGEX.is_match("no-extension"));
    }

    #[test]
    fn test_file_name_regex_invalid() {
        assert!(!FILE_NAME_REGEX.is_match("")); // empty
        assert!(!FILE_NAME_REGEX.is_match("../secret")); // traversal
        assert!(!FILE_NAME_REGEX.is_match("a/b")); // separator
        assert!(!FILE_NAME_REGEX.is_match("a\\b")); // windows separator
        assert!(!FILE_NAME_REGEX.is_match(".")); // dots only
        assert!(!FILE_NAME_REGEX.is_match(".."));
        assert!(!FILE_NAME_REGEX.is_match("line\nbreak")); // control char
    }
}
