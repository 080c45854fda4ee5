//! Heuristic classification of normalized text as Python.
//!
//! This is permissive substring matching, not parsing: treat the verdict as
//! an oracle for "worth executing", not ground truth. A dict literal or an
//! f-string with braces will be rejected; that is accepted collateral, the
//! fallback path covers it.

/// Keywords whose presence counts as evidence of Python.
const PYTHON_KEYWORDS: [&str; 9] = [
    "def ", "class ", "import ", "from ", "if ", "for ", "while ", "return ", "print(",
];

/// Markers of markup or brace/semicolon languages that disqualify the text.
const FOREIGN_MARKERS: [&str; 10] = [
    "<html", "<body", "<div", "{", "}", ";", "function", "var ", "let ", "const ",
];

/// Returns true when `code` looks like executable Python.
///
/// Requires all three: a known keyword, no foreign marker, and at least one
/// line starting with the four-space indentation unit.
pub fn looks_like_python(code: &str) -> bool {
    let has_keyword = PYTHON_KEYWORDS.iter().any(|kw| code.contains(kw));
    let has_foreign = FOREIGN_MARKERS.iter().any(|marker| code.contains(marker));
    let has_indentation = code.lines().any(|line| line.starts_with("    "));

    has_keyword && !has_foreign && has_indentation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_with_indented_body_is_valid() {
        let code = "def greet():\n    print('hello')";
        assert!(looks_like_python(code));
    }

    #[test]
    fn markup_tags_are_rejected() {
        let code = "<html>\n    <body>print</body>\n</html>";
        assert!(!looks_like_python(code));
    }

    #[test]
    fn braces_are_rejected_even_with_keywords() {
        let code = "def f():\n    return {1: 2}";
        assert!(!looks_like_python(code));
    }

    #[test]
    fn missing_indentation_is_rejected() {
        let code = "def f():\nreturn 1";
        assert!(!looks_like_python(code));
    }

    #[test]
    fn missing_keywords_are_rejected() {
        let code = "x = 1\n    y = 2";
        assert!(!looks_like_python(code));
    }
}
