//! Code-text normalization for unstructured model completions.
//!
//! Model output arrives with markdown fences, language tags, escaped
//! characters, and flattened indentation. [`normalize_code`] strips the
//! markup and re-derives line-level indentation with a small state machine.
//!
//! Indentation is tracked with a single scalar level rather than a stack of
//! nested block contexts: dedents are never inferred, and sibling blocks
//! keep deepening. This trades structural fidelity for robustness against
//! malformed input. No input is an error; the worst case is a flat,
//! line-preserving reformat.

use std::sync::LazyLock;

use regex::Regex;

/// Canonical indentation unit.
pub const INDENT: &str = "    ";

const FENCE: &str = "```";

/// Tag tokens a fence segment may start with (lowercased comparison).
const TAG_TOKENS: [&str; 3] = ["python", "py", ":"];

/// Block-opening keywords that bump the indent level when the line ends
/// with a colon.
const BLOCK_OPENERS: [&str; 7] = ["if ", "for ", "while ", "try:", "except ", "else:", "elif "];

static LANGUAGE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i):?python").expect("language tag regex should be valid"));

/// Normalize a raw completion into plausible Python source.
///
/// Applied in order: markup stripping (tags, backticks, fence segment
/// selection), removal of unbalanced triple-quote delimiters, unescaping of
/// `\_` `\n` `\\` `\t`, then line-by-line reindentation.
///
/// Idempotent: normalizing already-normalized text yields the same text.
pub fn normalize_code(raw: &str) -> String {
    let code = strip_markup(raw);
    let code = drop_unbalanced_triple_quotes(&code);
    let code = unescape(&code);
    reindent(&code)
}

/// Remove language tags and markdown fencing.
///
/// When multiple fence-delimited segments exist, the first segment whose
/// trimmed content does not begin with a tag token wins; this discards
/// preamble commentary emitted before the code block. If no segment
/// qualifies the text is left untouched.
fn strip_markup(raw: &str) -> String {
    let without_tags = LANGUAGE_TAG_RE.replace_all(raw, "");
    let trimmed = without_tags.trim_matches('`');

    if trimmed.contains(FENCE) {
        for part in trimmed.split(FENCE) {
            let clean = part.trim();
            if !clean.is_empty() && !starts_with_tag(clean) {
                return clean.to_string();
            }
        }
    }

    trimmed.to_string()
}

fn starts_with_tag(segment: &str) -> bool {
    let lower = segment.to_lowercase();
    TAG_TOKENS.iter().any(|tag| lower.starts_with(tag))
}

/// Drop triple-quote delimiters that appear an odd number of times; a
/// dangling delimiter would swallow the rest of the file as a string.
fn drop_unbalanced_triple_quotes(code: &str) -> String {
    let mut code = code.to_string();
    for delim in ["'''", "\"\"\""] {
        if code.matches(delim).count() % 2 != 0 {
            code = code.replace(delim, "");
        }
    }
    code
}

/// Undo escape sequences the model emits as literal text. Order matters:
/// `\\` is collapsed only after `\_` and `\n` are handled.
fn unescape(code: &str) -> String {
    code.replace("\\_", "_")
        .replace("\\n", "\n")
        .replace("\\\\", "\\")
        .replace("\\t", INDENT)
}

/// Re-derive indentation line by line.
///
/// State: { indent_level, in_function, in_docstring }. Transitions:
/// - `def ` line: emitted at column 0, resets the level, enters a function.
/// - `if __name__ == "__main__":` (either quote style): emitted at column
///   0, leaves the function, resets the level.
/// - Block opener: emitted at the current level (column 0 outside a
///   function); the level increments when the line ends with `:`.
/// - Blank line: emitted empty, state untouched.
/// - Triple-quote delimiter: toggles docstring mode; interior lines are
///   passed through verbatim so literal text is not corrupted.
/// - Anything else: emitted at the current level inside a function, else at
///   column 0.
fn reindent(code: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut indent_level: usize = 0;
    let mut in_function = false;
    let mut in_docstring = false;

    for line in code.lines() {
        let stripped = line.trim();

        if stripped.is_empty() {
            lines.push(String::new());
            continue;
        }

        if stripped.starts_with("\"\"\"") || stripped.starts_with("'''") {
            in_docstring = !in_docstring;
            lines.push(emit(stripped, indent_level, in_function));
            continue;
        }

        if in_docstring {
            lines.push(line.to_string());
            continue;
        }

        if stripped.starts_with("def ") {
            in_function = true;
            indent_level = 0;
            lines.push(stripped.to_string());
            continue;
        }

        if stripped == "if __name__ == \"__main__\":" || stripped == "if __name__ == '__main__':" {
            in_function = false;
            indent_level = 0;
            lines.push(stripped.to_string());
            continue;
        }

        if BLOCK_OPENERS.iter().any(|kw| stripped.starts_with(kw)) {
            lines.push(emit(stripped, indent_level, in_function));
            if stripped.ends_with(':') {
                indent_level += 1;
            }
            continue;
        }

        lines.push(emit(stripped, indent_level, in_function));
    }

    lines.join("\n")
}

fn emit(stripped: &str, indent_level: usize, in_function: bool) -> String {
    if in_function {
        format!("{}{}", INDENT.repeat(indent_level), stripped)
    } else {
        stripped.to_string()
    }
}
