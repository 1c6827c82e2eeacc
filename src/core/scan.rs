//! Purpose: Find the end of a brace-delimited literal embedded in host text.
//! Exports: `ScanMode`, `matching_brace_end`.
//! Role: Span computation for the embedded-block rewriter.
//! Invariants: Offsets are byte offsets; `{` and `}` are ASCII so they never split a char.
//! Invariants: `Naive` counts every brace byte, including braces inside string literals.

/// How braces inside JSON string literals are treated while scanning.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ScanMode {
    /// Count every `{` and `}` byte.
    #[default]
    Naive,
    /// Skip braces inside double-quoted strings, honoring backslash escapes.
    StringAware,
}

/// Returns the offset one past the `}` that closes the `{` at `open`.
///
/// `None` means the text ended before depth returned to zero, or `open`
/// does not point at a `{`.
pub fn matching_brace_end(text: &str, open: usize, mode: ScanMode) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, &byte) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' if mode == ScanMode::StringAware => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }

    None
}
