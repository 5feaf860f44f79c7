//! Comment handling shared across the chartcfg crates.
//!
//! Two flavours live here:
//! - [`strip_jsonc`] removes `//` and `/* */` comments from JSONC data files
//!   (the settings catalog and the diagnostics table), honouring string literals.
//! - [`blank_comments`] replaces comments in a chart configuration document
//!   with spaces, so every character that survives keeps its line and column.

/// Strip `//` and `/* */` comments from JSONC input.
///
/// Comment-like sequences inside string literals (including escaped quotes)
/// are preserved. Line comments keep their terminating newline so that line
/// numbers reported by a JSON parser still point at the original source.
#[must_use]
pub fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_str = false;

    while let Some(c) = chars.next() {
        if in_str {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_str = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_str = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                while chars.next_if(|next| *next != '\n').is_some() {}
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Replace comments in a configuration document with spaces.
///
/// Block comments (`/* ... */`) are blanked first, then every line whose
/// first non-blank character is `#` is blanked from the `#` to the end of the
/// line. Line breaks are kept and every removed byte becomes one space, so
/// byte offsets, line numbers and columns of the remaining text are
/// unchanged. An unterminated `/*` is left as is.
///
/// The operation is idempotent: `blank_comments(&blank_comments(s))`
/// equals `blank_comments(s)`.
#[must_use]
pub fn blank_comments(text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();

    let mut from = 0usize;
    while let Some(open_rel) = find(&bytes[from..], b"/*") {
        let open = from + open_rel;
        let Some(close_rel) = find(&bytes[open + 2..], b"*/") else {
            break;
        };
        let end = open + 2 + close_rel + 2;
        blank(&mut bytes[open..end]);
        from = end;
    }

    let mut line_start = 0usize;
    while line_start < bytes.len() {
        let line_end = bytes[line_start..]
            .iter()
            .position(|b| *b == b'\n')
            .map_or(bytes.len(), |rel| line_start + rel);
        let first = bytes[line_start..line_end]
            .iter()
            .position(|b| *b != b' ' && *b != b'\t');
        if let Some(rel) = first
            && bytes[line_start + rel] == b'#'
        {
            blank(&mut bytes[line_start + rel..line_end]);
        }
        line_start = line_end + 1;
    }

    // Only whole runs delimited by ASCII markers were replaced, so the
    // buffer is still valid UTF-8.
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn blank(region: &mut [u8]) {
    for b in region {
        if *b != b'\n' && *b != b'\r' {
            *b = b' ';
        }
    }
}
