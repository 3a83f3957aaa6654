//! Line view over file text that keeps each line's own terminator, so edits
//! write back `\r\n`, `\n` and lone `\r` endings untouched.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineSegment<'a> {
    pub(crate) body: &'a str,
    pub(crate) ending: &'a str,
}

/// Splits `text` at `\r\n`, `\n` or a lone `\r`. A trailing terminator does
/// not start an extra line; empty text is one empty line.
pub(crate) fn segments(text: &str) -> Vec<LineSegment<'_>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut index = 0;
    while index < bytes.len() {
        let end = match bytes[index] {
            b'\n' => index + 1,
            b'\r' if bytes.get(index + 1) == Some(&b'\n') => index + 2,
            b'\r' => index + 1,
            _ => {
                index += 1;
                continue;
            }
        };
        out.push(LineSegment {
            body: &text[start..index],
            ending: &text[index..end],
        });
        start = end;
        index = end;
    }
    if start < text.len() || out.is_empty() {
        out.push(LineSegment {
            body: &text[start..],
            ending: "",
        });
    }
    out
}

/// Returns `text` with line `index` replaced, or `None` past the last line.
pub(crate) fn replace_line(text: &str, index: usize, replacement: &str) -> Option<String> {
    let lines = segments(text);
    if index >= lines.len() {
        return None;
    }
    let mut out = String::with_capacity(text.len() + replacement.len());
    for (position, line) in lines.iter().enumerate() {
        out.push_str(if position == index { replacement } else { line.body });
        out.push_str(line.ending);
    }
    Some(out)
}
