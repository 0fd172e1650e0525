// Line-oriented fence scanning for streamed text.

/// An open code fence: everything needed to synthesize its closing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    /// Leading spaces before the opening run, at most 3.
    pub indent: usize,
    /// `b'`'` or `b'~'`.
    pub marker: u8,
    /// Length of the opening run, at least 3.
    pub length: usize,
    /// Info string after the opening run, trimmed.
    pub info: String,
    /// Zero-based line the fence opened on.
    pub line: usize,
    /// Whether any content line follows the opener.
    pub has_body: bool,
}

/// Fence state at the end of a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceScan {
    /// Every fence that opened also closed.
    Closed,
    /// A fence is still open.
    Open(Fence),
    /// A fence is open and the text ends mid-way through its closing run;
    /// the `usize` is how many marker characters are missing.
    PartialClose(Fence, usize),
}

/// Walk `text` line by line, tracking fence opens and closes.
pub fn scan_fences(text: &str) -> FenceScan {
    let mut open: Option<Fence> = None;
    let mut body_lines = 0;
    let mut last_line = "";
    for (idx, line) in text.lines().enumerate() {
        last_line = line;
        match open.as_ref() {
            None => {
                open = open_code_fence(line, idx);
                body_lines = 0;
            }
            Some(fence) => {
                if close_code_fence(line, fence) {
                    open = None;
                } else {
                    body_lines += 1;
                }
            }
        }
    }
    let mut fence = match open {
        Some(fence) => fence,
        None => return FenceScan::Closed,
    };
    if !text.ends_with('\n') {
        if let Some(run) = partial_close_run(last_line, &fence) {
            fence.has_body = body_lines > 1;
            let missing = fence.length - run;
            return FenceScan::PartialClose(fence, missing);
        }
    }
    fence.has_body = body_lines > 0;
    FenceScan::Open(fence)
}

/// Parse `line` as a fence opener: up to 3 spaces of indent, a run of at
/// least 3 backticks or tildes, and an info string that must not contain a
/// backtick when the fence is backtick-marked.
pub fn open_code_fence(line: &str, idx: usize) -> Option<Fence> {
    let bytes = line.as_bytes();
    let mut indent = 0;
    while indent < bytes.len() && bytes[indent] == b' ' {
        indent += 1;
    }
    if indent > 3 || indent >= bytes.len() {
        return None;
    }
    let marker = bytes[indent];
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let mut end = indent;
    while end < bytes.len() && bytes[end] == marker {
        end += 1;
    }
    let length = end - indent;
    if length < 3 {
        return None;
    }
    let info = line[end..].trim();
    if marker == b'`' && info.contains('`') {
        return None;
    }
    Some(Fence {
        indent,
        marker,
        length,
        info: info.to_string(),
        line: idx,
        has_body: false,
    })
}

/// True when `line` closes `fence`: same marker, a run at least as long as
/// the opener, nothing else but whitespace.
fn close_code_fence(line: &str, fence: &Fence) -> bool {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    if i > 3 || i >= bytes.len() || bytes[i] != fence.marker {
        return false;
    }
    let mut run = 0;
    while i < bytes.len() && bytes[i] == fence.marker {
        i += 1;
        run += 1;
    }
    run >= fence.length && bytes[i..].iter().all(|&b| b == b' ' || b == b'\t')
}

/// A closing run cut short by the end of the stream: same indent and marker
/// as `fence`, shorter than its opening run, nothing after it. Returns the
/// length already present.
fn partial_close_run(line: &str, fence: &Fence) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    if i != fence.indent {
        return None;
    }
    let start = i;
    while i < bytes.len() && bytes[i] == fence.marker {
        i += 1;
    }
    let run = i - start;
    if run == 0 || run >= fence.length || i != bytes.len() {
        return None;
    }
    Some(run)
}

#[cfg(test)]
pub mod tests {
    use super::*;

    fn fence(indent: usize, marker: u8, length: usize, info: &str) -> Fence {
        Fence {
            indent,
            marker,
            length,
            info: info.to_string(),
            line: 0,
            has_body: false,
        }
    }

    #[test]
    fn openers() {
        assert_eq!(
            open_code_fence("```rust", 0),
            Some(fence(0, b'`', 3, "rust"))
        );
        assert_eq!(open_code_fence("  ~~~~", 0), Some(fence(2, b'~', 4, "")));
        assert_eq!(open_code_fence("``", 0), None);
        assert_eq!(open_code_fence("    ```", 0), None);
        // Backtick info strings cannot contain backticks.
        assert_eq!(open_code_fence("``` a`b", 0), None);
        assert_eq!(open_code_fence("~~~ a`b", 0), Some(fence(0, b'~', 3, "a`b")));
    }

    #[test]
    fn open_without_body() {
        match scan_fences("```rust") {
            FenceScan::Open(f) => {
                assert_eq!(f.info, "rust");
                assert!(!f.has_body);
            }
            other => panic!("expected open fence, got {:?}", other),
        }
    }

    #[test]
    fn open_with_body() {
        match scan_fences("```elixir\ndef f") {
            FenceScan::Open(f) => {
                assert_eq!(f.info, "elixir");
                assert!(f.has_body);
            }
            other => panic!("expected open fence, got {:?}", other),
        }
    }

    #[test]
    fn closed() {
        assert_eq!(scan_fences("```\ncode\n```"), FenceScan::Closed);
        assert_eq!(scan_fences("```\ncode\n```\nafter"), FenceScan::Closed);
        // Closer runs may be longer than the opener.
        assert_eq!(scan_fences("```\ncode\n`````"), FenceScan::Closed);
    }

    #[test]
    fn shorter_run_does_not_close() {
        match scan_fences("````\ncode\n```\nmore\n") {
            FenceScan::Open(f) => assert_eq!(f.length, 4),
            other => panic!("expected open fence, got {:?}", other),
        }
    }

    #[test]
    fn partial_closer() {
        match scan_fences("```\ncode\n``") {
            FenceScan::PartialClose(f, missing) => {
                assert_eq!(f.length, 3);
                assert_eq!(missing, 1);
                assert!(f.has_body);
            }
            other => panic!("expected partial close, got {:?}", other),
        }
        // A trailing newline turns the short run back into content.
        match scan_fences("```\ncode\n``\n") {
            FenceScan::Open(f) => assert!(f.has_body),
            other => panic!("expected open fence, got {:?}", other),
        }
    }

    #[test]
    fn tilde_fences_ignore_backtick_lines() {
        match scan_fences("~~~\n```\n") {
            FenceScan::Open(f) => {
                assert_eq!(f.marker, b'~');
                assert!(f.has_body);
            }
            other => panic!("expected open fence, got {:?}", other),
        }
    }
}
