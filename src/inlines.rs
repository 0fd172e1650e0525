// Unmatched inline marker detection: emphasis families, code spans, math
// delimiters, link brackets. Counters run in a single pass over the raw
// bytes, threading code/math context as they go, and are idempotent.

/// An inline marker left open at the end of a piece of text, together with
/// the suffix that would close it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMarker {
    pub index: usize,
    pub token: String,
}

/// An unterminated math run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMath {
    pub index: usize,
    pub display: bool,
}

/// Valid occurrence counts for one emphasis-family marker.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerBalance {
    pub singles: usize,
    pub doubles: usize,
    pub last: Option<usize>,
    pub last_end: usize,
}

pub const EMPHASIS_MARKERS: [u8; 5] = [b'*', b'_', b'~', b'+', b'='];

pub fn is_escaped(bytes: &[u8], pos: usize) -> bool {
    let mut backslashes = 0;
    let mut i = pos;
    while i > 0 && bytes[i - 1] == b'\\' {
        backslashes += 1;
        i -= 1;
    }
    backslashes % 2 == 1
}

fn is_word_byte(b: u8) -> bool {
    // Bytes >= 0x80 belong to multibyte characters; treat them as word
    // content so "mot_clé" behaves like "snake_case".
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

fn backtick_run(bytes: &[u8], i: usize) -> usize {
    let mut end = i;
    while end < bytes.len() && bytes[end] == b'`' {
        end += 1;
    }
    end - i
}

/// Code and math context threaded through a scan.
#[derive(Debug, Default, Clone, Copy)]
struct Context {
    code_span: bool,
    fence: bool,
    inline_math: bool,
    display_math: bool,
    destination: bool,
}

impl Context {
    fn in_code(&self) -> bool {
        self.code_span || self.fence
    }

    fn in_math(&self) -> bool {
        self.inline_math || self.display_math
    }

    /// Consume the bytes at `i` if they change context, returning how many
    /// were consumed (zero for ordinary text).
    fn advance(&mut self, bytes: &[u8], i: usize) -> usize {
        match bytes[i] {
            b'\\' if !self.in_code() && i + 1 < bytes.len() => 2,
            b'`' => {
                let run = backtick_run(bytes, i);
                if run >= 3 {
                    self.fence = !self.fence;
                    self.code_span = false;
                } else if !self.fence && run == 1 {
                    self.code_span = !self.code_span;
                }
                run
            }
            b'$' if !self.in_code() => {
                if i + 1 < bytes.len() && bytes[i + 1] == b'$' {
                    self.display_math = !self.display_math;
                    self.inline_math = false;
                    2
                } else if self.display_math {
                    1
                } else if !self.inline_math && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit()
                {
                    // Currency, e.g. "$5".
                    1
                } else {
                    self.inline_math = !self.inline_math;
                    1
                }
            }
            b']' if !self.in_code() && i + 1 < bytes.len() && bytes[i + 1] == b'(' => {
                self.destination = true;
                2
            }
            b')' | b'\n' => {
                self.destination = false;
                1
            }
            _ => 0,
        }
    }
}

/// Last unescaped single backtick when a code span is open.
pub fn open_code_span(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut count = 0;
    let mut last = 0;
    let mut fence = false;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            if bytes[i] == b'\\' && !fence && i + 1 < bytes.len() {
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }
        let run = backtick_run(bytes, i);
        if run >= 3 {
            fence = !fence;
        } else if !fence && run == 1 && !is_escaped(bytes, i) {
            count += 1;
            last = i;
        }
        i += run;
    }
    if count % 2 == 1 {
        Some(last)
    } else {
        None
    }
}

fn math_state(text: &str) -> (Option<OpenMath>, Option<OpenMath>) {
    let bytes = text.as_bytes();
    let mut ctx = Context::default();
    let mut inline = None;
    let mut display = None;
    let mut i = 0;
    while i < bytes.len() {
        let was_inline = ctx.inline_math;
        let was_display = ctx.display_math;
        let consumed = ctx.advance(bytes, i);
        if ctx.inline_math && !was_inline {
            inline = Some(OpenMath {
                index: i,
                display: false,
            });
        }
        if ctx.display_math && !was_display {
            display = Some(OpenMath {
                index: i,
                display: true,
            });
        }
        i += consumed.max(1);
    }
    let open_inline = if ctx.inline_math { inline } else { None };
    let open_display = if ctx.display_math { display } else { None };
    (open_inline, open_display)
}

/// The math run still open at the end of `text`, display runs taking
/// precedence over inline ones.
pub fn open_math(text: &str) -> Option<OpenMath> {
    let (inline, display) = math_state(text);
    display.or(inline)
}

/// Line bounds and block-syntax classification around one marker run,
/// computed at most once per line.
#[derive(Debug, Default, Clone, Copy)]
struct LineGuard {
    start: usize,
    end: usize,
    thematic: bool,
    first_nonspace: usize,
}

fn line_guard(text: &str, pos: usize, marker: u8) -> LineGuard {
    let bytes = text.as_bytes();
    let mut start = pos;
    while start > 0 && bytes[start - 1] != b'\n' {
        start -= 1;
    }
    let mut end = pos;
    while end < bytes.len() && bytes[end] != b'\n' {
        end += 1;
    }
    let mut first_nonspace = start;
    while first_nonspace < end && bytes[first_nonspace] == b' ' {
        first_nonspace += 1;
    }
    let mut markers = 0;
    let mut thematic = true;
    for &b in &bytes[start..end] {
        if b == marker {
            markers += 1;
        } else if b != b' ' && b != b'\t' {
            thematic = false;
            break;
        }
    }
    LineGuard {
        start,
        end,
        thematic: thematic && markers >= 3,
        first_nonspace,
    }
}

/// Count the valid single and double occurrences of one emphasis-family
/// marker. Escaped markers, code and math context, link destinations,
/// thematic-break lines and bullet markers never count; `_`, `+` and `=`
/// additionally require a non-word character on at least one side.
pub fn marker_balance(text: &str, marker: u8) -> MarkerBalance {
    let bytes = text.as_bytes();
    let mut bal = MarkerBalance::default();
    let mut ctx = Context::default();
    let mut guard: Option<LineGuard> = None;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != marker {
            let consumed = ctx.advance(bytes, i);
            i += consumed.max(1);
            continue;
        }
        if is_escaped(bytes, i) {
            i += 1;
            continue;
        }
        if ctx.in_code() || ctx.in_math() || ctx.destination {
            let consumed = ctx.advance(bytes, i);
            i += consumed.max(1);
            continue;
        }
        let start = i;
        let mut end = i;
        while end < bytes.len() && bytes[end] == marker {
            end += 1;
        }
        i = end;

        let g = match guard {
            Some(g) if g.start <= start && start < g.end => g,
            _ => {
                let g = line_guard(text, start, marker);
                guard = Some(g);
                g
            }
        };
        if g.thematic {
            continue;
        }
        let run = end - start;
        let prev = if start > 0 { bytes[start - 1] } else { 0 };
        let next = if end < bytes.len() { bytes[end] } else { 0 };
        let intra_word = prev != 0 && next != 0 && is_word_byte(prev) && is_word_byte(next);

        // A lone marker opening a line is a bullet, not emphasis.
        if run == 1
            && start == g.first_nonspace
            && g.first_nonspace - g.start <= 3
            && matches!(marker, b'*' | b'+' | b'-')
            && (next == 0 || next == b' ' || next == b'\t')
        {
            continue;
        }

        match marker {
            b'+' | b'=' => {
                if intra_word || run < 2 {
                    continue;
                }
                bal.doubles += run / 2;
            }
            b'_' => {
                if intra_word {
                    continue;
                }
                count_run(&mut bal, run);
            }
            b'*' => {
                if run == 1 && intra_word {
                    continue;
                }
                count_run(&mut bal, run);
            }
            _ => count_run(&mut bal, run),
        }
        bal.last = Some(start);
        bal.last_end = end;
    }
    bal
}

fn count_run(bal: &mut MarkerBalance, run: usize) {
    match run {
        1 => bal.singles += 1,
        2 => bal.doubles += 1,
        3 => {
            bal.singles += 1;
            bal.doubles += 1;
        }
        n => {
            bal.doubles += n / 2;
            bal.singles += n % 2;
        }
    }
}

/// The suffix closing an open emphasis run of `marker`, or `None` when the
/// family is balanced. When single and double forms are both open the
/// combined closer is preferred, completing a trailing lone marker into it
/// rather than doubling up.
pub fn family_closer(text: &str, marker: u8, bal: &MarkerBalance) -> Option<String> {
    let single_open = !matches!(marker, b'+' | b'=') && bal.singles % 2 == 1;
    let double_open = bal.doubles % 2 == 1;
    let m = marker as char;
    match (single_open, double_open) {
        (false, false) => None,
        (true, false) => Some(m.to_string()),
        (false, true) => Some([m, m].iter().collect()),
        (true, true) => {
            let trimmed = text.trim_end();
            let bytes = trimmed.as_bytes();
            let ends_in_lone_marker = bytes.last() == Some(&marker)
                && (bytes.len() < 2 || bytes[bytes.len() - 2] != marker);
            if ends_in_lone_marker {
                Some([m, m].iter().collect())
            } else {
                Some([m, m, m].iter().collect())
            }
        }
    }
}

/// True when nothing but whitespace and marker characters follows; closing
/// an emphasis run with no real content would change its meaning.
pub fn only_whitespace_or_markers(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_whitespace() || matches!(c, '*' | '_' | '~' | '`' | '+' | '=' | '$'))
}

/// Emphasis families still open at the end of `text`, skipping runs with no
/// content after them, ordered by where they opened.
pub fn open_emphasis(text: &str) -> Vec<OpenMarker> {
    let mut open = vec![];
    for &marker in &EMPHASIS_MARKERS {
        let bal = marker_balance(text, marker);
        let Some(token) = family_closer(text, marker, &bal) else {
            continue;
        };
        let Some(index) = bal.last else {
            continue;
        };
        if only_whitespace_or_markers(&text[bal.last_end..]) {
            continue;
        }
        open.push(OpenMarker { index, token });
    }
    open.sort_by_key(|m| m.index);
    open
}

/// The marker sequence left unterminated at the end of `text`, if any:
/// the open emphasis, code span or math run that started last.
pub fn trailing_unclosed_token(text: &str) -> Option<String> {
    let mut open: Vec<OpenMarker> = vec![];
    for &marker in &EMPHASIS_MARKERS {
        let bal = marker_balance(text, marker);
        if let (Some(token), Some(index)) = (family_closer(text, marker, &bal), bal.last) {
            open.push(OpenMarker { index, token });
        }
    }
    if let Some(index) = open_code_span(text) {
        open.push(OpenMarker {
            index,
            token: "`".to_string(),
        });
    }
    if let Some(math) = open_math(text) {
        open.push(OpenMarker {
            index: math.index,
            token: if math.display { "$$" } else { "$" }.to_string(),
        });
    }
    open.into_iter().max_by_key(|m| m.index).map(|m| m.token)
}

/// The innermost unmatched `[` (or `![`), if any.
pub fn open_label(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut stack = vec![];
    let mut ctx = Context::default();
    let mut i = 0;
    while i < bytes.len() {
        if !ctx.in_code() && !ctx.destination && !is_escaped(bytes, i) {
            match bytes[i] {
                b'[' => {
                    stack.push(i);
                    i += 1;
                    continue;
                }
                b']' => {
                    stack.pop();
                    if i + 1 < bytes.len() && bytes[i + 1] == b'(' {
                        ctx.destination = true;
                        i += 2;
                    } else {
                        i += 1;
                    }
                    continue;
                }
                _ => {}
            }
        }
        let consumed = ctx.advance(bytes, i);
        i += consumed.max(1);
    }
    stack.pop()
}

/// An unterminated link destination: the position of the `](` whose
/// parentheses never close again, and the depth still open there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenDestination {
    pub index: usize,
    pub depth: usize,
}

pub fn open_destination(text: &str) -> Option<OpenDestination> {
    let bytes = text.as_bytes();
    let mut ctx = Context::default();
    let mut open: Option<OpenDestination> = None;
    let mut depth = 0;
    let mut i = 0;
    while i < bytes.len() {
        if depth > 0 {
            match bytes[i] {
                b'(' if !is_escaped(bytes, i) => depth += 1,
                b')' if !is_escaped(bytes, i) => {
                    depth -= 1;
                    if depth == 0 {
                        open = None;
                    }
                }
                _ => {}
            }
            i += 1;
            continue;
        }
        if bytes[i] == b']'
            && i + 1 < bytes.len()
            && bytes[i + 1] == b'('
            && !ctx.in_code()
            && !is_escaped(bytes, i)
        {
            open = Some(OpenDestination { index: i, depth: 1 });
            depth = 1;
            i += 2;
            continue;
        }
        let consumed = ctx.advance(bytes, i);
        i += consumed.max(1);
    }
    if let Some(o) = open.as_mut() {
        o.depth = depth;
    }
    open
}

/// Byte length of a leading list marker (`- `, `* `, `+ `, `1. `, `- [ ] `),
/// including the whitespace that follows it.
pub fn list_marker_end(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() && i < 3 && bytes[i] == b' ' {
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }
    match bytes[i] {
        b'-' | b'*' | b'+' => i += 1,
        b'0'..=b'9' => {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() && i - start < 9 {
                i += 1;
            }
            if i >= bytes.len() || !matches!(bytes[i], b'.' | b')') {
                return None;
            }
            i += 1;
        }
        _ => return None,
    }
    if i >= bytes.len() || !matches!(bytes[i], b' ' | b'\t') {
        return None;
    }
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
        i += 1;
    }
    // Task list box.
    if line[i..].starts_with("[ ]") || line[i..].starts_with("[x]") || line[i..].starts_with("[X]")
    {
        let after = i + 3;
        if after < bytes.len() && matches!(bytes[after], b' ' | b'\t') {
            i = after;
            while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
                i += 1;
            }
        }
    }
    Some(i)
}
