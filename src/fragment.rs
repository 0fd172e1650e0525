//! Completion of incomplete Markdown fragments.
//!
//! A fragment cut off mid-construct ("**Fol", "```elixir\ndef f") parses
//! badly: the emphasis renders as literal asterisks, the fence swallows
//! everything after it. [`complete`] appends the smallest suffix that
//! closes whatever the fragment left open, so the result parses the way
//! the finished text eventually will. Strategies are tried in order and
//! the first applicable one wins.

use crate::inlines;
use crate::scanners::{self, FenceScan};
use tracing::trace;

const PLACEHOLDER_URL: &str = "#";

/// Completion state carried between successive fragments of one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    /// Marker sequence the previous fragment left unterminated, e.g. `"**"`.
    pub last_unclosed_token: Option<String>,
}

/// Append the smallest suffix that closes the first construct `fragment`
/// leaves open. `prefix` is markup carried over from an earlier fragment
/// and is prepended before anything else happens; pass `""` when there is
/// none.
///
/// The result always parses cleanly. Already-complete text comes back
/// unchanged, so repeated completion converges.
///
/// ```
/// use markstream::fragment::complete;
///
/// assert_eq!(complete("**Fol", ""), "**Fol**");
/// assert_eq!(complete("a `code span", ""), "a `code span`");
/// assert_eq!(complete("intact text", ""), "intact text");
/// ```
pub fn complete(fragment: &str, prefix: &str) -> String {
    let fragment = trim_fragment_start(fragment);
    if prefix.is_empty() {
        complete_text(fragment, prefix).unwrap_or_else(|| fragment.to_string())
    } else {
        let text = format!("{}{}", prefix, fragment);
        match complete_text(&text, prefix) {
            Some(done) => done,
            None => text,
        }
    }
}

/// [`complete`] with the carry-over handled by a [`State`] value: the
/// returned state records whatever marker the raw input still leaves
/// unterminated, ready to seed the next call.
///
/// ```
/// use markstream::fragment::{complete_with_state, State};
///
/// let (done, state) = complete_with_state("**Fol", State::default());
/// assert_eq!(done, "**Fol**");
/// assert_eq!(state.last_unclosed_token.as_deref(), Some("**"));
///
/// let (done, state) = complete_with_state("low**", state);
/// assert_eq!(done, "**low**");
/// assert_eq!(state.last_unclosed_token, None);
/// ```
pub fn complete_with_state(fragment: &str, state: State) -> (String, State) {
    let prefix = state.last_unclosed_token.unwrap_or_default();
    let completed = complete(fragment, &prefix);
    let raw = format!("{}{}", prefix, fragment);
    let next = State {
        last_unclosed_token: inlines::trailing_unclosed_token(&raw),
    };
    (completed, next)
}

/// Leading whitespace on a single-line fragment is usually an accident of
/// chunking; indentation that means something (indented code, list items)
/// stays.
fn trim_fragment_start(fragment: &str) -> &str {
    if fragment.contains('\n') {
        return fragment;
    }
    let trimmed = fragment.trim_start_matches(' ');
    let lead = fragment.len() - trimmed.len();
    if lead == 0 || lead >= 4 || trimmed.starts_with('\t') {
        return fragment;
    }
    if inlines::list_marker_end(fragment).is_some() {
        return fragment;
    }
    trimmed
}

fn complete_text(text: &str, prefix: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    match scanners::scan_fences(text) {
        FenceScan::Open(fence) => {
            // A bare opener may still be growing its info string.
            if !fence.has_body {
                return None;
            }
            trace!(strategy = "fence", length = fence.length, "closing open code fence");
            return Some(close_fence(text, &fence));
        }
        FenceScan::PartialClose(fence, missing) => {
            trace!(strategy = "fence", missing, "topping up partial closing run");
            let mut out = String::with_capacity(text.len() + missing);
            out.push_str(text);
            for _ in 0..missing {
                out.push(fence.marker as char);
            }
            return Some(out);
        }
        FenceScan::Closed => {}
    }

    if let Some(done) = complete_table_header(text) {
        return Some(done);
    }

    let (body, trailing) = split_trailing_whitespace(text);
    if body.is_empty() {
        return None;
    }
    let done = match split_list_content(body) {
        Some(at) => {
            complete_span(&body[at..], prefix).map(|done| format!("{}{}", &body[..at], done))
        }
        None => complete_span(body, prefix),
    }?;
    Some(format!("{}{}", done, trailing))
}

/// Strategies that close inline constructs, applied to one span of text:
/// the whole fragment, or the content of its trailing list item.
fn complete_span(span: &str, prefix: &str) -> Option<String> {
    if span.is_empty() {
        return None;
    }

    if let Some(open) = inlines::open_math(span) {
        let start = open.index + if open.display { 2 } else { 1 };
        if !inlines::only_whitespace_or_markers(&span[start..]) {
            let closer = if open.display {
                if span[start..].contains('\n') {
                    "\n$$"
                } else {
                    "$$"
                }
            } else {
                "$"
            };
            trace!(strategy = "math", display = open.display, "closing math run");
            return Some(format!("{}{}", span, closer));
        }
    }

    if let Some(tick) = inlines::open_code_span(span) {
        if !inlines::only_whitespace_or_markers(&span[tick + 1..]) {
            trace!(strategy = "code", "closing code span");
            return Some(format!("{}`", span));
        }
    }

    if let Some(done) = close_leading_run(span) {
        return Some(done);
    }

    if !prefix.is_empty() && span.ends_with(prefix) && prefix_balanced(span, prefix) {
        trace!(strategy = "prefix", "carried-over marker already closed");
        return Some(span.to_string());
    }

    if let Some(done) = close_link(span) {
        return Some(done);
    }

    let open = inlines::open_emphasis(span);
    if !open.is_empty() {
        let mut out = String::from(span);
        for marker in open.iter().rev() {
            out.push_str(&marker.token);
        }
        trace!(strategy = "balance", count = open.len(), "closing open emphasis");
        return Some(out);
    }

    None
}

fn close_fence(text: &str, fence: &scanners::Fence) -> String {
    let mut out = String::with_capacity(text.len() + fence.indent + fence.length + 1);
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
    for _ in 0..fence.indent {
        out.push(' ');
    }
    for _ in 0..fence.length {
        out.push(fence.marker as char);
    }
    out
}

/// A fragment ending in a pipe-delimited line that is not yet a table gets
/// the delimiter row that makes it one.
fn complete_table_header(text: &str) -> Option<String> {
    let stripped = text.strip_suffix('\n')?;
    let stripped = stripped.strip_suffix('\r').unwrap_or(stripped);
    let line_start = stripped.rfind('\n').map_or(0, |i| i + 1);
    let line = &stripped[line_start..];
    let cells = header_cells(line)?;
    if is_delimiter_row(line.trim()) {
        return None;
    }
    // An earlier delimiter row in the same block means the table is already
    // under way and this line is data.
    for prev in stripped[..line_start].lines().rev() {
        let t = prev.trim();
        if t.is_empty() {
            break;
        }
        if is_delimiter_row(t) {
            return None;
        }
    }
    let mut sep = String::with_capacity(cells * 4 + 1);
    sep.push('|');
    for _ in 0..cells {
        sep.push_str(" - |");
    }
    trace!(strategy = "table", columns = cells, "appending delimiter row");
    Some(format!("{}{}", text, sep))
}

/// Number of cells when `line` is shaped like `| a | b |`.
fn header_cells(line: &str) -> Option<usize> {
    // A tab in the indent reaches the fourth column: indented code.
    let after_indent = line.trim_start_matches(' ');
    if line.len() - after_indent.len() > 3 || after_indent.starts_with('\t') {
        return None;
    }
    let t = line.trim();
    let bytes = t.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'|' || bytes[bytes.len() - 1] != b'|' {
        return None;
    }
    if inlines::is_escaped(bytes, bytes.len() - 1) {
        return None;
    }
    let mut cells = 0;
    let mut nonempty = 0;
    let mut cell_start = 1;
    for i in 1..bytes.len() {
        if bytes[i] == b'|' && !inlines::is_escaped(bytes, i) {
            cells += 1;
            if !t[cell_start..i].trim().is_empty() {
                nonempty += 1;
            }
            cell_start = i + 1;
        }
    }
    if cells == 0 || nonempty == 0 {
        None
    } else {
        Some(cells)
    }
}

fn is_delimiter_row(t: &str) -> bool {
    !t.is_empty()
        && t.contains('-')
        && t.chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

/// A span opening with a 1-3 long emphasis run mirrors whatever part of
/// that run is still unclosed: "**Fol" becomes "**Fol**", while a span
/// whose leading run already found its close declines.
fn close_leading_run(span: &str) -> Option<String> {
    let bytes = span.as_bytes();
    let marker = *bytes.first()?;
    if !inlines::EMPHASIS_MARKERS.contains(&marker) {
        return None;
    }
    let mut run = 0;
    while run < bytes.len() && bytes[run] == marker {
        run += 1;
    }
    if run > 3 {
        return None;
    }
    if inlines::only_whitespace_or_markers(&span[run..]) {
        return None;
    }
    let bal = inlines::marker_balance(span, marker);
    let single_open = bal.singles % 2 == 1;
    let double_open = bal.doubles % 2 == 1;
    let missing = match run {
        1 if single_open => 1,
        2 if double_open => 2,
        3 => (single_open as usize) + if double_open { 2 } else { 0 },
        _ => 0,
    };
    if missing == 0 {
        return None;
    }
    trace!(strategy = "leading", run, missing, "mirroring leading marker run");
    let mut out = String::with_capacity(span.len() + missing);
    out.push_str(span);
    for _ in 0..missing {
        out.push(marker as char);
    }
    Some(out)
}

fn prefix_balanced(span: &str, prefix: &str) -> bool {
    match prefix.as_bytes().first() {
        Some(b'`') => inlines::open_code_span(span).is_none(),
        Some(b'$') => inlines::open_math(span).is_none(),
        Some(&marker) if inlines::EMPHASIS_MARKERS.contains(&marker) => {
            let bal = inlines::marker_balance(span, marker);
            inlines::family_closer(span, marker, &bal).is_none()
        }
        _ => false,
    }
}

fn close_link(span: &str) -> Option<String> {
    if let Some(open) = inlines::open_destination(span) {
        let dest = &span[open.index + 2..];
        let mut out = String::with_capacity(span.len() + PLACEHOLDER_URL.len() + open.depth);
        out.push_str(span);
        if dest.trim().is_empty() {
            out.push_str(PLACEHOLDER_URL);
        }
        for _ in 0..open.depth {
            out.push(')');
        }
        trace!(strategy = "link", "closing link destination");
        return Some(out);
    }
    let label_start = inlines::open_label(span)?;
    if span[label_start + 1..].trim().is_empty() {
        return None;
    }
    trace!(strategy = "link", "closing open label with placeholder destination");
    Some(format!("{}]({})", span, PLACEHOLDER_URL))
}

fn split_trailing_whitespace(text: &str) -> (&str, &str) {
    let end = text.trim_end().len();
    (&text[..end], &text[end..])
}

/// When the last line of `body` is a list item, inline completion applies
/// to the content after its marker. Returns the content's byte offset.
fn split_list_content(body: &str) -> Option<usize> {
    let line_start = body.rfind('\n').map_or(0, |i| i + 1);
    let marker_end = inlines::list_marker_end(&body[line_start..])?;
    Some(line_start + marker_end)
}
