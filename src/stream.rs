//! Streaming sessions: buffer raw chunks as they arrive, read a coherent
//! document whenever you like.
//!
//! A [`MarkdownStream`] never parses on [`push`](MarkdownStream::push);
//! each read joins the buffered chunks, runs fragment completion over the
//! result, and reparses. The document seen mid-stream is therefore always
//! exactly what a one-shot parse of the text-so-far would produce, and the
//! final read matches a one-shot parse of the whole stream.

use std::collections::VecDeque;

use comrak::nodes::{NodeCodeBlock, NodeValue};
use comrak::Options;
use tracing::debug;

#[cfg(feature = "bon")]
use bon::Builder;

use crate::document::{Document, Error, Node};
use crate::fragment;

/// Where a pushed chunk lands in the buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Position {
    /// Before everything already buffered.
    Top,
    /// After everything already buffered.
    #[default]
    Bottom,
}

/// Raw chunks accumulated so far, in document order.
#[derive(Debug, Clone, Default)]
pub struct ChunkBuffer {
    chunks: VecDeque<String>,
}

impl ChunkBuffer {
    /// An empty buffer.
    pub fn new() -> ChunkBuffer {
        ChunkBuffer::default()
    }

    /// Number of chunks held.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when nothing has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Store `chunk` at `position`.
    pub fn push(&mut self, chunk: &str, position: Position) {
        match position {
            Position::Top => self.chunks.push_front(chunk.to_string()),
            Position::Bottom => self.chunks.push_back(chunk.to_string()),
        }
    }

    /// Every chunk joined in document order.
    pub fn concat(&self) -> String {
        self.chunks.iter().map(String::as_str).collect()
    }
}

/// Combine canonical text already rendered with the raw chunks buffered
/// since. When `last_node` is a fenced code block, the synthetic closing
/// fence a completion pass injected is stripped first, so the block keeps
/// growing instead of staying sealed. The boundary is normalized to exactly
/// one newline, then the chunks go on the end, oldest first.
pub fn merge_stream_buffer(
    existing: &str,
    buffer: &ChunkBuffer,
    last_node: Option<&Node>,
) -> String {
    let mut base = existing;
    if let Some(code) = last_node.and_then(fenced_code_of) {
        if let Some(cut) = synthetic_closer_start(base, code) {
            debug!(
                fence_length = code.fence_length,
                "stripping synthetic fence closer"
            );
            base = &base[..cut];
        }
    }
    if base.is_empty() {
        return buffer.concat();
    }
    let trimmed = base.trim_end_matches('\n');
    let mut out = String::with_capacity(trimmed.len() + 1);
    out.push_str(trimmed);
    out.push('\n');
    for chunk in &buffer.chunks {
        out.push_str(chunk);
    }
    out
}

fn fenced_code_of(node: &Node) -> Option<&NodeCodeBlock> {
    match node.value {
        NodeValue::CodeBlock(ref code) if code.fenced => Some(code),
        _ => None,
    }
}

/// Byte offset of the synthetic closing fence line, when `text` ends with
/// exactly the closer the formatter would emit for `code`. Anything else
/// (a longer run, extra trailing content) is real and stays.
fn synthetic_closer_start(text: &str, code: &NodeCodeBlock) -> Option<usize> {
    let trimmed = text.strip_suffix('\n').unwrap_or(text);
    let line_start = trimmed.rfind('\n')? + 1;
    let line = &trimmed[line_start..];
    if line.len() != code.fence_offset + code.fence_length {
        return None;
    }
    let (indent, run) = line.as_bytes().split_at(code.fence_offset);
    if indent.iter().all(|&b| b == b' ') && run.iter().all(|&b| b == code.fence_char) {
        Some(line_start)
    } else {
        None
    }
}

/// Parser and formatter options with every extension the completer
/// understands turned on.
pub fn extension_defaults() -> Options<'static> {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.tasklist = true;
    options.extension.autolink = true;
    options.extension.footnotes = true;
    options.extension.math_dollars = true;
    options.extension.superscript = true;
    options.extension.underline = true;
    options.extension.subscript = true;
    options
}

/// Per-session configuration, built once and passed by reference.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "bon", derive(Builder))]
pub struct StreamOptions {
    /// Where pushed chunks land in the buffer.
    #[cfg_attr(feature = "bon", builder(default))]
    pub position: Position,
    /// Options used for every reconciling parse and render.
    #[cfg_attr(feature = "bon", builder(default = extension_defaults()))]
    pub options: Options<'static>,
}

impl Default for StreamOptions {
    fn default() -> StreamOptions {
        StreamOptions {
            position: Position::default(),
            options: extension_defaults(),
        }
    }
}

/// A streaming session over one document.
///
/// ```
/// let mut stream = markstream::MarkdownStream::new();
/// stream.push("**Fol");
/// assert_eq!(stream.to_html().unwrap(), "<p><strong>Fol</strong></p>\n");
/// stream.push("low** done");
/// assert_eq!(
///     stream.to_html().unwrap(),
///     "<p><strong>Follow</strong> done</p>\n"
/// );
/// ```
#[derive(Debug, Default)]
pub struct MarkdownStream {
    options: StreamOptions,
    buffer: ChunkBuffer,
    document: Document,
}

impl MarkdownStream {
    /// A session with default options.
    pub fn new() -> MarkdownStream {
        MarkdownStream::default()
    }

    /// A session with explicit options.
    pub fn with_options(options: StreamOptions) -> MarkdownStream {
        MarkdownStream {
            options,
            buffer: ChunkBuffer::new(),
            document: Document::default(),
        }
    }

    /// Buffer one chunk. Nothing is parsed until the next read.
    pub fn push(&mut self, chunk: &str) {
        self.buffer.push(chunk, self.options.position);
    }

    /// The document as of everything pushed so far.
    pub fn document(&mut self) -> &Document {
        self.reconcile();
        &self.document
    }

    /// Render the current document to CommonMark.
    pub fn to_markdown(&mut self) -> Result<String, Error> {
        self.reconcile();
        self.document.to_commonmark(&self.options.options)
    }

    /// Render the current document to HTML.
    pub fn to_html(&mut self) -> Result<String, Error> {
        self.reconcile();
        self.document.to_html(&self.options.options)
    }

    fn reconcile(&mut self) {
        let text = merge_stream_buffer("", &self.buffer, None);
        let completed = fragment::complete(&text, "");
        self.document = Document::parse(&completed, &self.options.options);
    }
}
