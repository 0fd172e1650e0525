//! Streaming Markdown on top of [comrak]: complete fragments cut off
//! mid-construct, and merge freshly parsed nodes into a live document tree.
//!
//! Source repository and detailed `README` is at
//! <https://github.com/kivikakk/markstream>.
//!
//! Text arriving chunk by chunk (an LLM token stream, a chat relay, a
//! long-polled editor) spends most of its life syntactically broken:
//! `**Fol` renders as literal asterisks, an unclosed fence swallows the
//! rest of the page. [`fragment::complete`] appends the smallest suffix
//! that closes whatever a fragment left open:
//!
//! ```
//! use markstream::fragment::complete;
//!
//! assert_eq!(complete("**Fol", ""), "**Fol**");
//! assert_eq!(complete("see [the docs](https://exa", ""), "see [the docs](https://exa)");
//! ```
//!
//! [`MarkdownStream`] wraps that into a session: push chunks as they
//! arrive, read a well-formed document whenever you like.
//!
//! ```
//! let mut stream = markstream::MarkdownStream::new();
//! stream.push("| Name | Stars |\n");
//! assert_eq!(
//!     stream.to_html().unwrap(),
//!     "<table>\n<thead>\n<tr>\n<th>Name</th>\n<th>Stars</th>\n</tr>\n</thead>\n</table>\n"
//! );
//! ```
//!
//! The tree side is exposed through [`Document`]: parse chunks
//! independently and fold their nodes onto the tree with
//! [`Document::append_nodes`], which splices split-up lists back together
//! and wraps loose items and table rows in the container they imply.

#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]
#![allow(unknown_lints, clippy::doc_markdown)]

pub mod document;
pub mod fragment;
mod inlines;
mod merge;
mod scanners;
pub mod stream;
#[cfg(test)]
mod tests;

pub use comrak;

pub use crate::document::{Document, Error, Node};
pub use crate::fragment::{complete, complete_with_state, State};
pub use crate::stream::{
    extension_defaults, merge_stream_buffer, ChunkBuffer, MarkdownStream, Position, StreamOptions,
};
