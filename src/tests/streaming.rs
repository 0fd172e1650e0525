use comrak::nodes::NodeValue;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn mid_stream_reads_see_completed_markup() {
    let mut stream = MarkdownStream::new();
    stream.push("**Fol");
    assert_eq!(stream.to_html().unwrap(), "<p><strong>Fol</strong></p>\n");

    stream.push("low** done");
    assert_eq!(
        stream.to_html().unwrap(),
        "<p><strong>Follow</strong> done</p>\n"
    );
}

#[test]
fn final_read_matches_the_one_shot_parse() {
    let chunks = [
        "# Str",
        "eaming\n\n- it",
        "em one\n- item",
        " two\n\n```rs\nfn ma",
        "in() {}\n```\n",
    ];
    let mut stream = MarkdownStream::new();
    for chunk in chunks {
        stream.push(chunk);
        assert!(!stream.to_html().unwrap().is_empty());
    }

    let whole = chunks.concat();
    assert_eq!(stream.document(), &parse(&whole));
    assert_eq!(
        stream.to_html().unwrap(),
        parse(&whole).to_html(&extension_defaults()).unwrap()
    );
}

#[test]
fn open_fences_grow_instead_of_sealing() {
    let mut stream = MarkdownStream::new();
    stream.push("```rust\nlet a");
    assert_eq!(
        stream.to_html().unwrap(),
        "<pre><code class=\"language-rust\">let a\n</code></pre>\n"
    );

    stream.push(" = 1;\nlet b = 2;\n```\n");
    assert_eq!(
        stream.to_html().unwrap(),
        "<pre><code class=\"language-rust\">let a = 1;\nlet b = 2;\n</code></pre>\n"
    );
}

#[test]
fn tables_render_row_by_row() {
    let mut stream = MarkdownStream::new();
    stream.push("| Name | Stars |\n");
    assert_eq!(
        stream.to_html().unwrap(),
        "<table>\n<thead>\n<tr>\n<th>Name</th>\n<th>Stars</th>\n</tr>\n</thead>\n</table>\n"
    );

    stream.push("| - | - |\n| comrak | 1k |\n");
    assert_eq!(
        stream.to_html().unwrap(),
        concat!(
            "<table>\n",
            "<thead>\n<tr>\n<th>Name</th>\n<th>Stars</th>\n</tr>\n</thead>\n",
            "<tbody>\n<tr>\n<td>comrak</td>\n<td>1k</td>\n</tr>\n</tbody>\n",
            "</table>\n"
        )
    );
}

#[test]
fn top_position_prepends_chunks() {
    let options = StreamOptions {
        position: Position::Top,
        options: extension_defaults(),
    };
    let mut stream = MarkdownStream::with_options(options);
    stream.push("world\n");
    stream.push("hello ");
    assert_eq!(stream.to_html().unwrap(), "<p>hello world</p>\n");
}

#[test]
fn empty_streams_render_nothing() {
    let mut stream = MarkdownStream::new();
    assert_eq!(stream.to_html().unwrap(), "");
    assert_eq!(stream.to_markdown().unwrap(), "");
    assert!(stream.document().nodes.is_empty());
}

#[test]
fn document_reads_reflect_all_pushes() {
    let mut stream = MarkdownStream::new();
    stream.push("> quo");
    assert_eq!(stream.document().nodes.len(), 1);

    stream.push("te line\n");
    let doc = stream.document();
    assert!(matches!(doc.nodes[0].value, NodeValue::BlockQuote));
}

#[test]
fn markdown_reads_are_canonical() {
    let mut stream = MarkdownStream::new();
    stream.push("- item one\n- item");
    assert_eq!(stream.to_markdown().unwrap(), "- item one\n- item\n");

    stream.push(" two **bold");
    assert_eq!(
        stream.to_markdown().unwrap(),
        "- item one\n- item two **bold**\n"
    );
}

#[test]
fn chunk_buffer_orders_pushes() {
    let mut buffer = ChunkBuffer::new();
    assert!(buffer.is_empty());

    buffer.push("middle ", Position::Bottom);
    buffer.push("start ", Position::Top);
    buffer.push("end", Position::Bottom);
    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.concat(), "start middle end");
}

#[test]
fn merge_joins_existing_and_buffered() {
    let mut buffer = ChunkBuffer::new();
    buffer.push("next chunk", Position::Bottom);

    // Trailing newlines on the existing text collapse to a single break.
    assert_eq!(
        merge_stream_buffer("intro\n\n", &buffer, None),
        "intro\nnext chunk"
    );
    assert_eq!(merge_stream_buffer("", &buffer, None), "next chunk");
}

#[test]
fn synthetic_fence_closers_are_stripped() {
    let doc = parse("```rust\nlet a\n```\n");
    let last = doc.nodes.last().unwrap();

    let mut buffer = ChunkBuffer::new();
    buffer.push(" = 1;\n", Position::Bottom);
    assert_eq!(
        merge_stream_buffer("```rust\nlet a\n```\n", &buffer, Some(last)),
        "```rust\nlet a\n = 1;\n"
    );
}

#[test]
fn content_resembling_a_closer_stays() {
    let doc = parse("````rust\ncode\n````\n");
    let last = doc.nodes.last().unwrap();

    let mut buffer = ChunkBuffer::new();
    buffer.push("after", Position::Bottom);

    // A shorter run than the fence opened with is content, not a closer.
    assert_eq!(
        merge_stream_buffer("````rust\ncode\n```\n", &buffer, Some(last)),
        "````rust\ncode\n```\nafter"
    );
}
