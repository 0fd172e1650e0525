use super::*;
use ntest::timeout;

fn render(doc: &Document) -> String {
    doc.to_html(&extension_defaults()).unwrap()
}

// input: python3 -c 'n = 50000; print("*a_ " * n)'
#[test]
#[timeout(4000)]
fn pathological_emphasis_completion() {
    let n = 50_000;
    let input = "*a_ ".repeat(n);
    let closed = complete(&input, "");
    assert!(closed.len() >= input.len());
    assert!(!render(&parse(&closed)).is_empty());
}

// input: python3 -c 'n = 50000; print("**a " * n)'
#[test]
#[timeout(4000)]
fn pathological_strong_completion() {
    let n = 50_000;
    let input = "**a ".repeat(n);
    let closed = complete(&input, "");
    assert!(closed.len() >= input.len());
    assert!(!render(&parse(&closed)).is_empty());
}

// input: python3 -c 'n = 100000; print("```\n" + "x\n" * n, end="")'
#[test]
#[timeout(4000)]
fn pathological_fence_body() {
    let n = 100_000;
    let input = format!("```\n{}", "x\n".repeat(n));
    let closed = complete(&input, "");
    assert!(closed.ends_with("```"));
    assert!(render(&parse(&closed)).starts_with("<pre><code>"));
}

// input: python3 -c 'n = 20000; print("[a](b " * n)'
#[test]
#[timeout(4000)]
fn pathological_link_heads() {
    let n = 20_000;
    let input = "[a](b ".repeat(n);
    let closed = complete(&input, "");
    assert!(closed.len() > input.len());
    // The closers land before the preserved trailing space.
    assert!(closed.trim_end().ends_with(')'));
    assert!(!render(&parse(&closed)).is_empty());
}

#[test]
#[timeout(4000)]
fn pathological_list_splices() {
    let n = 10_000;
    let mut doc = parse("- item\n");
    for _ in 1..n {
        doc.merge(parse("- item\n")).unwrap();
    }
    assert_eq!(doc.nodes.len(), 1);
    assert_eq!(doc.nodes[0].children.len(), n);
}

#[test]
#[timeout(4000)]
fn pathological_stream_reads() {
    let n = 500;
    let mut stream = MarkdownStream::new();
    for _ in 0..n {
        stream.push("lorem ipsum ");
        assert!(!stream.to_html().unwrap().is_empty());
    }
    let output = stream.to_html().unwrap();
    assert!(output.starts_with("<p>lorem ipsum"));
    assert!(output.ends_with("ipsum</p>\n"));
}
