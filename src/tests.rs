use comrak::nodes::NodeValue;

use crate::*;

mod pathological;
mod streaming;

#[track_caller]
fn compare_strs(output: &str, expected: &str, kind: &str, original_input: &str) {
    if output != expected {
        println!("Running {} test", kind);
        println!("Original Input:");
        println!("==============================");
        println!("{}", original_input);
        println!("==============================");
        println!("Got:");
        println!("==============================");
        println!("{}", output);
        println!("==============================");
        println!();
        println!("Expected:");
        println!("==============================");
        println!("{}", expected);
        println!("==============================");
        println!();
    }
    assert_eq!(output, expected);
}

/// Completes `fragment` and checks the result, then re-completes the
/// result and checks it stays put.
#[track_caller]
fn assert_complete(fragment: &str, expected: &str) {
    let closed = complete(fragment, "");
    compare_strs(&closed, expected, "completion", fragment);
    let again = complete(&closed, "");
    compare_strs(&again, expected, "recompletion", &closed);
}

#[track_caller]
fn assert_intact(fragment: &str) {
    assert_complete(fragment, fragment);
}

fn parse(input: &str) -> Document {
    Document::parse(input, &extension_defaults())
}

#[track_caller]
fn assert_html(doc: &Document, expected: &str, original_input: &str) {
    let output = doc.to_html(&extension_defaults()).unwrap();
    compare_strs(&output, expected, "html", original_input);
}

#[track_caller]
fn assert_commonmark(doc: &Document, expected: &str, original_input: &str) {
    let output = doc.to_commonmark(&extension_defaults()).unwrap();
    compare_strs(&output, expected, "commonmark", original_input);
}

/// Every parent-child edge in `doc` satisfies the containment rules.
#[track_caller]
fn assert_containment(doc: &Document) {
    fn check(parent: &Node) {
        for child in &parent.children {
            assert!(
                crate::merge::can_contain(parent, child),
                "{:?} may not contain {:?}",
                parent.value,
                child.value
            );
            check(child);
        }
    }
    check(&Node {
        value: NodeValue::Document,
        children: doc.nodes.clone(),
    });
}
