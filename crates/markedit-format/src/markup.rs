//! Markup serializer.
//!
//! A negative indent minifies: no line breaks, text whitespace collapsed.
//! Any other indent pretty-prints one element per line, `indent * depth`
//! spaces deep, with each line of an element's text on its own line one
//! level further in. Attribute values are always written double-quoted.

use markedit_parser::{collapse_whitespace, Node, NodeId, Tree};
use tracing::instrument;

enum Work {
    Open(NodeId, usize),
    Close(NodeId, usize),
}

/// Render `tree` as markup text. An empty tree renders as `""`.
#[instrument(level = "debug", skip(tree), fields(nodes = tree.size()))]
pub fn dump(tree: &Tree, indent: i32) -> String {
    let Some(root) = tree.root() else {
        return String::new();
    };

    let mut out = Output::new(indent);
    let mut stack = vec![Work::Open(root, 0)];

    while let Some(work) = stack.pop() {
        match work {
            Work::Open(id, depth) => {
                let node = &tree[id];
                let tag = start_tag(node);

                if node.is_self_closing() {
                    out.line(depth, &tag);
                    continue;
                }

                if node.text().is_empty() && node.is_leaf() {
                    out.line(depth, &format!("{tag}{}", end_tag(&node.tag)));
                    continue;
                }

                out.line(depth, &tag);
                out.text(depth + 1, node.text());

                stack.push(Work::Close(id, depth));
                stack.extend(
                    node.children()
                        .iter()
                        .rev()
                        .map(|&child| Work::Open(child, depth + 1)),
                );
            }
            Work::Close(id, depth) => out.line(depth, &end_tag(&tree[id].tag)),
        }
    }

    out.finish()
}

/// `<tag a="v">`, or `<tag a="v"/>` for a self-closing node.
fn start_tag(node: &Node) -> String {
    let mut tag = format!("<{}", node.tag);
    for (name, value) in node.attributes.iter() {
        tag.push_str(&format!(" {name}=\"{value}\""));
    }
    tag.push_str(if node.is_self_closing() {
        "/>"
    } else if node.attributes.is_empty() {
        tag_terminator(&node.tag)
    } else {
        ">"
    });
    tag
}

/// `</tag>`
fn end_tag(name: &str) -> String {
    format!("</{name}{}", tag_terminator(name))
}

/// `>` for a bare tag name. Names ending in `/`, `?` or `-` get a space
/// first so the `>` does not fuse into `/>`, `?>` or `-->`.
fn tag_terminator(name: &str) -> &'static str {
    if name.ends_with(['/', '?', '-']) {
        " >"
    } else {
        ">"
    }
}

struct Output {
    buf: String,
    /// `None` when minifying.
    indent: Option<usize>,
}

impl Output {
    fn new(indent: i32) -> Self {
        Self {
            buf: String::new(),
            indent: usize::try_from(indent).ok(),
        }
    }

    fn line(&mut self, depth: usize, content: &str) {
        if let Some(width) = self.indent {
            if !self.buf.is_empty() {
                self.buf.push('\n');
            }
            self.buf.extend(std::iter::repeat(' ').take(width * depth));
        }
        self.buf.push_str(content);
    }

    fn text(&mut self, depth: usize, text: &str) {
        if self.indent.is_none() {
            self.buf.push_str(&collapse_whitespace(text));
            return;
        }
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.line(depth, line);
        }
    }

    fn finish(self) -> String {
        self.buf
    }
}
