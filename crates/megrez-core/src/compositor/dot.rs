//! Graphviz dump of the grid, used as a golden-output fixture.

use std::fmt::Write;

use super::Compositor;

impl Compositor {
    /// Render the grid as a `digraph`: `BOS`, every node by its current value
    /// with an edge to each node starting where it ends, and `EOS`.
    ///
    /// Output is a pure function of the grid contents.
    pub fn dump_dot(&self) -> String {
        let spans = self.grid.spans();
        let mut out = String::from("digraph {\ngraph [ rankdir=LR ];\nBOS;\n");
        for (p, span) in spans.iter().enumerate() {
            for node in span.nodes() {
                let value = node.value();
                if p == 0 {
                    let _ = writeln!(out, "BOS -> {value};");
                }
                let _ = writeln!(out, "{value};");
                let end = p + node.span_length();
                if let Some(next) = spans.get(end) {
                    for dest in next.nodes() {
                        let _ = writeln!(out, "{value} -> {};", dest.value());
                    }
                }
                if end == spans.len() {
                    let _ = writeln!(out, "{value} -> EOS;");
                }
            }
        }
        out.push_str("EOS;\n}\n");
        out
    }
}
