use crate::directive::node::DirectiveNode;

/// Render every top-level block under `root`, sorted by structural key.
/// The root itself writes nothing.
pub fn render_tree(root: &DirectiveNode) -> String {
    let mut out = String::new();
    for block in root.sorted_children() {
        write_directive(&mut out, block, 0);
    }
    out
}

/// Write one directive and its subtree at `level` (two spaces per level).
pub fn write_directive(out: &mut String, directive: &DirectiveNode, level: usize) {
    let indent = "  ".repeat(level);
    out.push_str(&indent);
    out.push_str(&directive.name);
    if !directive.name.is_empty() && !directive.args.is_empty() {
        out.push(' ');
    }
    out.push_str(&directive.args);
    if directive.children.is_some() {
        out.push_str(" {\n");
        for child in directive.sorted_children() {
            write_directive(out, child, level + 1);
        }
        out.push_str(&indent);
        out.push('}');
    }
    out.push('\n');
}

/// Write `text` as `# ` comment lines.
///
/// Lines are split on the two-character sequence `\n`, not on real newlines.
pub fn render_comment(out: &mut String, text: &str) {
    for line in text.split(r"\n") {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
}
