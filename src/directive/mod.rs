//! Label-to-directive compiler.
//!
//! A compile runs as a fixed pipeline over one workload entity:
//! - build: filtered labels -> nested `DirectiveNode` tree
//! - rewrite: magic keys under each top-level block -> `proxy` directive
//! - render: tree -> Caddyfile text, children sorted by structural key

pub mod build;
pub mod node;
pub mod render;
pub mod rewrite;
pub mod suffix;

pub use build::{LabelFilter, build_tree};
pub use node::DirectiveNode;
pub use render::{render_comment, render_tree};
pub use rewrite::{ResolveError, rewrite_magic_keys};

use crate::template::TemplateContext;

/// Compile one entity's labels into Caddyfile text.
///
/// Returns an empty string when no label matches `filter`. A resolver failure
/// aborts the whole entity; the caller decides how to report it.
pub fn compile<I, K, V, F>(
    labels: I,
    filter: &LabelFilter,
    context: &TemplateContext,
    resolve_target: F,
) -> Result<String, ResolveError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
    F: FnMut() -> Result<String, ResolveError>,
{
    let mut root = DirectiveNode::root();
    build_tree(labels, filter, context, &mut root);
    rewrite_magic_keys(&mut root, resolve_target)?;
    Ok(render_tree(&root))
}
