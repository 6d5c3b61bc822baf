use crate::directive::node::DirectiveNode;
use crate::directive::suffix::remove_suffix;
use crate::template::TemplateContext;
use regex::Regex;

/// Selects the labels that belong to the generator.
///
/// Matches `<prefix>`, `<prefix>_<digits>`, and either of those followed by
/// `.<anything>`. `caddyfoo.bar` does not match prefix `caddy`.
#[derive(Debug, Clone)]
pub struct LabelFilter {
    re: Regex,
}

impl LabelFilter {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let re = Regex::new(&format!(r"^{}(_[0-9]+)?(\.|$)", regex::escape(prefix)))?;
        Ok(Self { re })
    }

    pub fn matches(&self, label: &str) -> bool {
        self.re.is_match(label)
    }
}

/// Populate `root` from the labels that pass `filter`.
///
/// Each key is split on `.` and walked from the root, creating nodes on the
/// way. Top-level nodes (depth 0) start with an empty display name; deeper
/// nodes are named after their segment minus any `_<digits>` suffix. The
/// terminal node's args are the template-expanded value.
///
/// If two labels land on the same node, the one visited last wins, so the
/// result depends on the iteration order of `labels`.
pub fn build_tree<I, K, V>(
    labels: I,
    filter: &LabelFilter,
    context: &TemplateContext,
    root: &mut DirectiveNode,
) where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (label, value) in labels {
        let label = label.as_ref();
        if !filter.matches(label) {
            continue;
        }

        let mut directive = &mut *root;
        for (depth, segment) in label.split('.').enumerate() {
            let name = if depth == 0 { "" } else { remove_suffix(segment) };
            directive = directive.child_or_insert(segment, name);
        }
        directive.args = context.expand(value.as_ref());
    }
}
