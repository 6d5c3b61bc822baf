use std::collections::HashMap;

/// One Caddyfile directive, possibly with a nested block.
///
/// `key` is the raw (possibly suffixed) path segment and is what the parent's
/// `children` map is keyed by; `name` is what gets written. `header_1` and
/// `header_2` are distinct siblings that both render as `header`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveNode {
    pub key: String,
    pub name: String,
    pub args: String,

    /// `None` until a child is first inserted. An existing but empty map still
    /// renders a `{ }` block (e.g. after the rewrite removed every child).
    pub children: Option<HashMap<String, DirectiveNode>>,
}

impl DirectiveNode {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, key: &str) -> Option<&DirectiveNode> {
        self.children.as_ref()?.get(key)
    }

    /// Descend into child `key`, creating it with display name `name` if absent.
    /// An existing child keeps its current name.
    pub fn child_or_insert(&mut self, key: &str, name: &str) -> &mut DirectiveNode {
        self.children
            .get_or_insert_with(HashMap::new)
            .entry(key.to_string())
            .or_insert_with(|| DirectiveNode {
                key: key.to_string(),
                name: name.to_string(),
                ..Default::default()
            })
    }

    pub fn remove_child(&mut self, key: &str) -> Option<DirectiveNode> {
        self.children.as_mut()?.remove(key)
    }

    /// Children sorted by structural key (plain string order).
    pub fn sorted_children(&self) -> Vec<&DirectiveNode> {
        let mut out: Vec<&DirectiveNode> = match &self.children {
            Some(children) => children.values().collect(),
            None => Vec::new(),
        };
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }
}
