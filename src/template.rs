//! Value templating against the owning workload entity.
//!
//! Supported syntax is field access only: `{{.Name}}`, `{{ .Spec.Name }}`,
//! `{{.Labels.com.example.key}}`. Everything outside `{{ }}` is literal.
//! The context is a closed attribute map filled in per entity kind by
//! `crate::inventory`; there is no reflection over entity structs.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template: unclosed action at offset {0}")]
    Unclosed(usize),

    #[error("template: unsupported action {0:?}")]
    Unsupported(String),

    #[error("template: can't evaluate field {0}")]
    UnknownField(String),
}

/// Attributes an entity exposes to label values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    attrs: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut ctx = Self::default();
        for (k, v) in pairs {
            ctx.insert(k, v);
        }
        ctx
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.attrs.get(field).map(String::as_str)
    }

    /// Expand `content`, falling back to the unexpanded text on any error.
    pub fn expand(&self, content: &str) -> String {
        match self.try_expand(content) {
            Ok(expanded) => expanded,
            Err(err) => {
                log::warn!("{}; using {:?} unexpanded", err, content);
                content.to_string()
            }
        }
    }

    pub fn try_expand(&self, content: &str) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(content.len());
        let mut rest = content;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];
            let close = after_open
                .find("}}")
                .ok_or(TemplateError::Unclosed(offset + open))?;

            let action = after_open[..close].trim();
            let field = action
                .strip_prefix('.')
                .filter(|f| !f.is_empty() && !f.contains(char::is_whitespace))
                .ok_or_else(|| TemplateError::Unsupported(action.to_string()))?;
            let value = self
                .get(field)
                .ok_or_else(|| TemplateError::UnknownField(field.to_string()))?;
            out.push_str(value);

            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        out.push_str(rest);

        Ok(out)
    }
}
