use crate::directive::node::DirectiveNode;
use thiserror::Error;

pub const ADDRESS: &str = "address";
pub const TARGET_PORT: &str = "targetport";
pub const TARGET_PATH: &str = "targetpath";
pub const TARGET_PROTOCOL: &str = "targetprotocol";

/// Keys consumed by the rewrite; none survive under a top-level block.
pub const MAGIC_KEYS: [&str; 4] = [ADDRESS, TARGET_PORT, TARGET_PATH, TARGET_PROTOCOL];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{kind} {id} and caddy are not in same network")]
    NotInNetwork { kind: &'static str, id: String },

    #[error("Label {block}.targetprotocol requires {block}.targetport")]
    MissingTargetPort { block: String },
}

/// Apply the magic-key rewrite to every top-level block under `root`.
///
/// Only immediate children of the root are rewritten; magic keys deeper in
/// the tree are left as ordinary directives. The first failure aborts.
pub fn rewrite_magic_keys<F>(
    root: &mut DirectiveNode,
    mut resolve_target: F,
) -> Result<(), ResolveError>
where
    F: FnMut() -> Result<String, ResolveError>,
{
    let Some(children) = root.children.as_mut() else {
        return Ok(());
    };
    let mut keys: Vec<String> = children.keys().cloned().collect();
    keys.sort();
    for key in keys {
        if let Some(block) = children.get_mut(&key) {
            rewrite_block(block, &mut resolve_target)?;
        }
    }
    Ok(())
}

fn rewrite_block<F>(block: &mut DirectiveNode, resolve_target: &mut F) -> Result<(), ResolveError>
where
    F: FnMut() -> Result<String, ResolveError>,
{
    if let Some(address) = block.child(ADDRESS).map(|a| a.args.clone()) {
        block.name = address;
    }

    let arg = |key: &str| block.child(key).map(|c| c.args.clone());
    let port = arg(TARGET_PORT);
    let path = arg(TARGET_PATH);
    let protocol = arg(TARGET_PROTOCOL);

    if port.is_some() || protocol.is_some() {
        let Some(port) = port else {
            return Err(ResolveError::MissingTargetPort {
                block: block.key.clone(),
            });
        };
        let target = resolve_target()?;

        let mut args = String::from("/ ");
        if let Some(protocol) = protocol {
            args.push_str(&protocol);
            args.push_str("://");
        }
        args.push_str(&target);
        args.push(':');
        args.push_str(&port);
        if let Some(path) = path {
            args.push_str(&path);
        }
        block.child_or_insert("proxy", "proxy").args = args;
    }

    for key in MAGIC_KEYS {
        block.remove_child(key);
    }
    Ok(())
}
