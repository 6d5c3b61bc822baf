//! Generator options from CLI flags and environment variables.
//!
//! A non-empty environment variable wins over the corresponding flag.

use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

pub const DEFAULT_LABEL_PREFIX: &str = "caddy";
pub const LABEL_PREFIX_ENV: &str = "CADDY_DOCKER_LABEL_PREFIX";
pub const PROXY_SERVICE_TASKS_ENV: &str = "CADDY_DOCKER_PROXY_SERVICE_TASKS";

static TRUTHY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(true|yes|1)$").expect("truthy regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub label_prefix: String,

    /// Proxy services through `tasks.<name>` instead of their VIP name.
    pub proxy_service_tasks: bool,

    /// The proxy's own container id. Read from the cgroup file when unset.
    pub proxy_container_id: Option<String>,

    pub cgroup_path: PathBuf,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            proxy_service_tasks: false,
            proxy_container_id: None,
            cgroup_path: PathBuf::from(crate::inventory::SELF_CGROUP),
        }
    }
}

impl GeneratorOptions {
    /// Merge flag values with the process environment.
    pub fn from_flags(label_prefix: String, proxy_service_tasks: bool) -> Self {
        Self::from_flags_and_env(label_prefix, proxy_service_tasks, |key| {
            std::env::var(key).ok()
        })
    }

    pub fn from_flags_and_env<E>(label_prefix: String, proxy_service_tasks: bool, env: E) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());

        let label_prefix = non_empty(LABEL_PREFIX_ENV).unwrap_or(label_prefix);
        let proxy_service_tasks = match non_empty(PROXY_SERVICE_TASKS_ENV) {
            Some(value) => is_true(&value),
            None => proxy_service_tasks,
        };

        Self {
            label_prefix,
            proxy_service_tasks,
            ..Default::default()
        }
    }
}

/// `true`, `yes` or `1`, case-insensitive.
pub fn is_true(value: &str) -> bool {
    TRUTHY_RE.is_match(value)
}
