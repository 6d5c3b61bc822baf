use regex::Regex;
use std::sync::LazyLock;

static SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_[0-9]+$").expect("suffix regex is valid"));

/// Strip one trailing `_<digits>` group from a path segment.
///
/// `header_2` -> `header`, `header_2_3` -> `header_2`, `header` -> `header`.
pub fn remove_suffix(segment: &str) -> &str {
    match SUFFIX_RE.find(segment) {
        Some(m) => &segment[..m.start()],
        None => segment,
    }
}
