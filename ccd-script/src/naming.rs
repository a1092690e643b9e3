//! File name rules for deployed scripts.

use std::path::Path;

pub const LUA_EXTENSION: &str = ".lua";

/// Strips a requested name down to its final path component, so `../../etc`
/// becomes `etc` and `/abs/path` becomes `path`. Returns `None` when nothing
/// usable is left (`..`, `/`, empty).
pub fn file_name_component(raw: &str) -> Option<String> {
    Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .filter(|name| !name.is_empty())
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_unit_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Destination file for an extracted function.
pub fn unit_file_name(name: &str) -> String {
    format!("{}{LUA_EXTENSION}", sanitize_unit_name(name))
}

/// Destination file for a whole script written without splitting.
pub fn script_file_name(requested: &str) -> Option<String> {
    let mut name = file_name_component(requested)?;
    if !name.ends_with(LUA_EXTENSION) {
        name.push_str(LUA_EXTENSION);
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_each_disallowed_char() {
        assert_eq!(sanitize_unit_name("a b!c"), "a_b_c");
        assert_eq!(sanitize_unit_name("keep_this-one9"), "keep_this-one9");
        assert_eq!(sanitize_unit_name("héllo"), "h_llo");
    }

    #[test]
    fn traversal_collapses_to_last_component() {
        assert_eq!(file_name_component("../../etc").as_deref(), Some("etc"));
        assert_eq!(file_name_component("/var/lib/world").as_deref(), Some("world"));
        assert_eq!(file_name_component(".."), None);
        assert_eq!(file_name_component(""), None);
    }

    #[test]
    fn script_file_name_appends_extension_once() {
        assert_eq!(script_file_name("startup").as_deref(), Some("startup.lua"));
        assert_eq!(script_file_name("startup.lua").as_deref(), Some("startup.lua"));
        assert_eq!(script_file_name("dir/miner.txt").as_deref(), Some("miner.txt.lua"));
    }
}
