//! Saves-root path resolution.

use std::{
    fs,
    path::{Path, PathBuf},
};

use script::file_name_component;

/// Absolute, normalized form of the saves root. Falls back to a lexically
/// absolute path when the root does not exist yet.
pub fn resolve_base(base: &Path) -> PathBuf {
    fs::canonicalize(base)
        .or_else(|_| std::path::absolute(base))
        .unwrap_or_else(|_| base.to_path_buf())
}

/// Resolves `world_name` to an existing directory directly under `base`.
///
/// Only the last path component of `world_name` is used, so neither `../`
/// sequences nor absolute paths can escape the saves root.
pub fn resolve_world(base: &Path, world_name: &str) -> Option<PathBuf> {
    let name = file_name_component(world_name)?;
    let world_path = resolve_base(base).join(name);
    world_path.is_dir().then_some(world_path)
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn scratch_root(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or(0);
        let root = std::env::temp_dir().join(format!("ccd-paths-{name}-{now}"));
        fs::create_dir_all(&root).expect("scratch root should be created");
        root
    }

    #[test]
    fn existing_world_resolves_under_base() {
        let root = scratch_root("existing");
        fs::create_dir_all(root.join("Survival")).expect("world dir");

        let resolved = resolve_world(&root, "Survival").expect("world should resolve");
        assert_eq!(resolved, resolve_base(&root).join("Survival"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn traversal_is_reduced_to_last_component() {
        let root = scratch_root("traversal");
        assert_eq!(resolve_world(&root, "../../etc"), None);

        fs::create_dir_all(root.join("etc")).expect("etc dir");
        assert_eq!(
            resolve_world(&root, "../../etc"),
            Some(resolve_base(&root).join("etc"))
        );
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn plain_file_is_not_a_world() {
        let root = scratch_root("file");
        fs::write(root.join("level.dat"), b"").expect("file");
        assert_eq!(resolve_world(&root, "level.dat"), None);
        assert_eq!(resolve_world(&root, ".."), None);
        let _ = fs::remove_dir_all(&root);
    }
}
