use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

fn main() {
    stamp_git_metadata();
    embed_webui();
}

/// Generates `embedded_webui.rs` with every file under `webui/dist` baked in.
fn embed_webui() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
    let dist_dir = manifest_dir.join("webui").join("dist");
    let output = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR")).join("embedded_webui.rs");
    println!("cargo:rerun-if-changed={}", dist_dir.display());

    let mut assets = Vec::new();
    walk_assets(&dist_dir, &dist_dir, &mut assets);
    assets.sort();

    let mut source = String::from("static ASSETS: &[(&str, &[u8])] = &[\n");
    for (relative, absolute) in &assets {
        source.push_str(&format!(
            "    (\"{relative}\", include_bytes!(r#\"{absolute}\"#) as &[u8]),\n"
        ));
    }
    source.push_str("];\n\n");
    source.push_str("pub fn has_assets() -> bool {\n    !ASSETS.is_empty()\n}\n\n");
    source.push_str(
        "pub fn get_asset(path: &str) -> Option<&'static [u8]> {\n    \
         ASSETS.iter().find(|(name, _)| *name == path).map(|(_, bytes)| *bytes)\n}\n",
    );

    fs::write(&output, source).expect("failed to write embedded_webui.rs");
}

fn walk_assets(base: &Path, dir: &Path, assets: &mut Vec<(String, String)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            walk_assets(base, &path, assets);
        } else if let Ok(relative) = path.strip_prefix(base) {
            assets.push((
                relative.to_string_lossy().replace('\\', "/"),
                path.to_string_lossy().replace('\\', "/"),
            ));
        }
    }
}

fn stamp_git_metadata() {
    for (key, args, fallback) in [
        ("CCD_BUILD_GIT_TAG", &["describe", "--tags", "--exact-match"][..], "untagged"),
        ("CCD_BUILD_GIT_COMMIT", &["rev-parse", "--short=12", "HEAD"][..], "unknown"),
    ] {
        println!("cargo:rerun-if-env-changed={key}");
        let value = env::var(key)
            .ok()
            .or_else(|| git_output(args))
            .unwrap_or_else(|| fallback.to_string());
        println!("cargo:rustc-env={key}={value}");
    }

    println!("cargo:rerun-if-env-changed=CCD_BUILD_GIT_DIRTY");
    let dirty = env::var("CCD_BUILD_GIT_DIRTY").unwrap_or_else(|_| {
        git_output(&["status", "--porcelain", "--untracked-files=no"])
            .map(|status| (!status.is_empty()).to_string())
            .unwrap_or_else(|| "false".to_string())
    });
    println!("cargo:rustc-env=CCD_BUILD_GIT_DIRTY={dirty}");
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|value| value.trim().to_string())
}
