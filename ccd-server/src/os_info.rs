use std::{env::consts, fs};

use serde::{Deserialize, Serialize};
use sysinfo::System;

const PROC_VERSION: &str = "/proc/version";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    /// `posix` or `nt`.
    pub os_name: String,
    /// `linux`, `win32`, `darwin`, ...
    pub platform: String,
    /// `Linux`, `Windows`, `Darwin`, ...
    pub system: String,
    /// Kernel release string.
    pub release: String,
    pub is_wsl: bool,
}

pub fn current() -> OsInfo {
    OsInfo {
        os_name: os_name(consts::FAMILY).to_string(),
        platform: platform(consts::OS).to_string(),
        system: system(consts::OS).to_string(),
        release: System::kernel_version().unwrap_or_default(),
        is_wsl: is_wsl(),
    }
}

/// True when the Linux kernel looks like one shipped by the Windows
/// compatibility layer. Any read failure means no.
pub fn is_wsl() -> bool {
    fs::read_to_string(PROC_VERSION)
        .map(|version| kernel_version_is_wsl(&version))
        .unwrap_or(false)
}

pub fn kernel_version_is_wsl(version: &str) -> bool {
    let version = version.to_lowercase();
    version.contains("microsoft") || version.contains("wsl")
}

fn os_name(family: &str) -> &str {
    match family {
        "unix" => "posix",
        "windows" => "nt",
        other => other,
    }
}

fn platform(os: &str) -> &str {
    match os {
        "windows" => "win32",
        "macos" | "ios" => "darwin",
        other => other,
    }
}

fn system(os: &str) -> &str {
    match os {
        "linux" | "android" => "Linux",
        "windows" => "Windows",
        "macos" | "ios" => "Darwin",
        "freebsd" => "FreeBSD",
        "openbsd" => "OpenBSD",
        "netbsd" => "NetBSD",
        other => other,
    }
}
