//! On-disk layout of the ComputerCraft data inside a world save.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::settings::write_bytes_to_disk;

pub const COMPUTERCRAFT_DIR: &str = "computercraft";
pub const DEVICE_ROOT_DIR: &str = "computer";
pub const IDS_FILE: &str = "ids.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct IdsCounter {
    #[serde(default)]
    computer: u64,
}

/// What `connect` found inside a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldProbe {
    pub computercraft_installed: bool,
    pub computers_found: bool,
    pub max_computer_id: u64,
}

#[derive(Clone, Debug)]
pub struct WorldLayout {
    world_path: PathBuf,
}

impl WorldLayout {
    pub fn new(world_path: impl Into<PathBuf>) -> Self {
        Self {
            world_path: world_path.into(),
        }
    }

    pub fn world_path(&self) -> &Path {
        &self.world_path
    }

    pub fn computercraft_dir(&self) -> PathBuf {
        self.world_path.join(COMPUTERCRAFT_DIR)
    }

    pub fn device_root(&self) -> PathBuf {
        self.computercraft_dir().join(DEVICE_ROOT_DIR)
    }

    pub fn ids_file(&self) -> PathBuf {
        self.computercraft_dir().join(IDS_FILE)
    }

    pub fn device_dir(&self, computer_id: &str) -> PathBuf {
        self.device_root().join(computer_id)
    }

    /// Inspects the mod directory, creating the id counter when the mod
    /// directory exists without one.
    pub fn probe(&self) -> WorldProbe {
        let computercraft_installed = self.computercraft_dir().is_dir();
        let computers_found = computercraft_installed && self.device_root().is_dir();
        let max_computer_id = if !computercraft_installed {
            0
        } else if self.ids_file().exists() {
            self.read_max_computer_id()
        } else {
            if let Err(err) = self.ensure_ids_file() {
                warn!(
                    "failed to create ids counter path={} err={err}",
                    self.ids_file().display()
                );
            }
            0
        };
        WorldProbe {
            computercraft_installed,
            computers_found,
            max_computer_id,
        }
    }

    /// Highest id the mod has handed out. Corrupt counters read as zero.
    pub fn read_max_computer_id(&self) -> u64 {
        let path = self.ids_file();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) => {
                warn!("failed to read ids counter path={} err={err}", path.display());
                return 0;
            }
        };
        match serde_json::from_slice::<IdsCounter>(&data) {
            Ok(counter) => counter.computer,
            Err(err) => {
                warn!("ids counter is corrupted path={} err={err}", path.display());
                0
            }
        }
    }

    /// Writes `{"computer": 0}` unless a counter already exists.
    pub fn ensure_ids_file(&self) -> Result<(), String> {
        let path = self.ids_file();
        if path.exists() {
            return Ok(());
        }
        let bytes = serde_json::to_vec_pretty(&IdsCounter::default())
            .map_err(|err| format!("failed to serialize ids counter: {err}"))?;
        write_bytes_to_disk(&path, &bytes)?;
        info!("ids counter created at {}", path.display());
        Ok(())
    }

    /// Creates the mod directory, the device root and the id counter. Safe to
    /// call repeatedly.
    pub fn create_directories(&self) -> Result<(), String> {
        let computercraft = self.computercraft_dir();
        fs::create_dir_all(&computercraft)
            .map_err(|err| format!("{}: {err}", computercraft.display()))?;
        let device_root = self.device_root();
        fs::create_dir_all(&device_root)
            .map_err(|err| format!("{}: {err}", device_root.display()))?;
        self.ensure_ids_file()
    }

    /// Device ids present under the device root, in numeric order.
    ///
    /// Folders may be named `7` or `[7]`; anything that is not all digits once
    /// the brackets are trimmed is ignored.
    pub fn list_device_ids(&self) -> io::Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.device_root())? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let trimmed = name.trim_matches(&['[', ']'][..]);
            if !trimmed.is_empty() && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
                ids.push(trimmed.to_string());
            }
        }
        ids.sort_by(|lhs, rhs| {
            match (lhs.parse::<u128>(), rhs.parse::<u128>()) {
                (Ok(left), Ok(right)) => left.cmp(&right).then_with(|| lhs.cmp(rhs)),
                _ => lhs.cmp(rhs),
            }
        });
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn scratch_world(name: &str) -> WorldLayout {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or(0);
        let world = std::env::temp_dir().join(format!("ccd-layout-{name}-{now}"));
        fs::create_dir_all(&world).expect("world dir should be created");
        WorldLayout::new(world)
    }

    #[test]
    fn probe_without_mod_reports_nothing_and_writes_nothing() {
        let layout = scratch_world("bare");
        let probe = layout.probe();
        assert!(!probe.computercraft_installed);
        assert!(!probe.computers_found);
        assert_eq!(probe.max_computer_id, 0);
        assert!(!layout.ids_file().exists());
        let _ = fs::remove_dir_all(layout.world_path());
    }

    #[test]
    fn probe_initializes_missing_counter() {
        let layout = scratch_world("init");
        fs::create_dir_all(layout.computercraft_dir()).expect("mod dir");
        let probe = layout.probe();
        assert!(probe.computercraft_installed);
        assert!(!probe.computers_found);
        assert!(layout.ids_file().exists());
        let _ = fs::remove_dir_all(layout.world_path());
    }

    #[test]
    fn create_directories_keeps_existing_counter() {
        let layout = scratch_world("idempotent");
        layout.create_directories().expect("first create");
        fs::write(layout.ids_file(), br#"{"computer": 12}"#).expect("counter");
        layout.create_directories().expect("second create");
        assert_eq!(layout.read_max_computer_id(), 12);
        assert!(layout.probe().computers_found);
        let _ = fs::remove_dir_all(layout.world_path());
    }

    #[test]
    fn corrupt_counter_reads_as_zero() {
        let layout = scratch_world("corrupt");
        fs::create_dir_all(layout.computercraft_dir()).expect("mod dir");
        fs::write(layout.ids_file(), b"][").expect("counter");
        assert_eq!(layout.probe().max_computer_id, 0);
        let _ = fs::remove_dir_all(layout.world_path());
    }

    #[test]
    fn device_ids_accept_brackets_and_skip_others() {
        let layout = scratch_world("ids");
        let root = layout.device_root();
        for name in ["10", "[2]", "007", "0", "notes", "3a"] {
            fs::create_dir_all(root.join(name)).expect("device dir");
        }
        fs::write(root.join("5"), b"").expect("plain file");

        let ids = layout.list_device_ids().expect("ids should list");
        assert_eq!(ids, vec!["0", "2", "007", "10"]);
        let _ = fs::remove_dir_all(layout.world_path());
    }
}
