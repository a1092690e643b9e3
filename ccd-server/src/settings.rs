use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// The connected world, persisted between restarts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub world_name: String,
    pub saves_path: PathBuf,
}

impl Settings {
    /// A settings file with an empty name or path counts as not connected.
    fn is_connected(&self) -> bool {
        !self.world_name.is_empty() && !self.saves_path.as_os_str().is_empty()
    }
}

/// Reads the settings file. Missing, unreadable, corrupt or empty settings all
/// mean no world is connected.
pub fn load_settings(path: &Path) -> Option<Settings> {
    if !path.exists() {
        return None;
    }
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            warn!("failed to read settings path={} err={err}", path.display());
            return None;
        }
    };
    match serde_json::from_slice::<Settings>(&data) {
        Ok(settings) if settings.is_connected() => Some(settings),
        Ok(_) => None,
        Err(err) => {
            warn!("failed to parse settings path={} err={err}", path.display());
            None
        }
    }
}

/// Replaces the settings file wholesale.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), String> {
    let bytes = serde_json::to_vec_pretty(settings)
        .map_err(|err| format!("failed to serialize settings: {err}"))?;
    write_bytes_to_disk(path, &bytes)
}

pub(crate) fn write_bytes_to_disk(path: &Path, bytes: &[u8]) -> Result<(), String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "failed to create settings directory {}: {err}",
                parent.display()
            )
        })?;
    }

    let mut temp_name = path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);
    fs::write(&temp_path, bytes).map_err(|err| {
        format!(
            "failed to write temporary file {}: {err}",
            temp_path.display()
        )
    })?;

    // `rename` replaces an existing target in place.
    fs::rename(&temp_path, path).map_err(|err| {
        format!(
            "failed to move {} => {}: {err}",
            temp_path.display(),
            path.display()
        )
    })
}
