//! Writes script files into a device folder, locally or over SFTP.

use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use script::{ScriptUnit, split_functions};
use tracing::{info, warn};

use crate::{
    config::DeployConfig,
    layout::{COMPUTERCRAFT_DIR, DEVICE_ROOT_DIR, WorldLayout},
};

mod local;
mod sftp;

pub use local::LocalTarget;
pub use sftp::{RemoteDirs, SftpTarget, ensure_remote_dir};

/// One file to place in a device folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployFile {
    pub name: String,
    pub contents: String,
}

/// Files derived from one submitted script.
#[derive(Clone, Debug)]
pub struct DeployPlan {
    pub files: Vec<DeployFile>,
    pub units: Vec<ScriptUnit>,
}

impl DeployPlan {
    /// Splits `code` into one file per function, or keeps it whole under
    /// `fallback_name` when it has none.
    pub fn from_code(code: &str, fallback_name: &str) -> Self {
        let units = split_functions(code);
        let files = if units.is_empty() {
            vec![DeployFile {
                name: fallback_name.to_string(),
                contents: code.to_string(),
            }]
        } else {
            units
                .iter()
                .map(|unit| DeployFile {
                    name: unit.file_name(),
                    contents: unit.code.clone(),
                })
                .collect()
        };
        Self { files, units }
    }

    pub fn is_split(&self) -> bool {
        !self.units.is_empty()
    }
}

/// Which device a deploy is aimed at.
#[derive(Clone, Debug)]
pub struct DeviceLocation {
    pub world_name: String,
    pub world_path: PathBuf,
    pub computer_id: String,
}

#[derive(Debug)]
pub enum DeployError {
    DeviceNotFound { computer_id: String, path: PathBuf },
    Io { path: PathBuf, source: io::Error },
    Remote(String),
}

impl fmt::Display for DeployError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::DeviceNotFound { computer_id, .. } => {
                write!(f, "Computer ID \"{computer_id}\" not found.")
            }
            DeployError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            DeployError::Remote(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for DeployError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeployError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A place device files can be written to. One value lives for exactly one
/// deploy call.
pub trait DeployTarget {
    /// Makes sure `dir` can receive files.
    fn ensure_directory(&mut self, dir: &Path) -> Result<(), DeployError>;
    /// Creates or truncates `path` and writes `contents`.
    fn write_file(&mut self, path: &Path, contents: &str) -> Result<(), DeployError>;
    fn close(self: Box<Self>) -> Result<(), DeployError>;
}

impl DeployConfig {
    pub fn label(&self) -> &'static str {
        match self {
            DeployConfig::Local => "local",
            DeployConfig::Sftp(_) => "sftp",
        }
    }

    /// Device folder for `location` on this target.
    pub fn device_dir(&self, location: &DeviceLocation) -> PathBuf {
        match self {
            DeployConfig::Local => {
                WorldLayout::new(&location.world_path).device_dir(&location.computer_id)
            }
            DeployConfig::Sftp(remote) => Path::new(&remote.base_path)
                .join(&location.world_name)
                .join(COMPUTERCRAFT_DIR)
                .join(DEVICE_ROOT_DIR)
                .join(&location.computer_id),
        }
    }

    pub fn open(&self) -> Result<Box<dyn DeployTarget>, DeployError> {
        match self {
            DeployConfig::Local => Ok(Box::new(LocalTarget)),
            DeployConfig::Sftp(remote) => Ok(Box::new(SftpTarget::connect(remote)?)),
        }
    }
}

/// Writes every file of `plan` into the device folder, in order.
///
/// Files are not written transactionally: on failure the files before the
/// failing one stay on the target. The target is closed on every path; a
/// write error takes precedence over a close error.
pub fn deploy(
    config: &DeployConfig,
    location: &DeviceLocation,
    plan: &DeployPlan,
) -> Result<usize, DeployError> {
    let dir = config.device_dir(location);
    let target = config.open()?;
    deploy_with(target, &dir, location, plan)
}

/// Runs `plan` against an already opened target and closes it.
pub fn deploy_with(
    mut target: Box<dyn DeployTarget>,
    dir: &Path,
    location: &DeviceLocation,
    plan: &DeployPlan,
) -> Result<usize, DeployError> {
    let written = write_files(target.as_mut(), dir, location, &plan.files);
    let closed = target.close();
    if let Err(err) = &closed {
        warn!(
            "failed to close deploy target for computer {}: {err}",
            location.computer_id
        );
    }
    let count = written?;
    closed?;
    Ok(count)
}

fn write_files(
    target: &mut dyn DeployTarget,
    dir: &Path,
    location: &DeviceLocation,
    files: &[DeployFile],
) -> Result<usize, DeployError> {
    target.ensure_directory(dir)?;
    for file in files {
        target.write_file(&dir.join(&file.name), &file.contents)?;
        info!(
            "wrote \"{}\" to Computer ID \"{}\"",
            file.name, location.computer_id
        );
    }
    Ok(files.len())
}
