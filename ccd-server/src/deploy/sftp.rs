use std::{
    io::Write,
    net::TcpStream,
    path::{Component, Path, PathBuf},
};

use ssh2::{Session, Sftp};
use tracing::{debug, info};

use super::{DeployError, DeployTarget};
use crate::config::RemoteConfig;

/// Directory operations needed to build a remote folder path.
pub trait RemoteDirs {
    /// True when `path` exists and can be entered as a directory.
    fn can_enter(&self, path: &Path) -> bool;
    fn make_dir(&self, path: &Path) -> Result<(), String>;
}

impl RemoteDirs for Sftp {
    fn can_enter(&self, path: &Path) -> bool {
        self.opendir(path).is_ok()
    }

    fn make_dir(&self, path: &Path) -> Result<(), String> {
        self.mkdir(path, 0o755).map_err(|err| err.to_string())
    }
}

/// Creates `dir` one component at a time from the root down, skipping
/// components that already exist.
pub fn ensure_remote_dir<D>(dirs: &D, dir: &Path) -> Result<(), DeployError>
where
    D: RemoteDirs + ?Sized,
{
    if dirs.can_enter(dir) {
        return Ok(());
    }
    let mut current = PathBuf::new();
    for component in dir.components() {
        current.push(component);
        if matches!(component, Component::RootDir | Component::Prefix(_) | Component::CurDir) {
            continue;
        }
        if dirs.can_enter(&current) {
            continue;
        }
        if let Err(err) = dirs.make_dir(&current) {
            // Another writer may have created it in the meantime.
            if !dirs.can_enter(&current) {
                return Err(DeployError::Remote(format!(
                    "failed to create remote directory {}: {err}",
                    current.display()
                )));
            }
        }
        debug!("created remote directory {}", current.display());
    }
    Ok(())
}

/// One authenticated SFTP session, opened per deploy.
pub struct SftpTarget {
    session: Session,
    sftp: Sftp,
    host: String,
}

impl SftpTarget {
    pub fn connect(remote: &RemoteConfig) -> Result<Self, DeployError> {
        let tcp = TcpStream::connect((remote.host.as_str(), remote.port)).map_err(|err| {
            DeployError::Remote(format!(
                "failed to connect to {}:{}: {err}",
                remote.host, remote.port
            ))
        })?;
        let mut session = Session::new().map_err(map_ssh_error)?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(map_ssh_error)?;
        session
            .userauth_password(&remote.username, &remote.password)
            .map_err(map_ssh_error)?;
        if !session.authenticated() {
            return Err(DeployError::Remote(format!(
                "authentication failed for {}@{}",
                remote.username, remote.host
            )));
        }
        let sftp = session.sftp().map_err(map_ssh_error)?;
        info!(
            "sftp session opened host={} port={} user={}",
            remote.host, remote.port, remote.username
        );
        Ok(Self {
            session,
            sftp,
            host: remote.host.clone(),
        })
    }
}

impl DeployTarget for SftpTarget {
    fn ensure_directory(&mut self, dir: &Path) -> Result<(), DeployError> {
        ensure_remote_dir(&self.sftp, dir)
    }

    fn write_file(&mut self, path: &Path, contents: &str) -> Result<(), DeployError> {
        let mut file = self.sftp.create(path).map_err(|err| {
            DeployError::Remote(format!("failed to open {}: {err}", path.display()))
        })?;
        file.write_all(contents.as_bytes()).map_err(|err| {
            DeployError::Remote(format!("failed to write {}: {err}", path.display()))
        })
    }

    fn close(self: Box<Self>) -> Result<(), DeployError> {
        let SftpTarget {
            session,
            sftp,
            host,
        } = *self;
        drop(sftp);
        session
            .disconnect(None, "deploy finished", None)
            .map_err(map_ssh_error)?;
        info!("sftp session closed host={host}");
        Ok(())
    }
}

fn map_ssh_error(err: ssh2::Error) -> DeployError {
    DeployError::Remote(format!("SSH error: {err}"))
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::BTreeSet};

    use super::*;

    #[derive(Default)]
    struct FakeDirs {
        existing: RefCell<BTreeSet<PathBuf>>,
        created: RefCell<Vec<PathBuf>>,
        refuse: Option<PathBuf>,
    }

    impl FakeDirs {
        fn with_existing(paths: &[&str]) -> Self {
            let dirs = Self::default();
            dirs.existing
                .borrow_mut()
                .extend(paths.iter().map(PathBuf::from));
            dirs
        }
    }

    impl RemoteDirs for FakeDirs {
        fn can_enter(&self, path: &Path) -> bool {
            path == Path::new("/") || self.existing.borrow().contains(path)
        }

        fn make_dir(&self, path: &Path) -> Result<(), String> {
            if self.refuse.as_deref() == Some(path) {
                return Err("permission denied".to_string());
            }
            if self.existing.borrow().contains(path) {
                return Err("file exists".to_string());
            }
            self.existing.borrow_mut().insert(path.to_path_buf());
            self.created.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn partially_existing_path_creates_only_missing_components() {
        let dirs = FakeDirs::with_existing(&["/srv", "/srv/saves"]);
        ensure_remote_dir(&dirs, Path::new("/srv/saves/World/computercraft"))
            .expect("directories should be created");
        assert_eq!(
            *dirs.created.borrow(),
            vec![
                PathBuf::from("/srv/saves/World"),
                PathBuf::from("/srv/saves/World/computercraft"),
            ]
        );
    }

    #[test]
    fn existing_leaf_creates_nothing() {
        let dirs = FakeDirs::with_existing(&["/srv", "/srv/saves"]);
        ensure_remote_dir(&dirs, Path::new("/srv/saves")).expect("nothing to do");
        ensure_remote_dir(&dirs, Path::new("/srv/saves")).expect("still nothing to do");
        assert!(dirs.created.borrow().is_empty());
    }

    #[test]
    fn refused_mkdir_is_reported() {
        let dirs = FakeDirs {
            refuse: Some(PathBuf::from("/srv/locked")),
            ..FakeDirs::with_existing(&["/srv"])
        };
        let err = ensure_remote_dir(&dirs, Path::new("/srv/locked/7"))
            .expect_err("creation should fail");
        assert!(err.to_string().contains("/srv/locked"));
        assert!(err.to_string().contains("permission denied"));
    }
}
