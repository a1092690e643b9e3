use std::{fs, path::Path};

use super::{DeployError, DeployTarget};

/// Writes straight into the world save on this machine. Device folders must
/// already exist; they are provisioned by the mod, never by a deploy.
pub struct LocalTarget;

impl DeployTarget for LocalTarget {
    fn ensure_directory(&mut self, dir: &Path) -> Result<(), DeployError> {
        if dir.is_dir() {
            return Ok(());
        }
        let computer_id = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Err(DeployError::DeviceNotFound {
            computer_id,
            path: dir.to_path_buf(),
        })
    }

    fn write_file(&mut self, path: &Path, contents: &str) -> Result<(), DeployError> {
        fs::write(path, contents).map_err(|source| DeployError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn close(self: Box<Self>) -> Result<(), DeployError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::PathBuf,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;
    use crate::{
        config::DeployConfig,
        deploy::{DeployFile, DeployPlan, DeviceLocation, deploy},
        layout::WorldLayout,
    };

    fn scratch_world(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or(0);
        let world = std::env::temp_dir().join(format!("ccd-local-{name}-{now}"));
        fs::create_dir_all(&world).expect("world dir should be created");
        world
    }

    fn location(world: &Path, computer_id: &str) -> DeviceLocation {
        DeviceLocation {
            world_name: "World".to_string(),
            world_path: world.to_path_buf(),
            computer_id: computer_id.to_string(),
        }
    }

    #[test]
    fn missing_device_is_not_created() {
        let world = scratch_world("missing");
        let plan = DeployPlan::from_code("print(1)", "startup.lua");

        let err = deploy(&DeployConfig::Local, &location(&world, "9"), &plan)
            .expect_err("deploy should fail");
        assert!(matches!(err, DeployError::DeviceNotFound { ref computer_id, .. } if computer_id == "9"));
        assert!(!WorldLayout::new(&world).device_dir("9").exists());
        let _ = fs::remove_dir_all(&world);
    }

    #[test]
    fn existing_file_is_overwritten() {
        let world = scratch_world("overwrite");
        let device = WorldLayout::new(&world).device_dir("1");
        fs::create_dir_all(&device).expect("device dir");
        fs::write(device.join("startup.lua"), "a much longer previous program").expect("old file");

        let plan = DeployPlan::from_code("print(2)", "startup.lua");
        let count = deploy(&DeployConfig::Local, &location(&world, "1"), &plan)
            .expect("deploy should succeed");
        assert_eq!(count, 1);
        assert_eq!(
            fs::read_to_string(device.join("startup.lua")).expect("new file"),
            "print(2)"
        );
        let _ = fs::remove_dir_all(&world);
    }

    #[test]
    fn failure_midway_keeps_earlier_files() {
        let world = scratch_world("partial");
        let device = WorldLayout::new(&world).device_dir("3");
        fs::create_dir_all(device.join("c.lua")).expect("blocking dir");

        let plan = DeployPlan {
            files: ["a", "b", "c", "d", "e"]
                .iter()
                .map(|name| DeployFile {
                    name: format!("{name}.lua"),
                    contents: format!("{name}()\n"),
                })
                .collect(),
            units: Vec::new(),
        };
        let err = deploy(&DeployConfig::Local, &location(&world, "3"), &plan)
            .expect_err("third write should fail");
        assert!(matches!(err, DeployError::Io { ref path, .. } if path.ends_with("c.lua")));
        assert!(device.join("a.lua").is_file());
        assert!(device.join("b.lua").is_file());
        assert!(!device.join("d.lua").exists());
        assert!(!device.join("e.lua").exists());
        let _ = fs::remove_dir_all(&world);
    }
}
