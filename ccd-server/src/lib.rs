pub mod config;
pub mod deploy;
pub mod error;
pub mod layout;
pub mod logging;
pub mod os_info;
pub mod paths;
pub mod server;
pub mod settings;

pub use config::{ConfigError, DeployConfig, RemoteConfig, ServerConfig};
pub use deploy::{
    DeployError, DeployFile, DeployPlan, DeployTarget, DeviceLocation, deploy, deploy_with,
};
pub use error::ApiError;
pub use layout::{WorldLayout, WorldProbe};
pub use logging::init as init_logging;
pub use os_info::OsInfo;
pub use server::{AppState, ComputerIdsResponse, ConnectResponse, MessageResponse, build_app};
pub use settings::{Settings, load_settings, save_settings};
