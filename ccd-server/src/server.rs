use std::{sync::Arc, time::Instant};

use axum::{
    Json, Router,
    extract::{Path, Request, State, rejection::JsonRejection},
    http::{StatusCode, header::CONTENT_TYPE},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    config::ServerConfig,
    deploy::{DeployPlan, DeviceLocation, deploy},
    error::ApiError,
    layout::WorldLayout,
    os_info::{self, OsInfo},
    paths::resolve_world,
    settings::{Settings, load_settings, save_settings},
};

mod handlers;

use handlers::*;

pub const DEFAULT_SCRIPT_NAME: &str = "startup.lua";

mod embedded_webui {
    include!(concat!(env!("OUT_DIR"), "/embedded_webui.rs"));
}

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WorldRequest {
    #[serde(default)]
    pub world_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RunProgramRequest {
    /// A string or an integer.
    #[serde(default)]
    pub computer_id: Option<Value>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub success: bool,
    pub computercraft_installed: bool,
    pub computers_found: bool,
    pub max_computer_id: u64,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComputerIdsResponse {
    pub success: bool,
    pub computer_ids: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

impl MessageResponse {
    fn ok(message: String) -> Json<Self> {
        Json(Self {
            success: true,
            message,
        })
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui_index_handler))
        .route("/static/{*path}", get(ui_asset_handler))
        .route("/healthz", get(healthz_handler))
        .route("/api/connect", post(connect_handler))
        .route("/api/create_computercraft", post(create_computercraft_handler))
        .route("/api/get_computer_ids", get(get_computer_ids_handler))
        .route("/api/run_program", post(run_program_handler))
        .route("/api/os_info", get(os_info_handler))
        .layer(middleware::from_fn(access_log_middleware))
        .with_state(state)
}

fn webui_content_type(path: &str) -> &'static str {
    if path.ends_with(".html") {
        "text/html; charset=utf-8"
    } else if path.ends_with(".js") {
        "text/javascript; charset=utf-8"
    } else if path.ends_with(".css") {
        "text/css; charset=utf-8"
    } else if path.ends_with(".json") {
        "application/json; charset=utf-8"
    } else if path.ends_with(".svg") {
        "image/svg+xml"
    } else if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".ico") {
        "image/x-icon"
    } else {
        "application/octet-stream"
    }
}

/// Accepts `"7"` or `7`; anything else counts as missing.
fn computer_id_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn connect_message(world_name: &str, installed: bool, computers_found: bool) -> String {
    match (installed, computers_found) {
        (true, true) => format!(
            "Connected to \"{world_name}\". ComputerCraft is installed and computers are found."
        ),
        (true, false) => format!(
            "Connected to \"{world_name}\". ComputerCraft is installed but no computers found."
        ),
        _ => format!("Connected to \"{world_name}\". ComputerCraft is not installed."),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn computer_id_accepts_string_or_integer() {
        assert_eq!(computer_id_text(Some(&json!("12"))).as_deref(), Some("12"));
        assert_eq!(computer_id_text(Some(&json!(12))).as_deref(), Some("12"));
        assert_eq!(computer_id_text(Some(&json!(""))), None);
        assert_eq!(computer_id_text(Some(&json!(null))), None);
        assert_eq!(computer_id_text(Some(&json!(["1"]))), None);
        assert_eq!(computer_id_text(None), None);
    }

    #[test]
    fn connect_message_reflects_probe() {
        assert!(connect_message("W", true, true).ends_with("computers are found."));
        assert!(connect_message("W", true, false).ends_with("no computers found."));
        assert!(connect_message("W", false, false).ends_with("is not installed."));
    }
}
