use super::*;

pub(super) async fn access_log_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    let status = response.status();
    info!(
        method = %method,
        uri = %uri,
        status = status.as_u16(),
        elapsed_ms = started.elapsed().as_millis(),
        "http access"
    );
    response
}

pub(super) async fn healthz_handler() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

pub(super) async fn ui_index_handler() -> Response {
    ui_asset_response("index.html")
}

pub(super) async fn ui_asset_handler(Path(path): Path<String>) -> Response {
    ui_asset_response(path.trim_start_matches('/'))
}

fn ui_asset_response(path: &str) -> Response {
    if let Some(bytes) = embedded_webui::get_asset(path) {
        return (
            StatusCode::OK,
            [(CONTENT_TYPE, webui_content_type(path))],
            bytes.to_vec(),
        )
            .into_response();
    }
    let message = if embedded_webui::has_assets() {
        "webui asset not found"
    } else {
        "webui assets are not embedded; add them under ccd-server/webui/dist before compiling"
    };
    ApiError::NotFound(message.to_string()).into_response()
}

pub(super) async fn os_info_handler() -> Json<OsInfo> {
    Json(os_info::current())
}

fn require_world_name(request: &WorldRequest, action: &str) -> Result<String, ApiError> {
    match request.world_name.as_deref() {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => {
            warn!("{action} attempt without world name.");
            Err(ApiError::Validation("World name is required.".to_string()))
        }
    }
}

fn require_world(state: &AppState, world_name: &str) -> Result<WorldLayout, ApiError> {
    match resolve_world(&state.config().saves_root, world_name) {
        Some(world_path) => Ok(WorldLayout::new(world_path)),
        None => {
            let message = format!("World \"{world_name}\" does not exist in saves directory.");
            error!("{message}");
            Err(ApiError::NotFound(message))
        }
    }
}

fn require_connected(state: &AppState, action: &str) -> Result<Settings, ApiError> {
    load_settings(&state.config().settings_path).ok_or_else(|| {
        warn!("{action} attempt without connected world.");
        ApiError::Validation("World not connected.".to_string())
    })
}

pub(super) async fn connect_handler(
    State(state): State<AppState>,
    payload: Result<Json<WorldRequest>, JsonRejection>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let Json(request) = payload?;
    let world_name = require_world_name(&request, "Connect")?;
    let layout = require_world(&state, &world_name)?;

    let probe = layout.probe();
    let settings = Settings {
        world_name: world_name.clone(),
        saves_path: layout.world_path().to_path_buf(),
    };
    save_settings(&state.config().settings_path, &settings).map_err(|err| {
        error!("failed to persist settings: {err}");
        ApiError::Io(format!("Error saving settings: {err}"))
    })?;

    let message = connect_message(
        &world_name,
        probe.computercraft_installed,
        probe.computers_found,
    );
    info!("{message}");
    Ok(Json(ConnectResponse {
        success: true,
        computercraft_installed: probe.computercraft_installed,
        computers_found: probe.computers_found,
        max_computer_id: probe.max_computer_id,
        message,
    }))
}

pub(super) async fn create_computercraft_handler(
    State(state): State<AppState>,
    payload: Result<Json<WorldRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let world_name = require_world_name(&request, "Create ComputerCraft folders")?;
    let layout = require_world(&state, &world_name)?;

    layout.create_directories().map_err(|err| {
        error!(
            "Error creating folders at {}: {err}",
            layout.computercraft_dir().display()
        );
        ApiError::Io(format!("Error creating folders: {err}"))
    })?;

    let message = "ComputerCraft and computer folders created successfully.".to_string();
    info!("{message}");
    Ok(MessageResponse::ok(message))
}

pub(super) async fn get_computer_ids_handler(
    State(state): State<AppState>,
) -> Result<Json<ComputerIdsResponse>, ApiError> {
    let settings = require_connected(&state, "Get Computer IDs")?;
    let layout = WorldLayout::new(settings.saves_path);
    if !layout.device_root().is_dir() {
        let message = "ComputerCraft computer directory not found.".to_string();
        error!("{message}");
        return Err(ApiError::NotFound(message));
    }

    let computer_ids = layout.list_device_ids().map_err(|err| {
        error!(
            "failed to list {}: {err}",
            layout.device_root().display()
        );
        ApiError::Io(format!("Error listing computers: {err}"))
    })?;
    info!("Fetched Computer IDs: {computer_ids:?}");
    Ok(Json(ComputerIdsResponse {
        success: true,
        computer_ids,
    }))
}

pub(super) async fn run_program_handler(
    State(state): State<AppState>,
    payload: Result<Json<RunProgramRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let computer_id = computer_id_text(request.computer_id.as_ref());
    let code = request.code.filter(|code| !code.is_empty());
    let (Some(computer_id), Some(code)) = (computer_id, code) else {
        warn!("Run program attempt without Computer ID or code.");
        return Err(ApiError::Validation(
            "Computer ID and code are required.".to_string(),
        ));
    };

    let settings = require_connected(&state, "Run program")?;

    let Some(device_name) = script::file_name_component(&computer_id) else {
        let message = format!("Computer ID \"{computer_id}\" not found.");
        error!("{message}");
        return Err(ApiError::NotFound(message));
    };
    let requested_name = request
        .filename
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_SCRIPT_NAME);
    let Some(file_name) = script::script_file_name(requested_name) else {
        warn!("Run program attempt with unusable filename {requested_name:?}.");
        return Err(ApiError::Validation(format!(
            "Invalid filename \"{requested_name}\"."
        )));
    };

    // Devices are provisioned by the mod in the local save, whichever target
    // receives the files.
    if !WorldLayout::new(&settings.saves_path)
        .device_dir(&device_name)
        .is_dir()
    {
        let message = format!("Computer ID \"{device_name}\" not found.");
        error!("{message}");
        return Err(ApiError::NotFound(message));
    }

    let world_name = settings
        .saves_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| settings.world_name.clone());
    let location = DeviceLocation {
        world_name,
        world_path: settings.saves_path.clone(),
        computer_id: device_name,
    };
    let plan = DeployPlan::from_code(&code, &file_name);

    let deploy_config = state.config().deploy.clone();
    let task_location = location.clone();
    let task_plan = plan.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        deploy(&deploy_config, &task_location, &task_plan)
    })
    .await
    .map_err(|err| ApiError::Io(format!("Error writing Lua files: deploy task failed: {err}")))?;

    if let Err(err) = outcome {
        let err = ApiError::from(err);
        match err {
            ApiError::NotFound(ref message) => error!("{message}"),
            _ => error!(
                "Error writing Lua files for Computer ID \"{}\": {err}",
                location.computer_id
            ),
        }
        return Err(err);
    }

    let message = if plan.is_split() {
        for unit in &plan.units {
            info!(
                "Function \"{}\" saved as \"{}\" in Computer ID \"{}\".",
                unit.declared_name,
                unit.file_name(),
                location.computer_id
            );
        }
        format!(
            "{} functions successfully written to Computer ID \"{}\".",
            plan.units.len(),
            location.computer_id
        )
    } else {
        format!(
            "Lua program successfully written to Computer ID \"{}\" as \"{file_name}\".",
            location.computer_id
        )
    };
    info!("{message}");
    Ok(MessageResponse::ok(message))
}
