use std::env;

use ccd_server::{AppState, ServerConfig, build_app, init_logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if wants_version_flag() {
        println!("{}", binary_version_text());
        return Ok(());
    }

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return Err(err.into());
        }
    };

    init_logging(config.log_file.as_deref())?;
    info!("{}", binary_version_text());
    info!(
        "saves root={} settings={} deploy target={}",
        config.saves_root.display(),
        config.settings_path.display(),
        config.deploy.label()
    );

    let addr = config.addr;
    let app = build_app(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

fn wants_version_flag() -> bool {
    env::args()
        .skip(1)
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
}

fn binary_version_text() -> String {
    let binary = env!("CARGO_PKG_NAME");
    let git_tag = option_env!("CCD_BUILD_GIT_TAG").unwrap_or("untagged");
    let git_commit = option_env!("CCD_BUILD_GIT_COMMIT").unwrap_or("unknown");
    let git_dirty = option_env!("CCD_BUILD_GIT_DIRTY").unwrap_or("false");
    let dirty = matches!(git_dirty, "true" | "1" | "yes" | "dirty");

    if dirty {
        format!("{binary} {git_tag} (dirty commit: {git_commit})")
    } else {
        format!("{binary} {git_tag}")
    }
}
