use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Arg, ArgAction, Command as ClapCommand};
use log::info;

use dem_clipper::api::{create_router_with, AppState};
use dem_clipper::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = ClapCommand::new("api-server")
        .about("Bounding box extraction and place lookup API")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("TOML configuration file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .help("Address to listen on, overrides the configuration")
                .value_name("ADDR"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = Config::resolve(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("Failed to load configuration")?;
    if let Some(bind) = matches.get_one::<String>("bind") {
        config.server.bind = bind.clone();
    }
    let addr = config.bind_addr()?;

    let state = AppState::from_config(&config).context("Failed to initialise application state")?;
    let app = create_router_with(
        Arc::new(state),
        config.body_limit_bytes(),
        config.server.static_dir.as_deref(),
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("  POST /downloadBbox  {{x1, y1, x2, y2, product, resolution}}");
    info!("  POST /getPolygon    {{name}}");
    info!("  GET  /health");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
