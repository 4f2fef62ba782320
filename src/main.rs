//! Motiontuber - Headless Avatar Motion Service
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use motiontuber::{
    animation::{driver, loader},
    config::Config,
    error::WebError,
    web::WebServer,
    AppState,
};

/// Motiontuber - Headless avatar motion service
#[derive(Parser, Debug)]
#[command(name = "motiontuber", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the character and clips (overrides config)
    #[arg(short, long)]
    assets_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable HTTP server
    #[arg(long)]
    no_http: bool,

    /// HTTP server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", motiontuber::NAME, motiontuber::VERSION);

    let runtime = tokio::runtime::Runtime::new()?;

    let state = runtime.block_on(async { setup_and_spawn_services(&args).await })?;

    // Headless mode: wait for Ctrl+C / SIGTERM
    runtime.block_on(async {
        shutdown_signal().await;
        info!("Shutdown signal received");
        state.shutdown();

        // Give tasks a moment to clean up
        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
    });

    info!("Motiontuber stopped");
    Ok(())
}

/// Setup config, create AppState, and spawn all background services.
async fn setup_and_spawn_services(args: &Args) -> anyhow::Result<Arc<AppState>> {
    // Load configuration
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    if let Some(ref dir) = args.assets_dir {
        config.animation.assets_dir = dir.clone();
    }
    if args.no_http {
        config.http.enabled = false;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }

    // Validate configuration
    config.validate()?;

    info!("Assets directory: {}", config.animation.assets_dir.display());
    info!("Cross-fade: {}s", config.animation.crossfade_secs);
    info!("HTTP server: {}", config.http.enabled);

    // Create shared application state
    let state = AppState::new(config.clone());

    // Start the frame driver
    let mixer = state.sequencer.mixer();
    let frame_delta = config.animation.frame_delta_secs;
    let shutdown_rx = state.subscribe_shutdown();
    tokio::spawn(driver::run_frame_loop(mixer, frame_delta, shutdown_rx));

    // Load the character, then start the initial task
    let startup_state = Arc::clone(&state);
    tokio::spawn(async move {
        run_startup(startup_state).await;
    });

    // Start HTTP server if enabled
    if config.http.enabled {
        let http_state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = run_http_server(http_state).await {
                error!("HTTP server error: {}", e);
            }
        });
    }

    Ok(state)
}

async fn run_startup(state: Arc<AppState>) {
    let config = state.config.read().await;
    let character = config.animation.assets_dir.join(&config.animation.character);
    let initial_task = config.animation.initial_task;
    drop(config);

    match loader::load_character(character.clone()).await {
        Ok(info) => info!(
            "Loaded character {} ({} nodes, {} meshes, {} joints)",
            character.display(),
            info.nodes,
            info.meshes,
            info.joints
        ),
        Err(e) => warn!("Character unavailable: {}", e),
    }

    if let Some(task) = initial_task {
        if let Err(e) = state.change_animation(task.as_str()) {
            error!("Initial task {} rejected: {}", task, e);
        }
    }
}

async fn run_http_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let config = state.config.read().await.clone();

    let web_server = WebServer::new(Arc::clone(&state), &config);

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WebError::Bind(format!("{}: {}", addr, e)))?;
    info!("HTTP server listening on {}", addr);

    let mut shutdown_rx = state.subscribe_shutdown();

    axum::serve(listener, web_server.router())
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|e| WebError::Startup(e.to_string()))?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
