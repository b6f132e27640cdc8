mod api;
mod config;
mod config_cmd;
mod status_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use scaleslip_config::{
    config_file_path, defaults, load_config, log_report, prepare, SlipConfig, ValidationReport,
};
use scaleslip_pipeline::SlipUpload;

use api::AppState;
use terminal_output::{note_error, note_success, render_pairs};

#[derive(Parser)]
#[command(name = "scaleslip")]
#[command(about = "scaleslip: weigh-scale slip photos to spreadsheet rows")]
#[command(version)]
struct Cli {
    /// Config file (default: $SCALESLIP_CONFIG or ./scaleslip.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(long)]
        bind: Option<String>,
    },
    /// Process one slip image without the HTTP server
    Submit {
        /// Path to a .jpg, .jpeg, or .png image
        path: PathBuf,
        /// Print the same JSON the HTTP endpoint returns
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration with secrets masked
    Config,
    /// Query a running server's health endpoint
    Status {
        /// Base URL of the server (default: http://127.0.0.1:<configured port>)
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = config_file_path(cli.config.as_deref());
    let raw_config = load_config(&path).await?;
    let (config, report) = prepare(raw_config, &std::env::vars().collect())?;

    let logging = config.logging();
    logging::init_logger(
        logging.dir.as_deref().map(std::path::Path::new),
        logging.level.as_deref().unwrap_or(defaults::DEFAULT_LOG_LEVEL),
    )?;

    match cli.command {
        Commands::Serve { port, bind } => {
            log_report(&report);
            ensure_valid(&report)?;
            let mut config = config;
            let server = config.server.get_or_insert_with(Default::default);
            if port.is_some() {
                server.port = port;
            }
            if bind.is_some() {
                server.bind = bind;
            }
            run_server(config).await?;
        }
        Commands::Submit { path, json } => {
            log_report(&report);
            ensure_valid(&report)?;
            submit_file(&config, &path, json).await?;
        }
        Commands::Config => config_cmd::run(&path, &config, &report)?,
        Commands::Status { url } => {
            let url = url.unwrap_or_else(|| {
                format!(
                    "http://127.0.0.1:{}",
                    config.server().port.unwrap_or(defaults::DEFAULT_PORT)
                )
            });
            status_cmd::run(&url).await?;
        }
    }

    Ok(())
}

fn ensure_valid(report: &ValidationReport) -> Result<()> {
    if report.is_valid() {
        return Ok(());
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }
    bail!("Configuration is incomplete; see `scaleslip config`")
}

async fn submit_file(config: &SlipConfig, path: &std::path::Path, json: bool) -> Result<()> {
    let pipeline = config::build_pipeline(config)?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match pipeline.submit(SlipUpload::new(filename, bytes)).await {
        Ok(receipt) if json => {
            println!("{}", serde_json::to_string_pretty(&api::success_body(&receipt))?);
            Ok(())
        }
        Ok(receipt) => {
            print!("{}", render_pairs(("Field", "Value"), receipt.record.iter()));
            note_success(&format!(
                "Archived as {} ({})",
                receipt.filename, receipt.stored.web_view_link
            ));
            Ok(())
        }
        Err(failure) if json => {
            println!("{}", serde_json::to_string_pretty(&api::failure_body(&failure))?);
            Err(failure.into())
        }
        Err(failure) => Err(failure.into()),
    }
}

async fn run_server(config: SlipConfig) -> Result<()> {
    let server = config.server();
    let bind = server.bind.unwrap_or_else(|| defaults::DEFAULT_BIND.to_string());
    let port = server.port.unwrap_or(defaults::DEFAULT_PORT);
    let route = server.route.unwrap_or_else(|| defaults::DEFAULT_ROUTE.to_string());
    let body_limit = server
        .body_limit_bytes
        .unwrap_or(defaults::DEFAULT_BODY_LIMIT_BYTES);

    let pipeline = config::build_pipeline(&config)?;
    info!(
        port,
        bind = %bind,
        route = %route,
        worksheet = %pipeline.settings().worksheet,
        "Starting scaleslip"
    );

    let app_state = Arc::new(AppState {
        pipeline: Arc::new(pipeline),
    });
    let app = api::build_router(app_state, &route, body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
