use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::anyhow;
use axum::http::{HeaderValue, header};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use echosage::{Dialect, ServerConfig, routes, state::AppState, translate};

/// EchoSage - Telegram text-to-speech bot for Yandex SpeechKit
#[derive(Parser, Debug)]
#[command(name = "echosage")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (health, webhook, translate)
    Serve,

    /// Receive updates by long polling instead of a webhook
    Poll,

    /// Translate markup offline and print the payload
    Render {
        /// Text to translate; read from stdin when omitted
        text: Option<String>,

        /// Dialect of the input (inline or legacy)
        #[arg(short = 's', long = "source", default_value = "inline")]
        source: String,

        /// Dialect to render (inline or legacy)
        #[arg(short = 't', long = "target", default_value = "legacy")]
        target: String,
    },
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(config_path) => {
            info!(path = %config_path.display(), "Loading configuration from file");
            ServerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))
        }
        None => ServerConfig::from_env().map_err(|e| anyhow!(e.to_string())),
    }
}

fn parse_dialect(value: &str) -> anyhow::Result<Dialect> {
    Dialect::from_name(value)
        .ok_or_else(|| anyhow!("Invalid dialect '{value}'. Must be 'inline' or 'legacy'"))
}

fn render(
    config: &ServerConfig,
    text: Option<String>,
    source: &str,
    target: &str,
) -> anyhow::Result<()> {
    let source = parse_dialect(source)?;
    let target = parse_dialect(target)?;
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let rendered = translate(text.trim_end(), source, target, &config.markup)?;
    for warning in &rendered.warnings {
        eprintln!("warning: {warning}");
    }
    println!("{}", rendered.payload);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let address = config.address();
    if !config.is_webhook_secret_set() {
        warn!("TELEGRAM_WEBHOOK_SECRET not set, webhook requests are not authenticated");
    }

    let app_state = AppState::new(config)?;

    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    let app = routes::create_router(app_state).layer(security_headers);

    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;
    info!(address = %socket_addr, "Server listening");

    let listener = TcpListener::bind(&socket_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn poll(config: ServerConfig) -> anyhow::Result<()> {
    let app_state = AppState::new(config)?;
    let bot = app_state
        .bot
        .clone()
        .ok_or_else(|| anyhow!("TELEGRAM_BOT_TOKEN is required for polling"))?;

    tokio::select! {
        result = bot.run_polling() => result?,
        _ = shutdown_signal() => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Poll => poll(config).await,
        Commands::Render {
            text,
            source,
            target,
        } => render(&config, text, &source, &target),
    }
}
