use anyhow::{Context, Result};
use axum::http::HeaderValue;
use clap::Parser;
use colored::*;
use std::net::SocketAddr;
use switchboard_core::IceServerConfig;
use switchboard_server::{RelayConfig, RelayHandle, RoutingMode, router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "switchboard")]
#[command(about = "WebRTC signaling relay", version)]
struct Args {
    /// Address the HTTP/WebSocket server binds to.
    #[arg(long, env = "SWITCHBOARD_LISTEN", default_value = "0.0.0.0:3000")]
    listen: SocketAddr,

    /// direct, brokered or hybrid.
    #[arg(long, env = "SWITCHBOARD_MODE", default_value_t = RoutingMode::Hybrid)]
    mode: RoutingMode,

    /// Used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(
        long = "stun-url",
        env = "SWITCHBOARD_STUN_URLS",
        value_delimiter = ',',
        default_value = "stun:stun.l.google.com:19302"
    )]
    stun_urls: Vec<String>,

    #[arg(long, env = "TURN_URL")]
    turn_url: Option<String>,

    #[arg(long, env = "TURN_USERNAME")]
    turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL", hide_env_values = true)]
    turn_credential: Option<String>,

    /// Origin allowed by CORS. Any origin when unset.
    #[arg(long, env = "SWITCHBOARD_ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,

    #[arg(long, default_value_t = 256)]
    command_buffer: usize,
}

impl Args {
    fn ice_servers(&self) -> Vec<IceServerConfig> {
        let mut servers = Vec::new();

        let stun: Vec<String> = self
            .stun_urls
            .iter()
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .collect();
        if !stun.is_empty() {
            servers.push(IceServerConfig {
                urls: stun,
                username: None,
                credential: None,
            });
        }

        if let Some(turn) = self.turn_url.as_ref().filter(|url| !url.trim().is_empty()) {
            if self.turn_username.is_none() || self.turn_credential.is_none() {
                warn!("TURN server configured without full credentials");
            }
            servers.push(IceServerConfig {
                urls: vec![turn.trim().to_owned()],
                username: self.turn_username.clone(),
                credential: self.turn_credential.clone(),
            });
        }

        servers
    }

    fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            command_buffer: self.command_buffer,
            ..RelayConfig::default()
        }
        .with_mode(self.mode)
        .with_ice_servers(self.ice_servers())
    }
}

fn build_cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer> {
    let allow_origin = match allowed_origin {
        None | Some("*") => AllowOrigin::any(),
        Some(origin) => AllowOrigin::exact(
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid allowed origin '{}'", origin))?,
        ),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.relay_config();
    let cors = build_cors_layer(args.allowed_origin.as_deref())?;

    println!("{}", "📡 Starting Switchboard relay...".green().bold());
    println!("   🔀 Routing: {}", config.mode.to_string().cyan());
    println!("   🧊 ICE servers: {}", config.ice_servers.len());

    let relay = RelayHandle::spawn(config);
    let app = router(relay).layer(cors);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!("Signaling server listening on http://{}", args.listen);
    println!(
        "   🔌 WebSocket: {}",
        format!("ws://{}/ws/{{identity}}", args.listen).cyan()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    println!("{}", "✨ Switchboard stopped.".green().bold());
    Ok(())
}
