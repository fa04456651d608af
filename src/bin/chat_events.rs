use anyhow::{Context, Result};
use chat::{init_tracing, ChatSocket, ClientEvent, SocketConfig};
use chat_client::bin_common::{load_config_from_env, parse_args, ConfigType};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load config first (before logging is initialized)
    let config_type = match parse_args().into_iter().next() {
        Some(path) => ConfigType::Custom(path),
        None => ConfigType::Chat,
    };
    let config_path = load_config_from_env(config_type);
    let config = SocketConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    init_tracing(&config.log_level);
    config.log();

    let socket = ChatSocket::from_config(&config)?;

    socket.on_all(|event| {
        let body = serde_json::to_string(event).unwrap_or_default();
        info!("{}", body);
        Ok(())
    });

    // Queued until the first connection opens
    socket.set_timeline_streaming(true)?;

    let events = socket.events();
    std::thread::spawn(move || {
        for event in events.iter() {
            match event {
                ClientEvent::Connected => info!("Connected"),
                ClientEvent::Reconnected => info!("Reconnected"),
                ClientEvent::Disconnected => warn!("Disconnected"),
                ClientEvent::Reconnecting { attempt, delay } => {
                    warn!("Reconnecting in {:?} (attempt {})", delay, attempt)
                }
            }
        }
    });

    #[cfg(debug_assertions)]
    spawn_debug_console(&socket);

    print_banner("Chat event tail", socket.endpoint());
    socket.setup()?;

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down");

    let metrics = socket.metrics();
    socket.shutdown().await?;

    print_shutdown(
        "Chat event tail",
        &format!(
            "frames received: {}, reconnects: {}",
            metrics.frames_received, metrics.reconnect_count
        ),
    );
    Ok(())
}

/// Read `close` / `reconnect` from stdin and drive the debug hooks
#[cfg(debug_assertions)]
fn spawn_debug_console(socket: &ChatSocket) {
    use chat::DebugAction;
    use std::io::BufRead;

    let hooks = socket.debug_hooks();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines().map_while(|line| line.ok()) {
            match DebugAction::parse(&line) {
                Some(action) => {
                    if let Err(e) = hooks.run_action(action) {
                        warn!("Debug action failed: {}", e);
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => warn!("Unknown debug command: {} (try close / reconnect)", line.trim()),
            }
        }
    });
}

fn print_banner(name: &str, endpoint: &str) {
    info!("");
    info!("========================================");
    info!("Starting {}", name);
    info!("Endpoint: {}", endpoint);
    #[cfg(debug_assertions)]
    info!("Type 'close' or 'reconnect' to drive the socket by hand");
    info!("Press Ctrl+C to stop");
    info!("========================================");
    info!("");
}

fn print_shutdown(name: &str, stats: &str) {
    info!("");
    info!("========================================");
    info!("{} stopped gracefully", name);
    info!("{}", stats);
    info!("========================================");
}
