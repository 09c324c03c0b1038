use std::fs::File;
use std::sync::Arc;

use chatterbox::api::{Endpoints, HttpChatApi};
use chatterbox::core::config::{self, ChatConfig, CliOverrides};
use chatterbox::transport::WebSocketTransport;
use chatterbox::tui::{self, Backends};
use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "chatterbox", about = "Terminal client for chat rooms")]
struct Args {
    /// Chat server base URL (e.g. http://localhost:8000)
    #[arg(short, long)]
    server: Option<String>,

    /// Name to send messages as
    #[arg(short, long)]
    username: Option<String>,

    /// Room to join on startup
    #[arg(short, long)]
    room: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to chatterbox.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("chatterbox.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("Ignoring config file: {}", e);
        ChatConfig::default()
    });
    let overrides = CliOverrides {
        server: args.server,
        username: args.username,
        room: args.room,
    };
    let resolved = config::resolve(&file_config, &overrides);
    log::info!(
        "Chatterbox starting up: server={} user={}",
        resolved.server_url,
        resolved.username
    );

    let endpoints = Endpoints::new(&resolved.server_url, resolved.ws_url.as_deref())?;
    let api = Arc::new(HttpChatApi::new(endpoints.clone(), resolved.request_timeout)?);
    let backends = Backends {
        history: api.clone(),
        directory: api,
        transport: Arc::new(WebSocketTransport::new(endpoints)),
    };

    tui::run(resolved, backends)?;
    Ok(())
}
