use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use huddle::client::rtc::{RtcConnector, SampleMediaSource};
use huddle::client::{Client, ClientConfig, ClientHandle, UiEvent};
use huddle::model::IceServerConfig;
use huddle::server::RelayConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle", version, about = "Mesh video-chat signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Relay {
        #[arg(short, long, env = "HUDDLE_PORT", default_value_t = 3000)]
        port: u16,

        #[arg(long, env = "HUDDLE_HOST", default_value = "0.0.0.0")]
        host: String,

        /// STUN/TURN URL announced to clients. Repeatable.
        #[arg(long = "ice-server", env = "HUDDLE_ICE_SERVERS", value_delimiter = ',')]
        ice_servers: Vec<String>,
    },

    /// Join a room from the terminal. Lines typed are sent as chat.
    Join {
        #[arg(long, env = "HUDDLE_RELAY_URL", default_value = "ws://127.0.0.1:3000/ws")]
        relay: String,

        #[arg(short, long)]
        room: String,

        #[arg(short, long)]
        nickname: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "huddle=info,huddle_server=info,tower_http=info".into()),
        )
        .init();

    match Cli::parse().command {
        Commands::Relay {
            port,
            host,
            ice_servers,
        } => {
            let mut config = RelayConfig {
                host,
                port,
                ..Default::default()
            };
            if !ice_servers.is_empty() {
                config.ice_servers = vec![IceServerConfig {
                    urls: ice_servers,
                    username: None,
                    credential: None,
                }];
            }

            println!("{}", "Starting huddle relay".green().bold());
            println!("   WebSocket: ws://{}/ws", config.bind_addr());
            println!("   Health:    http://{}/health", config.bind_addr());

            huddle::server::run(config).await
        }

        Commands::Join {
            relay,
            room,
            nickname,
        } => join(relay, room, nickname).await,
    }
}

async fn join(relay: String, room: String, nickname: String) -> Result<()> {
    let client = Client::new(
        ClientConfig {
            relay_url: relay,
            ..Default::default()
        },
        Arc::new(RtcConnector::new()?),
        Arc::new(SampleMediaSource::default()),
    );

    let (handle, mut ui) = client
        .join(&room, &nickname)
        .await
        .context("failed to join room")?;

    println!(
        "{} {} {}",
        "Joined".green().bold(),
        room.bold(),
        "(/mute, /video, /cams, /camera <id>, /leave)".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = ui.recv() => match event {
                Some(event) => print_event(event),
                None => break,
            },
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !run_input(&handle, line.trim()).await? {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    handle.leave().await?;
    println!("{}", "Left the room".yellow());
    Ok(())
}

/// Returns false when the user asked to leave.
async fn run_input(handle: &ClientHandle, line: &str) -> Result<bool> {
    match line.split_once(' ').unwrap_or((line, "")) {
        ("", _) => {}
        ("/leave", _) => return Ok(false),
        ("/mute", _) => {
            let on = handle.toggle_audio().await?;
            println!("{}", (if on { "Unmuted" } else { "Muted" }).cyan());
        }
        ("/video", _) => {
            let on = handle.toggle_video().await?;
            println!("{}", (if on { "Camera on" } else { "Camera off" }).cyan());
        }
        ("/cams", _) => {
            for device in handle.list_cameras().await? {
                println!("   {}  {}", device.device_id.bold(), device.label);
            }
        }
        ("/camera", device_id) => {
            if let Err(e) = handle.switch_camera(device_id.trim()).await {
                println!("{} {}", "Camera switch failed:".red(), e);
            }
        }
        _ => handle.send_chat(line).await?,
    }
    Ok(true)
}

fn print_event(event: UiEvent) {
    match event {
        UiEvent::ParticipantJoined { nickname, .. } => {
            println!("{}", format!("notice! {} joined the room", nickname).yellow());
        }
        UiEvent::RemoteStreamAvailable { nickname, stream, .. } => {
            println!(
                "{} {} ({} tracks)",
                "Connected to".green(),
                nickname.bold(),
                stream.tracks.len()
            );
        }
        UiEvent::RemoveRemoteView { remote_id } => {
            println!("{}", format!("{} left", remote_id).yellow());
        }
        UiEvent::ChatMessage { from: None, text } => println!("{} {}", "You:".bold(), text),
        UiEvent::ChatMessage {
            from: Some(nickname),
            text,
        } => println!("{} {}", format!("{}:", nickname).bold(), text),
        UiEvent::MediaUnavailable { reason } => {
            println!("{} {}", "Media unavailable:".red(), reason);
        }
        UiEvent::RelayError { message } => println!("{} {}", "Relay error:".red(), message),
    }
}
