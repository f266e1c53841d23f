//! Live cast walkthrough
//!
//! Run with: cargo run --example cast_demo [MAX_CASTS]
//!
//! Simulates one owner casting to a handful of in-process viewers:
//!
//! - Alice starts a cast and three viewers join
//! - Viewers chat, Alice mutes one and kicks another
//! - Alice protects the cast with a password
//! - A login-server style directory request lists the cast
//! - The server shuts down, stopping every cast
//!
//! Each connection gets a writer task that prints what the game protocol
//! would have sent over the wire.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use livecast_rs::connection::{ChannelConnection, ConnectionEvents, ConnectionId, Outgoing};
use livecast_rs::directory::encode_cast_list;
use livecast_rs::persistence::MemoryCastStore;
use livecast_rs::{CastConfig, CastServer, DirectoryReply, OwnerId};
use tokio::task::JoinHandle;

fn connect(id: u64, label: &'static str) -> (Arc<ChannelConnection>, JoinHandle<()>) {
    let addr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, id as u8));
    let (conn, events) = ChannelConnection::new(ConnectionId(id), addr);
    let writer = tokio::spawn(write_loop(label, events));
    (conn, writer)
}

async fn write_loop(label: &'static str, mut events: ConnectionEvents) {
    while let Some(message) = events.recv().await {
        match message {
            Outgoing::OpenChannel { name, .. } => println!("[{}] opened channel '{}'", label, name),
            Outgoing::ChannelMessage { author, text, .. } if author.is_empty() => {
                println!("[{}] * {}", label, text)
            }
            Outgoing::ChannelMessage { author, text, .. } => {
                println!("[{}] {}: {}", label, author, text)
            }
            Outgoing::Status(text) => println!("[{}] (status) {}", label, text),
        }
    }
    println!("[{}] disconnected", label);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let max_casts = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<usize>())
        .transpose()?
        .unwrap_or(8);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("livecast_rs=debug".parse()?)
                .add_directive("cast_demo=debug".parse()?),
        )
        .init();

    let config = CastConfig::default()
        .max_casts(max_casts)
        .connect("127.0.0.1", 7173);
    let channel = config.channel_id;
    let connect_info = config.connect_info();

    let store = MemoryCastStore::new();
    let server = CastServer::start(config, store.clone());
    let casts = server.handle();

    let mut writers = Vec::new();

    let (owner, writer) = connect(1, "alice");
    writers.push(writer);
    casts.attach_owner(OwnerId(1), "Alice", owner).await?;
    casts.start_cast(OwnerId(1), None, "").await?;

    let mut viewers = Vec::new();
    for (id, label) in [(11, "viewer-a"), (12, "viewer-b"), (13, "viewer-c")] {
        let (conn, writer) = connect(id, label);
        writers.push(writer);
        viewers.push(casts.join("Alice", "", conn).await?);
    }

    casts.owner_say(OwnerId(1), channel, "welcome everyone").await?;
    casts.viewer_say(Arc::clone(&viewers[0]), "hi!").await?;
    casts.owner_say(OwnerId(1), channel, "/mute Spectator(1)").await?;
    casts.viewer_say(Arc::clone(&viewers[0]), "hello??").await?;
    casts.owner_say(OwnerId(1), channel, "/kick Spectator(2)").await?;
    casts.owner_say(OwnerId(1), channel, "/spectators").await?;
    casts.owner_say(OwnerId(1), channel, "/password hunter2").await?;

    match casts.list_casts(Some("hunter2".into())).await? {
        DirectoryReply::Casts(entries) => {
            for entry in &entries {
                println!(
                    "directory: {} ({} viewers, protected={})",
                    entry.display_name, entry.viewer_count, entry.password_protected
                );
            }
            let payload = encode_cast_list(&entries, &connect_info);
            println!("directory payload: {} bytes", payload.len());
        }
        other => println!("directory: {}", other.message().unwrap_or_default()),
    }

    let stopped = server.shutdown().await?;
    println!("stopped {} cast(s)", stopped);

    // Viewers were disconnected by the stop; the owner stays logged in
    drop(casts);
    drop(viewers);
    for writer in writers.drain(1..) {
        writer.await?;
    }

    println!("store history: {:?}", store.history().await);
    Ok(())
}
