//! Simulated GPS sender: streams fixes to a receiver over one TCP connection.
//!
//! Fixes are either random positions or positions parsed from NMEA sentences
//! read on stdin (one per line, e.g. piped from a serial GPS module).

use anyhow::Context;
use clap::Parser;
use gpsrx::latency::epoch_seconds;
use gpsrx::nmea::{self, Position};
use gpsrx::{LoggingConfig, codec, logging};
use rand::Rng;
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

#[derive(Debug, Parser)]
#[command(version, about = "Send simulated GPS fixes to a gps-receiver")]
struct Args {
    /// Receiver host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Receiver port
    #[arg(short, long, default_value_t = gpsrx::config::DEFAULT_PORT)]
    port: u16,

    /// Milliseconds between fixes
    #[arg(short, long, default_value_t = 1000)]
    interval_ms: u64,

    /// Stop after this many fixes
    #[arg(short, long)]
    count: Option<u64>,

    /// Read NMEA sentences from stdin instead of generating random fixes
    #[arg(long)]
    nmea: bool,

    /// Altitude in meters attached to every fix
    #[arg(long, default_value_t = 10.0)]
    altitude: f64,
}

fn random_position(rng: &mut impl Rng, altitude: f64) -> Position {
    let round6 = |v: f64| (v * 1e6).round() / 1e6;
    Position {
        latitude: round6(rng.random_range(-90.0..=90.0)),
        longitude: round6(rng.random_range(-180.0..=180.0)),
        altitude,
    }
}

async fn send(stream: &mut TcpStream, position: Position) -> anyhow::Result<()> {
    let fix = position.into_fix(epoch_seconds(SystemTime::now()));
    stream.write_all(codec::encode(&fix).as_bytes()).await.context("writing frame")?;
    debug!(lat = fix.latitude, lon = fix.longitude, sent_at = fix.sent_at, "Sent fix");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(&LoggingConfig::default())?;

    let address = format!("{}:{}", args.host, args.port);
    let mut stream = TcpStream::connect(&address)
        .await
        .with_context(|| format!("connecting to {address}"))?;
    stream.set_nodelay(true)?;
    info!("Connected to {}", address);

    let interval = Duration::from_millis(args.interval_ms);
    let mut sent = 0u64;

    if args.nmea {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if args.count.is_some_and(|max| sent >= max) {
                break;
            }
            match nmea::parse_sentence(&line, args.altitude) {
                Ok(position) => {
                    send(&mut stream, position).await?;
                    sent += 1;
                    tokio::time::sleep(interval).await;
                }
                Err(e) => debug!("Skipping line: {}", e),
            }
        }
    } else {
        let mut rng = rand::rng();
        while args.count.is_none_or(|max| sent < max) {
            let position = random_position(&mut rng, args.altitude);
            send(&mut stream, position).await?;
            sent += 1;
            tokio::time::sleep(interval).await;
        }
    }

    if let Err(e) = stream.shutdown().await {
        warn!("Shutdown failed: {}", e);
    }
    info!("Sent {} fixes", sent);
    Ok(())
}
