//! # Vector Source
//!
//! Test server for the vector client. Every accepted connection gets its own
//! task that sends standard-normal random vectors at a fixed rate until the
//! client goes away or the process is signalled.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lib_vecstream::loggers::parse_level;
use lib_vecstream::protocol::write_vector;

mod signals;
use signals::shutdown_signal;

#[derive(Parser, Debug, Clone)]
#[clap(about = "Sends random f64 vectors to every connected client", version)]
struct Args {
    /// Address to bind to.
    #[clap(default_value = "127.0.0.1")]
    address: String,

    /// Port to bind to.
    #[clap(default_value_t = 8888)]
    port: u16,

    #[clap(long, env = "VECSTREAM_VECTOR_LEN", default_value_t = 50, help = "Values per vector.")]
    vector_len: usize,

    #[clap(long, env = "VECSTREAM_SEND_HZ", default_value_t = 1000, help = "Vectors per second per client.")]
    send_hz: u32,

    #[clap(long, env = "VECSTREAM_LOG_LEVEL", default_value = "info", help = "Logging level.")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(parse_level(&args.log_level).into())
                .from_env_lossy(),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let period = Duration::from_secs_f64(1.0 / f64::from(args.send_hz.max(1)));
    let listener = TcpListener::bind((args.address.as_str(), args.port))
        .await
        .with_context(|| format!("cannot bind {}:{}", args.address, args.port))?;
    tracing::info!("Serving on {}", listener.local_addr()?);

    let shutdown = CancellationToken::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_shutdown.cancel();
    });

    loop {
        let (socket, peer) = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("accept failed: {}", e);
                    continue;
                }
            },
        };

        tracing::info!("Received connection from {}", peer);
        let client_shutdown = shutdown.child_token();
        let vector_len = args.vector_len;
        tokio::spawn(async move {
            match send_vectors(socket, peer, vector_len, period, client_shutdown).await {
                Ok(sent) => tracing::info!("Client {} done after {} vectors", peer, sent),
                Err(e) => tracing::warn!("Client {} failed: {}", peer, e),
            }
        });
    }

    tracing::info!("Shutdown complete.");
    Ok(())
}

/// Sends one vector per `period` until the client disconnects or `shutdown`
/// fires. Returns the number of vectors sent.
async fn send_vectors(
    mut socket: TcpStream,
    peer: SocketAddr,
    vector_len: usize,
    period: Duration,
    shutdown: CancellationToken,
) -> Result<u64> {
    socket.set_nodelay(true)?;
    let mut rng = StdRng::from_os_rng();
    let mut values = vec![0.0f64; vector_len];
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut sent = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        fill_standard_normal(&mut rng, &mut values);
        if let Err(e) = write_vector(&mut socket, &values).await {
            tracing::info!("Client {} disconnected: {}", peer, e);
            break;
        }
        sent += 1;
    }
    Ok(sent)
}

fn fill_standard_normal<R: Rng>(rng: &mut R, values: &mut [f64]) {
    for value in values.iter_mut() {
        *value = rng.sample(StandardNormal);
    }
}
