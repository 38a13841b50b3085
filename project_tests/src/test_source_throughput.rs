use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::net::TcpStream;

use lib_vecstream::{FrameDecoder, RateTracker, RunningStats};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Source host
    #[clap(long, default_value = "127.0.0.1")]
    host: String,

    /// Source port
    #[clap(short, long, default_value_t = 8888)]
    port: u16,

    /// Frames to read before reporting
    #[clap(short, long, default_value_t = 5000)]
    frames: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let addr = format!("{}:{}", args.host, args.port);
    println!("Connecting to {}...", addr);
    let stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("Failed to connect to {}", addr))?;
    stream.set_nodelay(true)?;

    let mut decoder = FrameDecoder::new(stream);
    let mut rate = RateTracker::new();
    rate.size_hint(args.frames as usize);
    let mut payload_bytes = RunningStats::new();

    while decoder.frames_decoded() < args.frames {
        match decoder.next_frame().await? {
            Some(frame) => {
                rate.record_event();
                payload_bytes.observe(frame.declared_length as f64);
            }
            None => {
                println!("Source closed after {} frames.", decoder.frames_decoded());
                break;
            }
        }
    }

    if rate.len() < 2 {
        bail!("not enough frames to measure a rate ({} received)", decoder.frames_decoded());
    }

    // The first sample is always 0 Hz; report the steady part separately.
    let steady: RunningStats = rate.samples()[1..].iter().copied().collect();
    let (mean, std) = rate.result();
    let (steady_mean, steady_std) = steady.result();

    println!("\n----- Throughput Summary -----");
    println!("Frames:        {}", decoder.frames_decoded());
    println!("Payload size:  {:.1} bytes avg", payload_bytes.mean());
    println!("Rate (all):    {:.2} Hz  std: {:.2} Hz", mean, std);
    println!("Rate (steady): {:.2} Hz  std: {:.2} Hz", steady_mean, steady_std);
    println!("------------------------------\n");
    Ok(())
}
