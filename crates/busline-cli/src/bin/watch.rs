//! Poll the public location feed, the way the viewer page does.

use busline_cli::BuslineClient;
use clap::Parser;
use std::time::Duration;
use tokio::time;

/// Print every bus's last known position at a fixed interval
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Busline server URL
    #[arg(long, default_value = "http://localhost:5000")]
    url: String,

    /// Seconds between polls
    #[arg(long, default_value_t = 5)]
    interval: u64,

    /// Stop after this many polls (0 = forever)
    #[arg(long, default_value_t = 0)]
    count: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let client = BuslineClient::new(&args.url)?;
    let mut interval = time::interval(Duration::from_secs(args.interval.max(1)));
    let mut polls = 0u64;

    loop {
        interval.tick().await;
        polls += 1;

        match client.locations().await {
            Ok(buses) if buses.is_empty() => println!("No buses have reported yet"),
            Ok(buses) => {
                println!("{} active bus(es):", buses.len());
                for (driver, record) in &buses {
                    println!(
                        "  {:<12} ({:.6}, {:.6}) ±{:.0}m  {}",
                        driver.as_str(),
                        record.latitude,
                        record.longitude,
                        record.accuracy,
                        record.captured_at
                    );
                }
            }
            Err(e) => tracing::warn!("Poll failed: {:#}", e),
        }

        if args.count > 0 && polls >= args.count {
            break;
        }
    }

    Ok(())
}
