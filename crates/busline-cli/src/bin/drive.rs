//! Simulate a bus driver sharing their position with a busline server.

use busline_cli::sim::{CircularRoute, LinearRoute, RoutePath};
use busline_cli::BuslineClient;
use clap::{Parser, ValueEnum};
use std::time::Duration;
use tokio::time;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RouteKind {
    /// Loop around the start point
    Circle,
    /// Drive straight to --to-lat/--to-lng and wait there
    Line,
}

/// Log in as a driver and stream simulated positions
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Busline server URL
    #[arg(long, default_value = "http://localhost:5000")]
    url: String,

    #[arg(long, default_value = "driver1")]
    username: String,

    #[arg(long, default_value = "pass123")]
    password: String,

    #[arg(long, value_enum, default_value_t = RouteKind::Circle)]
    route: RouteKind,

    /// Start (or circle center) latitude
    #[arg(long, default_value_t = 15.3173)]
    lat: f64,

    /// Start (or circle center) longitude
    #[arg(long, default_value_t = 75.7139)]
    lng: f64,

    /// Destination latitude for --route line
    #[arg(long, default_value_t = 15.3350)]
    to_lat: f64,

    /// Destination longitude for --route line
    #[arg(long, default_value_t = 75.7300)]
    to_lng: f64,

    /// Circle radius in meters
    #[arg(long, default_value_t = 400.0)]
    radius: f64,

    /// Bus speed in m/s
    #[arg(long, default_value_t = 10.0)]
    speed: f64,

    /// Reported GPS accuracy in meters
    #[arg(long)]
    accuracy: Option<f64>,

    /// Duration in seconds
    #[arg(long, default_value_t = 60)]
    duration: u64,

    /// Update rate in Hz
    #[arg(long, default_value_t = 0.5)]
    rate: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if !(args.rate > 0.0 && args.rate.is_finite()) {
        anyhow::bail!("--rate must be a positive number");
    }

    println!("Connecting to busline server at {}...", args.url);
    let mut client = BuslineClient::new(&args.url)?;
    client.login(&args.username, &args.password).await?;
    println!("Logged in as {}", args.username);

    let route: Box<dyn RoutePath> = match args.route {
        RouteKind::Circle => Box::new(CircularRoute::new(args.lat, args.lng, args.radius, args.speed)),
        RouteKind::Line => Box::new(LinearRoute::new(
            (args.lat, args.lng),
            (args.to_lat, args.to_lng),
            args.speed,
        )),
    };

    println!("Driving {:?} route from ({}, {})", args.route, args.lat, args.lng);
    println!("  Duration: {}s, Update rate: {}Hz", args.duration, args.rate);
    println!();

    let start = time::Instant::now();
    let mut sent = 0u32;
    let mut interval = time::interval(Duration::from_secs_f64(1.0 / args.rate));

    loop {
        interval.tick().await;

        let elapsed = start.elapsed().as_secs_f64();
        if elapsed > args.duration as f64 {
            break;
        }

        let (lat, lng) = route.position_at(elapsed);
        match client.update_location(lat, lng, args.accuracy).await {
            Ok(timestamp) => {
                sent += 1;
                println!("[{:3}] ({:.6}, {:.6}) recorded at {}", sent, lat, lng, timestamp);
            }
            Err(e) => tracing::warn!("Location update failed: {:#}", e),
        }
    }

    if let Some(record) = client.my_location().await? {
        println!(
            "\nServer has {} at ({:.6}, {:.6}) as of {}",
            record.owner, record.latitude, record.longitude, record.captured_at
        );
    }
    client.logout().await?;

    println!("Done. Sent {} position updates.", sent);
    Ok(())
}
