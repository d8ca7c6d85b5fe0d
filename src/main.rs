mod api;
mod engine;
mod geo;
mod matcher;
mod realtime;
mod schedule;

use clap::Parser;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Parser)]
#[command(name = "sawaari")]
#[command(about = "Crowd-sourced realtime transit inference and matching service")]
struct Args {
    /// Port to run the HTTP server on
    #[arg(short, long, env = "SERVER_PORT", default_value = "8080")]
    port: u16,

    /// Path to the merged schedule CSV
    /// (trip_id,route_id,stop_id,stop_lat,stop_lon,arrival_time)
    #[arg(long, env = "SCHEDULE_PATH", default_value = "final_merged_with_stops.csv")]
    schedule_path: String,

    /// GTFS-RT VehiclePositions feed polled for the live-vehicle snapshot.
    /// When unset, no fetcher runs and the snapshot stays empty.
    #[arg(long, env = "FEED_URL")]
    feed_url: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    println!("Starting sawaari realtime service...");

    // A missing schedule degrades delay estimation to no-match; the service
    // must stay available with partial data.
    let schedule = match schedule::load_schedule(&args.schedule_path) {
        Ok(index) => {
            if index.is_empty() {
                println!("Schedule file contained no usable rows, delay estimation disabled");
            } else {
                println!(
                    "Loaded {} stops across {} routes",
                    index.stop_count(),
                    index.route_count()
                );
            }
            Arc::new(index)
        }
        Err(e) => {
            eprintln!(
                "Failed to load schedule from {}: {} (delay estimation disabled)",
                args.schedule_path, e
            );
            Arc::new(schedule::ScheduleIndex::default())
        }
    };

    let tracker = Arc::new(engine::BusTracker::new(schedule));
    let live_snapshot: realtime::LiveSnapshot = Arc::new(RwLock::new(Vec::new()));

    if let Some(feed_url) = args.feed_url {
        let fetcher_snapshot = live_snapshot.clone();
        tokio::spawn(async move {
            realtime::fetcher::run_fetcher(feed_url, fetcher_snapshot).await;
        });
    } else {
        println!("No FEED_URL configured, live-vehicle snapshot will stay empty");
    }

    let state = Arc::new(api::server::AppState {
        tracker,
        live_snapshot,
    });
    api::server::run_server(state, args.port).await;
}
