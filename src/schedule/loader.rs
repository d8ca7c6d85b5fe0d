use crate::schedule::{ScheduleIndex, ScheduleStop};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;

/// One row of the merged schedule CSV. Extra columns in the file are ignored.
#[derive(Debug, Deserialize)]
struct ScheduleRow {
    trip_id: String,
    route_id: String,
    stop_id: String,
    stop_lat: f64,
    stop_lon: f64,
    arrival_time: String,
}

pub fn load_schedule(
    path: &str,
) -> Result<ScheduleIndex, Box<dyn std::error::Error + Send + Sync>> {
    println!("Loading schedule from {}", path);
    let file = File::open(path)?;
    read_schedule(file)
}

fn read_schedule<R: std::io::Read>(
    reader: R,
) -> Result<ScheduleIndex, Box<dyn std::error::Error + Send + Sync>> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let mut rows: Vec<ScheduleRow> = Vec::new();
    for result in csv_reader.deserialize() {
        let row: ScheduleRow = result?;
        rows.push(row);
    }

    rows.sort_by(|a, b| {
        (a.trip_id.as_str(), a.arrival_time.as_str())
            .cmp(&(b.trip_id.as_str(), b.arrival_time.as_str()))
    });

    let mut stops_by_route: HashMap<String, Vec<ScheduleStop>> = HashMap::new();
    for row in rows {
        // Rows with malformed arrival times carry no usable schedule signal.
        let Some(scheduled_secs) = parse_time_to_secs(&row.arrival_time) else {
            continue;
        };

        stops_by_route
            .entry(row.route_id.clone())
            .or_default()
            .push(ScheduleStop {
                route_id: row.route_id,
                stop_id: row.stop_id,
                lat: row.stop_lat,
                lon: row.stop_lon,
                scheduled_secs,
            });
    }

    Ok(ScheduleIndex::new(stops_by_route))
}

/// Parse a GTFS-style "HH:MM:SS" time into seconds since midnight. Hours may
/// exceed 23 for post-midnight trips.
fn parse_time_to_secs(time_str: &str) -> Option<u32> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() >= 2 {
        let hours: u32 = parts[0].trim().parse().ok()?;
        let mins: u32 = parts[1].trim().parse().ok()?;
        let secs: u32 = parts.get(2).and_then(|s| s.trim().parse().ok()).unwrap_or(0);
        Some(hours * 3600 + mins * 60 + secs)
    } else {
        None
    }
}
