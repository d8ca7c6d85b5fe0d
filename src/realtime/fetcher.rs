use crate::matcher::LiveVehicle;
use crate::realtime::LiveSnapshot;
use prost::Message;
use std::time::Duration;

const FETCH_INTERVAL_SECS: u64 = 15;

/// Poll the operator's GTFS-RT VehiclePositions feed and keep the shared
/// snapshot fresh. On fetch or decode failure the previous snapshot stays in
/// place; the matching core never sees the error.
pub async fn run_fetcher(feed_url: String, snapshot: LiveSnapshot) {
    println!(
        "Starting live feed fetcher, polling every {}s",
        FETCH_INTERVAL_SECS
    );
    let client = reqwest::Client::new();

    loop {
        match fetch_snapshot(&client, &feed_url).await {
            Ok(vehicles) => {
                println!("Fetched {} live vehicles", vehicles.len());
                *snapshot.write().await = vehicles;
            }
            Err(e) => {
                eprintln!("Feed fetch error: {}", e);
            }
        }

        tokio::time::sleep(Duration::from_secs(FETCH_INTERVAL_SECS)).await;
    }
}

async fn fetch_snapshot(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<LiveVehicle>, Box<dyn std::error::Error + Send + Sync>> {
    let response = client.get(url).send().await?;
    let bytes = response.bytes().await?;
    let feed = gtfs_realtime::FeedMessage::decode(bytes.as_ref())?;
    Ok(vehicles_from_feed(&feed))
}

/// Map feed entities to the snapshot shape the matcher consumes. Entities
/// without a position are skipped.
pub fn vehicles_from_feed(feed: &gtfs_realtime::FeedMessage) -> Vec<LiveVehicle> {
    feed.entity
        .iter()
        .filter_map(|entity| {
            let vehicle = entity.vehicle.as_ref()?;
            let position = vehicle.position.as_ref()?;

            let vehicle_id = vehicle
                .vehicle
                .as_ref()
                .and_then(|v| v.id.clone())
                .unwrap_or_else(|| entity.id.clone());

            Some(LiveVehicle {
                vehicle_id,
                lat: position.latitude as f64,
                lng: position.longitude as f64,
                speed: position.speed.map(|s| s as f64).unwrap_or(0.0),
                trip_id: vehicle.trip.as_ref().and_then(|t| t.trip_id.clone()),
                route_label: vehicle.trip.as_ref().and_then(|t| t.route_id.clone()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_with_position(id: &str, lat: f32, lon: f32) -> gtfs_realtime::FeedEntity {
        let mut position = gtfs_realtime::Position::default();
        position.latitude = lat;
        position.longitude = lon;
        position.speed = Some(8.5);

        let mut trip = gtfs_realtime::TripDescriptor::default();
        trip.trip_id = Some("trip-1".to_string());
        trip.route_id = Some("52A".to_string());

        let mut vehicle = gtfs_realtime::VehiclePosition::default();
        vehicle.position = Some(position);
        vehicle.trip = Some(trip);

        let mut entity = gtfs_realtime::FeedEntity::default();
        entity.id = id.to_string();
        entity.vehicle = Some(vehicle);
        entity
    }

    #[test]
    fn maps_entities_and_skips_positionless_ones() {
        let mut feed = gtfs_realtime::FeedMessage::default();
        feed.entity.push(entity_with_position("bus-1", 28.6, 77.2));

        let mut empty = gtfs_realtime::FeedEntity::default();
        empty.id = "no-position".to_string();
        empty.vehicle = Some(gtfs_realtime::VehiclePosition::default());
        feed.entity.push(empty);

        let vehicles = vehicles_from_feed(&feed);
        assert_eq!(vehicles.len(), 1);
        let v = &vehicles[0];
        // No vehicle descriptor, so the entity id stands in.
        assert_eq!(v.vehicle_id, "bus-1");
        assert!((v.lat - 28.6).abs() < 1e-6);
        assert_eq!(v.trip_id.as_deref(), Some("trip-1"));
        assert_eq!(v.route_label.as_deref(), Some("52A"));
        assert!((v.speed - 8.5).abs() < 1e-6);
    }
}
