use crate::engine::{BusTracker, PositionReport, ReporterRole, SubmitOutcome, VirtualBus};
use crate::geo::Point;
use crate::matcher::coverage::covers_request;
use crate::matcher::{
    find_peers_on_same_vehicle, match_live_vehicles, route_coverage, ActiveRide, LiveVehicle,
    MatchedVehicle, PeerSummary, RouteSegment, VehicleIdentity,
};
use crate::realtime::LiveSnapshot;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub struct AppState {
    pub tracker: Arc<BusTracker>,
    pub live_snapshot: LiveSnapshot,
}

pub async fn run_server(state: Arc<AppState>, port: u16) {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/broadcast-location", post(broadcast_location))
        .route("/api/virtual-buses", get(virtual_buses))
        .route("/api/live-buses", get(live_buses))
        .route("/api/routes", get(active_routes))
        .route("/api/match-vehicles", post(match_vehicles))
        .route("/api/carpool/coverage", post(carpool_coverage))
        .route("/api/carpool/same-bus-peers", post(same_bus_peers))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    println!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// A rider's location broadcast. The client may send a `timestamp` field; it
/// is ignored, the report is stamped with server receipt time instead.
#[derive(Debug, Deserialize)]
struct BroadcastPayload {
    user_id: String,
    route_id: String,
    lat: f64,
    lng: f64,
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    role: ReporterRole,
}

async fn broadcast_location(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BroadcastPayload>,
) -> Json<serde_json::Value> {
    // NaN/infinite coordinates must not reach the geo primitives.
    if !payload.lat.is_finite() || !payload.lng.is_finite() {
        return Json(json!({ "status": "ignored", "reason": "invalid_coordinates" }));
    }

    let report = PositionReport {
        reporter_id: payload.user_id,
        route_id: payload.route_id,
        lat: payload.lat,
        lng: payload.lng,
        timestamp: 0, // stamped by the tracker
        speed: payload.speed,
        role: payload.role,
    };

    match state.tracker.submit_report(report).await {
        SubmitOutcome::Accepted { active_reports } => Json(json!({
            "status": "success",
            "active_reports": active_reports,
        })),
        SubmitOutcome::Ignored { reason } => Json(json!({
            "status": "ignored",
            "reason": reason,
        })),
    }
}

async fn virtual_buses(State(state): State<Arc<AppState>>) -> Json<Vec<VirtualBus>> {
    let buses = state.tracker.virtual_buses().await;
    Json(buses.as_ref().clone())
}

async fn live_buses(State(state): State<Arc<AppState>>) -> Json<Vec<LiveVehicle>> {
    let snapshot = state.live_snapshot.read().await;
    Json(snapshot.clone())
}

async fn active_routes(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.tracker.active_routes().await)
}

#[derive(Debug, Deserialize)]
struct MatchVehiclesPayload {
    start_lat: f64,
    start_lng: f64,
    end_lat: f64,
    end_lng: f64,
}

async fn match_vehicles(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MatchVehiclesPayload>,
) -> Json<Vec<MatchedVehicle>> {
    let snapshot = state.live_snapshot.read().await.clone();
    let matches = match_live_vehicles(
        Point {
            lat: payload.start_lat,
            lng: payload.start_lng,
        },
        Point {
            lat: payload.end_lat,
            lng: payload.end_lng,
        },
        &snapshot,
    );
    Json(matches)
}

#[derive(Debug, Deserialize)]
struct CoveragePayload {
    ride: RouteSegment,
    request: RouteSegment,
}

/// Carpool search helper: how much of the request the offered ride covers,
/// plus the admission verdict.
async fn carpool_coverage(Json(payload): Json<CoveragePayload>) -> Json<serde_json::Value> {
    Json(json!({
        "coverage": route_coverage(&payload.ride, &payload.request),
        "match": covers_request(&payload.ride, &payload.request),
    }))
}

/// The carpool subsystem owns the active rides and hands them in per call.
#[derive(Debug, Deserialize)]
struct SameBusPeersPayload {
    rides: Vec<ActiveRide>,
    #[serde(flatten)]
    identity: VehicleIdentity,
    exclude_id: Option<String>,
}

async fn same_bus_peers(Json(payload): Json<SameBusPeersPayload>) -> Json<Vec<PeerSummary>> {
    Json(find_peers_on_same_vehicle(
        &payload.rides,
        &payload.identity,
        payload.exclude_id.as_deref(),
    ))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
