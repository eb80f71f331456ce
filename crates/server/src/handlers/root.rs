use axum::Json;

/// Service index at `/`.
pub async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "netpulse API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/networks",
            "/countries",
            "/hegemony",
            "/hegemony/cones",
            "/hegemony/alarms",
            "/hegemony/countries",
            "/hegemony/prefixes",
            "/tr_hegemony",
            "/network_delay",
            "/network_delay/locations",
            "/network_delay/alarms",
            "/link/delay",
            "/link/forwarding",
            "/link/delay/alarms",
            "/link/forwarding/alarms",
            "/disco/events",
            "/disco/probes",
            "/metis/atlas/deployment",
            "/metis/atlas/selection",
        ],
    }))
}
