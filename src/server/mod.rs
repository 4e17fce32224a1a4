//! JSON HTTP API over the picker's resolution paths.

mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::config::PickerConfig;
use crate::location::Geocoder;

pub use state::AppState;

pub fn build_router(geocoder: Arc<dyn Geocoder>, config: PickerConfig) -> Router {
    let state = Arc::new(AppState { geocoder, config });

    Router::new()
        .route("/api/parse", get(handlers::parse))
        .route("/api/suggest", get(handlers::suggest))
        .route("/api/search", get(handlers::search))
        .route("/api/estimate", get(handlers::estimate))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, geocoder: Arc<dyn Geocoder>, config: PickerConfig) -> std::io::Result<()> {
    let app = build_router(geocoder, config);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("solarpin server listening on http://{}", addr);
    axum::serve(listener, app).await
}
