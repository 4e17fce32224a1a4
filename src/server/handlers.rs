use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::estimate::{mock_estimate, SolarEstimate};
use crate::location::{parse_coordinates, Coordinate, LocationError, Suggestion};
use crate::picker::Notice;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

#[derive(Deserialize)]
pub struct TextQuery {
    pub q: Option<String>,
}

impl TextQuery {
    fn text(&self) -> &str {
        self.q.as_deref().unwrap_or("").trim()
    }
}

async fn lookup(
    state: &AppState,
    query: &str,
    limit: usize,
) -> Result<Vec<Suggestion>, LocationError> {
    let geocoder = Arc::clone(&state.geocoder);
    let query = query.to_string();
    tokio::task::spawn_blocking(move || geocoder.search(&query, limit))
        .await
        .map_err(|e| LocationError::Network(format!("lookup task failed: {}", e)))?
}

// ─── GET /api/parse ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct ParseResponse {
    pub coordinate: Option<Coordinate>,
}

pub async fn parse(Query(params): Query<TextQuery>) -> Json<ParseResponse> {
    Json(ParseResponse {
        coordinate: parse_coordinates(params.text()),
    })
}

// ─── GET /api/suggest ────────────────────────────────────────────

/// Best-effort: failures and coordinate input both yield an empty list.
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TextQuery>,
) -> Json<Vec<Suggestion>> {
    let query = params.text();
    if query.is_empty() || parse_coordinates(query).is_some() {
        return Json(Vec::new());
    }

    let start = Instant::now();
    let found = match lookup(&state, query, state.config.suggestion_limit).await {
        Ok(found) => found,
        Err(e) => {
            debug!(query, error = %e, "suggestion lookup failed");
            Vec::new()
        }
    };

    debug!(
        query,
        count = found.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/suggest"
    );
    Json(found)
}

// ─── GET /api/search ─────────────────────────────────────────────

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TextQuery>,
) -> Result<Json<Suggestion>, ApiError> {
    let query = params.text();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'q' parameter"));
    }

    if let Some(coordinate) = parse_coordinates(query) {
        return Ok(Json(Suggestion::new(query, coordinate)));
    }

    let start = Instant::now();
    let found = lookup(&state, query, 1).await.map_err(|e| {
        warn!(query, error = %e, "location search failed");
        api_error(StatusCode::BAD_GATEWAY, Notice::SearchFailed.to_string())
    })?;

    let best = found
        .into_iter()
        .next()
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, Notice::LocationNotFound.to_string()))?;

    info!(
        query,
        label = %best.label,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/search"
    );
    Ok(Json(best))
}

// ─── GET /api/estimate ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct EstimateQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

pub async fn estimate(Query(params): Query<EstimateQuery>) -> Result<Json<SolarEstimate>, ApiError> {
    let (Some(lat), Some(lng)) = (params.lat, params.lng) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Provide 'lat' and 'lng' parameters"));
    };
    let at = Coordinate::new(lat, lng).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "Invalid coordinates. Lat: -90..90, Lng: -180..180",
        )
    })?;
    Ok(Json(mock_estimate(at)))
}
