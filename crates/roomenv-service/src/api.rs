//! REST API endpoints for the roomenv-service.
//!
//! # Endpoints
//!
//! | Route          | Description                                          |
//! |----------------|------------------------------------------------------|
//! | `/api/health`  | Liveness check                                       |
//! | `/api/series`  | Bucketed series per room, optionally differential    |
//! | `/api/rooms`   | Rooms with recent samples                            |
//! | `/api/last`    | Most recent sample per room                          |
//! | `/api/samples` | Paginated raw samples                                |
//!
//! # Lock Acquisition
//!
//! Handlers validate their parameters before taking `state.store`, and hold
//! the lock for a single store call. The differential is computed after the
//! lock is released.
//!
//! ## Error Handling
//!
//! All endpoints return structured JSON errors via [`AppError`]. Invalid
//! parameters, oversized ranges and unknown reference rooms return HTTP 400;
//! storage failures return HTTP 500.
//!
//! # Example
//!
//! ```ignore
//! use roomenv_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, error};

use roomenv_store::{AggregateQuery, SampleQuery, StoredSample};
use roomenv_types::{Granularity, LatestSample, Series};

use crate::state::AppState;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/series", get(get_series))
        .route("/api/rooms", get(get_rooms))
        .route("/api/last", get(get_last))
        .route("/api/samples", get(get_samples))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

/// Parameters of a series request.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesParams {
    /// Range start, UTC epoch seconds.
    pub from: i64,
    /// Range end, UTC epoch seconds.
    pub to: i64,
    /// Bucket width.
    pub by: Granularity,
    /// Requested rooms; empty means every room.
    pub rooms: Vec<String>,
    /// Reference room for a differential series.
    pub reference: Option<String>,
}

impl SeriesParams {
    /// Parse query pairs, using `now` as the default end of range.
    ///
    /// `rooms` may be repeated; each value is one room name, taken verbatim.
    /// Empty values are treated as absent.
    pub fn parse(pairs: &[(String, String)], now: i64) -> Result<Self, AppError> {
        let mut params = Self {
            from: 0,
            to: now,
            by: Granularity::default(),
            rooms: Vec::new(),
            reference: None,
        };

        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "from" => params.from = parse_timestamp("from", value)?,
                "to" => params.to = parse_timestamp("to", value)?,
                "by" => {
                    params.by = value
                        .parse()
                        .map_err(|e: roomenv_types::ParseError| AppError::BadRequest(e.to_string()))?
                }
                "rooms" => params.rooms.push(value.clone()),
                "ref" => params.reference = Some(value.clone()),
                _ => {}
            }
        }

        Ok(params)
    }

    /// Build the aggregation, always including the reference room.
    pub fn to_query(&self, max_rows: u32) -> AggregateQuery {
        let mut rooms = self.rooms.clone();
        if let Some(reference) = &self.reference
            && !rooms.is_empty()
            && !rooms.contains(reference)
        {
            rooms.push(reference.clone());
        }
        AggregateQuery::new(self.from, self.to, self.by)
            .rooms(rooms)
            .limit(max_rows)
    }
}

fn parse_timestamp(name: &str, value: &str) -> Result<i64, AppError> {
    value.parse::<i64>().map_err(|_| {
        AppError::BadRequest(format!(
            "invalid '{}' value '{}': expected a UNIX timestamp in seconds",
            name, value
        ))
    })
}

fn to_instant(name: &str, timestamp: i64) -> Result<OffsetDateTime, AppError> {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|_| AppError::BadRequest(format!("'{}' value {} is out of range", name, timestamp)))
}

/// Get bucketed series.
///
/// # Query Parameters
///
/// - `from`: range start, UNIX seconds (default 0)
/// - `to`: range end, UNIX seconds (default now)
/// - `by`: one of `minute`, `hour`, `day`, `month`, `year` (default `hour`)
/// - `rooms`: room to include, repeated for several (default all)
/// - `ref`: reference room; every other room is returned relative to it
///
/// # Errors
///
/// - Returns [`AppError::BadRequest`] for invalid parameters, ranges
///   spanning more buckets than allowed, or a reference room with no data
/// - Returns [`AppError::Store`] if the database query fails
async fn get_series(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Series>, AppError> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let params = SeriesParams::parse(&pairs, now)?;
    let query = params.to_query(state.config.query.max_rows);
    query.check_row_cap()?;

    debug!(
        "GetSeries({}, {}, {}, {:?}, ref={:?})",
        params.from, params.to, params.by, params.rooms, params.reference
    );

    // An empty range has nothing to compare against, differential or not
    if query.is_empty_range() {
        return Ok(Json(Series::new()));
    }

    let series = {
        let store = state.store.lock().await;
        store.query_series(&query)?
    };

    match &params.reference {
        Some(reference) => Ok(Json(roomenv_store::diff(reference, params.by, &series)?)),
        None => Ok(Json(series)),
    }
}

/// Query parameters for the room directory and latest samples.
#[derive(Debug, Deserialize, Default)]
pub struct RecentQuery {
    pub since: Option<String>,
}

impl RecentQuery {
    /// Resolve `since`, defaulting to the configured window before `now`.
    pub fn since(&self, now: OffsetDateTime, window_days: u32) -> Result<OffsetDateTime, AppError> {
        match self.since.as_deref().filter(|s| !s.is_empty()) {
            Some(value) => {
                let since = parse_timestamp("since", value)?;
                to_instant("since", since)
            }
            None => Ok(now - Duration::days(i64::from(window_days))),
        }
    }
}

/// List rooms with at least one sample since `since`.
///
/// # Errors
///
/// - Returns [`AppError::BadRequest`] if `since` is not a timestamp
/// - Returns [`AppError::Store`] if the database query fails
async fn get_rooms(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let since = params.since(OffsetDateTime::now_utc(), state.config.query.rooms_window_days)?;
    let store = state.store.lock().await;
    Ok(Json(store.list_rooms(since)?))
}

/// Most recent sample of every recently active room.
async fn get_last(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentQuery>,
) -> Result<Json<BTreeMap<String, LatestSample>>, AppError> {
    let since = params.since(OffsetDateTime::now_utc(), state.config.query.rooms_window_days)?;
    let store = state.store.lock().await;
    Ok(Json(store.latest_samples(since)?))
}

/// Query parameters for raw samples.
#[derive(Debug, Deserialize, Default)]
pub struct SamplesQuery {
    pub room: Option<String>,
    pub since: Option<i64>,
    pub until: Option<i64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SamplesQuery {
    /// Validate the query parameters.
    /// Returns an error if `since > until`.
    pub fn validate(&self) -> Result<(), AppError> {
        if let (Some(since), Some(until)) = (self.since, self.until)
            && since > until
        {
            return Err(AppError::BadRequest(format!(
                "Invalid time range: 'since' ({}) must be less than or equal to 'until' ({})",
                since, until
            )));
        }
        Ok(())
    }
}

/// Paginated response wrapper with metadata.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// The data items.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Pagination metadata.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    /// Number of items returned.
    pub count: usize,
    /// Offset from the beginning.
    pub offset: u32,
    /// Maximum items requested (if specified).
    pub limit: Option<u32>,
    /// Whether there are more items available.
    pub has_more: bool,
}

/// Get raw samples, newest first.
///
/// # Query Parameters
///
/// - `room`: only samples of this room
/// - `since`: Unix timestamp to filter samples from (inclusive)
/// - `until`: Unix timestamp to filter samples until (inclusive)
/// - `limit`: Maximum number of samples to return
/// - `offset`: Number of samples to skip (for pagination)
///
/// # Errors
///
/// - Returns [`AppError::BadRequest`] if `since > until` or either bound is
///   outside the representable date range
/// - Returns [`AppError::Store`] if the database query fails
async fn get_samples(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SamplesQuery>,
) -> Result<Json<PaginatedResponse<StoredSample>>, AppError> {
    params.validate()?;

    let mut query = SampleQuery::new();
    if let Some(room) = &params.room {
        query = query.room(room);
    }
    if let Some(since) = params.since {
        query = query.since(to_instant("since", since)?);
    }
    if let Some(until) = params.until {
        query = query.until(to_instant("until", until)?);
    }

    // Request one extra item to determine if there are more
    if let Some(limit) = params.limit {
        query = query.limit(limit.saturating_add(1));
    }
    if let Some(offset) = params.offset {
        query = query.offset(offset);
    }

    let mut samples = {
        let store = state.store.lock().await;
        store.query_samples(&query)?
    };

    let has_more = params.limit.is_some_and(|l| samples.len() > l as usize);
    if has_more {
        samples.pop();
    }

    Ok(Json(PaginatedResponse {
        pagination: PaginationMeta {
            count: samples.len(),
            offset: params.offset.unwrap_or(0),
            limit: params.limit,
            has_more,
        },
        data: samples,
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Store(roomenv_store::Error),
}

impl From<roomenv_store::Error> for AppError {
    fn from(e: roomenv_store::Error) -> Self {
        match e {
            roomenv_store::Error::TooManyRows { .. } | roomenv_store::Error::ReferenceNotFound(_) => {
                AppError::BadRequest(e.to_string())
            }
            e => AppError::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => {
                debug!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::Store(e) => {
                error!("Storage failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use roomenv_store::Store;
    use roomenv_types::Measure;
    use tower::ServiceExt;

    use crate::config::Config;

    fn create_test_state() -> Arc<AppState> {
        let store = Store::open_in_memory().unwrap();
        let config = Config::default();
        AppState::new(store, config)
    }

    fn at(ts: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(ts).unwrap()
    }

    fn measure(temperature: i32, humidity: u16) -> Measure {
        Measure {
            temperature,
            humidity,
            offset: 0,
        }
    }

    /// Kitchen: 20.0/21.0 in the first hour, 22.0 in the second.
    /// Outside: 5.0 in the first hour only.
    async fn seed(state: &AppState) {
        let store = state.store.lock().await;
        store.append("kitchen", &measure(200, 400), at(0)).unwrap();
        store.append("kitchen", &measure(210, 420), at(1800)).unwrap();
        store.append("kitchen", &measure(220, 440), at(3600)).unwrap();
        store.append("outside", &measure(50, 800), at(600)).unwrap();
    }

    async fn get(state: Arc<AppState>, uri: &str) -> axum::response::Response {
        router()
            .with_state(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn response_body(response: axum::response::Response) -> String {
        let body = response.into_body();
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        serde_json::from_str(&response_body(response).await).unwrap()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = get(create_test_state(), "/api/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_series_hour_buckets() {
        let state = create_test_state();
        seed(&state).await;

        let response = get(state, "/api/series?from=0&to=7200&by=hour&rooms=kitchen").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        let kitchen = json["kitchen"].as_array().unwrap();
        assert_eq!(kitchen.len(), 2);
        assert_eq!(kitchen[0]["t"], 0);
        assert_eq!(kitchen[0]["tmin"], 20.0);
        assert_eq!(kitchen[0]["tavg"], 20.5);
        assert_eq!(kitchen[0]["tmax"], 21.0);
        assert_eq!(kitchen[1]["t"], 3600);
        assert_eq!(kitchen[1]["tavg"], 22.0);
        assert!(json.get("outside").is_none());
    }

    #[tokio::test]
    async fn test_series_empty_result() {
        let state = create_test_state();
        let response = get(state, "/api/series?from=0&to=3600").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_body(response).await, "{}");
    }

    #[tokio::test]
    async fn test_series_inverted_range_is_empty() {
        let state = create_test_state();
        seed(&state).await;

        let response = get(state, "/api/series?from=7200&to=0").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_body(response).await, "{}");
    }

    #[tokio::test]
    async fn test_series_differential_inverted_range_is_empty() {
        let state = create_test_state();
        seed(&state).await;

        let response = get(Arc::clone(&state), "/api/series?from=7200&to=0&ref=outside").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_body(response).await, "{}");

        let response = get(state, "/api/series?from=3600&to=3600&ref=outside").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_body(response).await, "{}");
    }

    #[tokio::test]
    async fn test_series_is_idempotent() {
        let state = create_test_state();
        seed(&state).await;

        let uri = "/api/series?from=0&to=7200&by=minute";
        let first = response_body(get(Arc::clone(&state), uri).await).await;
        let second = response_body(get(state, uri).await).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_series_rejects_too_many_rows() {
        let state = create_test_state();
        seed(&state).await;

        // One week by minute is 10080 buckets
        let response = get(state, "/api/series?from=0&to=604800&by=minute").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = response_json(response).await;
        let message = json["error"].as_str().unwrap();
        assert!(message.contains("too much data requested"));
        assert!(message.contains("10080"));
        assert!(message.contains("5000"));
    }

    #[tokio::test]
    async fn test_series_row_cap_boundary() {
        let state = create_test_state();

        let response = get(Arc::clone(&state), "/api/series?from=0&to=300000&by=minute").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(state, "/api/series?from=0&to=300001&by=minute").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_series_default_range_exceeds_row_cap() {
        let response = get(create_test_state(), "/api/series").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_series_bad_parameters() {
        for uri in [
            "/api/series?from=yesterday&to=3600",
            "/api/series?from=0&to=1.5",
            "/api/series?from=0&to=3600&by=week",
        ] {
            let response = get(create_test_state(), uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let json = response_json(response).await;
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_series_differential() {
        let state = create_test_state();
        seed(&state).await;

        let response = get(state, "/api/series?from=0&to=7200&by=hour&ref=outside").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert!(json.get("outside").is_none());
        let kitchen = json["kitchen"].as_array().unwrap();
        assert_eq!(kitchen.len(), 1);
        assert_eq!(kitchen[0]["t"], 0);
        assert_eq!(kitchen[0]["tavg"], 15.5);
        assert_eq!(kitchen[0]["havg"], -39.0);
    }

    #[tokio::test]
    async fn test_series_differential_includes_reference_in_filter() {
        let state = create_test_state();
        seed(&state).await;

        let response = get(state, "/api/series?from=0&to=7200&rooms=kitchen&ref=outside").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["kitchen"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_series_unknown_reference() {
        let state = create_test_state();
        seed(&state).await;

        let response = get(state, "/api/series?from=0&to=7200&ref=attic").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = response_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("attic"));
    }

    #[test]
    fn test_series_params_defaults() {
        let params = SeriesParams::parse(&[], 1_700_000_000).unwrap();
        assert_eq!(params.from, 0);
        assert_eq!(params.to, 1_700_000_000);
        assert_eq!(params.by, Granularity::Hour);
        assert!(params.rooms.is_empty());
        assert!(params.reference.is_none());
    }

    #[test]
    fn test_series_params_rooms_repeated() {
        let params = SeriesParams::parse(
            &pairs(&[("rooms", "kitchen"), ("rooms", "cellar"), ("rooms", "")]),
            0,
        )
        .unwrap();
        assert_eq!(params.rooms, vec!["kitchen", "cellar"]);
    }

    #[test]
    fn test_series_params_room_names_are_verbatim() {
        let params = SeriesParams::parse(&pairs(&[("rooms", "a,b"), ("rooms", " attic ")]), 0).unwrap();
        assert_eq!(params.rooms, vec!["a,b", " attic "]);
    }

    #[tokio::test]
    async fn test_series_room_filter_with_comma_in_name() {
        let state = create_test_state();
        {
            let store = state.store.lock().await;
            crate::mqtt::handle_message(&store, "/room/a,b/env", br#"{"t":200,"h":400}"#, at(10))
                .unwrap();
            store.append("a", &measure(100, 400), at(10)).unwrap();
        }

        for uri in [
            "/api/series?from=0&to=3600&rooms=a,b",
            "/api/series?from=0&to=3600&rooms=a%2Cb",
        ] {
            let json = response_json(get(Arc::clone(&state), uri).await).await;
            let rooms: Vec<&String> = json.as_object().unwrap().keys().collect();
            assert_eq!(rooms, vec!["a,b"], "{}", uri);
            assert_eq!(json["a,b"][0]["tavg"], 20.0);
        }
    }

    #[test]
    fn test_series_params_empty_values_use_defaults() {
        let params = SeriesParams::parse(&pairs(&[("from", ""), ("by", "")]), 100).unwrap();
        assert_eq!(params.from, 0);
        assert_eq!(params.by, Granularity::Hour);
    }

    #[test]
    fn test_series_params_to_query() {
        let params = SeriesParams::parse(
            &pairs(&[("from", "10"), ("to", "20"), ("by", "day"), ("rooms", "kitchen"), ("ref", "outside")]),
            0,
        )
        .unwrap();

        let query = params.to_query(100);
        assert_eq!(query.from, 10);
        assert_eq!(query.to, 20);
        assert_eq!(query.by, Granularity::Day);
        assert_eq!(query.rooms, vec!["kitchen", "outside"]);
        assert_eq!(query.limit, 100);

        // No filter means every room, reference included
        let all = SeriesParams::parse(&pairs(&[("ref", "outside")]), 0).unwrap();
        assert!(all.to_query(100).rooms.is_empty());
    }

    #[tokio::test]
    async fn test_rooms_endpoint() {
        let state = create_test_state();
        seed(&state).await;

        let response = get(Arc::clone(&state), "/api/rooms?since=0").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_body(response).await, r#"["kitchen","outside"]"#);

        let response = get(Arc::clone(&state), "/api/rooms?since=1000").await;
        assert_eq!(response_body(response).await, r#"["kitchen"]"#);

        // Seeded samples are far older than the default window
        let response = get(state, "/api/rooms").await;
        assert_eq!(response_body(response).await, "[]");
    }

    #[tokio::test]
    async fn test_rooms_bad_since() {
        let response = get(create_test_state(), "/api/rooms?since=never").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_last_endpoint() {
        let state = create_test_state();
        seed(&state).await;

        let response = get(state, "/api/last?since=0").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["kitchen"]["t"], 3600);
        assert_eq!(json["kitchen"]["temperature"], 22.0);
        assert_eq!(json["kitchen"]["humidity"], 44.0);
        assert_eq!(json["outside"]["t"], 600);
    }

    #[tokio::test]
    async fn test_last_endpoint_recent_default() {
        let state = create_test_state();
        {
            let store = state.store.lock().await;
            store
                .append("kitchen", &measure(215, 450), OffsetDateTime::now_utc())
                .unwrap();
        }

        let json = response_json(get(state, "/api/last").await).await;
        assert_eq!(json["kitchen"]["temperature"], 21.5);
    }

    #[tokio::test]
    async fn test_samples_pagination() {
        let state = create_test_state();
        seed(&state).await;

        let response = get(Arc::clone(&state), "/api/samples?room=kitchen&limit=2").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["pagination"]["count"], 2);
        assert_eq!(json["pagination"]["has_more"], true);
        assert_eq!(json["data"][0]["temperature"], 22.0);

        let json = response_json(get(state, "/api/samples?room=kitchen&limit=2&offset=2").await).await;
        assert_eq!(json["pagination"]["count"], 1);
        assert_eq!(json["pagination"]["offset"], 2);
        assert_eq!(json["pagination"]["has_more"], false);
    }

    #[tokio::test]
    async fn test_samples_out_of_range_bounds() {
        let state = create_test_state();
        seed(&state).await;

        for uri in [
            "/api/samples?since=999999999999999&room=kitchen",
            "/api/samples?until=-999999999999999&room=kitchen",
        ] {
            let response = get(Arc::clone(&state), uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);

            let json = response_json(response).await;
            assert!(json["error"].as_str().unwrap().contains("out of range"));
        }
    }

    #[tokio::test]
    async fn test_samples_invalid_range() {
        let response = get(create_test_state(), "/api/samples?since=100&until=10").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = response_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("Invalid time range"));
    }

    #[test]
    fn test_app_error_from_store() {
        let err: AppError = roomenv_store::Error::ReferenceNotFound("attic".to_string()).into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = roomenv_store::Error::TooManyRows {
            requested: 6000,
            max: 5000,
        }
        .into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = roomenv_store::Error::CreateDirectory {
            path: "/nonexistent".into(),
            source: std::io::Error::other("denied"),
        }
        .into();
        assert!(matches!(err, AppError::Store(_)));
    }

    #[test]
    fn test_app_error_status() {
        let response = AppError::BadRequest("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
