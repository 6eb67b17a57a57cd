use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};

use crate::api::{selection, ApiEligibilityRequest, ApiEligibilityResponse, ApiRecommendRequest};
use admit_fit::config::TierConfig;
use admit_fit::institutions::{CountryWeights, InstitutionRow, InstitutionTable};
use admit_fit::seats::SeatTable;
use admit_fit::{recommend, Normalizer};

/// Reference tables shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    institutions: Arc<InstitutionTable>,
    seats: Arc<SeatTable>,
    normalizer: Arc<Normalizer>,
    tiers: TierConfig,
}

impl AppState {
    pub fn new(
        institutions: InstitutionTable,
        seats: SeatTable,
        normalizer: Normalizer,
        tiers: TierConfig,
    ) -> Self {
        Self {
            institutions: Arc::new(institutions),
            seats: Arc::new(seats),
            normalizer: Arc::new(normalizer),
            tiers,
        }
    }
}

#[derive(Deserialize)]
struct InstitutionsQuery {
    country: Option<String>,
}

#[derive(Serialize)]
struct InstitutionsResponse<'a> {
    countries: Vec<String>,
    country_weights: &'a [CountryWeights],
    institutions: Vec<&'a InstitutionRow>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/recommend", post(recommend_handler))
        .route("/api/eligibility", post(eligibility_handler))
        .route("/api/institutions", get(institutions_handler))
        .with_state(state)
}

pub async fn serve(args: crate::ServeArgs, state: AppState) -> Result<(), String> {
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind server: {}", err))?;

    info!(%addr, "serving admission fit API");
    axum::serve(listener, app)
        .await
        .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn recommend_handler(
    State(state): State<AppState>,
    Json(payload): Json<ApiRecommendRequest>,
) -> impl IntoResponse {
    let (raw, countries, classifier) = match payload.into_input(&state.tiers) {
        Ok(input) => input,
        Err(err) => return bad_request(err),
    };

    let profile = state.normalizer.normalize(&raw);
    let recommendation = recommend(&state.institutions, &profile, &countries, &classifier);
    (StatusCode::OK, Json(recommendation)).into_response()
}

async fn eligibility_handler(
    State(state): State<AppState>,
    Json(payload): Json<ApiEligibilityRequest>,
) -> impl IntoResponse {
    let query = match payload.into_query() {
        Ok(query) => query,
        Err(err) => return bad_request(err),
    };

    let rows = state.seats.filter(&query);
    (StatusCode::OK, Json(ApiEligibilityResponse::from_rows(rows))).into_response()
}

async fn institutions_handler(
    State(state): State<AppState>,
    Query(query): Query<InstitutionsQuery>,
) -> impl IntoResponse {
    let countries = selection(
        query
            .country
            .map(|value| value.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
    );
    let weights: Vec<CountryWeights> = state
        .institutions
        .country_weights()
        .iter()
        .filter(|entry| countries.is_empty() || countries.contains(&entry.country))
        .cloned()
        .collect();

    let response = InstitutionsResponse {
        countries: state.institutions.countries(),
        country_weights: &weights,
        institutions: state.institutions.by_global_rank(&countries),
    };
    (StatusCode::OK, Json(response)).into_response()
}

fn bad_request(message: String) -> axum::response::Response {
    warn!(%message, "rejected request");
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}
