// College Finder - HTTP API
// Presentation layer over the catalog: every request recomputes its view from
// the current working set.

use crate::catalog::{Catalog, CatalogQuery, Facets, Filters, SortOrder};
use crate::college::{CollegeRecord, CollegeType};
use crate::import::{import_delimited, import_json};
use crate::locations::{group_by_location, LocationGroup};
use crate::validation::validate_neet_mark;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    catalog: Arc<RwLock<Catalog>>,
}

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Catalog) -> T) -> T {
        let catalog = self.catalog.read().unwrap_or_else(|p| p.into_inner());
        f(&catalog)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}

/// Query string accepted by the list and location endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    q: Option<String>,
    sort_by_rank: Option<bool>,
    sort: Option<SortOrder>,
    state: Option<String>,
    category: Option<String>,
    quota: Option<String>,
    #[serde(rename = "type")]
    college_type: Option<String>,
    branch: Option<String>,
    hostel: Option<bool>,
    min_rating: Option<f64>,
    all_fields: Option<bool>,
}

impl From<ListParams> for CatalogQuery {
    fn from(params: ListParams) -> Self {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        CatalogQuery {
            query: params.q.unwrap_or_default(),
            sort_by_rank: params.sort_by_rank.unwrap_or(false),
            sort: params.sort.unwrap_or_default(),
            filters: Filters {
                state: non_blank(params.state),
                category: non_blank(params.category),
                quota: non_blank(params.quota),
                college_type: non_blank(params.college_type).map(|t| CollegeType::parse(&t)),
                branch: non_blank(params.branch),
                hostel_required: params.hostel.unwrap_or(false),
                min_rating: params.min_rating,
                search_all_fields: params.all_fields.unwrap_or(false),
            },
        }
    }
}

#[derive(Serialize)]
struct CollegeList {
    total: usize,
    shown: usize,
    colleges: Vec<CollegeRecord>,
}

#[derive(Serialize)]
struct ImportSummary {
    source: String,
    records: usize,
    ranked: usize,
    ignored_columns: Vec<String>,
    defaulted_cells: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImportParams {
    format: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NeetParams {
    mark: String,
}

#[derive(Serialize)]
struct NeetResult {
    mark: u16,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/colleges - Filtered, searched and sorted view
async fn list_colleges(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let query = CatalogQuery::from(params);
    let (total, colleges) = state.read(|catalog| (catalog.len(), catalog.view(&query)));

    ApiResponse::ok(CollegeList {
        total,
        shown: colleges.len(),
        colleges,
    })
}

/// GET /api/colleges/:id - One college
async fn get_college(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.read(|catalog| catalog.get(&id).cloned()) {
        Some(college) => ApiResponse::ok(college),
        None => error_response(StatusCode::NOT_FOUND, format!("college not found: {}", id)),
    }
}

/// POST /api/colleges/import - Replace the working set with an uploaded sheet
async fn import_colleges(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    body: Bytes,
) -> Response {
    let format = params.format.unwrap_or_else(|| "csv".to_string()).to_lowercase();
    let report = match format.as_str() {
        "csv" => import_delimited(&body[..], b','),
        "tsv" => import_delimited(&body[..], b'\t'),
        "json" => import_json(&body[..]),
        other => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("unsupported file format: {}", other),
            )
        }
    };

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "import rejected");
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let source = params.name.unwrap_or_else(|| format!("upload.{}", format));
    let summary = ImportSummary {
        source: source.clone(),
        records: report.records.len(),
        ranked: report.ranked_count(),
        ignored_columns: report.ignored_columns.clone(),
        defaulted_cells: report.defaulted_cells,
    };

    {
        let mut catalog = state.catalog.write().unwrap_or_else(|p| p.into_inner());
        catalog.replace(report.records, source);
    }
    info!(records = summary.records, "catalog replaced via upload");

    ApiResponse::ok(summary)
}

/// GET /api/facets - Distinct filter values
async fn get_facets(State(state): State<AppState>) -> Response {
    let facets: Facets = state.read(Catalog::facets);
    ApiResponse::ok(facets)
}

/// GET /api/locations - Current view grouped for the map
async fn get_locations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let query = CatalogQuery::from(params);
    let groups: Vec<LocationGroup> = state.read(|catalog| group_by_location(&catalog.view(&query)));
    ApiResponse::ok(groups)
}

/// GET /api/neet/validate?mark= - NEET mark check
async fn validate_neet(Query(params): Query<NeetParams>) -> Response {
    match validate_neet_mark(&params.mark) {
        Ok(mark) => ApiResponse::ok(NeetResult { mark }),
        Err(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e.message),
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/colleges", get(list_colleges))
        .route("/colleges/import", post(import_colleges))
        .route("/colleges/:id", get(get_college))
        .route("/facets", get(get_facets))
        .route("/locations", get(get_locations))
        .route("/neet/validate", get(validate_neet))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(Catalog::seeded()))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(app(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_list_with_search_and_rank_sort() {
        let (status, body) =
            get_json(app(), "/api/colleges?q=medical&sort_by_rank=true&type=medical").await;
        assert_eq!(status, StatusCode::OK);

        let ranks: Vec<u64> = body["data"]["colleges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["rank"].as_u64().unwrap())
            .collect();
        assert!(!ranks.is_empty());
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "Ranks ascending: {:?}", ranks);
        assert_eq!(body["data"]["total"], 10);
    }

    #[tokio::test]
    async fn test_get_college_not_found() {
        let (status, body) = get_json(app(), "/api/colleges/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_import_replaces_catalog() {
        let state = AppState::new(Catalog::seeded());
        let csv = "id,name,rank\nx,Uploaded College,7\ny,,\n";

        let request = Request::post("/api/colleges/import?name=sheet.csv")
            .body(Body::from(csv))
            .unwrap();
        let (status, body) = send(router(state.clone()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["records"], 2);
        assert_eq!(body["data"]["ranked"], 1);

        let (_, body) = get_json(router(state.clone()), "/api/colleges").await;
        assert_eq!(body["data"]["total"], 2, "Upload replaces, never merges");
        assert_eq!(body["data"]["colleges"][1]["name"], "Unnamed College");

        let (status, _) = get_json(router(state), "/api/colleges/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_import_accepts_latin1_bytes() {
        let state = AppState::new(Catalog::seeded());
        let sheet: &[u8] = b"name,rank\nCol\xE9ge,5\n";

        let request = Request::post("/api/colleges/import")
            .body(Body::from(sheet.to_vec()))
            .unwrap();
        let (status, body) = send(router(state.clone()), request).await;
        assert_eq!(status, StatusCode::OK, "Invalid UTF-8 is decoded lossily, not rejected");
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["records"], 1);

        let (_, body) = get_json(router(state), "/api/colleges").await;
        assert_eq!(body["data"]["colleges"][0]["name"], "Col\u{FFFD}ge");
        assert_eq!(body["data"]["colleges"][0]["rank"], 5);
    }

    #[tokio::test]
    async fn test_import_rejects_unknown_format() {
        let request = Request::post("/api/colleges/import?format=xlsx")
            .body(Body::from("junk"))
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("xlsx"));
    }

    #[tokio::test]
    async fn test_neet_validation_endpoint() {
        let (status, body) = get_json(app(), "/api/neet/validate?mark=650").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["mark"], 650);

        let (status, _) = get_json(app(), "/api/neet/validate?mark=721").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_facets_and_locations() {
        let (_, body) = get_json(app(), "/api/facets").await;
        assert!(body["data"]["states"]
            .as_array()
            .unwrap()
            .contains(&Value::from("Tamil Nadu")));

        let (_, body) = get_json(app(), "/api/locations?state=Delhi").await;
        let groups = body["data"].as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["display_name"], "New Delhi, Delhi");
    }
}
