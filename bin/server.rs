// Used Car Valuation Portal - Web Server
// Serves the analytics dashboard and the price-prediction form plus a JSON API

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use car_valuation::{
    avg_mileage_by_brand, avg_price_by_brand, avg_price_by_ownership, kms_vs_price, kpis,
    price_by_year, price_histogram, BrandStat, DashboardFilter, HistogramBin, Kpis,
    OwnershipStat, ScatterPoint, ValuationContext, ValuationPaths, VehicleInput,
};

const PRICE_HISTOGRAM_BINS: usize = 50;

/// Shared application state: the read-only startup context. No writer
/// exists after load, so no locking is needed; the recorder opens its own
/// connection per submission.
#[derive(Clone)]
struct AppState {
    ctx: Arc<ValuationContext>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

// ============================================================================
// Dashboard API
// ============================================================================

/// Sidebar filters as query parameters; list-valued filters arrive
/// comma-separated, e.g. /api/dashboard?brands=Maruti,Honda&year_min=2015
#[derive(Debug, Default, Deserialize)]
struct DashboardQuery {
    brands: Option<String>,
    ownerships: Option<String>,
    fuel_types: Option<String>,
    rto_states: Option<String>,
    transmission_types: Option<String>,
    year_min: Option<i64>,
    year_max: Option<i64>,
}

impl DashboardQuery {
    fn into_filter(self) -> DashboardFilter {
        fn split(value: Option<String>) -> Option<Vec<String>> {
            value.map(|s| {
                s.split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
        }

        let year_range = match (self.year_min, self.year_max) {
            (None, None) => None,
            (min, max) => Some((min.unwrap_or(i64::MIN), max.unwrap_or(i64::MAX))),
        };

        DashboardFilter {
            brands: split(self.brands),
            ownerships: split(self.ownerships),
            fuel_types: split(self.fuel_types),
            rto_states: split(self.rto_states),
            transmission_types: split(self.transmission_types),
            year_range,
        }
    }
}

#[derive(Serialize)]
struct DashboardResponse {
    total_count: usize,
    filtered_count: usize,
    kpis: Kpis,
    avg_price_by_brand: Vec<BrandStat>,
    avg_price_by_ownership: Vec<OwnershipStat>,
    avg_mileage_by_brand: Vec<BrandStat>,
    price_histogram: Vec<HistogramBin>,
    price_by_year: Vec<ScatterPoint>,
    kms_vs_price: Vec<ScatterPoint>,
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/options - Selection options for the prediction form
async fn get_options(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.ctx.options().clone()))
}

/// GET /api/dashboard - Filtered aggregates for every chart on the page
async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    let listings = state.ctx.listings();
    let filtered = query.into_filter().apply(listings);

    let response = DashboardResponse {
        total_count: listings.len(),
        filtered_count: filtered.len(),
        kpis: kpis(&filtered),
        avg_price_by_brand: avg_price_by_brand(&filtered, 15),
        avg_price_by_ownership: avg_price_by_ownership(&filtered),
        avg_mileage_by_brand: avg_mileage_by_brand(&filtered),
        price_histogram: price_histogram(&filtered, PRICE_HISTOGRAM_BINS),
        price_by_year: price_by_year(&filtered),
        kms_vs_price: kms_vs_price(&filtered),
    };

    Json(ApiResponse::ok(response))
}

// ============================================================================
// Prediction API
// ============================================================================

#[derive(Serialize)]
struct PredictResponse {
    low: f64,
    high: f64,
    display: String,
    /// Set when the best-effort persistence write failed; the range above
    /// is still valid
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

/// POST /api/predict - Run the full submission pipeline
async fn predict(
    State(state): State<AppState>,
    Json(input): Json<VehicleInput>,
) -> impl IntoResponse {
    match state.ctx.submit(&input) {
        Ok(valuation) => {
            if let Some(warning) = valuation.outcome.warning() {
                eprintln!("Recorder warning: {}", warning);
            }

            let response = PredictResponse {
                low: valuation.range.low,
                high: valuation.range.high,
                display: valuation.display,
                warning: valuation.outcome.warning().map(String::from),
            };

            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e) => {
            // Inference failure is fatal for this request only
            eprintln!("Prediction error: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Option<PredictResponse>> {
                    success: false,
                    data: None,
                    error: Some(format!("{:#}", e)),
                }),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Pages
// ============================================================================

/// GET / - Serve landing page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

/// GET /dashboard - Serve analytics dashboard
async fn serve_dashboard() -> impl IntoResponse {
    Html(include_str!("../web/dashboard.html"))
}

/// GET /predict - Serve prediction form
async fn serve_predict() -> impl IntoResponse {
    Html(include_str!("../web/predict.html"))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Used Car Valuation Portal - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let paths = ValuationPaths::from_env();

    let ctx = match ValuationContext::load(&paths) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("❌ Failed to load startup artifacts: {:#}", e);
            eprintln!("   Expected layout:");
            eprintln!("   {:?}", paths.dataset);
            eprintln!("   {:?}", paths.model_te);
            eprintln!("   {:?}", paths.rto_te);
            eprintln!("   {:?}", paths.global_mean);
            eprintln!("   {:?}", paths.price_model);
            std::process::exit(1);
        }
    };

    println!("✓ Reference listings: {}", ctx.listings().len());
    println!("✓ Brands: {}", ctx.options().brands.len());
    println!("✓ Range fraction: ±{}%", ctx.range_fraction() * 100.0);

    let state = AppState { ctx: Arc::new(ctx) };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/options", get(get_options))
        .route("/dashboard", get(get_dashboard))
        .route("/predict", post(predict))
        .with_state(state.clone());

    // Build main router
    let app = Router::new()
        .route("/", get(serve_index))
        .route("/dashboard", get(serve_dashboard))
        .route("/predict", get(serve_predict))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   Dashboard: http://localhost:3000/dashboard");
    println!("   Estimator: http://localhost:3000/predict");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
