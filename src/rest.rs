/*!
gssdash REST API Server

Serves the dashboard page and the Vega-Lite specifications behind it.

## Usage

```bash
gssdash-rest --host 127.0.0.1 --port 8050
gssdash-rest --sample            # bundled extract, no network access
```

## Endpoints

- `GET /` - Dashboard page (vega-embed)
- `GET /api/v1/figures` - Every static figure, keyed by name
- `GET /api/v1/figures/:name` - One static figure
- `GET /api/v1/breakdown?feature=satjob&group=sex` - Interactive bar chart
- `GET /api/v1/options` - Selectable fields with descriptions
- `GET /api/v1/health` - Health check
- `GET /api/v1/version` - Version information
*/

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gssdash::dashboard::{Dashboard, StaticFigure};
use gssdash::reader::{self, load_sample};
use gssdash::writer::VegaLiteWriter;
use gssdash::{
    AttitudeField, BreakdownRequest, DashError, Figure, GroupField, LoaderConfig, VERSION,
};

/// CLI arguments for the REST API server
#[derive(Parser)]
#[command(name = "gssdash-rest")]
#[command(about = "gssdash REST API Server")]
#[command(version = VERSION)]
struct Cli {
    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind to
    #[arg(long, default_value = "8050")]
    port: u16,

    /// CORS allowed origins (comma-separated)
    #[arg(long, default_value = "*")]
    cors_origin: String,

    /// URL or path of the survey CSV (overrides the config file)
    #[arg(long)]
    source: Option<String>,

    /// JSON loader configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serve the bundled sample extract instead of fetching
    #[arg(long, default_value = "false")]
    sample: bool,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    dashboard: Arc<Dashboard>,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query string of /api/v1/breakdown
#[derive(Debug, Deserialize)]
struct BreakdownParams {
    #[serde(default = "default_feature")]
    feature: String,
    #[serde(default = "default_group")]
    group: String,
}

fn default_feature() -> String {
    AttitudeField::default().name().to_string()
}

fn default_group() -> String {
    GroupField::default().name().to_string()
}

/// Successful API response
#[derive(Debug, Serialize)]
struct ApiSuccess<T> {
    status: String,
    data: T,
}

/// Error API response
#[derive(Debug, Serialize)]
struct ApiError {
    status: String,
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

/// A rendered figure
#[derive(Debug, Serialize)]
struct FigureResult {
    name: String,
    heading: String,
    kind: String,
    /// Vega-Lite spec, or the table object for summary tables
    spec: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct FieldOption {
    name: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct OptionsResult {
    features: Vec<FieldOption>,
    groups: Vec<FieldOption>,
    default_feature: String,
    default_group: String,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    respondents: usize,
}

/// Version response
#[derive(Debug, Serialize)]
struct VersionResponse {
    version: String,
    features: Vec<String>,
}

// ============================================================================
// Error Handling
// ============================================================================

/// Custom error type for API responses
struct ApiErrorResponse {
    status: StatusCode,
    error: ApiError,
}

impl ApiErrorResponse {
    fn new(status: StatusCode, error_type: &str, message: String) -> Self {
        ApiErrorResponse {
            status,
            error: ApiError {
                status: "error".to_string(),
                error: ErrorDetails {
                    message,
                    error_type: error_type.to_string(),
                },
            },
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let json = Json(self.error);
        (self.status, json).into_response()
    }
}

impl From<DashError> for ApiErrorResponse {
    fn from(err: DashError) -> Self {
        let (status, error_type) = match &err {
            DashError::InvalidFieldError(_) => (StatusCode::BAD_REQUEST, "InvalidFieldError"),
            DashError::RenderError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RenderError"),
            DashError::LoadError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "LoadError"),
            DashError::SchemaError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SchemaError"),
            DashError::TypeError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TypeError"),
            DashError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };
        ApiErrorResponse::new(status, error_type, err.to_string())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn render_figure(name: &str, heading: &str, figure: &Figure) -> Result<FigureResult, DashError> {
    Ok(FigureResult {
        name: name.to_string(),
        heading: heading.to_string(),
        kind: figure.kind().to_string(),
        spec: VegaLiteWriter::new().render(figure)?,
    })
}

fn success<T>(data: T) -> Json<ApiSuccess<T>> {
    Json(ApiSuccess {
        status: "success".to_string(),
        data,
    })
}

fn load_dashboard(cli: &Cli) -> anyhow::Result<Dashboard> {
    let mut config = match &cli.config {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };
    if let Some(source) = &cli.source {
        config = config.with_source(source.as_str());
    }

    let dataset = if cli.sample {
        info!("Loading bundled sample extract");
        load_sample(&config)?
    } else {
        info!("Loading survey from {}", config.source);
        reader::load(&config).with_context(|| format!("Failed to load {}", config.source))?
    };
    Ok(Dashboard::new(Arc::new(dataset))?)
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/v1/figures", get(figures_handler))
        .route("/api/v1/figures/:name", get(figure_handler))
        .route("/api/v1/breakdown", get(breakdown_handler))
        .route("/api/v1/options", get(options_handler))
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/version", get(version_handler))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Dashboard page
async fn root_handler() -> Html<&'static str> {
    Html(include_str!("page.html"))
}

/// GET /api/v1/figures - All static figures
async fn figures_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiSuccess<serde_json::Map<String, serde_json::Value>>>, ApiErrorResponse> {
    let mut figures = serde_json::Map::new();
    for (which, figure) in state.dashboard.figures() {
        let result = render_figure(which.name(), which.heading(), figure)?;
        let value = serde_json::to_value(result)
            .map_err(|e| DashError::InternalError(format!("Failed to serialize figure: {}", e)))?;
        figures.insert(which.name().to_string(), value);
    }
    Ok(success(figures))
}

/// GET /api/v1/figures/:name - One static figure
async fn figure_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiSuccess<FigureResult>>, ApiErrorResponse> {
    let which: StaticFigure = name.parse().map_err(|_| {
        ApiErrorResponse::new(
            StatusCode::NOT_FOUND,
            "NotFound",
            format!("No figure named '{}'", name),
        )
    })?;
    let figure = state.dashboard.figure(which.name()).ok_or_else(|| {
        ApiErrorResponse::new(
            StatusCode::NOT_FOUND,
            "NotFound",
            format!("No figure named '{}'", name),
        )
    })?;
    Ok(success(render_figure(which.name(), which.heading(), figure)?))
}

/// GET /api/v1/breakdown - Re-aggregate for one selection
async fn breakdown_handler(
    State(state): State<AppState>,
    Query(params): Query<BreakdownParams>,
) -> Result<Json<ApiSuccess<FigureResult>>, ApiErrorResponse> {
    debug!("Breakdown request: {:?}", params);
    let request = BreakdownRequest::parse(&params.feature, &params.group)?;
    let figure = state.dashboard.breakdown(request)?;
    let heading = format!("Count of {} grouped by {}", request.feature, request.group);
    Ok(success(render_figure("breakdown", &heading, &figure)?))
}

/// GET /api/v1/options - Dropdown contents
async fn options_handler() -> Json<ApiSuccess<OptionsResult>> {
    success(OptionsResult {
        features: AttitudeField::ALL
            .iter()
            .map(|f| FieldOption {
                name: f.name().to_string(),
                description: f.description().to_string(),
            })
            .collect(),
        groups: GroupField::ALL
            .iter()
            .map(|g| FieldOption {
                name: g.name().to_string(),
                description: g.description().to_string(),
            })
            .collect(),
        default_feature: default_feature(),
        default_group: default_group(),
    })
}

/// GET /api/v1/health - Health check
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: VERSION.to_string(),
        respondents: state.dashboard.dataset().height(),
    })
}

/// GET /api/v1/version - Version information
async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: VERSION.to_string(),
        features: vec!["vegalite".to_string(), "rest-api".to_string()],
    })
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gssdash=info,gssdash_rest=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // The dataset is loaded once, before binding
    let dashboard = load_dashboard(&cli)?;
    let state = AppState {
        dashboard: Arc::new(dashboard),
    };

    // Configure CORS
    let cors = if cli.cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(vec![header::CONTENT_TYPE])
    } else {
        let origins: Vec<_> = cli
            .cors_origin
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(vec![header::CONTENT_TYPE])
    };

    let app = router(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("Invalid host or port: {}:{}", cli.host, cli.port))?;

    info!("Starting gssdash server on http://{}", addr);
    info!("API documentation:");
    info!("  GET  /                        - Dashboard page");
    info!("  GET  /api/v1/figures          - Static figures");
    info!("  GET  /api/v1/breakdown        - Interactive breakdown");
    info!("  GET  /api/v1/options          - Selectable fields");
    info!("  GET  /api/v1/health           - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let dataset = load_sample(&LoaderConfig::default()).unwrap();
        let dashboard = Dashboard::new(Arc::new(dataset)).unwrap();
        router(AppState {
            dashboard: Arc::new(dashboard),
        })
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = create_test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_root_serves_page() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("vega-embed"));
        assert!(html.contains("/api/v1/breakdown"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, json) = get_json("/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], VERSION);
        assert_eq!(json["respondents"], 48);
    }

    #[tokio::test]
    async fn test_version_endpoint() {
        let (status, json) = get_json("/api/v1/version").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["version"], VERSION);
        assert!(json["features"].as_array().unwrap().contains(&serde_json::json!("vegalite")));
    }

    #[tokio::test]
    async fn test_figures_endpoint() {
        let (status, json) = get_json("/api/v1/figures").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        let figures = json["data"].as_object().unwrap();
        assert_eq!(figures.len(), 6);
        assert_eq!(figures["means_by_sex"]["spec"]["kind"], "table");
        assert_eq!(figures["income_by_prestige"]["spec"]["columns"], 2);
        assert_eq!(figures["prestige_income"]["kind"], "scatter-with-trend");
    }

    #[tokio::test]
    async fn test_single_figure_endpoint() {
        let (status, json) = get_json("/api/v1/figures/income_box").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["name"], "income_box");
        assert_eq!(json["data"]["heading"], "Distribution of Income by Sex");
        assert_eq!(
            json["data"]["spec"]["$schema"],
            "https://vega.github.io/schema/vega-lite/v6.json"
        );
    }

    #[tokio::test]
    async fn test_unknown_figure_is_404() {
        let (status, json) = get_json("/api/v1/figures/bar_chart").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["type"], "NotFound");
    }

    #[tokio::test]
    async fn test_breakdown_defaults() {
        let (status, json) = get_json("/api/v1/breakdown").await;
        assert_eq!(status, StatusCode::OK);
        let spec = &json["data"]["spec"];
        assert_eq!(spec["height"], 600);
        assert_eq!(spec["layer"][0]["encoding"]["x"]["field"], "satjob");
        assert_eq!(spec["layer"][0]["encoding"]["color"]["field"], "sex");
        assert_eq!(spec["layer"][0]["encoding"]["xOffset"]["field"], "sex");
    }

    #[tokio::test]
    async fn test_breakdown_selection() {
        let (status, json) =
            get_json("/api/v1/breakdown?feature=men_overwork&group=region").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["data"]["spec"]["layer"][0]["encoding"]["x"]["field"],
            "men_overwork"
        );
        assert_eq!(json["data"]["heading"], "Count of men_overwork grouped by region");
    }

    #[tokio::test]
    async fn test_breakdown_rejects_unknown_field() {
        let (status, json) = get_json("/api/v1/breakdown?feature=income&group=sex").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["type"], "InvalidFieldError");
        assert!(json["error"]["message"].as_str().unwrap().contains("income"));
    }

    #[tokio::test]
    async fn test_options_endpoint() {
        let (status, json) = get_json("/api/v1/options").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["features"].as_array().unwrap().len(), 6);
        assert_eq!(json["data"]["groups"].as_array().unwrap().len(), 3);
        assert_eq!(json["data"]["default_feature"], "satjob");
        assert_eq!(json["data"]["default_group"], "sex");
        assert_eq!(json["data"]["groups"][0]["description"], "male or female");
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (DashError::InvalidFieldError("x".into()), StatusCode::BAD_REQUEST),
            (DashError::RenderError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (DashError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiErrorResponse::from(err).status, expected);
        }
    }
}
