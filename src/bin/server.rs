use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use weighted_tiles::solver::LayoutSolver;
use weighted_tiles::types::{
    Area, Configuration, CriteriaPair, Grid, Item, Layout, LayoutError, LayoutOptions,
    deserialize_u32_from_number,
};

#[derive(Deserialize, Serialize)]
struct LayoutRequest {
    items: Vec<Item>,
    area: Area,
    #[serde(default)]
    criteria: Option<Vec<CriteriaPair>>,
    #[serde(default = "default_max_ratio")]
    max_ratio: f64,
    #[serde(default = "default_max_attempts", deserialize_with = "deserialize_u32_from_number")]
    max_attempts: u32,
    #[serde(default)]
    return_all: bool,
}

fn default_max_ratio() -> f64 {
    3.0
}

fn default_max_attempts() -> u32 {
    10_000
}

#[derive(Serialize)]
struct LayoutResponse {
    grid: Grid,
    configurations: Vec<Configuration>,
}

fn error_status(err: &LayoutError) -> StatusCode {
    match err {
        LayoutError::GridOverflow(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_REQUEST,
    }
}

async fn layout(
    Json(req): Json<LayoutRequest>,
) -> Result<Json<LayoutResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /layout"
    );

    let options = LayoutOptions {
        max_ratio: req.max_ratio,
        criteria: req.criteria.unwrap_or_else(weighted_tiles::types::default_criteria),
        max_attempts: req.max_attempts,
        return_all: req.return_all,
    };

    let solver = LayoutSolver::new(req.items, req.area, options);
    let result: Layout = solver
        .solve()
        .map_err(|e| (error_status(&e), e.to_string()))?;

    Ok(Json(LayoutResponse {
        grid: result.grid,
        configurations: result.configurations,
    }))
}

#[tokio::main]
async fn main() {
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/layout", post(layout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
