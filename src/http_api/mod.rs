use std::{io::Cursor, net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    ConfigError, DayLabel, DayLoad, LineId, PlanFilter, PlanMetrics, PlanRow, PlannerConfig,
    PlanningSession, RowOutcome, TabularError, XLSX_CONTENT_TYPE, read_demand_csv,
    read_demand_xlsx, write_workbook_xlsx,
};

#[derive(Clone)]
pub struct AppState {
    session: Arc<RwLock<PlanningSession>>,
}

impl AppState {
    pub fn new(session: PlanningSession) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }

    pub fn with_shared(session: Arc<RwLock<PlanningSession>>) -> Self {
        Self { session }
    }

    fn session(&self) -> Arc<RwLock<PlanningSession>> {
        self.session.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn no_plan() -> Self {
        ApiError::not_found("no plan computed yet; POST demand CSV to /plan")
    }
}

impl From<TabularError> for ApiError {
    fn from(value: TabularError) -> Self {
        ApiError::Invalid(value.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(value: ConfigError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

/// View filters as comma separated query values, e.g. `?day=Lunes,Martes&line=3`.
#[derive(Debug, Default, Deserialize)]
struct ViewQuery {
    day: Option<String>,
    line: Option<String>,
    brand: Option<String>,
}

impl ViewQuery {
    fn into_filter(self) -> Result<PlanFilter, ApiError> {
        let days = split_values(self.day.as_deref())
            .map(|value| DayLabel::from_str(value).map_err(ApiError::invalid))
            .collect::<Result<Vec<_>, _>>()?;
        let lines = split_values(self.line.as_deref())
            .map(|value| {
                value
                    .parse::<LineId>()
                    .map_err(|_| ApiError::invalid(format!("invalid line '{value}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let brands = split_values(self.brand.as_deref())
            .map(ToOwned::to_owned)
            .collect();
        Ok(PlanFilter {
            days,
            lines,
            brands,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

fn split_values(input: Option<&str>) -> impl Iterator<Item = &str> {
    input
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResponse {
    pub segments: Vec<PlanRow>,
    pub outcomes: Vec<RowOutcome>,
    pub metrics: PlanMetrics,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(get_config))
        .route("/plan", get(get_plan).post(upload_demand))
        .route("/plan/metrics", get(get_metrics))
        .route("/plan/load", get(get_load_by_day))
        .route("/plan/outcomes", get(get_outcomes))
        .route("/plan/export", get(export_workbook))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, session: PlanningSession) -> std::io::Result<()> {
    let state = AppState::new(session);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_config(State(state): State<AppState>) -> Json<PlannerConfig> {
    let session = state.session();
    let config = {
        let guard = session.read();
        guard.config().clone()
    };
    Json(config)
}

fn is_xlsx(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(XLSX_CONTENT_TYPE))
}

/// Demand as CSV text, or as an `.xlsx` workbook when the content type says so.
async fn upload_demand(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PlanResponse>, ApiError> {
    let demand = if is_xlsx(&headers) {
        read_demand_xlsx(Cursor::new(body))?
    } else {
        read_demand_csv(&body[..])?
    };
    let session = state.session();
    let response = {
        let mut guard = session.write();
        guard.plan_demand(demand)?;
        let plan = guard.plan().ok_or_else(ApiError::no_plan)?;
        let metrics = guard.metrics().ok_or_else(ApiError::no_plan)?;
        PlanResponse {
            segments: plan.rows(),
            outcomes: plan.outcomes().to_vec(),
            metrics,
        }
    };
    info!(
        segments = response.segments.len(),
        rows = response.outcomes.len(),
        "plan computed from upload"
    );
    Ok(Json(response))
}

async fn get_plan(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<Vec<PlanRow>>, ApiError> {
    let filter = query.into_filter()?;
    let session = state.session();
    let rows = {
        let guard = session.read();
        guard
            .view_with(&filter)
            .map(|view| view.rows())
            .ok_or_else(ApiError::no_plan)?
    };
    Ok(Json(rows))
}

async fn get_metrics(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<PlanMetrics>, ApiError> {
    let filter = query.into_filter()?;
    let session = state.session();
    let metrics = {
        let guard = session.read();
        guard.metrics_with(&filter).ok_or_else(ApiError::no_plan)?
    };
    Ok(Json(metrics))
}

async fn get_load_by_day(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<Vec<DayLoad>>, ApiError> {
    let filter = query.into_filter()?;
    let session = state.session();
    let load = {
        let guard = session.read();
        guard
            .view_with(&filter)
            .map(|view| view.load_by_day())
            .ok_or_else(ApiError::no_plan)?
    };
    Ok(Json(load))
}

async fn get_outcomes(State(state): State<AppState>) -> Result<Json<Vec<RowOutcome>>, ApiError> {
    let session = state.session();
    let outcomes = {
        let guard = session.read();
        guard
            .plan()
            .map(|plan| plan.outcomes().to_vec())
            .ok_or_else(ApiError::no_plan)?
    };
    Ok(Json(outcomes))
}

async fn export_workbook(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
    Query(export): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let filter = query.into_filter()?;
    let session = state.session();
    let workbook = {
        let guard = session.read();
        guard.workbook_with(&filter).ok_or_else(ApiError::no_plan)?
    };
    match export.format.as_deref().unwrap_or("json") {
        "json" => Ok(Json(workbook).into_response()),
        "xlsx" => {
            let bytes = write_workbook_xlsx(&workbook)
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            let headers = [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"plan_produccion.xlsx\"",
                ),
            ];
            Ok((headers, bytes).into_response())
        }
        other => Err(ApiError::invalid(format!("unknown export format '{other}'"))),
    }
}
