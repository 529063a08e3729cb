#![cfg(feature = "http_api")]

use std::io::Cursor;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode, header},
};
use calamine::{Reader, Xlsx, open_workbook_from_rs};
use line_planner::{
    DayLoad, PlanMetrics, PlanRow, PlanWorkbook, PlannerConfig, PlanningSession, RowOutcome,
    XLSX_CONTENT_TYPE,
    http_api::{self, PlanResponse},
};
use rust_xlsxwriter::Workbook;
use serde::de::DeserializeOwned;
use tower::util::ServiceExt;

const DEMAND: &str = "\
Descripcion,Marca,Unit Quantity,Cajas por hora linea automatica,Cajas por hora linea manual
Milka Oreo,Milka,100,50,80
Galleta Maria,ACME,1000,10,100
";

fn new_router() -> axum::Router {
    let state = http_api::AppState::new(PlanningSession::default());
    http_api::router(state)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn get_json<T: DeserializeOwned>(app: &axum::Router, uri: &str) -> T {
    let (status, bytes) = send(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{uri}");
    serde_json::from_slice(&bytes).unwrap()
}

fn upload(csv: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/plan")
        .header("content-type", "text/csv")
        .body(Body::from(csv.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_and_config_are_served() {
    let app = new_router();
    let health: serde_json::Value = get_json(&app, "/health").await;
    assert_eq!(health["status"], "ok");
    let config: PlannerConfig = get_json(&app, "/config").await;
    assert_eq!(config, PlannerConfig::default());
}

#[tokio::test]
async fn plan_views_are_not_found_before_upload() {
    let app = new_router();
    for uri in ["/plan", "/plan/metrics", "/plan/load", "/plan/outcomes", "/plan/export"] {
        let (status, bytes) = send(
            &app,
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "not_found");
    }
}

#[tokio::test]
async fn upload_plans_demand_and_views_filter_it() {
    let app = new_router();

    let (status, bytes) = send(&app, upload(DEMAND)).await;
    assert_eq!(status, StatusCode::OK);
    let response: PlanResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(response.segments.len(), 3);
    assert_eq!(response.outcomes.len(), 2);
    assert_eq!(response.metrics.active_lines, 2);
    assert_eq!(response.metrics.headcount, 12);
    assert_eq!(response.metrics.total_boxes, 1100);
    assert_eq!(response.segments[0].start_time, "08:00");
    assert_eq!(response.segments[0].end_time, "10:00");

    let by_line: Vec<PlanRow> = get_json(&app, "/plan?line=3").await;
    assert_eq!(by_line.len(), 2);
    let by_day: Vec<PlanRow> = get_json(&app, "/plan?day=Martes").await;
    assert_eq!(by_day.len(), 1);
    assert_eq!(by_day[0].quantity, 300);
    let by_brand: Vec<PlanRow> = get_json(&app, "/plan?brand=milka").await;
    assert_eq!(by_brand.len(), 1);
    let several: Vec<PlanRow> = get_json(&app, "/plan?line=1,3&day=Lunes").await;
    assert_eq!(several.len(), 2);

    let metrics: PlanMetrics = get_json(&app, "/plan/metrics?line=1").await;
    assert_eq!(metrics.active_lines, 2);
    assert_eq!(metrics.total_boxes, 100);

    let load: Vec<DayLoad> = get_json(&app, "/plan/load?line=3").await;
    let quantities: Vec<u64> = load.iter().map(|entry| entry.quantity).collect();
    assert_eq!(quantities, vec![700, 300, 0, 0, 0]);

    let outcomes: Vec<RowOutcome> = get_json(&app, "/plan/outcomes").await;
    assert!(outcomes.iter().all(|outcome| !outcome.is_truncated()));

    let workbook: PlanWorkbook = get_json(&app, "/plan/export?day=Martes").await;
    assert_eq!(workbook.full_plan.len(), 3);
    assert_eq!(workbook.filtered_view.len(), 1);
}

#[tokio::test]
async fn bad_filters_and_bad_uploads_are_rejected() {
    let app = new_router();
    let (status, _) = send(&app, upload(DEMAND)).await;
    assert_eq!(status, StatusCode::OK);

    for uri in ["/plan?day=Sabado", "/plan?line=uno"] {
        let (status, bytes) = send(
            &app,
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "invalid_request");
    }

    let (status, _) = send(&app, upload("Product,Quantity\nA,1\n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // the previous plan survives a rejected upload
    let rows: Vec<PlanRow> = get_json(&app, "/plan").await;
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn new_upload_replaces_previous_plan() {
    let app = new_router();
    send(&app, upload(DEMAND)).await;
    let (status, bytes) = send(
        &app,
        upload("Product,Brand,Quantity,Automatic Rate,Manual Rate\nSolo,ACME,50,1,100\n"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let response: PlanResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(response.segments.len(), 1);
    assert_eq!(response.segments[0].line, 3);

    let rows: Vec<PlanRow> = get_json(&app, "/plan").await;
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn export_serves_xlsx_workbook() {
    let app = new_router();
    send(&app, upload(DEMAND)).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/plan/export?format=xlsx&line=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let mut book: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(book.sheet_names(), vec!["Plan_Completo", "Vista_Filtrada"]);
    assert_eq!(book.worksheet_range("Plan_Completo").unwrap().height(), 4);
    assert_eq!(book.worksheet_range("Vista_Filtrada").unwrap().height(), 3);

    let (status, bytes) = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/plan/export?format=pdf")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn upload_accepts_xlsx_body() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, title) in ["Product", "Brand", "Quantity", "Automatic Rate", "Manual Rate"]
        .iter()
        .enumerate()
    {
        sheet.write_string(0, col as u16, *title).unwrap();
    }
    sheet.write_string(1, 0, "Milka Oreo").unwrap();
    sheet.write_string(1, 1, "Milka").unwrap();
    sheet.write_number(1, 2, 100).unwrap();
    sheet.write_number(1, 3, 50).unwrap();
    sheet.write_number(1, 4, 80).unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let app = new_router();
    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/plan")
            .header("content-type", XLSX_CONTENT_TYPE)
            .body(Body::from(bytes))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let response: PlanResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.segments.len(), 1);
    assert_eq!(response.segments[0].line, 1);
    assert_eq!(response.segments[0].end_time, "10:00");

    let (status, _) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/plan")
            .header("content-type", XLSX_CONTENT_TYPE)
            .body(Body::from("Product,Brand\n"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
