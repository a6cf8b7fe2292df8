//! Read-only HTTP view of a finished analysis.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::pipeline::RunOutcome;
use crate::report::StatisticsRecord;

struct AppState {
    record: StatisticsRecord,
    report_text: String,
    map_html: Option<String>,
}

pub fn router(outcome: RunOutcome) -> Router {
    let shared_state = Arc::new(AppState {
        record: outcome.record,
        report_text: outcome.report_text,
        map_html: outcome.map_html,
    });

    let cors = CorsLayer::new()
        .allow_methods(tower_http::cors::Any)
        .allow_origin(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/stats", get(stats))
        .route("/report", get(report))
        .route("/map", get(map))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}

pub async fn serve(outcome: RunOutcome, bind: &str) -> anyhow::Result<()> {
    let app = router(outcome);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Serving analysis on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<StatisticsRecord> {
    Json(state.record.clone())
}

async fn report(State(state): State<Arc<AppState>>) -> String {
    state.report_text.clone()
}

async fn map(State(state): State<Arc<AppState>>) -> Response {
    match &state.map_html {
        Some(html) => Html(html.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "No map for this analysis").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::report::tests::sample_record;

    fn outcome(map_html: Option<&str>) -> RunOutcome {
        RunOutcome {
            record: sample_record(),
            report_text: "REPORT".to_string(),
            map_html: map_html.map(str::to_string),
            report_path: None,
            map_path: None,
        }
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_and_report() {
        let (status, body) = get_body(router(outcome(None)), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");

        let (status, body) = get_body(router(outcome(None)), "/report").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "REPORT");
    }

    #[tokio::test]
    async fn stats_are_json() {
        let (status, body) = get_body(router(outcome(None)), "/stats").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["city"], "Cali, Colombia");
        assert_eq!(json["intersections"], 12_345);
        assert_eq!(json["intersection_classes"]["t_junction"], 8_000);
        assert_eq!(json["signals"]["total"], 1_115);
        assert_eq!(json["signals"]["source"], "tagged");
        assert_eq!(json["traffic"]["tier"], "high");
        assert_eq!(json["street_types"][0]["label"], "Residential");
    }

    #[tokio::test]
    async fn map_is_optional() {
        let (status, _) = get_body(router(outcome(None)), "/map").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get_body(router(outcome(Some("<html></html>"))), "/map").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<html></html>");
    }
}
