use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RevalidateRequest {
    #[serde(default)]
    pub paths: Vec<String>,
}

/// GET /api/cron/email-sequences. Read-only look at the follow-up funnel.
#[get("/email-sequences")]
pub async fn sequence_stats(state: web::Data<AppState>) -> impl Responder {
    match state.sequences.stats().await {
        Ok(stats) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "stats": stats,
        })),
        Err(e) => e.to_http_response(),
    }
}

/// POST /api/cron/email-sequences. Runs one follow-up batch.
///
/// The scheduler is expected not to overlap invocations; if it does anyway,
/// the processor's internal lock serializes the runs. Per-lead delivery
/// failures land in `results` without failing the batch, so the response is
/// `success: true` whenever the run itself completed.
#[post("/email-sequences")]
pub async fn run_sequences(state: web::Data<AppState>) -> impl Responder {
    let before = match state.sequences.stats().await {
        Ok(stats) => stats,
        Err(e) => return e.to_http_response(),
    };

    let report = match state.sequences.process_due(Utc::now()).await {
        Ok(report) => report,
        Err(e) => return e.to_http_response(),
    };

    let after = match state.sequences.stats().await {
        Ok(stats) => stats,
        Err(e) => return e.to_http_response(),
    };

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "processed": report.processed,
        "sent": report.sent,
        "errors": report.errors,
        "results": report.results,
        "stats": { "before": before, "after": after },
    }))
}

/// POST /api/cron/revalidate. Invalidates the standing page list plus any
/// paths in the body; `success` is true only when every path went through.
#[post("/revalidate")]
pub async fn revalidate(
    state: web::Data<AppState>,
    body: Option<web::Json<RevalidateRequest>>,
) -> impl Responder {
    let requested = body.map(|b| b.into_inner().paths).unwrap_or_default();
    let report = state.revalidation.run(&requested).await;

    HttpResponse::Ok().json(serde_json::json!({
        "success": report.failed.is_empty(),
        "revalidated": report.revalidated,
        "failed": report.failed,
    }))
}
