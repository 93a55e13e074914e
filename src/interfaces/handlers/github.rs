use actix_web::{get, web, HttpResponse, Responder};

use crate::AppState;

/// GET /api/github/stats. Served from the in-process cache whenever it is
/// fresh; a stale snapshot beats an error when GitHub is unreachable.
#[get("/github/stats")]
pub async fn github_stats(state: web::Data<AppState>) -> impl Responder {
    match state.github_stats.stats().await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => e.to_http_response(),
    }
}
