use actix_web::{post, web, HttpResponse, Responder};

use crate::AppState;

/// POST /api/deploy. Kicks off a frontend rebuild through the configured
/// deploy hook; sits behind the same bearer check as the cron scope.
#[post("")]
pub async fn trigger_deploy(state: web::Data<AppState>) -> impl Responder {
    match state.deploy.trigger().await {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(e) => e.to_http_response(),
    }
}
