use actix_web::{post, web, HttpRequest, HttpResponse, Responder};

use crate::{
    entities::contact::ContactForm,
    errors::AppError,
    utils::get_client_ip::get_client_ip,
    AppState,
};

/// POST /api/contact. Admission control runs first: the fixed-window limiter
/// is keyed by client IP, so one origin cannot drain the outbound email
/// budget for everyone else.
#[post("/contact")]
pub async fn submit_contact(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Json<ContactForm>,
) -> impl Responder {
    let client_ip = get_client_ip(&req, state.config.trust_proxy_headers);

    if !state.limiter.check_and_consume(&client_ip) {
        tracing::warn!(%client_ip, "contact submission rate limited");
        return AppError::RateLimited(
            "You've sent a few messages already. Please try again in a little while.".to_string(),
        )
        .to_http_response();
    }

    match state.contact_handler.handle_submission(form.into_inner()).await {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(e) => e.to_http_response(),
    }
}
