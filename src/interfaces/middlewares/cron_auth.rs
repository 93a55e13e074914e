use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{errors::AppError, AppState};

/// Shared-secret gate for the cron and deploy scopes.
///
/// Schedulers call these endpoints with `Authorization: Bearer <secret>`.
/// Enforcement applies in production only, so local runs need no credentials;
/// a production config without a strong secret is refused at startup (see
/// `AppConfig::validate`). Rejections short-circuit before any processing.
pub struct CronAuth;

impl<S> Transform<S, ServiceRequest> for CronAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = CronAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CronAuthService {
            service: Rc::new(service),
        })
    }
}

pub struct CronAuthService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for CronAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            // Missing state means nothing to compare against: reject.
            let (enforce, expected) = match req.app_data::<web::Data<AppState>>() {
                Some(state) => (
                    state.config.is_production(),
                    state.config.cron_secret.clone(),
                ),
                None => (true, String::new()),
            };

            if enforce {
                let authorized = extract_token(&req)
                    .is_some_and(|token| !expected.is_empty() && token == expected);

                if !authorized {
                    tracing::warn!(
                        path = %req.path(),
                        "rejected scheduled trigger without a valid bearer token"
                    );
                    let response = AppError::UnauthorizedAccess.to_http_response();
                    return Ok(req.into_response(response));
                }
            }

            service.call(req).await
        })
    }
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| {
            let parts: Vec<&str> = header.split_whitespace().collect();
            if parts.len() == 2 && parts[0].eq_ignore_ascii_case("bearer") {
                Some(parts[1].to_string())
            } else {
                None
            }
        })
}
