use actix_cors::Cors;
use actix_web::{http::header, middleware::NormalizePath, web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use portfolio_api::{
    background_task::start_sweep_task,
    graceful_shutdown::shutdown_signal,
    routes::configure_routes,
    settings::AppConfig,
    AppState,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let config = match AppConfig::new() {
        Ok(cfg) => {
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        },
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = web::Data::new(AppState::new(&config));

    let server_addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        "🚀 Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    // The sweep task owns its own handle to the limiter's store.
    let sweep_store = app_state.limiter.store().clone();
    let cors_origins = config.cors_origins();

    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(3600);
        if cors_origins.iter().any(|origin| origin == "*") {
            cors = cors.allow_any_origin();
        } else {
            for origin in &cors_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        App::new()
            .app_data(app_state.clone())
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .wrap(cors)
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    tokio::spawn(start_sweep_task(sweep_store, config.sweep_interval()));

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
