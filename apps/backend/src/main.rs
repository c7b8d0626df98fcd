use actix_web::{web, App, HttpServer};
use forum_backend::infra::state::build_state;
use forum_backend::middleware::cors::cors_middleware;
use forum_backend::middleware::request_trace::RequestTrace;
use forum_backend::middleware::structured_logger::StructuredLogger;
use forum_backend::middleware::trace_span::TraceSpan;
use forum_backend::routes;
use forum_backend::services::mailer::mailer_from_setting;
use forum_backend::state::security_config::SecurityConfig;
use tracing::{error, info};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = match std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
    {
        Ok(port) => port,
        Err(_) => {
            error!("BACKEND_PORT must be a valid port number");
            std::process::exit(1);
        }
    };

    let security_config = match SecurityConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Token secret is not configured");
            std::process::exit(1);
        }
    };

    let mailer = mailer_from_setting(std::env::var("MAILER").ok().as_deref());

    let app_state = match build_state()
        .with_security(security_config)
        .with_mailer(mailer)
        .build()
    {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to build application state");
            std::process::exit(1);
        }
    };

    let data = web::Data::new(app_state);

    info!(%host, port, "Starting forum backend");

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
