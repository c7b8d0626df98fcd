use actix_web::web;

pub mod auth;
pub mod health;

/// Register every route. `main.rs` and the HTTP tests both build their app
/// through this, so they serve identical paths.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").configure(health::configure_routes));
    cfg.service(
        web::scope("/api/auth")
            .configure(auth::configure_routes)
            .default_service(web::to(auth::endpoint_not_found)),
    );
}
