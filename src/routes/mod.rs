pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

/// Public surface: health probes and the authentication endpoints.
/// These never require a bearer credential.
pub fn public(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health).service(health::status).service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login),
    );
}

/// Protected surface, mounted under `/api` behind `AuthGate`.
pub fn protected(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tasks")
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
