use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;

use taskdeck::auth::{AuthGate, TokenService};
use taskdeck::config::Config;
use taskdeck::routes;

/// Composition root: all dependencies are assembled here, once, and handed
/// to the app as shared immutable data.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let tokens = TokenService::new(&config.jwt_secret, config.token_lifetime_secs);

    let pool = web::Data::new(pool);
    let tokens = web::Data::new(tokens);

    log::info!("starting taskdeck server at {}", config.server_url());

    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(tokens.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::public)
            .service(
                web::scope("/api")
                    .wrap(AuthGate)
                    .configure(routes::protected),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
