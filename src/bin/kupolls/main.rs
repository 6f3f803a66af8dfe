use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::middleware::{DefaultHeaders, ErrorHandlers, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use env_logger::Env;
use kupolls::app_config::AppConfig;
use kupolls::middleware::ClientCtx;
use kupolls::{db, events, session};
use rand::{distributions::Alphanumeric, Rng};
use std::time::Duration;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();

    let config = AppConfig::load().expect("Failed to load configuration.");
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set.");

    let db = db::connect(&database_url, config.database.max_connections)
        .await
        .expect("Failed to connect to the database.");
    db::init_schema(&db)
        .await
        .expect("Failed to create the database schema.");

    let secret_key = match std::env::var("SECRET_KEY") {
        Ok(key) if key.len() >= 64 => Key::from(key.as_bytes()),
        other => {
            let random_string: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(128)
                .map(char::from)
                .collect();
            log::warn!("SECRET_KEY was invalid. Reason: {:?}\r\nThis means the key used for signing session cookies will invalidate every time the application is restarted. A secret key must be at least 64 bytes to be accepted.\r\n\r\nNeed a key? How about:\r\n{}", other.map(|k| format!("{} bytes", k.len())), random_string);
            Key::from(random_string.as_bytes())
        }
    };

    let db = Data::new(db);
    let auth_events = Data::new(events::with_audit_log());
    let bind_address = config.server.bind_address.clone();
    let workers = config.server.workers;
    let config = Data::new(config);

    // Spawn expired session cleanup task
    let sweep_db = db.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match session::remove_expired_sessions(&sweep_db, chrono::Utc::now().naive_utc()).await {
                Ok(n) => log::debug!("Expired session cleanup removed {} sessions", n),
                Err(e) => log::error!("remove_expired_sessions() {}", e),
            }
        }
    });

    log::info!("{} listening on {}", config.site.name, bind_address);

    let mut server = HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(auth_events.clone())
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("X-XSS-Protection", "0")) // Disable legacy XSS filter
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::BAD_REQUEST, kupolls::web::error::render_400)
                    .handler(StatusCode::FORBIDDEN, kupolls::web::error::render_403)
                    .handler(StatusCode::NOT_FOUND, kupolls::web::error::render_404)
                    .handler(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        kupolls::web::error::render_500,
                    ),
            )
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(false) // Allow HTTP for development
                    .session_lifecycle(PersistentSession::default())
                    .build(),
            )
            .wrap(Logger::new("%a %r %s %{User-Agent}i"))
            .configure(kupolls::web::configure)
    });

    if workers > 0 {
        server = server.workers(workers);
    }

    server.bind(bind_address)?.run().await
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env file is fine; the environment may already be populated.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("dotenv: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
