use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use efs_portal::app_config;
use efs_portal::db::{connect, create_schema};
use efs_portal::middleware::ClientCtx;
use efs_portal::notify::{EmailNotifier, Notifier};
use env_logger::Env;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    app_config::init();

    let config = app_config::get_config();

    let db = connect(&config.database.url, config.database.max_connections)
        .await
        .context("failed to connect to the database")?;
    if config.database.create_schema {
        create_schema(&db)
            .await
            .context("failed to create the database schema")?;
        log::info!("Database schema is up to date");
    }

    let secret_key = match std::env::var("SECRET_KEY") {
        Ok(key) if key.len() >= 64 => Key::from(key.as_bytes()),
        other => {
            let random_string: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(128)
                .map(char::from)
                .collect();
            log::warn!("SECRET_KEY was invalid. Reason: {:?}\r\nThis means the key used for signing session cookies will invalidate every time the application is restarted. A secret key must be at least 64 bytes to be accepted.", other.map(|k| format!("only {} bytes", k.len())));
            Key::from(random_string.as_bytes())
        }
    };

    if config.email.mock {
        log::warn!("Email is in mock mode; confirmations are logged, not sent");
    }
    let notifier: Arc<dyn Notifier> = Arc::new(EmailNotifier::new(
        config.email.clone(),
        config.site.clone(),
    ));

    let db = Data::new(db);
    let secure_cookies = config.server.secure_cookies;

    log::info!("Listening on {}", config.server.bind);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(db.clone())
            .app_data(Data::new(notifier.clone()))
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(secure_cookies)
                    .session_lifecycle(PersistentSession::default())
                    .build(),
            )
            .wrap(Logger::new("%a %r %s %Dms"))
            .configure(efs_portal::web::configure)
    })
    .bind(&config.server.bind)
    .with_context(|| format!("failed to bind {}", config.server.bind))?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env file is fine; the environment may be set directly.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
