use std::sync::Arc;

use cinevault::config::{environment::Config, init_db};
use cinevault::services::jwt::JwtService;
use cinevault::services::mailer::{Mailer, SmtpMailer};
use cinevault::services::reminder::ReminderEngine;
use cinevault::services::storage::{ObjectStorage, S3Storage};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinevault=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db().await;
    tracing::info!("Connected to MySQL");

    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
        tracing::warn!("migration failed: {}", e);
    }

    let jwt_service = JwtService::new(config.jwt_secret.clone(), config.jwt_expires_in_days);

    let storage: Arc<dyn ObjectStorage> = Arc::new(S3Storage::new(&config.storage).await);
    let mailer: Arc<dyn Mailer> =
        Arc::new(SmtpMailer::new(&config.mail).expect("Failed to configure SMTP transport"));

    let _reminder_task =
        ReminderEngine::new(db.clone(), mailer.clone(), config.reminder_hour).start();
    tracing::info!("Reminder job scheduled daily at {:02}:00", config.reminder_hour);

    let app = cinevault::create_app(
        db,
        jwt_service,
        storage,
        mailer,
        config.frontend_url.clone(),
    )
    .await;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .unwrap();
    tracing::info!("Server running on http://localhost:{}", config.port);
    axum::serve(listener, app).await.unwrap();
}
