use actix_web::{middleware, web, App, HttpServer};
use chargease_expo_shared::ExpoClient;
use chargease_fcm_shared::FcmClient;
use notification_service::{
    handlers::{
        devices::register_routes as register_devices,
        notifications::register_routes as register_notifications,
        preferences::register_routes as register_preferences,
        topics::register_routes as register_topics,
    },
    metrics, AppError, Config, ExpoAdapter, FcmAdapter, InMemoryTokenStore, NotificationService,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting notification service");

    let config = Config::from_env()?;

    // FCM is optional: without credentials the adapter stays registered and
    // reports every FCM send as failed instead of refusing to start.
    let fcm_client = match &config.fcm.credentials_path {
        Some(path) => match FcmClient::from_key_file(path) {
            Ok(client) => {
                if let Some(expected) = &config.fcm.project_id {
                    if expected != client.project_id() {
                        tracing::warn!(
                            "FCM_PROJECT_ID {} does not match key file project {}",
                            expected,
                            client.project_id()
                        );
                    }
                }
                tracing::info!("FCM client ready for project {}", client.project_id());
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load FCM credentials: {}. FCM delivery disabled",
                    e
                );
                None
            }
        },
        None => {
            tracing::warn!("FCM_CREDENTIALS_PATH not set. FCM delivery disabled");
            None
        }
    };

    let expo_client = Arc::new(ExpoClient::new(
        config.expo.push_url.clone(),
        config.expo.access_token.clone(),
    ));

    let store = Arc::new(InMemoryTokenStore::new(
        config.dispatch.max_tokens_per_recipient,
    ));
    let notification_service = Arc::new(NotificationService::new(
        store,
        Arc::new(FcmAdapter::new(fcm_client)),
        Arc::new(ExpoAdapter::new(expo_client)),
        config.dispatch.clone(),
    ));

    let addr = format!("0.0.0.0:{}", config.app.port);
    tracing::info!("Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(notification_service.clone()))
            .wrap(middleware::Logger::default())
            .wrap(metrics::MetricsMiddleware)
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route("/", web::get().to(|| async { "Notification Service v1.0" }))
            .configure(|cfg| {
                register_notifications(cfg);
                register_devices(cfg);
                register_preferences(cfg);
                register_topics(cfg);
            })
    })
    .bind(&addr)
    .map_err(|e| AppError::StartServer(format!("bind {}: {}", addr, e)))?
    .run()
    .await
    .map_err(|e| AppError::StartServer(e.to_string()))
}
