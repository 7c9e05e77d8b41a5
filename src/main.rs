use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use swipe_engine::config::{LoggingSettings, Settings, SHARED_LEDGER_SCOPE};
use swipe_engine::core::{LedgerSnapshot, MatchLedger};
use swipe_engine::routes::{self, AppState, SessionRegistry};
use swipe_engine::services::{load_json, HttpBackend, KeyValueStore, MemoryStore, RedisStore, StorageKey};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn config_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging before configuration so config errors are reported
    let logging = LoggingSettings::default();
    let log_level = std::env::var("LOG_LEVEL").unwrap_or(logging.level);
    let log_format = std::env::var("LOG_FORMAT").unwrap_or(logging.format);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&log_level))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    info!("Starting swipe engine service...");

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        config_error(e)
    })?;

    info!("Configuration loaded successfully");

    // Storage: Redis when configured, in-memory otherwise
    let store: Arc<dyn KeyValueStore> = match &settings.storage.redis_url {
        Some(url) => match RedisStore::new(url, settings.storage.l1_cache_size, settings.storage.ttl_secs).await {
            Ok(store) => {
                info!("Redis storage initialized (L1: {} entries)", settings.storage.l1_cache_size);
                Arc::new(store)
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), falling back to in-memory storage", e);
                Arc::new(MemoryStore::new())
            }
        },
        None => {
            info!("No Redis URL configured, using in-memory storage");
            Arc::new(MemoryStore::new())
        }
    };

    // Backend sync client (optional - swipes stay local without it)
    let backend = if settings.backend.enabled {
        let client = HttpBackend::new(
            settings.backend.base_url.clone(),
            settings.backend.api_key.clone(),
            String::new(),
            Duration::from_secs(settings.backend.timeout_secs),
        )
        .map_err(|e| {
            error!("Failed to build backend client: {}", e);
            config_error(e)
        })?;
        info!("Backend sync enabled at {}", settings.backend.base_url);
        Some(client)
    } else {
        info!("Backend sync disabled, running local-only");
        None
    };

    // Shared ledger, restored once for the whole process
    let ledger_key = StorageKey::ledger(SHARED_LEDGER_SCOPE);
    let ledger = match load_json::<LedgerSnapshot>(store.as_ref(), &ledger_key).await {
        Ok(Some(snapshot)) => {
            info!(
                "Restored ledger with {} matches and {} pending likes",
                snapshot.matches.len(),
                snapshot.pending_likes.len()
            );
            Arc::new(MatchLedger::from_snapshot(snapshot))
        }
        Ok(None) => Arc::new(MatchLedger::new()),
        Err(e) => {
            error!("Failed to restore ledger, starting empty: {}", e);
            Arc::new(MatchLedger::new())
        }
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);
    let max_sessions = settings.server.max_sessions.unwrap_or(10_000);

    let app_state = AppState {
        sessions: Arc::new(SessionRegistry::new(
            Arc::new(settings),
            ledger,
            store,
            backend,
            max_sessions,
        )),
    };

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
