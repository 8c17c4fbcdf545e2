//! Arbiter API — Rust + Actix-Web + SeaORM + PostgreSQL
//!
//! Features:
//! - Single-decision engine: one dinner action per request, never a list
//! - Append-only decision event log with feedback copies
//! - Receipt ingestion (OCR -> parse -> normalize -> dedupe -> inventory)
//! - Taste learning and autopilot with an eight-gate policy
//! - JWT bearer auth deriving the household key
//! - Postgres or in-memory store behind one query contract

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arbiter_api::config::Config;
use arbiter_api::db;
use arbiter_api::handlers::{configure_decision, configure_receipts};
use arbiter_api::middleware::{JwtAuth, RateLimit};
use arbiter_api::receipts::{HttpOcrProvider, MockOcrProvider, OcrProvider};
use arbiter_api::services::{
    DecisionService, DrmService, FeedbackService, ReceiptService, TokenService,
};
use arbiter_api::store::{ArbiterStore, MemoryStore, PgStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,arbiter_api=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Arbiter API");

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    let bind_address = format!("{}:{}", config.host, config.port);
    let cors_origin = config.cors_origin.clone();
    let dev_fallback = config.app_env.is_development();

    // Select the store backend
    let store: Arc<dyn ArbiterStore> = match config.database_url() {
        Some(url) => {
            let db = db::establish_connection(url)
                .await
                .expect("Failed to connect to database");

            // Run all migrations in dependency order
            tracing::info!("Running database migrations...");
            use sea_orm::{ConnectionTrait, Statement};

            let migrations: &[&str] = &[
                // ── Meal library (seeded, read-only at runtime) ────────────────
                r#"
                CREATE TABLE IF NOT EXISTS meals (
                    id              TEXT PRIMARY KEY,
                    canonical_key   TEXT NOT NULL,
                    display_name    TEXT NOT NULL,
                    steps_short     TEXT NOT NULL,
                    est_minutes     INTEGER NOT NULL,
                    cost_band       TEXT NOT NULL,
                    tags            JSONB NOT NULL DEFAULT '[]',
                    active          BOOLEAN NOT NULL DEFAULT TRUE
                );
                CREATE INDEX IF NOT EXISTS idx_meals_active ON meals(active);
                CREATE INDEX IF NOT EXISTS idx_meals_canonical_key ON meals(canonical_key);
                "#,

                // ── Meal ingredients ───────────────────────────────────────────
                r#"
                CREATE TABLE IF NOT EXISTS meal_ingredients (
                    id                  BIGINT PRIMARY KEY,
                    meal_id             TEXT NOT NULL REFERENCES meals(id) ON DELETE CASCADE,
                    ingredient_name     TEXT NOT NULL,
                    qty_text            TEXT,
                    is_pantry_staple    BOOLEAN NOT NULL DEFAULT FALSE
                );
                CREATE INDEX IF NOT EXISTS idx_meal_ingredients_meal
                    ON meal_ingredients(meal_id);
                "#,

                // ── Inventory items (probabilistic pantry state) ───────────────
                r#"
                CREATE TABLE IF NOT EXISTS inventory_items (
                    id                  UUID PRIMARY KEY,
                    household_key       TEXT NOT NULL,
                    item_name           TEXT NOT NULL,
                    qty_estimated       DOUBLE PRECISION,
                    qty_used_estimated  DOUBLE PRECISION NOT NULL DEFAULT 0,
                    unit                TEXT,
                    confidence          DOUBLE PRECISION NOT NULL,
                    source              TEXT NOT NULL,
                    last_seen_at        TIMESTAMPTZ NOT NULL,
                    last_used_at        TIMESTAMPTZ,
                    expiry_date         DATE,
                    decay_rate_per_day  DOUBLE PRECISION NOT NULL DEFAULT 0.05,
                    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    CONSTRAINT chk_inventory_confidence CHECK (confidence >= 0 AND confidence <= 1),
                    CONSTRAINT chk_inventory_qty_used CHECK (qty_used_estimated >= 0)
                );
                CREATE INDEX IF NOT EXISTS idx_inventory_household
                    ON inventory_items(household_key);
                CREATE INDEX IF NOT EXISTS idx_inventory_household_name
                    ON inventory_items(household_key, item_name);
                "#,

                // ── Decision events (append-only) ──────────────────────────────
                r#"
                CREATE TABLE IF NOT EXISTS decision_events (
                    id                  UUID PRIMARY KEY,
                    household_key       TEXT NOT NULL,
                    decided_at          TIMESTAMPTZ NOT NULL,
                    decision_type       TEXT NOT NULL CHECK (decision_type IN ('cook', 'order', 'zero_cook')),
                    meal_id             TEXT,
                    external_vendor_key TEXT,
                    context_hash        TEXT NOT NULL,
                    decision_payload    JSONB NOT NULL,
                    user_action         TEXT NOT NULL CHECK (user_action IN ('pending', 'approved', 'rejected', 'drm_triggered', 'expired')),
                    actioned_at         TIMESTAMPTZ,
                    notes               TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_decision_events_household_decided
                    ON decision_events(household_key, decided_at DESC);
                CREATE UNIQUE INDEX IF NOT EXISTS idx_decision_events_autopilot
                    ON decision_events(household_key, context_hash) WHERE notes = 'autopilot';
                "#,

                // ── Receipt imports ────────────────────────────────────────────
                r#"
                CREATE TABLE IF NOT EXISTS receipt_imports (
                    id              UUID PRIMARY KEY,
                    household_key   TEXT NOT NULL,
                    source          TEXT NOT NULL CHECK (source IN ('image_upload', 'text', 'manual')),
                    vendor_name     TEXT,
                    purchased_at    TIMESTAMPTZ,
                    ocr_provider    TEXT NOT NULL,
                    ocr_text        TEXT NOT NULL,
                    status          TEXT NOT NULL CHECK (status IN ('received', 'parsed', 'failed')),
                    error_message   TEXT,
                    content_hash    TEXT NOT NULL,
                    is_duplicate    BOOLEAN NOT NULL DEFAULT FALSE,
                    duplicate_of    UUID,
                    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_receipt_imports_canonical
                    ON receipt_imports(household_key, content_hash) WHERE is_duplicate = FALSE;
                CREATE INDEX IF NOT EXISTS idx_receipt_imports_household
                    ON receipt_imports(household_key, created_at DESC);
                "#,

                // ── Receipt line items ─────────────────────────────────────────
                r#"
                CREATE TABLE IF NOT EXISTS receipt_line_items (
                    id                  UUID PRIMARY KEY,
                    receipt_import_id   UUID NOT NULL REFERENCES receipt_imports(id) ON DELETE CASCADE,
                    raw_line            TEXT NOT NULL,
                    raw_item_name       TEXT NOT NULL,
                    raw_qty_text        TEXT,
                    raw_price           NUMERIC(10,2),
                    normalized_name     TEXT NOT NULL,
                    normalized_unit     TEXT,
                    normalized_qty      DOUBLE PRECISION,
                    confidence          DOUBLE PRECISION NOT NULL,
                    CONSTRAINT chk_line_confidence CHECK (confidence >= 0 AND confidence <= 1)
                );
                CREATE INDEX IF NOT EXISTS idx_receipt_line_items_import
                    ON receipt_line_items(receipt_import_id);
                "#,

                // ── Taste signals (append-only) ────────────────────────────────
                r#"
                CREATE TABLE IF NOT EXISTS taste_signals (
                    id                  UUID PRIMARY KEY,
                    household_key       TEXT NOT NULL,
                    decided_at          TIMESTAMPTZ NOT NULL,
                    actioned_at         TIMESTAMPTZ,
                    decision_event_id   UUID NOT NULL UNIQUE,
                    meal_id             TEXT,
                    decision_type       TEXT NOT NULL,
                    user_action         TEXT NOT NULL,
                    context_hash        TEXT NOT NULL,
                    features            JSONB NOT NULL,
                    weight              DOUBLE PRECISION NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_taste_signals_household
                    ON taste_signals(household_key);
                "#,

                // ── Taste meal scores (mutable cache) ──────────────────────────
                r#"
                CREATE TABLE IF NOT EXISTS taste_meal_scores (
                    household_key   TEXT NOT NULL,
                    meal_id         TEXT NOT NULL,
                    score           DOUBLE PRECISION NOT NULL DEFAULT 0,
                    approvals       INTEGER NOT NULL DEFAULT 0,
                    rejections      INTEGER NOT NULL DEFAULT 0,
                    last_seen_at    TIMESTAMPTZ NOT NULL,
                    updated_at      TIMESTAMPTZ NOT NULL,
                    PRIMARY KEY (household_key, meal_id)
                );
                "#,
            ];

            for sql in migrations {
                db.execute(Statement::from_string(
                    sea_orm::DatabaseBackend::Postgres,
                    sql.to_string(),
                ))
                .await
                .expect("Failed to run migration");
            }

            tracing::info!("All {} migrations complete", migrations.len());

            let pg = PgStore::new(db);
            pg.ensure_seeded().await.expect("Failed to seed meal library");
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set — using the in-memory store (dev mode)");
            Arc::new(MemoryStore::new())
        }
    };

    // OCR provider: real when a key is configured, deterministic mock otherwise
    let ocr: Arc<dyn OcrProvider> = match &config.ocr_api_key {
        Some(key) => Arc::new(HttpOcrProvider::new(key.clone())),
        None => {
            tracing::info!("OCR_API_KEY not set — using the mock OCR provider");
            Arc::new(MockOcrProvider)
        }
    };

    // Initialize services
    let token_service = Arc::new(TokenService::new(&config));
    let decision_service = Arc::new(DecisionService::new(store.clone()));
    let feedback_service = Arc::new(FeedbackService::new(store.clone()));
    let drm_service = Arc::new(DrmService::new(store.clone()));
    let receipt_service = Arc::new(ReceiptService::new(store.clone(), ocr));

    tracing::info!("Server starting on {}", bind_address);

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            // Security: request body size limit (4 MB covers receipt images)
            .app_data(web::JsonConfig::default().limit(4 * 1024 * 1024))
            // Logging
            .wrap(TracingLogger::default())
            // CORS
            .wrap(cors)
            // Rate limiting
            .wrap(RateLimit::lenient())
            // Services
            .app_data(web::Data::new(decision_service.clone()))
            .app_data(web::Data::new(feedback_service.clone()))
            .app_data(web::Data::new(drm_service.clone()))
            .app_data(web::Data::new(receipt_service.clone()))
            // ── Protected routes (bearer token required; dev falls back) ─────
            .service(
                web::scope("")
                    .wrap(JwtAuth::new(token_service.clone(), dev_fallback))
                    .wrap(RateLimit::strict())
                    .configure(configure_decision) // /decision, /feedback, /drm
                    .configure(configure_receipts), // /receipt/import, /receipt/{id}
            )
            // Health check (public, no auth)
            .route("/health", web::get().to(|| async {
                actix_web::HttpResponse::Ok().json(serde_json::json!({
                    "status": "healthy",
                    "service": "arbiter-api"
                }))
            }))
    })
    .bind(&bind_address)?
    .run()
    .await
}
