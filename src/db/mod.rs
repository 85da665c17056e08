//! Application state and the SQLite store.
//!
//! Store operations are grouped per table:
//! - `business` - business profile defaults
//! - `templates` - named, versioned template bodies
//! - `invoice` - append-only invoice history
//! - `settings` - free-form application settings

mod business;
mod invoice;
mod settings;
mod templates;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::auth::RateLimiter;
use crate::config::AppConfig;
use crate::invoice::InvoiceNormalizer;
use crate::pdf::{ChromiumExporter, PdfExporter};
use crate::render::TemplateRenderer;

pub const IN_MEMORY: &str = ":memory:";

const SCHEMA: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS business_settings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        address TEXT,
        city TEXT,
        state TEXT,
        postal_code TEXT,
        phone TEXT,
        email TEXT,
        website TEXT,
        tax_id TEXT,
        logo_path TEXT,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS templates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        type TEXT NOT NULL,
        content TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT 1,
        version INTEGER NOT NULL DEFAULT 1,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS invoice_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        invoice_number TEXT NOT NULL,
        template_type TEXT NOT NULL,
        customer_name TEXT NOT NULL,
        customer_email TEXT,
        total_amount REAL,
        currency TEXT DEFAULT '₪',
        status TEXT NOT NULL DEFAULT 'generated',
        data_json TEXT,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS app_settings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        setting_key TEXT NOT NULL UNIQUE,
        setting_value TEXT,
        description TEXT,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_invoice_history_created_at ON invoice_history (created_at)",
];

/// Everything a handler needs, built once and shared across workers.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub normalizer: InvoiceNormalizer,
    pub renderer: TemplateRenderer,
    pub exporter: Arc<dyn PdfExporter>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let pool = connect_pool(&config.database_path).await?;
        let exporter = Arc::new(ChromiumExporter::new(config.browser.clone()));
        Ok(Self::new_with_pool_and_exporter(config, pool, exporter).await?)
    }

    pub async fn new_with_pool_and_exporter(
        config: AppConfig,
        pool: SqlitePool,
        exporter: Arc<dyn PdfExporter>,
    ) -> Result<Self, sqlx::Error> {
        let rate_limiter = RateLimiter::new(config.rate_limit_window, config.rate_limit_max);

        let state = AppState {
            pool,
            config: Arc::new(config),
            normalizer: InvoiceNormalizer::default(),
            renderer: TemplateRenderer::new(),
            exporter,
            rate_limiter,
        };
        state.init_schema().await?;
        state.seed_defaults().await?;
        Ok(state)
    }

    pub fn with_normalizer(mut self, normalizer: InvoiceNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn seed_defaults(&self) -> Result<(), sqlx::Error> {
        if self.get_business_settings().await?.is_none() {
            self.insert_default_business_settings().await?;
            log::info!("Default business settings inserted");
        }
        for template in crate::template::BUNDLED_TEMPLATES {
            if self
                .insert_template_if_missing(template.name, template.kind, template.content)
                .await?
            {
                log::info!("Seeded bundled template '{}'", template.name);
            }
        }
        Ok(())
    }
}

/// Open the SQLite pool, creating the database file and its directory on demand.
pub async fn connect_pool(database_path: &str) -> anyhow::Result<SqlitePool> {
    if database_path == IN_MEMORY {
        // Every connection to :memory: is a separate database, so keep exactly one alive.
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        return Ok(pool);
    }

    if let Some(parent) = Path::new(database_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;
    log::info!("Connected to SQLite database at {}", database_path);
    Ok(pool)
}
