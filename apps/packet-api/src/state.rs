//! Application state for packet-api

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use packet_forms::{FormProfile, TemplateStore};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::FormsConfig;
use crate::error::ApiError;

/// A served form: its fill profile and its template file.
#[derive(Debug)]
pub struct FormEntry {
    pub profile: FormProfile,
    pub template: TemplateStore,
}

pub struct AppState {
    pub db: SqlitePool,
    pub forms: BTreeMap<String, Arc<FormEntry>>,
}

impl AppState {
    pub async fn new(database_url: &str, config: &FormsConfig, template_dir: &Path) -> Result<Self> {
        tracing::info!("Connecting to database: {}", database_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::with_pool(pool, config, template_dir).await
    }

    /// State backed by a private in-memory database.
    #[cfg(test)]
    pub async fn in_memory(config: &FormsConfig, template_dir: &Path) -> Result<Self> {
        // One connection that never expires, so the database outlives idle periods.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool, config, template_dir).await
    }

    async fn with_pool(pool: SqlitePool, config: &FormsConfig, template_dir: &Path) -> Result<Self> {
        Self::run_migrations(&pool).await?;

        let mut forms = BTreeMap::new();
        for form in &config.forms {
            let entry = FormEntry {
                profile: form.load_profile()?,
                template: TemplateStore::new(form.template_path(template_dir)),
            };
            tracing::info!(
                form = %form.name,
                template = %entry.template.path().display(),
                fields = entry.profile.fields.len(),
                overlay_targets = entry.profile.overlay.len(),
                "Registered form"
            );
            forms.insert(form.name.clone(), Arc::new(entry));
        }

        Ok(Self { db: pool, forms })
    }

    pub fn form(&self, name: &str) -> Result<Arc<FormEntry>, ApiError> {
        self.forms
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::FormNotFound(name.to_string()))
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS form_progress (
                user_id TEXT NOT NULL,
                form_name TEXT NOT NULL,
                pdf_base64 TEXT NOT NULL,
                filled BOOLEAN NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, form_name)
            )
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }
}
