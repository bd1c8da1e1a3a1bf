use std::future::Future;

use anyhow::Context;
use axum::Router;
use shelf_db::Database;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// A fully initialized application: settings, store and registered modules
pub struct App {
    settings: Settings,
    db: Database,
    registry: ModuleRegistry,
}

impl App {
    /// Open the store, register every module, apply their migrations and
    /// run their `init` hooks
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let db = Database::connect(
            settings.database.data_dir.as_deref(),
            settings.database.max_connections,
        )
        .await
        .context("failed to open database")?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry)?;
        registry.run_migrations(&db).await?;

        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };
        registry.init_all(&ctx).await?;

        tracing::info!(
            env = ?settings.environment,
            modules = registry.len(),
            database = ?db.path(),
            "shelf bootstrap complete"
        );

        Ok(Self {
            settings,
            db,
            registry,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// The complete HTTP router, middleware included
    pub fn router(&self) -> Router {
        shelf_http::build_router(&self.registry, &self.settings)
    }

    /// Start modules, serve HTTP until `shutdown` resolves, then stop modules
    pub async fn run<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ctx = InitCtx {
            settings: &self.settings,
            db: &self.db,
        };
        self.registry.start_all(&ctx).await?;

        let served = shelf_http::start_server(&self.registry, &self.settings, shutdown).await;

        self.registry.stop_all().await?;
        self.db.close().await;
        served
    }
}
