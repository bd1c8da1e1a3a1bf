use anyhow::{bail, Context};
use std::sync::Arc;

use shelf_db::Database;

use crate::module::{InitCtx, Migration, Module};

/// Module registry driving every module through init, start and stop
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module. Names must be unique since they become route prefixes.
    pub fn register(&mut self, module: Arc<dyn Module>) -> anyhow::Result<()> {
        if self.get_module(module.name()).is_some() {
            bail!("module '{}' is already registered", module.name());
        }

        tracing::debug!(module = module.name(), "registered module");
        self.modules.push(module);
        Ok(())
    }

    /// Get all registered modules in registration order
    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.modules.iter()
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no modules are registered
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Collect every module's migrations, ordered by module name then id
    pub fn collect_migrations(&self) -> Vec<(&'static str, Migration)> {
        let mut migrations: Vec<_> = self
            .modules
            .iter()
            .flat_map(|module| {
                module
                    .migrations()
                    .into_iter()
                    .map(move |migration| (module.name(), migration))
            })
            .collect();

        migrations.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.id.cmp(b.1.id)));
        migrations
    }

    /// Apply pending migrations; returns how many ran
    pub async fn run_migrations(&self, db: &Database) -> anyhow::Result<usize> {
        let mut applied = 0;

        for (module, migration) in self.collect_migrations() {
            let ran = db
                .apply(module, &migration)
                .await
                .with_context(|| format!("failed to migrate module '{module}'"))?;
            if ran {
                applied += 1;
            }
        }

        tracing::info!(applied, "migrations complete");
        Ok(applied)
    }

    /// Initialize modules in registration order
    pub async fn init_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start modules in registration order
    pub async fn start_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_all(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::sync::Mutex;

    struct TestModule {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl TestModule {
        fn record(&self, event: &str) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, event));
        }
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("init");
            Ok(())
        }

        async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("start");
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.record("stop");
            Ok(())
        }

        fn migrations(&self) -> Vec<Migration> {
            vec![
                Migration {
                    id: "002_seed",
                    up: "INSERT INTO lifecycle (module) VALUES ('seeded')",
                },
                Migration {
                    id: "001_init",
                    up: "CREATE TABLE IF NOT EXISTS lifecycle (module TEXT NOT NULL)",
                },
            ]
        }
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();

        registry
            .register(Arc::new(TestModule { name: "book", log: log.clone() }))
            .unwrap();
        let second = registry.register(Arc::new(TestModule { name: "book", log }));

        assert!(second.is_err());
        assert_eq!(registry.len(), 1);
        assert!(registry.get_module("book").is_some());
    }

    #[tokio::test]
    async fn test_module_lifecycle_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        let settings = Settings::default();
        let db = Database::in_memory().await.unwrap();
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        for name in ["a", "b"] {
            registry
                .register(Arc::new(TestModule { name, log: log.clone() }))
                .unwrap();
        }

        registry.init_all(&ctx).await.unwrap();
        registry.start_all(&ctx).await.unwrap();
        registry.stop_all().await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:init", "b:init", "a:start", "b:start", "b:stop", "a:stop"]
        );
    }

    #[tokio::test]
    async fn test_migrations_run_in_order_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry
            .register(Arc::new(TestModule { name: "b", log: log.clone() }))
            .unwrap();
        registry
            .register(Arc::new(TestModule { name: "a", log }))
            .unwrap();

        let order: Vec<_> = registry
            .collect_migrations()
            .into_iter()
            .map(|(module, migration)| format!("{module}/{}", migration.id))
            .collect();
        assert_eq!(order, vec!["a/001_init", "a/002_seed", "b/001_init", "b/002_seed"]);

        let db = Database::in_memory().await.unwrap();
        assert_eq!(registry.run_migrations(&db).await.unwrap(), 4);
        assert_eq!(registry.run_migrations(&db).await.unwrap(), 0);
    }
}
