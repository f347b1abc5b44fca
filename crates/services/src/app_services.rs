use std::sync::Arc;

use storage::repository::Storage;
use svenska_core::model::Catalog;

use crate::config::DailyConfig;
use crate::daily::{DailyCache, DailyLoopService};
use crate::error::AppServicesError;
use crate::practice_service::PracticeService;
use crate::profile_service::ProfileService;
use crate::Clock;

/// Assembles app-facing services over one storage backend and catalog.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    daily: Arc<DailyLoopService>,
    profiles: Arc<ProfileService>,
    practice: Arc<PracticeService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        catalog: Catalog,
        config: DailyConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, catalog, config))
    }

    /// Build services backed by in-memory storage.
    #[must_use]
    pub fn new_in_memory(clock: Clock, catalog: Catalog, config: DailyConfig) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, catalog, config)
    }

    /// Build services over an already assembled storage backend.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        catalog: Catalog,
        config: DailyConfig,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let cache = DailyCache::new(Arc::clone(&storage.local), &config);
        let daily = Arc::new(DailyLoopService::new(
            clock,
            Arc::clone(&catalog),
            cache,
            Arc::clone(&storage.profiles),
            config,
        ));
        let profiles = Arc::new(ProfileService::new(
            clock,
            Arc::clone(&catalog),
            Arc::clone(&storage.profiles),
        ));
        let practice = Arc::new(PracticeService::new(
            clock,
            Arc::clone(&catalog),
            Arc::clone(&storage.profiles),
        ));

        Self {
            catalog,
            daily,
            profiles,
            practice,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn daily(&self) -> Arc<DailyLoopService> {
        Arc::clone(&self.daily)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeService> {
        Arc::clone(&self.practice)
    }
}
