//! Record store for district snapshots, case data and operational records.
//!
//! This module provides the storage abstraction via the Repository pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (REST API)                           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs)                            │
//! │  - Metric caching keyed by data version                 │
//! │  - Forecast orchestration                               │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌──────────────────────────────────────────────┐
//!     │             Local Repository                  │
//!     │     (in-memory, seeded from data/seed.json)   │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! # Recommended Usage
//! ```ignore
//! use csip_rust::db::{services, RepositoryFactory};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::create_local()?;
//!     let districts = services::list_districts(repo.as_ref()).await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable at least one repository backend feature.");

pub mod checksum;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod seed;
pub mod services;


pub use services::{
    all_metrics, chatbot_query, compare_districts, health_check, list_districts,
    metrics_for_district, upsert_snapshot, ServiceError, ServiceResult,
};

pub use checksum::{calculate_checksum, snapshot_checksum};
pub use repo_config::RepositoryConfig;
pub use seed::SeedData;

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType, SeedSource};
pub use repositories::LocalRepository;
pub use repository::{
    CaseRepository, DistrictRepository, ErrorContext, FullRepository, OperationsRepository,
    RepositoryError, RepositoryResult, UpsertOutcome, VersionedSnapshot,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Initialize the global repository singleton from the environment.
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = RepositoryFactory::from_env().context("Failed to create repository")?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if REPOSITORY.get().is_none() {
        init_repository()?;
    }

    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
