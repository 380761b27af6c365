//! Repository factory for dependency injection.
//!
//! Creates repository instances from runtime configuration: the
//! `REPOSITORY_TYPE` environment variable or a `repository.toml` file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
use super::repositories::LocalRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "memory" | "in-memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from the `REPOSITORY_TYPE` environment variable.
    ///
    /// Defaults to Local when unset or unrecognised.
    pub fn from_env() -> Self {
        match std::env::var("REPOSITORY_TYPE") {
            Ok(val) => val.parse().unwrap_or_else(|e| {
                log::warn!("{}; falling back to the local repository", e);
                Self::Local
            }),
            Err(_) => Self::Local,
        }
    }
}

/// How the store is populated at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// The dataset compiled into the binary.
    Bundled,
    /// A JSON seed document on disk.
    File(PathBuf),
    /// Start empty.
    Empty,
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use csip_rust::db::{RepositoryFactory, RepositoryType};
///
/// let repo = RepositoryFactory::create(RepositoryType::Local)?;
/// let empty = RepositoryFactory::create_empty();
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a seeded repository of the given type.
    pub fn create(repo_type: RepositoryType) -> RepositoryResult<Arc<dyn FullRepository>> {
        Self::create_with_seed(repo_type, &SeedSource::Bundled)
    }

    pub fn create_with_seed(
        repo_type: RepositoryType,
        seed: &SeedSource,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Local => {
                let repo = match seed {
                    SeedSource::Bundled => LocalRepository::seeded()?,
                    SeedSource::File(path) => LocalRepository::from_seed_file(path)?,
                    SeedSource::Empty => LocalRepository::new(),
                };
                Ok(Arc::new(repo))
            }
        }
    }

    /// Create an in-memory repository holding the bundled dataset.
    pub fn create_local() -> RepositoryResult<Arc<dyn FullRepository>> {
        Self::create(RepositoryType::Local)
    }

    /// Create an empty in-memory repository.
    pub fn create_empty() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create repository from environment configuration.
    pub fn from_env() -> RepositoryResult<Arc<dyn FullRepository>> {
        Self::create(RepositoryType::from_env())
    }

    /// Create repository from a TOML configuration file.
    pub fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = RepositoryConfig::from_file(config_path)?;
        Self::from_repository_config(&config)
    }

    /// Create repository from the default configuration file location.
    pub fn from_default_config() -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = RepositoryConfig::from_default_location()?;
        Self::from_repository_config(&config)
    }

    pub fn from_repository_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        Self::create_with_seed(repo_type, &seed_source(config))
    }
}

fn seed_source(config: &RepositoryConfig) -> SeedSource {
    match (&config.repository.seed_file, config.repository.seed) {
        (Some(path), _) => SeedSource::File(path.clone()),
        (None, true) => SeedSource::Bundled,
        (None, false) => SeedSource::Empty,
    }
}

/// Builder for configuring repository creation.
///
/// # Example
/// ```ignore
/// use csip_rust::db::{RepositoryBuilder, RepositoryType};
///
/// let repo = RepositoryBuilder::new()
///     .repository_type(RepositoryType::Local)
///     .seed_file("data/seed.json")
///     .build()?;
/// ```
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    seed: SeedSource,
}

impl RepositoryBuilder {
    /// Create a builder for a bundled-seed repository of the environment's
    /// type.
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::from_env(),
            seed: SeedSource::Bundled,
        }
    }

    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    /// Load (or skip) the bundled dataset.
    pub fn seed(mut self, enabled: bool) -> Self {
        self.seed = if enabled {
            SeedSource::Bundled
        } else {
            SeedSource::Empty
        };
        self
    }

    pub fn seed_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed = SeedSource::File(path.into());
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> Self {
        self.repo_type = RepositoryType::from_env();
        self
    }

    /// Load configuration from a TOML file.
    pub fn from_config_file<P: AsRef<Path>>(
        mut self,
        config_path: P,
    ) -> Result<Self, RepositoryError> {
        let repo_config = RepositoryConfig::from_file(config_path)?;

        self.repo_type = repo_config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        self.seed = seed_source(&repo_config);

        Ok(self)
    }

    pub fn build(self) -> RepositoryResult<Arc<dyn FullRepository>> {
        RepositoryFactory::create_with_seed(self.repo_type, &self.seed)
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
