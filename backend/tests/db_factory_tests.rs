//! Tests for db::factory module - repository creation and configuration.

mod support;

use std::str::FromStr;

use csip_rust::db::factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
use csip_rust::db::{CaseRepository, DistrictRepository, OperationsRepository, RepositoryError};

#[test]
fn test_repository_type_from_str_local() {
    for name in ["local", "LOCAL", "memory", "in-memory"] {
        assert_eq!(RepositoryType::from_str(name).unwrap(), RepositoryType::Local);
    }
}

#[test]
fn test_repository_type_from_str_invalid() {
    let result = RepositoryType::from_str("postgres");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", None)], || {
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
    });
}

#[test]
fn test_repository_type_from_env_invalid_falls_back() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", Some("cassandra"))], || {
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
    });
}

#[tokio::test]
async fn test_create_local_is_seeded() {
    let repo = RepositoryFactory::create_local().unwrap();
    assert_eq!(repo.list_districts().await.unwrap().len(), 5);
    assert!(!repo.case_records().await.unwrap().is_empty());
    assert_eq!(repo.tickets().await.unwrap().len(), 14);
}

#[tokio::test]
async fn test_create_empty() {
    let repo = RepositoryFactory::create_empty();
    assert!(repo.list_districts().await.unwrap().is_empty());
    assert!(repo.alerts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_from_config_file_without_seed() {
    let config = support::temp_file("[repository]\ntype = \"local\"\nseed = false\n", ".toml");
    let repo = RepositoryFactory::from_config_file(config.path()).unwrap();
    assert!(repo.list_districts().await.unwrap().is_empty());
}

#[test]
fn test_from_config_file_rejects_unknown_type() {
    let config = support::temp_file("[repository]\ntype = \"postgres\"\n", ".toml");
    let err = RepositoryFactory::from_config_file(config.path()).err().expect("expected error");
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
}

#[test]
fn test_from_config_file_missing() {
    let err = RepositoryFactory::from_config_file("/nonexistent/repository.toml").err().expect("expected error");
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    assert!(err.to_string().contains("Failed to read config file"));
}

#[tokio::test]
async fn test_builder_with_seed_file() {
    let seed = support::temp_file(
        r#"{
            "snapshots": [
                {"district": "Nashik", "predicted_emergency_cases": 120, "icu_beds": 10,
                 "bed_occupancy_rate": 0.7, "bed_capacity": 400}
            ],
            "tickets": []
        }"#,
        ".json",
    );

    let repo = RepositoryBuilder::new()
        .repository_type(RepositoryType::Local)
        .seed_file(seed.path())
        .build()
        .unwrap();

    assert_eq!(repo.list_districts().await.unwrap(), vec!["Nashik"]);
    let stored = repo.get_snapshot("nashik").await.unwrap();
    assert_eq!(stored.snapshot.icu_beds, Some(10.0));
    assert_eq!(stored.version.value(), 1);
    // Case table is generated when the seed omits it.
    assert!(!repo.case_records().await.unwrap().is_empty());
}

#[test]
fn test_builder_with_malformed_seed_file() {
    let seed = support::temp_file("{ not json", ".json");
    let result = RepositoryBuilder::new().seed_file(seed.path()).build();
    assert!(matches!(result, Err(RepositoryError::SeedError { .. })));
}

#[tokio::test]
async fn test_builder_without_seed() {
    let repo = RepositoryBuilder::new().seed(false).build().unwrap();
    assert!(repo.list_snapshots().await.unwrap().is_empty());
}
