//! # CSIP Rust Backend
//!
//! Decision-support analytics for government service delivery.
//!
//! This crate scores districts from operational snapshots, ranks and compares
//! them, forecasts weekly disease case counts, and answers free-text questions
//! through a rule-based query router. The backend exposes a REST API via Axum
//! for the dashboard frontend.
//!
//! ## Features
//!
//! - **Metric Engine**: HVI, ISS, RCS, P-Score and SEL with explicit
//!   unavailable values instead of silent zeros
//! - **Aggregation**: district ranking and pairwise comparison
//! - **Forecasting**: Holt linear smoothing with hold-out KPIs and narrative insights
//! - **Query Router**: keyword, district and fuzzy matching over free text
//! - **Operations**: alerts, feedback, tickets and workforce summaries
//! - **HTTP API**: RESTful endpoints for frontend integration
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Data Transfer Objects (DTOs) for API responses
//! - [`config`]: Analytics configuration (weights, thresholds, forecast settings)
//! - [`db`]: Repository pattern, seed data and service-layer orchestration
//! - [`models`]: Input records (snapshots, case series, operational records)
//! - [`services`]: Business logic: metrics, aggregation, forecasting, routing
//! - [`http`]: Axum-based HTTP server and request handlers
//! - [`routes`]: Route-specific response types
//!

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;

pub mod db;
pub mod models;

pub mod routes;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
