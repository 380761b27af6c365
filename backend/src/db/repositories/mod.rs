//! Repository implementations.
//!
//! - `local`: in-memory store seeded from the bundled dataset
pub mod local;

pub use local::LocalRepository;
