//! Input records consumed by the analytics services.

pub mod records;
pub mod series;
pub mod snapshot;

pub use records::*;
pub use series::*;
pub use snapshot::*;
