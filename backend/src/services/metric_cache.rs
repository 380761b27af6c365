//! Memoised metric results keyed by (district, data version).

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::{DataVersion, MetricResult};

/// In-memory metric cache.
///
/// Holds at most one entry per district. An entry computed for an older data
/// version is never returned.
#[derive(Clone, Default)]
pub struct MetricCache {
    entries: Arc<RwLock<HashMap<String, (DataVersion, MetricResult)>>>,
}

fn key(district: &str) -> String {
    district.trim().to_lowercase()
}

impl MetricCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, district: &str, version: DataVersion) -> Option<MetricResult> {
        let entries = self.entries.read();
        match entries.get(&key(district)) {
            Some((cached, result)) if *cached == version => {
                log::debug!("Metric cache hit for {} (v{})", district, version.value());
                Some(result.clone())
            }
            _ => {
                log::debug!("Metric cache miss for {} (v{})", district, version.value());
                None
            }
        }
    }

    pub fn insert(&self, district: &str, version: DataVersion, result: MetricResult) {
        self.entries
            .write()
            .insert(key(district), (version, result));
    }

    /// Drop every cached entry for a district.
    pub fn invalidate(&self, district: &str) {
        if self.entries.write().remove(&key(district)).is_some() {
            log::debug!("Invalidated cached metrics for {}", district);
        }
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Return the cached result for `version`, computing and storing it on a
    /// miss.
    pub fn get_or_compute<F>(&self, district: &str, version: DataVersion, compute: F) -> MetricResult
    where
        F: FnOnce() -> MetricResult,
    {
        if let Some(hit) = self.get(district, version) {
            return hit;
        }
        let result = compute();
        self.insert(district, version, result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DistrictOperationalSnapshot;
    use crate::services::metrics::compute_metrics;
    use std::cell::Cell;

    fn result(district: &str) -> MetricResult {
        compute_metrics(&DistrictOperationalSnapshot::new(district))
    }

    #[test]
    fn test_hit_requires_matching_version() {
        let cache = MetricCache::new();
        cache.insert("Pune", DataVersion::new(1), result("Pune"));

        assert!(cache.get("pune", DataVersion::new(1)).is_some());
        assert!(cache.get("Pune", DataVersion::new(2)).is_none());
    }

    #[test]
    fn test_get_or_compute_memoises() {
        let cache = MetricCache::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            result("Pune")
        };

        cache.get_or_compute("Pune", DataVersion::new(1), compute);
        cache.get_or_compute("Pune", DataVersion::new(1), compute);
        assert_eq!(calls.get(), 1);

        cache.get_or_compute("Pune", DataVersion::new(2), compute);
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_drops_district() {
        let cache = MetricCache::new();
        cache.insert("Pune", DataVersion::new(1), result("Pune"));
        cache.insert("Thane", DataVersion::new(1), result("Thane"));

        cache.invalidate("PUNE");
        assert!(cache.get("Pune", DataVersion::new(1)).is_none());
        assert!(cache.get("Thane", DataVersion::new(1)).is_some());
    }
}
