//! Valuation caching
//!
//! Interactive front ends re-request the same parameter sets on every
//! redraw. The cache is owned by the caller and keyed by the exact validated
//! parameters, so the pricing functions themselves stay pure.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{BsmError, BsmResult, OptionParameters, OptionRecord, OptionType, PricingConfig};
use crate::models::{value, Valuation};

/// Cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum entries before the oldest is evicted (0 = unbounded)
    pub capacity: usize,
    /// Whether to use cache
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 4096,
            enabled: true,
        }
    }
}

/// Exact bit pattern of the validated inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    bits: [u64; 6],
    option_type: OptionType,
    at_expiry: bool,
    zero_vol: bool,
}

impl CacheKey {
    fn new(params: &OptionParameters) -> Self {
        // + 0.0 folds -0.0 into 0.0
        let bits = [
            params.spot(),
            params.strike(),
            params.time_to_expiry(),
            params.rate(),
            params.dividend_yield(),
            params.volatility(),
        ]
        .map(|v| (v + 0.0).to_bits());
        Self {
            bits,
            option_type: params.option_type(),
            at_expiry: params.is_at_expiry(),
            zero_vol: params.is_zero_vol(),
        }
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotEntry {
    params: OptionRecord,
    floors: PricingConfig,
    valuation: Valuation,
}

/// Caller-owned cache of price + Greeks (per-unit convention)
#[derive(Debug, Default)]
pub struct ValuationCache {
    config: CacheConfig,
    entries: HashMap<CacheKey, (OptionParameters, Valuation)>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl ValuationCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Cached valuation, computing and storing it on a miss
    pub fn get_or_value(&mut self, params: &OptionParameters) -> BsmResult<Valuation> {
        if !self.config.enabled {
            return value(params);
        }

        let key = CacheKey::new(params);
        if let Some((_, valuation)) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(*valuation);
        }

        self.misses += 1;
        tracing::debug!("Cache miss for {:?}", params.to_record());
        let valuation = value(params)?;
        self.insert(key, *params, valuation);
        Ok(valuation)
    }

    /// Cached valuation without computing
    pub fn get(&self, params: &OptionParameters) -> Option<Valuation> {
        self.entries.get(&CacheKey::new(params)).map(|(_, v)| *v)
    }

    fn insert(&mut self, key: CacheKey, params: OptionParameters, valuation: Valuation) {
        if self.entries.insert(key, (params, valuation)).is_none() {
            self.order.push_back(key);
        }
        while self.config.capacity > 0 && self.entries.len() > self.config.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }

    /// Clear all cache
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Write all entries to a JSON snapshot
    pub fn save(&self, path: &Path) -> BsmResult<()> {
        let snapshot: Vec<SnapshotEntry> = self
            .order
            .iter()
            .filter_map(|key| self.entries.get(key))
            .map(|(params, valuation)| SnapshotEntry {
                params: params.to_record(),
                floors: params.pricing_config(),
                valuation: *valuation,
            })
            .collect();

        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| BsmError::serialization(e.to_string()))?;
        fs::write(path, json)?;

        tracing::info!("Cached {} valuations at {:?}", snapshot.len(), path);
        Ok(())
    }

    /// Load entries from a JSON snapshot; returns how many were added
    pub fn load(&mut self, path: &Path) -> BsmResult<usize> {
        let json = fs::read_to_string(path)?;
        let snapshot: Vec<SnapshotEntry> =
            serde_json::from_str(&json).map_err(|e| BsmError::serialization(e.to_string()))?;

        let mut loaded = 0;
        for entry in snapshot {
            let kind: OptionType = entry.params.option_kind.parse()?;
            let params = OptionParameters::with_config(
                entry.params.spot,
                entry.params.strike,
                entry.params.time_to_expiry_years,
                entry.params.risk_free_rate,
                entry.params.dividend_yield,
                entry.params.volatility,
                kind,
                entry.floors,
            )?;
            self.insert(CacheKey::new(&params), params, entry.valuation);
            loaded += 1;
        }

        tracing::info!("Loaded {} valuations from {:?}", loaded, path);
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn params(spot: f64) -> OptionParameters {
        OptionParameters::new(spot, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call).unwrap()
    }

    #[test]
    fn test_hits_and_misses() {
        let mut cache = ValuationCache::new(CacheConfig::default());

        let first = cache.get_or_value(&params(100.0)).unwrap();
        let second = cache.get_or_value(&params(100.0)).unwrap();
        assert_eq!(first, second);
        assert!((first.price - 10.450_583_572_185_565).abs() < 1e-10);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);

        // Other side is a different key
        cache
            .get_or_value(&params(100.0).with_option_type(OptionType::Put))
            .unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut cache = ValuationCache::new(CacheConfig {
            capacity: 2,
            enabled: true,
        });
        for spot in [90.0, 100.0, 110.0] {
            cache.get_or_value(&params(spot)).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&params(90.0)).is_none());
        assert!(cache.get(&params(110.0)).is_some());
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let mut cache = ValuationCache::new(CacheConfig {
            capacity: 0,
            enabled: false,
        });
        cache.get_or_value(&params(100.0)).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache = ValuationCache::new(CacheConfig::default());
        let p = OptionParameters::new(100.0, 100.0, 1.0, -1000.0, 0.0, 0.2, OptionType::Call).unwrap();
        assert!(cache.get_or_value(&p).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("valuations.json");

        let mut cache = ValuationCache::new(CacheConfig::default());
        cache.get_or_value(&params(95.0)).unwrap();
        // Degenerate entry keeps its floor flags through the snapshot
        let expired = OptionParameters::new(120.0, 100.0, 0.0, 0.05, 0.0, 0.2, OptionType::Call).unwrap();
        cache.get_or_value(&expired).unwrap();
        cache.save(&path).unwrap();

        let mut restored = ValuationCache::new(CacheConfig::default());
        assert_eq!(restored.load(&path).unwrap(), 2);
        let original = cache.get(&params(95.0)).unwrap();
        let reloaded = restored.get(&params(95.0)).unwrap();
        assert!((reloaded.price - original.price).abs() < 1e-12);
        assert!((reloaded.greeks.vega - original.greeks.vega).abs() < 1e-12);
        assert!(restored.get(&expired).is_some());

        // Clear
        restored.clear();
        assert!(restored.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempdir().unwrap();
        let mut cache = ValuationCache::new(CacheConfig::default());
        let err = cache.load(&temp_dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, BsmError::IO(_)));
    }
}
