//! Partitioned city store.
//!
//! Materializes the master catalog into one partition per timezone, each a
//! population-descending `Arc<Vec<City>>` swapped in atomically. Readers
//! either see a partition's old version or its new version, never a
//! half-written one, and a rebuild of one zone never blocks reads of
//! another.
//!
//! Partitioning turns "population ≥ N within zone Z" into a sorted prefix
//! scan, and "random city across winning zones" into count+offset without
//! materializing the matching set. `count_matching` followed by
//! `read_at_offset` is only consistent when no rebuild of the involved
//! zones interleaves between the two calls; callers needing strictness
//! under concurrent rebuild must bracket the pair themselves.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;

use crate::catalog::{Catalog, City};
use crate::logger::Log;

/// Read-path failures that are not "no cities found".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store has no catalog yet, or the requested zone's partition has
    /// not been built. Distinct from an empty result so callers can tell
    /// "nothing matched" from "not initialized".
    #[error("city store not ready: {0}")]
    NotReady(String),
}

/// The partitioned city store.
///
/// Constructed once at startup around a catalog, rebuilt on demand, read
/// concurrently thereafter. All locks are held only for map access, never
/// across a partition build.
pub struct CityStore {
    catalog: RwLock<Option<Arc<Catalog>>>,
    partitions: RwLock<HashMap<String, Arc<Vec<City>>>>,
    /// One guard per zone so concurrent rebuilds of the same partition
    /// serialize while different zones proceed in parallel.
    rebuild_guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CityStore {
    /// Create an empty, not-yet-ready store.
    pub fn new() -> Self {
        CityStore {
            catalog: RwLock::new(None),
            partitions: RwLock::new(HashMap::new()),
            rebuild_guards: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store from a catalog and build every partition.
    pub fn with_catalog(catalog: Catalog) -> Self {
        let store = Self::new();
        store.install_catalog(catalog);
        store.rebuild_all(true);
        store
    }

    /// Replace the master catalog wholesale.
    ///
    /// Existing partitions are cleared; they are stale relative to the new
    /// master until [`rebuild_all`](Self::rebuild_all) runs.
    pub fn install_catalog(&self, catalog: Catalog) {
        let catalog = Arc::new(catalog);
        *self
            .catalog
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(catalog);
        self.partitions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    fn current_catalog(&self) -> Result<Arc<Catalog>, StoreError> {
        self.catalog
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
            .ok_or_else(|| StoreError::NotReady("no catalog installed".to_string()))
    }

    /// Fetch a zone's partition, distinguishing "zone unknown to the
    /// catalog" (no cities, `Ok(None)`) from "partition not built yet"
    /// (`Err(NotReady)`).
    fn partition(&self, zone_name: &str) -> Result<Option<Arc<Vec<City>>>, StoreError> {
        let catalog = self.current_catalog()?;
        if catalog.timezone_by_name(zone_name).is_none() {
            return Ok(None);
        }
        self.partitions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(zone_name)
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                StoreError::NotReady(format!("partition for {} not built", zone_name))
            })
    }

    /// Population-descending rows of one zone with population ≥ `floor`,
    /// truncated to `limit` if given.
    ///
    /// The partition is already sorted, so the floor is a prefix scan that
    /// stops at the first row below threshold.
    pub fn read_partition(
        &self,
        zone_name: &str,
        floor: u64,
        limit: Option<usize>,
    ) -> Result<Vec<City>, StoreError> {
        let Some(partition) = self.partition(zone_name)? else {
            return Ok(Vec::new());
        };
        let matching = partition.iter().take_while(|c| c.population >= floor);
        Ok(match limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        })
    }

    /// Count rows with population ≥ `floor` across a set of zones.
    pub fn count_matching(
        &self,
        zone_names: &BTreeSet<String>,
        floor: u64,
    ) -> Result<usize, StoreError> {
        let mut total = 0;
        for zone_name in zone_names {
            if let Some(partition) = self.partition(zone_name)? {
                total += partition
                    .iter()
                    .take_while(|c| c.population >= floor)
                    .count();
            }
        }
        Ok(total)
    }

    /// The row at position `offset` of the concatenation of all matching
    /// rows, zones in name-ascending order and each zone population
    /// descending.
    ///
    /// # Panics
    /// Panics if `offset` is not below the corresponding
    /// [`count_matching`](Self::count_matching) result; that is a caller
    /// bug, not a data condition.
    pub fn read_at_offset(
        &self,
        zone_names: &BTreeSet<String>,
        floor: u64,
        offset: usize,
    ) -> Result<(String, City), StoreError> {
        let mut remaining = offset;
        for zone_name in zone_names {
            let Some(partition) = self.partition(zone_name)? else {
                continue;
            };
            let matching = partition
                .iter()
                .take_while(|c| c.population >= floor)
                .count();
            if remaining < matching {
                return Ok((zone_name.clone(), partition[remaining].clone()));
            }
            remaining -= matching;
        }
        panic!(
            "read_at_offset: offset {} is out of range for {} zones at floor {}",
            offset,
            zone_names.len(),
            floor
        );
    }

    /// Rebuild every partition from the master catalog.
    ///
    /// Zones whose partition already exists are skipped unless `force` is
    /// set, so re-running against an up-to-date store is a no-op. Each
    /// partition is built off to the side and swapped in whole; rebuilds of
    /// the same zone serialize on a per-zone guard.
    ///
    /// # Returns
    /// The number of partitions actually rebuilt.
    pub fn rebuild_all(&self, force: bool) -> usize {
        let Ok(catalog) = self.current_catalog() else {
            Log::log_warning("Partition rebuild requested before any catalog was installed");
            return 0;
        };

        let mut rebuilt = 0;
        for timezone in catalog.timezones() {
            if self.rebuild_partition(&catalog, &timezone.name, timezone.id, force) {
                rebuilt += 1;
            }
        }
        if rebuilt > 0 {
            Log::log_decorated(&format!(
                "Built {} timezone partitions ({} zones total)",
                rebuilt,
                catalog.timezones().len()
            ));
        }
        rebuilt
    }

    /// Rebuild every partition on a detached background thread.
    ///
    /// Reads proceed against existing partitions while the rebuild runs;
    /// each partition flips to its new version atomically as it completes.
    pub fn rebuild_all_background(self: &Arc<Self>, force: bool) -> thread::JoinHandle<usize> {
        let store = Arc::clone(self);
        thread::spawn(move || store.rebuild_all(force))
    }

    /// Rebuild one zone's partition. Returns whether a build happened.
    fn rebuild_partition(
        &self,
        catalog: &Catalog,
        zone_name: &str,
        timezone_id: u32,
        force: bool,
    ) -> bool {
        let guard = self.rebuild_guard(zone_name);
        let _serialized = guard
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if !force
            && self
                .partitions
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .contains_key(zone_name)
        {
            return false;
        }

        // The master list is already population-descending and stable, so a
        // filtered copy preserves the partition invariant. Population-0 rows
        // stay out of ranked reads entirely.
        let rows: Vec<City> = catalog
            .cities()
            .iter()
            .filter(|c| c.timezone_id == timezone_id && c.population > 0)
            .cloned()
            .collect();

        self.partitions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(zone_name.to_string(), Arc::new(rows));
        true
    }

    fn rebuild_guard(&self, zone_name: &str) -> Arc<Mutex<()>> {
        let mut guards = self
            .rebuild_guards
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guards
            .entry(zone_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for CityStore {
    fn default() -> Self {
        Self::new()
    }
}
