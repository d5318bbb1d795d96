//! Population threshold resolution.
//!
//! Combines the timezone snapshot with partition reads, relaxing the
//! population floor multiplicatively until something matches or the hard
//! floor is reached. The relaxation is an explicit loop with the
//! termination condition as its guard; successive floors shrink
//! geometrically (`f, ⌊f·decay⌋, …`) regardless of starting magnitude.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::catalog::ResolvedCity;
use crate::snapshot::{self, ZoneSnapshot};
use crate::store::{CityStore, StoreError};

/// The winning zones for an instant plus the floor at which cities were
/// found (or the search gave up).
#[derive(Debug)]
pub struct FloorSearch {
    /// Winning zone names in ascending order, paired with their snapshots.
    pub zones: Vec<(String, ZoneSnapshot)>,
    /// The floor the search settled on: the first floor with matches, or
    /// the last floor attempted before crossing the hard floor.
    pub floor_used: u64,
    /// Matching rows across the winning zones at `floor_used`.
    pub count: usize,
}

/// Find the floor at which the winning zones hold any city.
///
/// Starts at `min_population` and multiplies by `decay` until either
/// `count_matching` is non-zero or the floor would cross `hard_floor`.
/// Never materializes rows; the sampler builds on this directly.
///
/// # Panics
/// Panics if `decay` is not in `[0, 1)`; a non-decreasing floor would loop
/// forever. Config validation enforces the same range for the binary path.
pub fn settle_floor(
    store: &CityStore,
    now: DateTime<Utc>,
    target_hour: u32,
    min_population: u64,
    hard_floor: u64,
    decay: f64,
) -> Result<FloorSearch, StoreError> {
    assert!(
        (0.0..1.0).contains(&decay),
        "settle_floor: decay {} must be below 1.0 or the relaxation never terminates",
        decay
    );

    let snapshots = snapshot::resolve(now, target_hour);
    let zone_names: BTreeSet<String> = snapshots.keys().cloned().collect();

    let mut floor = min_population;
    let count = loop {
        let count = store.count_matching(&zone_names, floor)?;
        if count > 0 || floor <= hard_floor {
            break count;
        }
        floor = (floor as f64 * decay).floor() as u64;
    };

    let mut zones: Vec<(String, ZoneSnapshot)> = snapshots.into_iter().collect();
    zones.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(FloorSearch {
        zones,
        floor_used: floor,
        count,
    })
}

/// Resolve every city currently at `target_hour`, relaxing the floor as
/// needed.
///
/// # Returns
/// The matching cities (zone name ascending, population descending within
/// each zone, each joined with its zone's local-time metadata) and the
/// floor actually used. An empty list with the final floor is the defined
/// exhausted-search outcome, not an error.
pub fn resolve_with_floor(
    store: &CityStore,
    now: DateTime<Utc>,
    target_hour: u32,
    min_population: u64,
    hard_floor: u64,
    decay: f64,
) -> Result<(Vec<ResolvedCity>, u64), StoreError> {
    let search = settle_floor(store, now, target_hour, min_population, hard_floor, decay)?;

    let mut cities = Vec::with_capacity(search.count);
    for (zone_name, zone_snapshot) in &search.zones {
        for city in store.read_partition(zone_name, search.floor_used, None)? {
            cities.push(ResolvedCity::from_city(&city, zone_name, zone_snapshot));
        }
    }
    Ok((cities, search.floor_used))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CityRecord};
    use chrono::TimeZone;

    fn record(name: &str, population: u64, tz: &str) -> CityRecord {
        CityRecord {
            name: name.to_string(),
            state: None,
            state_code: None,
            country: None,
            country_code: "US".to_string(),
            population,
            latitude: 0.0,
            longitude: 0.0,
            timezone_name: tz.to_string(),
        }
    }

    /// 22:00 UTC in northern winter: the UTC-5 zones read 17:00.
    fn winter_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 22, 0, 0).unwrap()
    }

    #[test]
    fn test_resolver_returns_cities_at_starting_floor() {
        let store = CityStore::with_catalog(Catalog::from_records(vec![
            record("New York", 8_000_000, "America/New_York"),
            record("Chicago", 2_700_000, "America/Chicago"),
        ]));

        let (cities, floor) =
            resolve_with_floor(&store, winter_instant(), 17, 2_000, 500, 0.9).unwrap();
        assert_eq!(floor, 2_000);
        assert!(cities.iter().any(|c| c.name == "New York"));
        // Chicago reads 16:00 at this instant
        assert!(cities.iter().all(|c| c.name != "Chicago"));
        assert!(cities.iter().all(|c| c.local_time == "17:00:00"));
    }

    #[test]
    fn test_resolver_relaxes_floor_geometrically() {
        // Only city in the winning zones has population 1700: floors go
        // 2000 → 1800 → 1620 before anything matches.
        let store = CityStore::with_catalog(Catalog::from_records(vec![record(
            "Mid Town",
            1_700,
            "America/New_York",
        )]));

        let (cities, floor) =
            resolve_with_floor(&store, winter_instant(), 17, 2_000, 500, 0.9).unwrap();
        assert_eq!(floor, 1_620);
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name, "Mid Town");
    }

    #[test]
    fn test_resolver_exhausted_search_reports_last_floor() {
        // Nothing in any winning zone: the floor decays until it crosses
        // the hard floor and the defined empty outcome comes back.
        let store = CityStore::with_catalog(Catalog::from_records(vec![record(
            "Elsewhere",
            5_000_000,
            "Asia/Tokyo",
        )]));

        let (cities, floor) =
            resolve_with_floor(&store, winter_instant(), 17, 2_000, 500, 0.9).unwrap();
        assert!(cities.is_empty());
        assert!(floor <= 500);
    }

    #[test]
    fn test_settle_floor_counts_without_materializing() {
        let store = CityStore::with_catalog(Catalog::from_records(vec![
            record("New York", 8_000_000, "America/New_York"),
            record("Buffalo", 278_000, "America/New_York"),
        ]));

        let search = settle_floor(&store, winter_instant(), 17, 2_000, 500, 0.9).unwrap();
        assert_eq!(search.floor_used, 2_000);
        assert_eq!(search.count, 2);
        assert!(
            search
                .zones
                .iter()
                .any(|(name, _)| name == "America/New_York")
        );
    }

    #[test]
    #[should_panic(expected = "never terminates")]
    fn test_settle_floor_rejects_non_decreasing_decay() {
        let store = CityStore::with_catalog(Catalog::from_records(vec![record(
            "Elsewhere",
            5_000_000,
            "Asia/Tokyo",
        )]));
        let _ = settle_floor(&store, winter_instant(), 17, 2_000, 500, 1.0);
    }

    #[test]
    fn test_resolver_not_ready_store_errors() {
        let store = CityStore::new();
        let result = resolve_with_floor(&store, winter_instant(), 17, 2_000, 500, 0.9);
        assert!(result.is_err());
    }
}
