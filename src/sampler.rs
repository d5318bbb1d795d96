//! Uniform random city sampling.
//!
//! Draws one city uniformly from the set matching "hour H, population ≥
//! floor" using count+offset against the partitioned store, so the
//! candidate set is never loaded. Each of the `count` matching rows is
//! picked with probability `1/count`, provided no rebuild of the involved
//! partitions lands between the count and the offset read.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::BTreeSet;

use crate::catalog::ResolvedCity;
use crate::resolver;
use crate::store::{CityStore, StoreError};

/// Pick one city uniformly at random among those currently at
/// `target_hour`, relaxing the population floor as needed.
///
/// # Returns
/// The sampled city and the floor used, or `None` with the final floor
/// when relaxation exhausted itself (the defined empty outcome).
pub fn pick_random<R: Rng>(
    store: &CityStore,
    now: DateTime<Utc>,
    target_hour: u32,
    min_population: u64,
    hard_floor: u64,
    decay: f64,
    rng: &mut R,
) -> Result<(Option<ResolvedCity>, u64), StoreError> {
    let search = resolver::settle_floor(store, now, target_hour, min_population, hard_floor, decay)?;
    if search.count == 0 {
        return Ok((None, search.floor_used));
    }

    let zone_names: BTreeSet<String> =
        search.zones.iter().map(|(name, _)| name.clone()).collect();
    let offset = rng.random_range(0..search.count);
    let (zone_name, city) = store.read_at_offset(&zone_names, search.floor_used, offset)?;

    let snapshot = search
        .zones
        .iter()
        .find(|(name, _)| *name == zone_name)
        .map(|(_, snapshot)| snapshot)
        .expect("sampled city came from a winning zone");

    Ok((
        Some(ResolvedCity::from_city(&city, &zone_name, snapshot)),
        search.floor_used,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CityRecord};
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

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

    fn winter_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 22, 0, 0).unwrap()
    }

    #[test]
    fn test_pick_random_returns_a_matching_city() {
        let store = CityStore::with_catalog(Catalog::from_records(vec![
            record("New York", 8_000_000, "America/New_York"),
            record("Buffalo", 278_000, "America/New_York"),
        ]));
        let mut rng = StdRng::seed_from_u64(7);

        let (city, floor) =
            pick_random(&store, winter_instant(), 17, 2_000, 500, 0.9, &mut rng).unwrap();
        let city = city.unwrap();
        assert_eq!(floor, 2_000);
        assert!(city.name == "New York" || city.name == "Buffalo");
        assert_eq!(city.local_time, "17:00:00");
    }

    #[test]
    fn test_pick_random_none_when_search_exhausts() {
        let store = CityStore::with_catalog(Catalog::from_records(vec![record(
            "Elsewhere",
            5_000_000,
            "Asia/Tokyo",
        )]));
        let mut rng = StdRng::seed_from_u64(7);

        let (city, floor) =
            pick_random(&store, winter_instant(), 17, 2_000, 500, 0.9, &mut rng).unwrap();
        assert!(city.is_none());
        assert!(floor <= 500);
    }

    #[test]
    fn test_pick_random_is_roughly_uniform() {
        let store = CityStore::with_catalog(Catalog::from_records(vec![
            record("Alpha", 4_000, "America/New_York"),
            record("Bravo", 3_500, "America/New_York"),
            record("Charlie", 3_000, "America/New_York"),
            record("Delta", 2_500, "America/New_York"),
        ]));
        let mut rng = StdRng::seed_from_u64(42);

        const TRIALS: usize = 4_000;
        let mut hits: HashMap<String, usize> = HashMap::new();
        for _ in 0..TRIALS {
            let (city, _) =
                pick_random(&store, winter_instant(), 17, 2_000, 500, 0.9, &mut rng).unwrap();
            *hits.entry(city.unwrap().name).or_insert(0) += 1;
        }

        // Chi-square goodness of fit against uniform over 4 cells; the
        // 99.9% critical value for 3 degrees of freedom is 16.27.
        assert_eq!(hits.len(), 4);
        let expected = TRIALS as f64 / 4.0;
        let chi_square: f64 = hits
            .values()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();
        assert!(
            chi_square < 16.27,
            "selection looks non-uniform: chi-square = {chi_square:.2}, hits = {hits:?}"
        );
    }
}
