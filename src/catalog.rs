//! City catalog data model and bulk build.
//!
//! The catalog is the read-only master table every query runs against. It is
//! built in bulk from gazetteer rows, never mutated row by row, and replaced
//! wholesale on rebuild. Rows carrying an IANA timezone name that chrono-tz
//! does not know are skipped and counted; a handful of bad rows must never
//! abort an import of hundreds of thousands.

use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::logger::Log;
use crate::snapshot::ZoneSnapshot;

/// A named IANA timezone as stored in the catalog.
///
/// Created once during the catalog build and immutable afterward. Cities
/// reference it by `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timezone {
    pub id: u32,
    pub name: String,
}

/// One raw gazetteer row, as produced by the import collaborator.
#[derive(Debug, Clone)]
pub struct CityRecord {
    pub name: String,
    pub state: Option<String>,
    pub state_code: Option<String>,
    pub country: Option<String>,
    pub country_code: String,
    pub population: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone_name: String,
}

/// A city row in the master table.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub name: String,
    pub state: Option<String>,
    pub state_code: Option<String>,
    pub country: Option<String>,
    pub country_code: String,
    pub population: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone_id: u32,
}

/// The immutable master table: all timezones plus all cities, with the city
/// list sorted by population descending (stable, so catalog insertion order
/// breaks ties).
#[derive(Debug, Default)]
pub struct Catalog {
    timezones: Vec<Timezone>,
    cities: Vec<City>,
    skipped_rows: usize,
}

impl Catalog {
    /// Build the catalog from gazetteer rows.
    ///
    /// Timezone ids are assigned in sorted-name order over the distinct zone
    /// names seen in the input. Rows whose timezone name does not resolve to
    /// a known IANA zone are dropped (data-quality skip) and counted.
    pub fn from_records(records: Vec<CityRecord>) -> Self {
        let mut zone_names: BTreeSet<String> = BTreeSet::new();
        for record in &records {
            if record.timezone_name.parse::<Tz>().is_ok() {
                zone_names.insert(record.timezone_name.clone());
            }
        }

        let timezones: Vec<Timezone> = zone_names
            .iter()
            .enumerate()
            .map(|(i, name)| Timezone {
                id: i as u32,
                name: name.clone(),
            })
            .collect();
        let ids_by_name: std::collections::HashMap<&str, u32> = timezones
            .iter()
            .map(|tz| (tz.name.as_str(), tz.id))
            .collect();

        let mut skipped_rows = 0;
        let mut cities: Vec<City> = Vec::with_capacity(records.len());
        for record in records {
            let Some(&timezone_id) = ids_by_name.get(record.timezone_name.as_str()) else {
                skipped_rows += 1;
                continue;
            };
            cities.push(City {
                name: record.name,
                state: record.state,
                state_code: record.state_code,
                country: record.country,
                country_code: record.country_code,
                population: record.population,
                latitude: record.latitude,
                longitude: record.longitude,
                timezone_id,
            });
        }

        // Stable sort: equal populations keep their insertion order
        cities.sort_by(|a, b| b.population.cmp(&a.population));

        if skipped_rows > 0 {
            Log::log_warning(&format!(
                "Skipped {} gazetteer rows with unresolvable timezone names",
                skipped_rows
            ));
        }

        Catalog {
            timezones,
            cities,
            skipped_rows,
        }
    }

    /// All timezones known to this catalog, in id order.
    pub fn timezones(&self) -> &[Timezone] {
        &self.timezones
    }

    /// The master city list, population descending.
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Look up a timezone by its IANA name.
    pub fn timezone_by_name(&self, name: &str) -> Option<&Timezone> {
        // Timezones are sorted by name, so this could binary search; the
        // table tops out at a few hundred entries either way.
        self.timezones.iter().find(|tz| tz.name == name)
    }

    /// Number of rows dropped during the build for bad timezone names.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

/// A city joined with the live local-time metadata of its zone.
///
/// This is the single serialization boundary of the crate: the serialized
/// field set (`name, state, country, population, latitude, longitude,
/// timezone, local_date, local_time, timezone_abbr`) is the output contract
/// callers rely on.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedCity {
    pub name: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub population: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub local_date: String,
    pub local_time: String,
    pub timezone_abbr: String,
    /// Grouping key for round-robin interleaving; not part of the
    /// serialized contract.
    #[serde(skip)]
    pub country_code: String,
}

impl ResolvedCity {
    /// Join a city row with its zone's snapshot for this instant.
    pub fn from_city(city: &City, zone_name: &str, snapshot: &ZoneSnapshot) -> Self {
        ResolvedCity {
            name: city.name.clone(),
            state: city.state.clone(),
            country: city.country.clone(),
            population: city.population,
            latitude: city.latitude,
            longitude: city.longitude,
            timezone: zone_name.to_string(),
            local_date: snapshot.local_date.clone(),
            local_time: snapshot.local_time.clone(),
            timezone_abbr: snapshot.abbreviation.clone(),
            country_code: city.country_code.clone(),
        }
    }
}
